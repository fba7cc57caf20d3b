//! Encounter state machine.
//!
//! Owns the encounter lifecycle (`active → resolved`, terminal) and the
//! tick handler that drives creature casts, auto-attacks, death marking,
//! and victory/defeat distribution.
//!
//! The in-tick ordering is a contract: creature-ability resolution runs
//! before player auto-attacks, which run before creature auto-attacks,
//! which run before the still-anyone-alive check. Rewards and death
//! marking depend on this order.

use std::sync::Arc;

use combat_core::config::EngineConfig;
use combat_core::effect::EffectKind;
use combat_core::env::{CreatureOracle, EventSink, GearOracle};
use combat_core::error::AbilityError;
use combat_core::mitigation::{apply_variance, crit_chance_permille, mitigate_physical, roll_attack_outcome};
use combat_core::rng::{RollOracle, compute_seed};
use combat_core::stats::{derive_enemy_stats, level_difference_percent};
use combat_core::types::{
    CharacterId, CreatureId, EncounterId, GroupId, PetId, SimTime, SpawnId, ThreatSource,
    ThreatTarget,
};
use combat_core::AttackOutcome;

use crate::ai::EnemyAiSelector;
use crate::error::RuntimeError;
use crate::events::{CombatEvent, EncounterOutcome, EventBus};
use crate::executor::{AbilityExecutor, roll_salt};
use crate::resolution::RewardDispatcher;
use crate::store::{
    CombatEnemy, CombatResult, CombatState, EncounterState, EnemyCast, ParticipantStatus,
};

/// Seed contexts for auto-attack rolls.
const CTX_OUTCOME: u32 = 0;
const CTX_VARIANCE: u32 = 1;

/// Crit chance creatures swing with, in per-mille.
const CREATURE_CRIT_PERMILLE: u32 = 50;

/// Result of one encounter tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still fighting; reschedule at this time.
    Continue { next_at: SimTime },
    /// The encounter resolved inside this tick.
    Resolved,
}

/// The encounter state machine.
pub struct EncounterEngine {
    executor: AbilityExecutor,
    ai: EnemyAiSelector,
    rewards: Arc<dyn RewardDispatcher>,
    creatures: Arc<dyn CreatureOracle>,
    gear: Arc<dyn GearOracle>,
    sink: Arc<dyn EventSink>,
    rolls: Arc<dyn RollOracle>,
    events: EventBus,
    config: EngineConfig,
}

impl EncounterEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        executor: AbilityExecutor,
        ai: EnemyAiSelector,
        rewards: Arc<dyn RewardDispatcher>,
        creatures: Arc<dyn CreatureOracle>,
        gear: Arc<dyn GearOracle>,
        sink: Arc<dyn EventSink>,
        rolls: Arc<dyn RollOracle>,
        events: EventBus,
        config: EngineConfig,
    ) -> Self {
        Self {
            executor,
            ai,
            rewards,
            creatures,
            gear,
            sink,
            rolls,
            events,
            config,
        }
    }

    pub fn executor(&self) -> &AbilityExecutor {
        &self.executor
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open an encounter between a party and a spawn's creatures.
    ///
    /// Every qualifying party member in the leader's location joins as a
    /// participant. A character already in an active encounter cannot
    /// start or join another one.
    pub fn start_combat(
        &self,
        state: &mut CombatState,
        now: SimTime,
        leader: CharacterId,
        spawn: SpawnId,
        participants: &[CharacterId],
        group: Option<GroupId>,
    ) -> Result<EncounterId, RuntimeError> {
        let leader_row = state
            .character(leader)
            .ok_or(RuntimeError::UnknownCharacter(leader))?;
        if state.in_combat(leader) {
            return Err(RuntimeError::CharacterInCombat(leader));
        }
        let location = leader_row.location;

        let members = self.creatures.spawn_members(spawn);
        if members.is_empty() {
            return Err(RuntimeError::EmptySpawn);
        }

        let encounter = state.create_encounter(location, group, now);
        let first_swing = now.plus_millis(self.config.auto_attack_interval_ms);

        state.add_participant(encounter, leader, first_swing);
        for &character in participants {
            if character == leader {
                continue;
            }
            let qualifies = state.character(character).is_some_and(|row| {
                row.location == location && row.group == group && row.is_alive()
            }) && !state.in_combat(character);
            if qualifies {
                state.add_participant(encounter, character, first_swing);
            }
        }

        for key in members {
            let Some(template) = self.creatures.template(&key) else {
                tracing::warn!(template = %key, "spawn references unknown creature template");
                continue;
            };
            let role = self.creatures.role_template(template.role);
            let derived = derive_enemy_stats(template.hp, template.armor, &role, template.level);
            let creature = state.spawn_enemy(CombatEnemy {
                id: CreatureId(0), // assigned by the store
                encounter,
                spawn,
                template_key: template.key.clone(),
                name: template.name.clone(),
                level: template.level,
                role: template.role,
                hp: derived.max_hp,
                max_hp: derived.max_hp,
                attack_damage: derived.attack_damage,
                armor_class: derived.armor_class,
                magic_resist: template.magic_resist,
                abilities: template.abilities.clone(),
                target: Some(ThreatTarget::Character(leader)),
                next_auto_attack_at: first_swing,
                base_xp: template.base_xp,
            });
            // Seed the table so top-threat resolves from the first tick.
            state
                .threat_mut(encounter)
                .add(creature, ThreatSource::Character(leader), 1);
        }

        self.sink.append_group(encounter, "You are under attack!");
        self.events.publish(CombatEvent::EncounterStarted {
            encounter,
            location,
        });
        tracing::info!(%encounter, %leader, spawn = spawn.0, "combat started");
        Ok(encounter)
    }

    /// Best-effort flight: a status flip honored on the next check, not
    /// an immediate preemption.
    pub fn flee(&self, state: &mut CombatState, character: CharacterId) -> Result<(), RuntimeError> {
        let encounter = state
            .encounter_of_character(character)
            .ok_or(AbilityError::NotInCombat)?;
        if let Some(participant) = state.participant_mut(encounter, character) {
            participant.status = ParticipantStatus::Fled;
        }
        let name = state
            .character(character)
            .map(|r| r.name.clone())
            .unwrap_or_default();
        self.sink.append_private(character, "You flee from battle!");
        self.sink
            .append_group(encounter, &format!("{} flees!", name));
        Ok(())
    }

    /// Explicitly end a finished fight; falls back to fleeing when
    /// creatures still stand.
    pub fn end_combat(
        &self,
        state: &mut CombatState,
        now: SimTime,
        character: CharacterId,
    ) -> Result<(), RuntimeError> {
        let encounter = state
            .encounter_of_character(character)
            .ok_or(AbilityError::NotInCombat)?;
        if state.living_enemies(encounter).is_empty() {
            self.victory(state, now, encounter);
            Ok(())
        } else {
            self.flee(state, character)
        }
    }

    // ========================================================================
    // Tick Handler
    // ========================================================================

    /// Advance one encounter by one tick.
    pub fn tick(&self, state: &mut CombatState, now: SimTime, encounter: EncounterId) -> TickOutcome {
        // 1. Never run against a resolved (or vanished) encounter.
        let active = state
            .encounter(encounter)
            .is_some_and(|e| e.state == EncounterState::Active);
        if !active {
            return TickOutcome::Resolved;
        }

        // 2. A creatureless encounter is an immediate victory path; an
        //    encounter with no enemy rows at all is stale state, cleaned
        //    up without rewards.
        if state.enemies_of(encounter).is_empty() {
            tracing::warn!(%encounter, "encounter without creatures; resolving defensively");
            return self.resolve_abandoned(state, now, encounter);
        }
        if state.living_enemies(encounter).is_empty() {
            self.victory(state, now, encounter);
            return TickOutcome::Resolved;
        }

        // 3. Mark participants whose HP hit zero (DoTs, late casts).
        for participant in state.participants_of(encounter) {
            if participant.status != ParticipantStatus::Active {
                continue;
            }
            let dead = state
                .character(participant.character)
                .is_some_and(|r| !r.is_alive());
            if dead {
                self.mark_dead(state, encounter, participant.character);
            }
        }

        // 4. Resolve matured creature casts, then let idle creatures
        //    begin new ones.
        for cast in state.take_matured_casts(encounter, now) {
            self.executor.execute_creature_cast(state, now, &cast);
        }
        for creature in state.living_enemies(encounter) {
            if state.cast_of(creature).is_some()
                || state.enemy_effects.is_stunned(creature, now)
            {
                continue;
            }
            if let Some(planned) = self.ai.select(state, encounter, creature, now) {
                let cast = EnemyCast {
                    encounter,
                    creature,
                    ability: planned.ability,
                    resolves_at: now.plus_millis(planned.cast_time_ms),
                    target: planned.target,
                };
                if planned.cast_time_ms == 0 {
                    self.executor.execute_creature_cast(state, now, &cast);
                } else {
                    let name = state.enemy(creature).map(|e| e.name.clone()).unwrap_or_default();
                    self.sink.append_group(
                        encounter,
                        &format!("{} begins to gather itself...", name),
                    );
                    state.begin_cast(cast);
                }
            }
        }

        // 5. Player and pet auto-attacks.
        for participant in state.participants_of(encounter) {
            if participant.status != ParticipantStatus::Active {
                continue;
            }
            let character = participant.character;
            let ready = participant.next_auto_attack_at <= now
                && state.character(character).is_some_and(|r| r.is_alive())
                && !state.character_effects.is_stunned(character, now);
            if !ready {
                continue;
            }
            self.participant_auto_attack(state, now, encounter, character);
            if let Some(p) = state.participant_mut(encounter, character) {
                p.next_auto_attack_at = now.plus_millis(self.config.auto_attack_interval_ms);
            }
        }
        for pet in state.pets_of_encounter(encounter) {
            self.pet_turn(state, now, encounter, pet);
        }

        // 6. Victory the moment the last creature drops.
        if state.living_enemies(encounter).is_empty() {
            self.victory(state, now, encounter);
            return TickOutcome::Resolved;
        }

        // 7. Creature auto-attacks against their top-threat targets.
        for creature in state.living_enemies(encounter) {
            let ready = state.enemy(creature).is_some_and(|e| e.next_auto_attack_at <= now)
                && !state.enemy_effects.is_stunned(creature, now)
                && state.cast_of(creature).is_none();
            if !ready {
                continue;
            }
            let target = state
                .threat(encounter)
                .and_then(|t| t.top(creature))
                .or_else(|| state.enemy(creature).and_then(|e| e.target));
            if let Some(enemy) = state.enemy_mut(creature) {
                enemy.target = target;
                enemy.next_auto_attack_at = now.plus_millis(self.config.auto_attack_interval_ms);
            }
            match target {
                Some(ThreatTarget::Character(ch)) => {
                    self.creature_attack_character(state, now, encounter, creature, ch)
                }
                Some(ThreatTarget::Pet(pet)) => {
                    self.creature_attack_pet(state, now, encounter, creature, pet)
                }
                None => {}
            }
        }

        // Defeat check: nobody left standing.
        let any_alive = state.participants_of(encounter).iter().any(|p| {
            p.status == ParticipantStatus::Active
                && state.character(p.character).is_some_and(|r| r.is_alive())
        });
        if !any_alive {
            let any_dead = state
                .participants_of(encounter)
                .iter()
                .any(|p| p.status == ParticipantStatus::Dead);
            return if any_dead {
                self.defeat(state, now, encounter);
                TickOutcome::Resolved
            } else {
                // Everyone fled; nothing to distribute.
                self.resolve_abandoned(state, now, encounter)
            };
        }

        // 8. Still fighting.
        TickOutcome::Continue {
            next_at: now.plus_millis(self.config.encounter_tick_ms),
        }
    }

    // ========================================================================
    // Auto-Attacks
    // ========================================================================

    fn participant_auto_attack(
        &self,
        state: &mut CombatState,
        now: SimTime,
        encounter: EncounterId,
        character: CharacterId,
    ) {
        let Some(&creature) = state.living_enemies(encounter).first() else {
            return;
        };
        let Some(row) = state.character(character).cloned() else {
            return;
        };
        let Some(enemy) = state.enemy(creature).cloned() else {
            return;
        };
        let gear = self.gear.bonuses(character);

        let salt = roll_salt(character.0, creature.0);
        let roll = self
            .rolls
            .roll_permille(compute_seed(now.millis(), salt, CTX_OUTCOME));
        let dexterity = row.stats.dexterity + gear.stats.dexterity;
        let outcome = roll_attack_outcome(
            roll,
            gear.hit_bonus_permille,
            &enemy.defense_profile(),
            crit_chance_permille(dexterity, &self.config),
        );

        if !outcome.landed() {
            self.sink.append_private(
                character,
                &format!("{} avoids your attack.", enemy.name),
            );
            return;
        }

        let buffs = state.character_effects.magnitude_sum(character, EffectKind::DamageUp)
            - state.character_effects.magnitude_sum(character, EffectKind::DamageDown);
        let strength = row.stats.strength + gear.stats.strength;
        let raw = gear.weapon_damage + strength / 2 + buffs;
        let armor =
            enemy.armor_class + state.enemy_effects.magnitude_sum(creature, EffectKind::AcBonus);
        let mut amount = apply_variance(
            mitigate_physical(raw, armor, &self.config),
            compute_seed(now.millis(), salt, CTX_VARIANCE),
        );
        if outcome == AttackOutcome::Critical {
            amount = amount * 150 / 100;
        }

        if let Some(enemy) = state.enemy_mut(creature) {
            enemy.damage(amount);
        }
        let policy = row.class.capabilities().threat;
        let threat = amount * policy.damage_percent(&self.config) / 100;
        state
            .threat_mut(encounter)
            .add(creature, ThreatSource::Character(character), threat);

        self.sink.append_private(
            character,
            &format!("You hit {} for {}.", enemy.name, amount),
        );

        if state.enemy(creature).is_some_and(|e| !e.is_alive()) {
            self.sink
                .append_group(encounter, &format!("{} collapses!", enemy.name));
            self.events.publish(CombatEvent::CreatureSlain {
                encounter,
                creature,
                name: enemy.name,
            });
        }
    }

    fn pet_turn(&self, state: &mut CombatState, now: SimTime, encounter: EncounterId, pet: PetId) {
        let Some(pet_row) = state.pet(pet).cloned() else {
            return;
        };
        if let Some(expiry) = pet_row.expires_at
            && now >= expiry
        {
            state.threat_mut(encounter).remove_pet(pet);
            state.remove_pet(pet);
            self.sink
                .append_private(pet_row.owner, &format!("{} fades away.", pet_row.name));
            return;
        }
        if !pet_row.is_alive() {
            return;
        }

        if pet_row.next_auto_attack_at <= now {
            let target = pet_row
                .target
                .filter(|c| state.enemy(*c).is_some_and(|e| e.is_alive()))
                .or_else(|| state.living_enemies(encounter).first().copied());
            if let Some(creature) = target {
                let Some(enemy) = state.enemy(creature).cloned() else {
                    return;
                };
                let salt = roll_salt(pet.0, creature.0);
                let amount = apply_variance(
                    mitigate_physical(pet_row.attack_damage, enemy.armor_class, &self.config),
                    compute_seed(now.millis(), salt, CTX_VARIANCE),
                );
                if let Some(enemy) = state.enemy_mut(creature) {
                    enemy.damage(amount);
                }
                let share = amount * self.config.pet_class_threat_percent / 100;
                state.threat_mut(encounter).add(
                    creature,
                    ThreatSource::Pet {
                        pet,
                        owner: pet_row.owner,
                    },
                    share,
                );
                if let Some(p) = state.pet_mut(pet) {
                    p.target = Some(creature);
                    p.next_auto_attack_at = now.plus_millis(self.config.auto_attack_interval_ms);
                }
            }
        }

        self.executor.execute_pet_ability(state, now, pet);
    }

    fn creature_attack_character(
        &self,
        state: &mut CombatState,
        now: SimTime,
        encounter: EncounterId,
        creature: CreatureId,
        character: CharacterId,
    ) {
        let Some(enemy) = state.enemy(creature).cloned() else {
            return;
        };
        let Some(row) = state.character(character).cloned() else {
            // Stale participant referencing a missing character: clean up
            // instead of crashing the scheduler.
            tracing::warn!(%character, "participant references missing character");
            state.participants.retain(|p| p.character != character);
            return;
        };
        if !row.is_alive() {
            return;
        }
        let gear = self.gear.bonuses(character);

        let salt = roll_salt(creature.0, character.0);
        let roll = self
            .rolls
            .roll_permille(compute_seed(now.millis(), salt, CTX_OUTCOME));
        let outcome = roll_attack_outcome(roll, 0, &row.defense_profile(), CREATURE_CRIT_PERMILLE);

        match outcome {
            AttackOutcome::Dodge => {
                self.sink
                    .append_private(character, &format!("You dodge {}'s attack.", enemy.name));
                return;
            }
            AttackOutcome::Parry => {
                self.sink
                    .append_private(character, &format!("You parry {}'s attack.", enemy.name));
                return;
            }
            _ => {}
        }

        // Level difference scales the creature's swing.
        let scale = level_difference_percent(enemy.level, row.level);
        let buffs = state.enemy_effects.magnitude_sum(creature, EffectKind::DamageUp)
            - state.enemy_effects.magnitude_sum(creature, EffectKind::DamageDown);
        let raw = (enemy.attack_damage + buffs) * scale / 100;
        let armor =
            gear.armor_class + state.character_effects.magnitude_sum(character, EffectKind::AcBonus);
        let mut amount = apply_variance(
            mitigate_physical(raw, armor, &self.config),
            compute_seed(now.millis(), salt, CTX_VARIANCE),
        );
        match outcome {
            AttackOutcome::Block => {
                amount = (amount / 2).max(1);
                self.sink.append_private(
                    character,
                    &format!("You block part of {}'s blow.", enemy.name),
                );
            }
            AttackOutcome::Critical => {
                amount = amount * 150 / 100;
            }
            _ => {}
        }

        if let Some(row) = state.character_mut(character) {
            row.damage(amount);
        }
        self.sink.append_private(
            character,
            &format!("{} hits you for {}!", enemy.name, amount),
        );

        if state.character(character).is_some_and(|r| !r.is_alive()) {
            self.mark_dead(state, encounter, character);
        }
    }

    fn creature_attack_pet(
        &self,
        state: &mut CombatState,
        now: SimTime,
        encounter: EncounterId,
        creature: CreatureId,
        pet: PetId,
    ) {
        let Some(enemy) = state.enemy(creature).cloned() else {
            return;
        };
        let Some(pet_row) = state.pet(pet).cloned() else {
            return;
        };
        let salt = roll_salt(creature.0, pet.0);
        let amount = apply_variance(
            mitigate_physical(enemy.attack_damage, 0, &self.config),
            compute_seed(now.millis(), salt, CTX_VARIANCE),
        );
        if let Some(p) = state.pet_mut(pet) {
            p.damage(amount);
        }

        if state.pet(pet).is_some_and(|p| !p.is_alive()) {
            state.threat_mut(encounter).remove_pet(pet);
            state.remove_pet(pet);
            if let Some(e) = state.enemy_mut(creature) {
                e.target = None;
            }
            self.sink.append_private(
                pet_row.owner,
                &format!("{} is slain by {}!", pet_row.name, enemy.name),
            );
        }
    }

    fn mark_dead(&self, state: &mut CombatState, encounter: EncounterId, character: CharacterId) {
        if state.mark_participant_dead(encounter, character) {
            let name = state
                .character(character)
                .map(|r| r.name.clone())
                .unwrap_or_default();
            self.sink.append_private(character, "You have been slain!");
            self.sink
                .append_group(encounter, &format!("{} has fallen!", name));
            self.events.publish(CombatEvent::CharacterDied {
                encounter,
                character,
            });
        }
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    fn victory(&self, state: &mut CombatState, now: SimTime, encounter: EncounterId) {
        let participants: Vec<_> = state
            .participants_of(encounter)
            .into_iter()
            .filter(|p| p.status != ParticipantStatus::Fled)
            .collect();
        let enemies: Vec<CombatEnemy> = state
            .enemies_of(encounter)
            .iter()
            .filter_map(|id| state.enemy(*id).cloned())
            .collect();

        let slain_names = enemies
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let fallen: Vec<String> = participants
            .iter()
            .filter(|p| p.status == ParticipantStatus::Dead)
            .filter_map(|p| state.character(p.character).map(|r| r.name.clone()))
            .collect();
        let fallen_suffix = if fallen.is_empty() {
            String::new()
        } else {
            format!(" Fallen: {}.", fallen.join(", "))
        };

        // Experience: split evenly, with a small bonus per living party
        // member, halved for the dead.
        let total_base: u64 = enemies
            .iter()
            .map(|e| {
                if e.base_xp > 0 {
                    e.base_xp
                } else {
                    u64::from(e.level) * self.config.base_xp_per_level
                }
            })
            .sum();
        let live_count = participants
            .iter()
            .filter(|p| p.status == ParticipantStatus::Active)
            .count() as u64;
        let head_count = participants.len().max(1) as u64;
        let party_bonus = live_count.saturating_sub(1) * self.config.party_xp_bonus_percent;
        let per_head = total_base / head_count * (100 + party_bonus) / 100;
        let creature_level = enemies.iter().map(|e| e.level).max().unwrap_or(1);

        let first_active = participants
            .iter()
            .find(|p| p.status == ParticipantStatus::Active)
            .map(|p| p.character);

        for participant in &participants {
            let character = participant.character;
            let share = if participant.status == ParticipantStatus::Dead {
                per_head * self.config.dead_xp_percent / 100
            } else {
                per_head
            };

            let Some(mut row) = state.character(character).cloned() else {
                continue;
            };
            let award = self.rewards.award_experience(&mut row, creature_level, share);
            state.insert_character(row);

            self.sink.append_private(
                character,
                &format!("You gain {} experience.", award.gained),
            );
            if award.leveled_up {
                self.sink
                    .append_private(character, "You have grown stronger!");
            }
            if participant.status == ParticipantStatus::Dead {
                self.rewards.create_corpse(character);
            }
            for enemy in &enemies {
                self.rewards.adjust_faction(character, &enemy.template_key);
            }

            state.push_result(CombatResult {
                encounter,
                character,
                summary: format!(
                    "Victory over {}. Gained {} experience.{}",
                    slain_names, award.gained, fallen_suffix
                ),
                recorded_at: now,
            });
        }

        if let Some(looter) = first_active {
            for enemy in &enemies {
                self.rewards.roll_loot(looter, &enemy.template_key);
            }
        }

        self.release_spawns(&enemies, now);
        self.sink
            .append_group(encounter, &format!("Victory! {} defeated.", slain_names));
        self.finish(state, encounter, EncounterOutcome::Victory);
    }

    fn defeat(&self, state: &mut CombatState, now: SimTime, encounter: EncounterId) {
        let participants: Vec<_> = state
            .participants_of(encounter)
            .into_iter()
            .filter(|p| p.status != ParticipantStatus::Fled)
            .collect();
        let enemies: Vec<CombatEnemy> = state
            .enemies_of(encounter)
            .iter()
            .filter_map(|id| state.enemy(*id).cloned())
            .collect();
        let victor_names = enemies
            .iter()
            .filter(|e| e.is_alive())
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let fallen: Vec<String> = participants
            .iter()
            .filter(|p| p.status == ParticipantStatus::Dead)
            .filter_map(|p| state.character(p.character).map(|r| r.name.clone()))
            .collect();
        let fallen_suffix = if fallen.is_empty() {
            String::new()
        } else {
            format!(" Fallen: {}.", fallen.join(", "))
        };

        for participant in &participants {
            let character = participant.character;
            if participant.status == ParticipantStatus::Dead {
                self.rewards.create_corpse(character);

                let Some(mut row) = state.character(character).cloned() else {
                    continue;
                };
                let lost = self.rewards.apply_death_penalty(&mut row);

                // Respawn state: pools floored at the partial-restore
                // fraction.
                let restore = self.config.defeat_restore_percent;
                row.hp = row.hp.max(row.max_hp * restore / 100).max(1);
                row.mana = row.mana.max(row.max_mana * restore / 100);
                row.stamina = row.stamina.max(row.max_stamina * restore / 100);
                state.insert_character(row);

                if lost > 0 {
                    self.sink.append_private(
                        character,
                        &format!("Death claims {} experience.", lost),
                    );
                }
            }

            state.push_result(CombatResult {
                encounter,
                character,
                summary: format!("Defeat at the hands of {}.{}", victor_names, fallen_suffix),
                recorded_at: now,
            });
        }

        self.release_spawns(&enemies, now);
        self.sink
            .append_group(encounter, "The battle is lost.");
        self.finish(state, encounter, EncounterOutcome::Defeat);
    }

    fn resolve_abandoned(
        &self,
        state: &mut CombatState,
        now: SimTime,
        encounter: EncounterId,
    ) -> TickOutcome {
        let enemies: Vec<CombatEnemy> = state
            .enemies_of(encounter)
            .iter()
            .filter_map(|id| state.enemy(*id).cloned())
            .collect();
        self.release_spawns(&enemies, now);
        self.finish(state, encounter, EncounterOutcome::Abandoned);
        TickOutcome::Resolved
    }

    fn release_spawns(&self, enemies: &[CombatEnemy], now: SimTime) {
        let mut released: Vec<SpawnId> = Vec::new();
        for enemy in enemies {
            if !released.contains(&enemy.spawn) {
                released.push(enemy.spawn);
                self.creatures.release(enemy.spawn, now);
            }
        }
    }

    /// Clear the encounter's combat artifacts and seal its state.
    ///
    /// The encounter row itself is never deleted; it remains as the
    /// historical record. Results also survive.
    fn finish(&self, state: &mut CombatState, encounter: EncounterId, outcome: EncounterOutcome) {
        for creature in state.enemies_of(encounter) {
            state.enemy_effects.clear_owner(creature);
            state.enemies.remove(&creature);
        }
        state.participants.retain(|p| p.encounter != encounter);
        state.threat.remove(&encounter);
        state.casts.retain(|c| c.encounter != encounter);
        state.enemy_cooldowns.retain(|c| c.encounter != encounter);
        for pet in state.pets_of_encounter(encounter) {
            if let Some(p) = state.pet_mut(pet) {
                p.encounter = None;
                p.target = None;
            }
        }

        if let Some(row) = state.encounter_mut(encounter) {
            row.state = EncounterState::Resolved;
        }
        self.events.publish(CombatEvent::EncounterResolved { encounter, outcome });
        tracing::info!(%encounter, ?outcome, "encounter resolved");
    }

    // ========================================================================
    // Cadences
    // ========================================================================

    /// Fast cadence: one tick of every regen/DoT effect.
    pub fn fast_tick(&self, state: &mut CombatState, now: SimTime) {
        self.executor.apply_periodic_effects(state, now);
    }

    /// Slow cadence: decay buffs/debuffs, reverting temporary max-HP
    /// grants before deletion.
    pub fn slow_tick(&self, state: &mut CombatState, now: SimTime) {
        let removed = state.character_effects.decay_round(now);
        for record in removed {
            if record.kind == EffectKind::MaxHpBonus
                && let Some(row) = state.character_mut(record.owner)
            {
                row.max_hp = (row.max_hp - record.magnitude).max(1);
                row.hp = row.hp.clamp(0, row.max_hp);
            }
            self.sink.append_private(
                record.owner,
                &format!("The effect of {} wears off.", record.source),
            );
        }

        let removed = state.enemy_effects.decay_round(now);
        for record in removed {
            if record.kind == EffectKind::MaxHpBonus
                && let Some(enemy) = state.enemy_mut(record.owner)
            {
                enemy.max_hp = (enemy.max_hp - record.magnitude).max(1);
                enemy.hp = enemy.hp.clamp(0, enemy.max_hp);
            }
        }

        // Out-of-combat recovery rides the same cadence.
        let resting: Vec<CharacterId> = state
            .characters
            .values()
            .filter(|r| r.is_alive())
            .map(|r| r.id)
            .filter(|id| !state.in_combat(*id))
            .collect();
        for character in resting {
            // A rest stance doubles recovery while it lasts.
            let mut percent = self.config.out_of_combat_regen_percent;
            if state.character_effects.has(character, EffectKind::Stance) {
                percent *= 2;
            }
            if let Some(row) = state.character_mut(character) {
                row.hp = (row.hp + row.max_hp * percent / 100).min(row.max_hp);
                row.mana = (row.mana + row.max_mana * percent / 100).min(row.max_mana);
                row.stamina = (row.stamina + row.max_stamina * percent / 100).min(row.max_stamina);
            }
        }
    }
}
