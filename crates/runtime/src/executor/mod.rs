//! Ability execution engine.
//!
//! One generic, data-driven path interprets [`AbilitySpec`] records for
//! the common case; irregular mechanics (pet summons, resurrection,
//! pet-threat redirect) route to the bespoke handlers in [`special`].
//!
//! Preconditions are checked up front and raise [`AbilityError`] before
//! any state is touched. Resource consumption is deferred until the
//! dispatch body returns `Ok`, so a failed cast never costs mana or
//! stamina, and a free-cast effect is only spent on success.

mod special;

use std::sync::Arc;

use combat_core::ability::{AbilityKey, AbilitySpec, CreatureAbilityEffect, DebuffSpec};
use combat_core::config::EngineConfig;
use combat_core::effect::{EffectDuration, EffectKind, EffectRecord, PeriodicTick};
use combat_core::env::{AbilityOracle, EventSink, GearOracle};
use combat_core::error::AbilityError;
use combat_core::mitigation::{apply_variance, crit_chance_permille, mitigate_magic, mitigate_physical};
use combat_core::rng::{RollOracle, compute_seed};
use combat_core::threat::diffuse_heal_threat;
use combat_core::types::{
    CharacterId, CreatureId, EncounterId, PetId, SimTime, TargetRef, ThreatSource,
};
use combat_core::{CasterProfile, DamageBreakdown, DamageKind, SpecialMechanic, compose_ability_damage};

use crate::store::{CastTarget, CombatState, EnemyCast};

/// Seed contexts distinguishing rolls inside one action.
pub(crate) const CTX_VARIANCE: u32 = 1;
pub(crate) const CTX_CRIT: u32 = 2;

/// The ability execution engine.
///
/// Stateless service: every method operates on the [`CombatState`] of the
/// enclosing transaction.
pub struct AbilityExecutor {
    catalog: Arc<dyn AbilityOracle>,
    gear: Arc<dyn GearOracle>,
    sink: Arc<dyn EventSink>,
    rolls: Arc<dyn RollOracle>,
    config: EngineConfig,
}

impl AbilityExecutor {
    pub fn new(
        catalog: Arc<dyn AbilityOracle>,
        gear: Arc<dyn GearOracle>,
        sink: Arc<dyn EventSink>,
        rolls: Arc<dyn RollOracle>,
        config: EngineConfig,
    ) -> Self {
        Self {
            catalog,
            gear,
            sink,
            rolls,
            config,
        }
    }

    pub(crate) fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    pub(crate) fn catalog(&self) -> &dyn AbilityOracle {
        self.catalog.as_ref()
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================================================
    // Character Abilities
    // ========================================================================

    /// Execute a character ability.
    ///
    /// Precondition order is a contract: catalog/class match, level gate,
    /// cooldown, resource, then target resolution inside the dispatch
    /// body. Each failure is a distinct, user-visible error and leaves
    /// state untouched.
    pub fn execute_character(
        &self,
        state: &mut CombatState,
        now: SimTime,
        caster: CharacterId,
        key: &AbilityKey,
        target: Option<TargetRef>,
    ) -> Result<(), AbilityError> {
        let spec = self
            .catalog
            .ability(key)
            .ok_or_else(|| AbilityError::UnknownAbility(key.clone()))?;

        let row = state.character(caster).ok_or(AbilityError::ActorMissing)?;
        if row.class != spec.class {
            return Err(AbilityError::WrongClass);
        }
        if row.level < spec.required_level {
            return Err(AbilityError::LevelTooLow {
                required: spec.required_level,
            });
        }
        if !row.is_alive() {
            return Err(AbilityError::ActorDead);
        }
        if state.character_effects.is_stunned(caster, now) {
            return Err(AbilityError::ActorStunned);
        }
        if !state.character_cooldown_ready(caster, key, now) {
            return Err(AbilityError::OnCooldown);
        }

        let free_cast = state.character_effects.has(caster, EffectKind::ResourceFree);
        if !free_cast && row.resource(spec.resource) < spec.cost {
            return Err(AbilityError::InsufficientResource(spec.resource));
        }

        match &spec.special {
            Some(SpecialMechanic::SummonPet(pet_key)) => {
                special::summon_pet(self, state, now, caster, &spec, pet_key)?
            }
            Some(SpecialMechanic::Resurrect { restore_percent }) => {
                special::resurrect(self, state, caster, &spec, *restore_percent, target)?
            }
            Some(SpecialMechanic::RedirectPetThreat) => {
                special::redirect_pet_threat(self, state, caster, &spec)?
            }
            None => {
                if spec.damage_kind == DamageKind::Healing {
                    self.cast_heal(state, now, caster, &spec, target)?;
                } else if spec.power > 0 || spec.debuff.is_some() {
                    self.cast_damage(state, now, caster, &spec, target)?;
                } else {
                    // Pure self-buff: nothing to hit, nothing to heal.
                    self.require_buff(&spec)?;
                }
            }
        }

        // Deferred consumption: only a successful cast pays.
        if free_cast {
            state
                .character_effects
                .remove_kind(caster, EffectKind::ResourceFree);
        } else if let Some(row) = state.character_mut(caster) {
            row.spend_resource(spec.resource, spec.cost);
        }

        if let Some(buff) = &spec.buff {
            self.apply_character_buff(state, now, caster, &spec.key, buff);
        }
        if spec.cooldown_ms > 0 {
            state.set_character_cooldown(caster, key.clone(), now.plus_millis(spec.cooldown_ms));
        }

        tracing::debug!(caster = %caster, ability = %key, "ability executed");
        Ok(())
    }

    fn require_buff(&self, spec: &AbilitySpec) -> Result<(), AbilityError> {
        if spec.buff.is_none() {
            return Err(AbilityError::InvalidTarget);
        }
        Ok(())
    }

    fn apply_character_buff(
        &self,
        state: &mut CombatState,
        now: SimTime,
        caster: CharacterId,
        source: &AbilityKey,
        buff: &DebuffSpec,
    ) {
        if buff.kind == EffectKind::MaxHpBonus
            && let Some(row) = state.character_mut(caster)
        {
            row.max_hp += buff.magnitude;
            row.hp = (row.hp + buff.magnitude).min(row.max_hp);
        }
        state.character_effects.apply(EffectRecord {
            owner: caster,
            kind: buff.kind,
            magnitude: buff.magnitude,
            duration: duration_for(buff, now),
            source: source.clone(),
            attributed_to: None,
        });
    }

    // ========================================================================
    // Damage Path
    // ========================================================================

    fn cast_damage(
        &self,
        state: &mut CombatState,
        now: SimTime,
        caster: CharacterId,
        spec: &AbilitySpec,
        target: Option<TargetRef>,
    ) -> Result<(), AbilityError> {
        let encounter = state
            .encounter_of_character(caster)
            .ok_or(AbilityError::NotInCombat)?;
        let breakdown = self.compose_for(state, caster, spec);

        if spec.aoe {
            // AoE skips the single-target path entirely: every living
            // creature is struck independently, each with its own
            // mitigation, variance, threat, and DoT application.
            let living = state.living_enemies(encounter);
            if living.is_empty() {
                return Err(AbilityError::NoLivingEnemy);
            }
            for creature in living {
                self.strike_creature(
                    state,
                    now,
                    encounter,
                    caster,
                    spec,
                    &breakdown,
                    creature,
                    self.config.aoe_damage_percent,
                )?;
            }
            return Ok(());
        }

        let creature = match target {
            Some(TargetRef::Creature(c)) => {
                let valid = state
                    .enemy(c)
                    .is_some_and(|e| e.encounter == encounter && e.is_alive());
                if !valid {
                    return Err(AbilityError::InvalidTarget);
                }
                c
            }
            Some(TargetRef::Character(_)) => return Err(AbilityError::InvalidTarget),
            None => *state
                .living_enemies(encounter)
                .first()
                .ok_or(AbilityError::NoLivingEnemy)?,
        };

        self.strike_creature(state, now, encounter, caster, spec, &breakdown, creature, 100)
    }

    /// Resolve every hit of one ability against one creature, then apply
    /// the aggregate threat update, the DoT component, and the debuff.
    #[allow(clippy::too_many_arguments)]
    fn strike_creature(
        &self,
        state: &mut CombatState,
        now: SimTime,
        encounter: EncounterId,
        caster: CharacterId,
        spec: &AbilitySpec,
        breakdown: &DamageBreakdown,
        creature: CreatureId,
        damage_percent: i64,
    ) -> Result<(), AbilityError> {
        let caster_row = state.character(caster).ok_or(AbilityError::ActorMissing)?;
        let caster_name = caster_row.name.clone();
        let dexterity = caster_row.stats.dexterity
            + self.gear.bonuses(caster).stats.dexterity;
        let policy = caster_row.class.capabilities().threat;

        let mut total = 0i64;
        for hit in 0..spec.hits.max(1) {
            let enemy = state.enemy(creature).ok_or(AbilityError::InvalidTarget)?;
            let enemy_name = enemy.name.clone();
            let raw = breakdown.direct * damage_percent / 100;

            let defense_bonus = state.enemy_effects.magnitude_sum(creature, EffectKind::AcBonus);
            let mitigated = match spec.damage_kind {
                DamageKind::Physical => {
                    mitigate_physical(raw, enemy.armor_class + defense_bonus, &self.config)
                }
                DamageKind::Magic => mitigate_magic(raw, enemy.magic_resist, &self.config),
                DamageKind::Healing => raw,
            };

            // Each hit rolls variance and crit independently.
            let salt = roll_salt(caster.0, creature.0);
            let mut amount = apply_variance(
                mitigated,
                compute_seed(now.millis(), salt, CTX_VARIANCE + hit * 4),
            );
            let crit_seed = compute_seed(now.millis(), salt, CTX_CRIT + hit * 4);
            if self
                .rolls
                .roll_permille(crit_seed)
                < crit_chance_permille(dexterity, &self.config)
            {
                amount = amount * spec.crit_multiplier_percent / 100;
                self.sink.append_private(
                    caster,
                    &format!("Critical! Your {} tears into {}.", spec.name, enemy_name),
                );
            }

            if let Some(enemy) = state.enemy_mut(creature) {
                enemy.damage(amount);
            }
            total += amount;

            self.sink.append_private(
                caster,
                &format!("Your {} hits {} for {}.", spec.name, enemy_name, amount),
            );
        }

        // All hits contribute to one aggregate threat update.
        let threat = total * policy.damage_percent(&self.config) / 100;
        state
            .threat_mut(encounter)
            .add(creature, ThreatSource::Character(caster), threat);

        // DoT: full magnitude per target, even under the AoE penalty.
        if let Some(periodic) = &breakdown.periodic
            && periodic.kind == EffectKind::Dot
        {
            self.apply_enemy_dot(state, caster, spec, creature, periodic.per_tick, periodic.ticks);
        }

        if let Some(debuff) = &spec.debuff {
            state.enemy_effects.apply(EffectRecord {
                owner: creature,
                kind: debuff.kind,
                magnitude: debuff.magnitude,
                duration: duration_for(debuff, now),
                source: spec.key.clone(),
                attributed_to: None,
            });
        }

        if state.enemy(creature).is_some_and(|e| !e.is_alive()) {
            let name = state.enemy(creature).map(|e| e.name.clone()).unwrap_or_default();
            self.sink
                .append_group(encounter, &format!("{} falls to {}!", name, caster_name));
        }

        Ok(())
    }

    /// Create (or refresh) a DoT row and apply its first tick
    /// immediately, so the caster feels instant impact. The fast cadence
    /// applies the remaining ticks.
    fn apply_enemy_dot(
        &self,
        state: &mut CombatState,
        caster: CharacterId,
        spec: &AbilitySpec,
        creature: CreatureId,
        per_tick: i64,
        ticks: u32,
    ) {
        if let Some(enemy) = state.enemy_mut(creature) {
            enemy.damage(per_tick);
        }
        if spec.life_drain && let Some(row) = state.character_mut(caster) {
            row.heal(per_tick);
        }
        state.enemy_effects.apply(EffectRecord {
            owner: creature,
            kind: EffectKind::Dot,
            magnitude: per_tick,
            duration: EffectDuration::Rounds(ticks),
            source: spec.key.clone(),
            attributed_to: spec.life_drain.then_some(caster),
        });
    }

    // ========================================================================
    // Healing Path
    // ========================================================================

    fn cast_heal(
        &self,
        state: &mut CombatState,
        now: SimTime,
        caster: CharacterId,
        spec: &AbilitySpec,
        target: Option<TargetRef>,
    ) -> Result<(), AbilityError> {
        let caster_row = state.character(caster).ok_or(AbilityError::ActorMissing)?;
        let caster_group = caster_row.group;
        let caster_location = caster_row.location;

        // Self if ungrouped, else any same-location group member.
        let recipient = match target {
            None => caster,
            Some(TargetRef::Character(t)) if t == caster => caster,
            Some(TargetRef::Character(t)) => {
                let valid = caster_group.is_some()
                    && state.character(t).is_some_and(|r| {
                        r.group == caster_group && r.location == caster_location && r.is_alive()
                    });
                if !valid {
                    return Err(AbilityError::InvalidTarget);
                }
                t
            }
            Some(TargetRef::Creature(_)) => return Err(AbilityError::InvalidTarget),
        };

        let breakdown = self.compose_for(state, caster, spec);
        let salt = roll_salt(caster.0, recipient.0);
        let healed = apply_variance(
            breakdown.direct,
            compute_seed(now.millis(), salt, CTX_VARIANCE),
        );

        let mut restored = 0;
        if let Some(row) = state.character_mut(recipient) {
            restored = row.heal(healed);
        }

        // HoT: immediate first tick, then the cadence.
        if let Some(periodic) = &breakdown.periodic
            && periodic.kind == EffectKind::Regen
        {
            if let Some(row) = state.character_mut(recipient) {
                restored += row.heal(periodic.per_tick);
            }
            state.character_effects.apply(EffectRecord {
                owner: recipient,
                kind: EffectKind::Regen,
                magnitude: periodic.per_tick,
                duration: EffectDuration::Rounds(periodic.ticks),
                source: spec.key.clone(),
                attributed_to: None,
            });
        }

        // Healing threat is diffuse: a fixed share of healing done, split
        // evenly across all living creatures in the caster's encounter.
        if let Some(encounter) = state.encounter_of_character(caster) {
            let living = state.living_enemies(encounter);
            let share = diffuse_heal_threat(restored, self.config.heal_threat_percent, living.len());
            if share > 0 {
                for creature in living {
                    state
                        .threat_mut(encounter)
                        .add(creature, ThreatSource::Character(caster), share);
                }
            }
        }

        if recipient == caster {
            self.sink
                .append_private(caster, &format!("Your {} restores {} health.", spec.name, restored));
        } else {
            let name = state
                .character(recipient)
                .map(|r| r.name.clone())
                .unwrap_or_default();
            self.sink.append_private(
                caster,
                &format!("Your {} restores {} health to {}.", spec.name, restored, name),
            );
            self.sink.append_private(
                recipient,
                &format!("{} washes over you, restoring {} health.", spec.name, restored),
            );
        }

        Ok(())
    }

    // ========================================================================
    // Pet Abilities
    // ========================================================================

    /// Fire the pet's granted special ability if its cooldown elapsed.
    ///
    /// Called opportunistically from the tick handler; every bail-out is
    /// silent because a pet with nothing to do is not an error.
    pub fn execute_pet_ability(&self, state: &mut CombatState, now: SimTime, pet: PetId) {
        let Some(pet_row) = state.pet(pet).cloned() else {
            return;
        };
        let Some(key) = pet_row.ability.clone() else {
            return;
        };
        if now < pet_row.ability_ready_at || !pet_row.is_alive() {
            return;
        }
        let Some(spec) = self.catalog.creature_ability(&key) else {
            tracing::warn!(ability = %key, "pet ability missing from catalog");
            return;
        };
        let Some(encounter) = pet_row.encounter else {
            return;
        };
        let target = pet_row
            .target
            .filter(|c| state.enemy(*c).is_some_and(|e| e.is_alive()))
            .or_else(|| state.living_enemies(encounter).first().copied());
        let Some(creature) = target else {
            return;
        };

        let Some(enemy) = state.enemy(creature) else {
            return;
        };
        let raw = spec.power + pet_row.attack_damage / 2;
        let mitigated = match spec.damage_kind {
            DamageKind::Magic => mitigate_magic(raw, enemy.magic_resist, &self.config),
            _ => mitigate_physical(raw, enemy.armor_class, &self.config),
        };
        let salt = roll_salt(pet.0, creature.0);
        let amount = apply_variance(mitigated, compute_seed(now.millis(), salt, CTX_VARIANCE));
        let enemy_name = enemy.name.clone();

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
        if let Some(row) = state.pet_mut(pet) {
            row.ability_ready_at = now.plus_millis(spec.cooldown_ms);
            row.target = Some(creature);
        }

        self.sink.append_private(
            pet_row.owner,
            &format!("{} uses {} on {} for {}.", pet_row.name, spec.name, enemy_name, amount),
        );
    }

    // ========================================================================
    // Creature Casts
    // ========================================================================

    /// Resolve a matured creature cast.
    ///
    /// Defensive by design: a target that died or vanished while the cast
    /// was in flight skips the effect. Cooldown registration happens here,
    /// in the same transaction as the execution.
    pub fn execute_creature_cast(&self, state: &mut CombatState, now: SimTime, cast: &EnemyCast) {
        let Some(spec) = self.catalog.creature_ability(&cast.ability) else {
            tracing::warn!(ability = %cast.ability, "creature ability missing from catalog");
            return;
        };

        // Execution and cooldown registration are atomic within the tick.
        state.set_enemy_cooldown(
            cast.encounter,
            cast.ability.clone(),
            now.plus_millis(spec.cooldown_ms),
        );

        let Some(enemy) = state.enemy(cast.creature).cloned() else {
            return;
        };
        if !enemy.is_alive() {
            return;
        }

        match spec.effect {
            CreatureAbilityEffect::Direct => {
                let CastTarget::Character(target) = cast.target else {
                    return;
                };
                if !state.character(target).is_some_and(|r| r.is_alive()) {
                    return;
                }
                let gear = self.gear.bonuses(target);
                let armor = gear.armor_class
                    + state.character_effects.magnitude_sum(target, EffectKind::AcBonus);
                let raw = spec.power + enemy.attack_damage / 2;
                let mitigated = match spec.damage_kind {
                    DamageKind::Magic => mitigate_magic(raw, gear.magic_resist, &self.config),
                    _ => mitigate_physical(raw, armor, &self.config),
                };
                let salt = roll_salt(cast.creature.0, target.0);
                let amount =
                    apply_variance(mitigated, compute_seed(now.millis(), salt, CTX_VARIANCE));

                if let Some(row) = state.character_mut(target) {
                    row.damage(amount);
                }
                self.sink.append_private(
                    target,
                    &format!("{}'s {} hits you for {}!", enemy.name, spec.name, amount),
                );
                if !state.character(target).is_some_and(|r| r.is_alive()) {
                    self.report_participant_death(state, cast.encounter, target);
                }
            }
            CreatureAbilityEffect::Dot { rounds } => {
                let CastTarget::Character(target) = cast.target else {
                    return;
                };
                if !state.character(target).is_some_and(|r| r.is_alive()) {
                    return;
                }
                let per_tick = (spec.power / i64::from(rounds.max(1))).max(1);
                if let Some(row) = state.character_mut(target) {
                    row.damage(per_tick);
                }
                state.character_effects.apply(EffectRecord {
                    owner: target,
                    kind: EffectKind::Dot,
                    magnitude: per_tick,
                    duration: EffectDuration::Rounds(rounds),
                    source: cast.ability.clone(),
                    attributed_to: None,
                });
                self.sink.append_private(
                    target,
                    &format!("{}'s {} sinks in; you are bleeding.", enemy.name, spec.name),
                );
                if !state.character(target).is_some_and(|r| r.is_alive()) {
                    self.report_participant_death(state, cast.encounter, target);
                }
            }
            CreatureAbilityEffect::Stun { duration_ms } => {
                let CastTarget::Character(target) = cast.target else {
                    return;
                };
                state.character_effects.apply(EffectRecord {
                    owner: target,
                    kind: EffectKind::Stun,
                    magnitude: 0,
                    duration: EffectDuration::Until(now.plus_millis(duration_ms)),
                    source: cast.ability.clone(),
                    attributed_to: None,
                });
                self.sink.append_private(
                    target,
                    &format!("{}'s {} leaves you stunned!", enemy.name, spec.name),
                );
            }
            CreatureAbilityEffect::Heal => {
                let amount = apply_variance(
                    spec.power,
                    compute_seed(now.millis(), cast.creature.0, CTX_VARIANCE),
                );
                if let Some(enemy) = state.enemy_mut(cast.creature) {
                    enemy.heal(amount);
                }
                self.sink.append_group(
                    cast.encounter,
                    &format!("{} knits its wounds with {}.", enemy.name, spec.name),
                );
            }
        }
    }

    /// Mark a participant killed mid-cast-resolution as dead right away,
    /// so the rest of the tick sees a consistent view.
    fn report_participant_death(
        &self,
        state: &mut CombatState,
        encounter: EncounterId,
        character: CharacterId,
    ) {
        if state.mark_participant_dead(encounter, character) {
            let name = state
                .character(character)
                .map(|r| r.name.clone())
                .unwrap_or_default();
            self.sink
                .append_group(encounter, &format!("{} has fallen!", name));
        }
    }

    // ========================================================================
    // Periodic Effects
    // ========================================================================

    /// Apply one fast-cadence round of periodic effects on both ledgers.
    pub fn apply_periodic_effects(&self, state: &mut CombatState, _now: SimTime) {
        // Character-side regen and DoTs
        let ticks: Vec<PeriodicTick<CharacterId>> = state.character_effects.tick_periodic();
        for tick in ticks {
            match tick.kind {
                EffectKind::Regen => {
                    if let Some(row) = state.character_mut(tick.owner) {
                        row.heal(tick.amount);
                    }
                }
                EffectKind::Dot => {
                    if let Some(row) = state.character_mut(tick.owner) {
                        row.damage(tick.amount);
                    }
                    if let Some(beneficiary) = tick.attributed_to
                        && let Some(row) = state.character_mut(beneficiary)
                    {
                        row.heal(tick.amount);
                    }
                }
                _ => {}
            }
            if tick.expired {
                self.sink
                    .append_private(tick.owner, &format!("The effect of {} fades.", tick.source));
            }
        }

        // Creature-side DoTs (and the rare creature regen)
        let ticks: Vec<PeriodicTick<CreatureId>> = state.enemy_effects.tick_periodic();
        for tick in ticks {
            match tick.kind {
                EffectKind::Regen => {
                    if let Some(enemy) = state.enemy_mut(tick.owner) {
                        enemy.heal(tick.amount);
                    }
                }
                EffectKind::Dot => {
                    if let Some(enemy) = state.enemy_mut(tick.owner) {
                        enemy.damage(tick.amount);
                    }
                    if let Some(beneficiary) = tick.attributed_to
                        && let Some(row) = state.character_mut(beneficiary)
                    {
                        row.heal(tick.amount);
                    }
                }
                _ => {}
            }
        }
    }

    // ========================================================================
    // Composition
    // ========================================================================

    fn compose_for(
        &self,
        state: &CombatState,
        caster: CharacterId,
        spec: &AbilitySpec,
    ) -> DamageBreakdown {
        let Some(row) = state.character(caster) else {
            return DamageBreakdown {
                direct: 0,
                periodic: None,
            };
        };
        let gear = self.gear.bonuses(caster);
        let caps = row.class.capabilities();
        let profile = CasterProfile {
            primary_stat: row.stats.plus(gear.stats).get(caps.primary_stat),
            weapon_damage: gear.weapon_damage,
            flat_bonus: 0,
            racial_bonus: row.race.damage_bonus(),
            damage_buff: state.character_effects.magnitude_sum(caster, EffectKind::DamageUp)
                - state.character_effects.magnitude_sum(caster, EffectKind::DamageDown),
        };
        compose_ability_damage(spec, &profile, &self.config)
    }
}

/// Mix two entity ids into one roll salt.
pub(crate) fn roll_salt(a: u64, b: u64) -> u64 {
    a.wrapping_mul(0x9e3779b97f4a7c15) ^ b
}

/// Round-counted debuffs stay round-counted; stun debuffs become a time
/// window so re-application extends rather than stacks.
fn duration_for(debuff: &DebuffSpec, now: SimTime) -> EffectDuration {
    if debuff.kind == EffectKind::Stun {
        EffectDuration::Until(now.plus_millis(u64::from(debuff.rounds) * 1000))
    } else {
        EffectDuration::Rounds(debuff.rounds)
    }
}
