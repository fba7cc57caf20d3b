//! Enemy AI ability selection.
//!
//! On each tick, every creature without an ability mid-cast scores its
//! off-cooldown abilities and may begin one cast. Scoring is fully
//! deterministic: the jitter comes from hashing the ability key with the
//! encounter and creature ids, and the final gate roll is seeded from
//! tick time plus ids.

use std::sync::Arc;

use combat_core::ability::{AbilityKey, CreatureAbilityEffect, CreatureAbilitySpec, TargetRule};
use combat_core::effect::EffectKind;
use combat_core::env::AbilityOracle;
use combat_core::rng::{RollOracle, compute_seed, hash_key};
use combat_core::types::{CharacterId, CreatureId, EncounterId, SimTime, ThreatTarget};

use crate::store::{CastTarget, CombatState};

/// Seed context for the cast-gate roll.
const CTX_AI_GATE: u32 = 3;

/// A cast the selector decided to begin this tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedCast {
    pub ability: AbilityKey,
    pub target: CastTarget,
    pub cast_time_ms: u64,
}

/// Weighted, deterministic creature ability selector.
pub struct EnemyAiSelector {
    catalog: Arc<dyn AbilityOracle>,
    rolls: Arc<dyn RollOracle>,
}

impl EnemyAiSelector {
    pub fn new(catalog: Arc<dyn AbilityOracle>, rolls: Arc<dyn RollOracle>) -> Self {
        Self { catalog, rolls }
    }

    /// Pick the ability a creature starts casting this tick, if any.
    ///
    /// Candidates on cooldown are skipped, as are DoT abilities whose
    /// effect is already running on the resolved target (no
    /// refresh-stacking for creature DoTs). The highest-scoring candidate
    /// then passes a per-ability percentage gate before the cast begins.
    pub fn select(
        &self,
        state: &CombatState,
        encounter: EncounterId,
        creature: CreatureId,
        now: SimTime,
    ) -> Option<PlannedCast> {
        let enemy = state.enemy(creature)?;
        if !enemy.is_alive() {
            return None;
        }

        let mut best: Option<(i64, CreatureAbilitySpec, CastTarget)> = None;

        for key in &enemy.abilities {
            if !state.enemy_cooldown_ready(encounter, key, now) {
                continue;
            }
            let Some(spec) = self.catalog.creature_ability(key) else {
                tracing::warn!(ability = %key, "creature ability missing from catalog");
                continue;
            };

            let Some(target) = self.resolve_target(state, encounter, creature, &spec, now) else {
                continue;
            };

            // No refresh-stacking: skip a DoT already running on this
            // exact target.
            if let CreatureAbilityEffect::Dot { .. } = spec.effect
                && let CastTarget::Character(ch) = target
                && state.character_effects.has_from(ch, EffectKind::Dot, key)
            {
                continue;
            }

            let mut score = spec.base_weight;
            if matches!(spec.effect, CreatureAbilityEffect::Dot { .. }) {
                score += 30;
            }
            score += match spec.target_rule {
                TargetRule::LowestHp => 20,
                TargetRule::Aggro => 10,
                _ => 0,
            };
            if spec.randomness > 0 {
                let jitter = hash_key(key.as_str())
                    ^ encounter.0.wrapping_mul(0x9e3779b97f4a7c15)
                    ^ creature.0.wrapping_mul(0x517cc1b727220a95);
                score += (jitter % spec.randomness) as i64;
            }

            // Strict comparison keeps the first-listed ability on ties.
            if best.as_ref().is_none_or(|(s, _, _)| score > *s) {
                best = Some((score, spec, target));
            }
        }

        let (_, spec, target) = best?;

        // Final deterministic gate: the chosen cast only begins with the
        // ability's base chance.
        let gate_seed = compute_seed(now.millis(), creature.0, CTX_AI_GATE);
        if !self.rolls.chance(gate_seed, spec.base_chance_percent) {
            return None;
        }

        Some(PlannedCast {
            ability: spec.key.clone(),
            target,
            cast_time_ms: spec.cast_time_ms,
        })
    }

    fn resolve_target(
        &self,
        state: &CombatState,
        encounter: EncounterId,
        creature: CreatureId,
        spec: &CreatureAbilitySpec,
        now: SimTime,
    ) -> Option<CastTarget> {
        let living: Vec<CharacterId> = state
            .active_participants(encounter)
            .into_iter()
            .filter(|ch| state.character(*ch).is_some_and(|r| r.is_alive()))
            .collect();

        match spec.target_rule {
            TargetRule::SelfCast => Some(CastTarget::SelfCast(creature)),
            TargetRule::Aggro => {
                let top = state.threat(encounter).and_then(|t| t.top(creature));
                let target = match top {
                    Some(ThreatTarget::Character(ch)) => Some(ch),
                    // Creature abilities land on characters; a pet tank
                    // redirects onto its owner.
                    Some(ThreatTarget::Pet(pet)) => state.pet(pet).map(|p| p.owner),
                    None => living.first().copied(),
                };
                target
                    .filter(|ch| state.character(*ch).is_some_and(|r| r.is_alive()))
                    .map(CastTarget::Character)
            }
            TargetRule::LowestHp => living
                .iter()
                .copied()
                .min_by_key(|ch| state.character(*ch).map(|r| r.hp).unwrap_or(i64::MAX))
                .map(CastTarget::Character),
            TargetRule::Random => {
                if living.is_empty() {
                    return None;
                }
                let seed = compute_seed(now.millis(), creature.0 ^ hash_key(spec.key.as_str()), 0);
                let index = self.rolls.pick(seed, living.len());
                Some(CastTarget::Character(living[index]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticContent;
    use crate::store::{CharacterRow, CombatEnemy};
    use combat_core::effect::{EffectDuration, EffectRecord};
    use combat_core::rng::PcgRoll;
    use combat_core::stats::{CharacterClass, CreatureRole, Race, StatBlock};
    use combat_core::types::{LocationId, SpawnId, ThreatSource};

    fn fixture() -> (EnemyAiSelector, CombatState, EncounterId, CreatureId, CharacterId) {
        let content = Arc::new(StaticContent::standard());
        let selector = EnemyAiSelector::new(content, Arc::new(PcgRoll));

        let mut state = CombatState::new();
        let character = CharacterId(1);
        state.insert_character(CharacterRow::new(
            character,
            "Ana",
            CharacterClass::Warrior,
            Race::Human,
            5,
            StatBlock::default(),
            LocationId(1),
        ));
        let encounter = state.create_encounter(LocationId(1), None, SimTime::ZERO);
        state.add_participant(encounter, character, SimTime::ZERO);
        let creature = state.spawn_enemy(CombatEnemy {
            id: CreatureId(0),
            encounter,
            spawn: SpawnId(1),
            template_key: "gray_wolf".to_owned(),
            name: "Gray Wolf".to_owned(),
            level: 3,
            role: CreatureRole::Damage,
            hp: 60,
            max_hp: 60,
            attack_damage: 8,
            armor_class: 10,
            magic_resist: 0,
            abilities: [AbilityKey::new("rending_bite")].into_iter().collect(),
            target: None,
            next_auto_attack_at: SimTime::ZERO,
            base_xp: 0,
        });
        state
            .threat_mut(encounter)
            .add(creature, ThreatSource::Character(character), 10);

        (selector, state, encounter, creature, character)
    }

    #[test]
    fn selection_is_deterministic_for_a_given_tick() {
        let (selector, state, encounter, creature, _) = fixture();

        // The gate is an 80% roll; scan a few ticks for one that passes.
        let mut chosen = None;
        for round in 0..20u64 {
            let now = SimTime::from_secs(round * 3);
            if let Some(plan) = selector.select(&state, encounter, creature, now) {
                chosen = Some((now, plan));
                break;
            }
        }
        let (now, plan) = chosen.expect("gate should pass within twenty ticks");
        assert_eq!(plan.ability, AbilityKey::new("rending_bite"));

        // Same state, same tick, same plan.
        assert_eq!(selector.select(&state, encounter, creature, now), Some(plan));
    }

    #[test]
    fn active_dot_suppresses_recast_on_the_same_target() {
        let (selector, mut state, encounter, creature, character) = fixture();
        state.character_effects.apply(EffectRecord {
            owner: character,
            kind: EffectKind::Dot,
            magnitude: 2,
            duration: EffectDuration::Rounds(3),
            source: AbilityKey::new("rending_bite"),
            attributed_to: None,
        });

        // The wolf's only ability is its DoT; with the effect already on
        // the aggro target there is nothing left to cast.
        for round in 0..20u64 {
            let now = SimTime::from_secs(round * 3);
            assert_eq!(selector.select(&state, encounter, creature, now), None);
        }
    }

    #[test]
    fn dead_creatures_never_cast() {
        let (selector, mut state, encounter, creature, _) = fixture();
        if let Some(enemy) = state.enemy_mut(creature) {
            enemy.hp = 0;
        }
        assert_eq!(selector.select(&state, encounter, creature, SimTime::ZERO), None);
    }
}
