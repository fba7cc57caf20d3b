//! Catalog record types.
//!
//! These are content data consumed by the engine: the ability catalog
//! oracle hands them out, the executor interprets them. Tuning constants
//! live in the content, not in engine code.

use super::{AbilityKey, DamageKind, ResourceKind};
use crate::effect::EffectKind;
use crate::stats::CharacterClass;

/// DoT/HoT split attached to an ability.
///
/// The power-budget fraction is removed from the direct component and
/// diverted into a periodic effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicSplit {
    /// Percent of the ability's power diverted into the periodic part.
    pub power_percent: i64,
    /// Number of cadence ticks the periodic effect lasts.
    pub duration_ticks: u32,
}

/// Debuff attached to an ability. The ability pays for it with a fixed
/// percentage off its own direct damage.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebuffSpec {
    pub kind: EffectKind,
    pub magnitude: i64,
    pub rounds: u32,
}

/// Pet behavior archetype, deciding how a fresh summon seeds aggro.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PetArchetype {
    /// Plain damage pet; builds aggro only by acting.
    Striker,
    /// Taunts the caster's current target on summon.
    Taunter,
    /// Seeds aggro against every living creature on summon.
    Guardian,
}

/// Stat template for a summoned pet, scaled by caster level.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PetTemplate {
    pub key: AbilityKey,
    pub name: String,
    pub archetype: PetArchetype,
    pub hp_base: i64,
    pub hp_per_level: i64,
    pub damage_base: i64,
    pub damage_per_level: i64,
    /// Ability granted to the pet, with its own cooldown.
    pub ability: Option<AbilityKey>,
    pub ability_cooldown_ms: u64,
    /// Lifetime cap; `None` lasts until dismissed or killed.
    pub duration_ms: Option<u64>,
    /// Aggro seeded by taunter/guardian archetypes on summon.
    pub taunt_threat: i64,
}

/// Irregular mechanics routed to bespoke handlers instead of the generic
/// data-driven executor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecialMechanic {
    /// Summon the pet described by this template key.
    SummonPet(AbilityKey),
    /// Bring a dead character back; targets a corpse, not a live member.
    Resurrect { restore_percent: i64 },
    /// Fold the caster's pet threat onto the caster and retarget.
    RedirectPetThreat,
}

/// One player-ability catalog record.
///
/// A record with `special: None` is fully interpreted by the generic
/// executor; everything it needs is in the fields below.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilitySpec {
    pub key: AbilityKey,
    pub name: String,
    pub class: CharacterClass,
    pub required_level: u32,
    pub resource: ResourceKind,
    pub cost: i64,
    /// Nominal cast time; already folded into `time_multiplier_percent`
    /// for damage normalization.
    pub cast_time_ms: u64,
    pub cooldown_ms: u64,
    /// Raw ability power before scaling and splits.
    pub power: i64,
    pub damage_kind: DamageKind,
    /// Weapon contribution in percent of weapon damage (0 = none).
    pub weapon_percent: i64,
    /// Stat scaling in per-mille of the class's primary stat.
    pub stat_scaling_permille: i64,
    /// Cast-time normalization multiplier in percent.
    pub time_multiplier_percent: i64,
    /// DoT (damage abilities) or HoT (healing abilities) split.
    pub periodic: Option<PeriodicSplit>,
    /// Each periodic tick also heals the caster for the drained amount.
    pub life_drain: bool,
    pub debuff: Option<DebuffSpec>,
    /// Self-buff applied to the caster on a successful cast.
    pub buff: Option<DebuffSpec>,
    /// Applies to every living creature with the AoE penalty; skips the
    /// single-target path entirely.
    pub aoe: bool,
    /// Number of independent hits; each rolls mitigation and variance on
    /// its own.
    pub hits: u32,
    /// Crit multiplier in percent replacing the 100% base on a crit.
    pub crit_multiplier_percent: i64,
    pub special: Option<SpecialMechanic>,
}

impl AbilitySpec {
    /// A minimal single-hit spec; content builders override from here.
    pub fn direct(key: &str, name: &str, class: CharacterClass, power: i64) -> Self {
        Self {
            key: AbilityKey::new(key),
            name: name.to_owned(),
            class,
            required_level: 1,
            resource: ResourceKind::Mana,
            cost: 0,
            cast_time_ms: 0,
            cooldown_ms: 0,
            power,
            damage_kind: DamageKind::Physical,
            weapon_percent: 0,
            stat_scaling_permille: 0,
            time_multiplier_percent: 100,
            periodic: None,
            life_drain: false,
            debuff: None,
            buff: None,
            aoe: false,
            hits: 1,
            crit_multiplier_percent: 150,
            special: None,
        }
    }
}

// ============================================================================
// Creature Abilities
// ============================================================================

/// Target-selection rule for a creature ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetRule {
    /// Current top-threat character.
    Aggro,
    /// Living participant with the lowest HP.
    LowestHp,
    /// Deterministically picked living participant.
    Random,
    /// The creature itself (self-heals, self-buffs).
    SelfCast,
}

/// What a creature ability does when the cast resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CreatureAbilityEffect {
    /// Direct damage.
    Direct,
    /// Damage over time; never refresh-stacked on a target that already
    /// has it.
    Dot { rounds: u32 },
    /// Stun window in milliseconds.
    Stun { duration_ms: u64 },
    /// Heals the resolved target (used with `SelfCast` or healer roles).
    Heal,
}

/// One creature-ability catalog record used by the AI selector.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreatureAbilitySpec {
    pub key: AbilityKey,
    pub name: String,
    pub power: i64,
    pub damage_kind: DamageKind,
    pub effect: CreatureAbilityEffect,
    pub target_rule: TargetRule,
    pub cast_time_ms: u64,
    pub cooldown_ms: u64,
    /// Base score weight in the AI selector.
    pub base_weight: i64,
    /// Bound on the deterministic jitter added to the score.
    pub randomness: u64,
    /// Percent chance that the chosen cast actually begins this tick.
    pub base_chance_percent: u32,
}
