//! Deterministic combat rules shared across the engine.
//!
//! `combat-core` defines the canonical math and data types of the combat
//! simulation (mitigation and variance, the threat ledger, the status
//! effect ledger, ability composition, and enemy stat derivation) and
//! exposes pure APIs reused by the runtime and by offline tools. Nothing
//! here performs I/O or reads a clock: callers pass in [`SimTime`] and
//! roll seeds, which is what makes fights replayable.
pub mod ability;
pub mod config;
pub mod effect;
pub mod env;
pub mod error;
pub mod mitigation;
pub mod rng;
pub mod stats;
pub mod threat;
pub mod types;

pub use ability::{
    AbilityKey, AbilitySpec, CasterProfile, CreatureAbilityEffect, CreatureAbilitySpec,
    DamageBreakdown, DamageKind, DebuffSpec, PeriodicSplit, PetArchetype, PetTemplate,
    ResourceKind, SpecialMechanic, TargetRule, compose_ability_damage,
};
pub use config::EngineConfig;
pub use effect::{EffectDuration, EffectKind, EffectLedger, EffectRecord, PeriodicTick};
pub use env::{
    AbilityOracle, CreatureOracle, CreatureTemplate, EventSink, GearBonus, GearOracle,
    NullEventSink, NullRewardSink, RewardSink,
};
pub use error::AbilityError;
pub use mitigation::{
    AttackOutcome, DefenseProfile, apply_variance, crit_chance_permille, mitigate_magic,
    mitigate_physical, roll_attack_outcome,
};
pub use rng::{PcgRoll, RollOracle, compute_seed, hash_key};
pub use stats::{
    CharacterClass, ClassCapabilities, CreatureRole, DerivedEnemyStats, PrimaryStat, Race,
    RoleTemplate, StatBlock, ThreatPolicy, derive_enemy_stats, level_difference_percent,
};
pub use threat::{AggroEntry, ThreatTable, diffuse_heal_threat};
pub use types::{
    ActorRef, CharacterId, CreatureId, EncounterId, GroupId, LocationId, PetId, SimTime, SpawnId,
    TargetRef, ThreatSource, ThreatTarget,
};
