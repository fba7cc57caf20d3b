//! Creature template, role, and spawn collaborator.

use arrayvec::ArrayVec;

use crate::ability::AbilityKey;
use crate::config::EngineConfig;
use crate::stats::{CreatureRole, RoleTemplate};
use crate::types::{SimTime, SpawnId};

/// Content template for one creature kind.
///
/// A template plus a role assignment yields a tuned instance (see
/// `stats::derive_enemy_stats`).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreatureTemplate {
    pub key: String,
    pub name: String,
    pub level: u32,
    pub hp: i64,
    pub armor: i64,
    pub magic_resist: i64,
    pub role: CreatureRole,
    /// Terrain-derived special abilities this creature knows.
    pub abilities: ArrayVec<AbilityKey, { EngineConfig::MAX_CREATURE_ABILITIES }>,
    /// Base experience override; 0 falls back to the level formula.
    pub base_xp: u64,
}

/// Creature content and spawn bookkeeping.
///
/// `release` is the one write: the engine reports a spawn slot freed by
/// the encounter ending, and the implementation either marks it available
/// again or schedules a respawn for an exhausted group. The engine does
/// not know which.
pub trait CreatureOracle: Send + Sync {
    fn template(&self, key: &str) -> Option<CreatureTemplate>;

    /// Role-based scaling values for one role.
    fn role_template(&self, role: CreatureRole) -> RoleTemplate;

    /// Template keys of the creatures currently held by a spawn slot.
    fn spawn_members(&self, spawn: SpawnId) -> Vec<String>;

    /// Return a spawn slot to the world after its encounter resolved.
    fn release(&self, spawn: SpawnId, now: SimTime);
}
