//! Equipped-gear bonus aggregator.

use crate::stats::StatBlock;
use crate::types::CharacterId;

/// Aggregated equipment bonuses for one character.
///
/// Produced by the inventory collaborator; the engine never inspects
/// individual items.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GearBonus {
    pub stats: StatBlock,
    pub armor_class: i64,
    pub magic_resist: i64,
    /// Equipped weapon base damage, used by weapon-scaling abilities and
    /// auto-attacks.
    pub weapon_damage: i64,
    /// Attacker hit bonus in per-mille, netted against dodge/parry.
    pub hit_bonus_permille: u32,
}

/// Read-only view of a character's equipment bonuses.
pub trait GearOracle: Send + Sync {
    fn bonuses(&self, character: CharacterId) -> GearBonus;
}
