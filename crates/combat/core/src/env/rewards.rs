//! Reward collaborators: faction, loot, corpses.

use crate::types::CharacterId;

/// Pass-through hooks into the inventory/loot and faction collaborators.
///
/// The resolution dispatcher calls these with the resolved outcome; it
/// never reads loot tables or item templates itself, and nothing here is
/// read back mid-tick.
pub trait RewardSink: Send + Sync {
    /// Create a corpse for a character that died in combat.
    fn create_corpse(&self, character: CharacterId);

    /// Roll and hand out loot for a defeated creature.
    fn roll_loot(&self, character: CharacterId, creature_key: &str);

    /// Adjust faction standing for a creature kill.
    fn adjust_faction(&self, character: CharacterId, creature_key: &str);
}

/// Sink that ignores every reward hook. Useful in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRewardSink;

impl RewardSink for NullRewardSink {
    fn create_corpse(&self, _character: CharacterId) {}

    fn roll_loot(&self, _character: CharacterId, _creature_key: &str) {}

    fn adjust_faction(&self, _character: CharacterId, _creature_key: &str) {}
}
