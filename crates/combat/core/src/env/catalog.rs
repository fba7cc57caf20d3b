//! Ability catalog oracle.

use crate::ability::{AbilityKey, AbilitySpec, CreatureAbilitySpec, PetTemplate};

/// Read-only access to ability content.
///
/// Lookups return owned records: implementations are free to build them
/// on the fly (role-scaled copies, terrain-filtered lists) without the
/// engine holding references into their storage.
pub trait AbilityOracle: Send + Sync {
    /// Player-ability record for a catalog key.
    fn ability(&self, key: &AbilityKey) -> Option<AbilitySpec>;

    /// Creature-ability record for a catalog key.
    fn creature_ability(&self, key: &AbilityKey) -> Option<CreatureAbilitySpec>;

    /// Stat template for a summonable pet.
    fn pet_template(&self, key: &AbilityKey) -> Option<PetTemplate>;
}
