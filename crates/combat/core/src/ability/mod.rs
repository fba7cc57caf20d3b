//! Ability catalog model and damage composition.
//!
//! The common 80% of abilities are plain data: an [`AbilitySpec`] record
//! interpreted by the generic executor in the runtime. Abilities with
//! truly unique mechanics (pet summons, resurrection) carry a
//! [`SpecialMechanic`] tag that routes them to a bespoke handler instead.

pub mod damage;
pub mod spec;

pub use damage::{CasterProfile, DamageBreakdown, PeriodicComponent, compose_ability_damage};
pub use spec::{
    AbilitySpec, CreatureAbilityEffect, CreatureAbilitySpec, DebuffSpec, PeriodicSplit,
    PetArchetype, PetTemplate, SpecialMechanic, TargetRule,
};

use std::fmt;

/// Catalog key identifying one ability.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AbilityKey(String);

impl AbilityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AbilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AbilityKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Resource pool an ability draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceKind {
    Mana,
    Stamina,
}

/// Damage school of an ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageKind {
    /// Mitigated by armor class.
    Physical,
    /// Mitigated by magic resistance only; bypasses armor.
    Magic,
    /// Restores HP; never mitigated.
    Healing,
}
