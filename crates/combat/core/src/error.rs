//! Ability validation errors.
//!
//! Every variant is a user-visible rejection surfaced as a private
//! narrative message. Preconditions are checked before any side effect,
//! so a raised error guarantees nothing was mutated.

use crate::ability::{AbilityKey, ResourceKind};

/// Errors raised synchronously by ability validation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityError {
    /// No such ability in the catalog.
    #[error("You don't know how to do that.")]
    UnknownAbility(AbilityKey),

    /// Ability belongs to a different class.
    #[error("Your training does not cover that art.")]
    WrongClass,

    /// Actor level below the ability's requirement.
    #[error("You must reach level {required} first.")]
    LevelTooLow { required: u32 },

    /// Resource pool too low and no free-cast effect active.
    #[error("You don't have enough {0}.")]
    InsufficientResource(ResourceKind),

    /// Ability cooldown has not elapsed.
    #[error("You are not ready to do that again.")]
    OnCooldown,

    /// No valid target could be resolved.
    #[error("You don't have a valid target.")]
    InvalidTarget,

    /// Target must be dead for this ability (resurrection).
    #[error("That only works on the fallen.")]
    TargetNotDead,

    /// Actor is not in an active encounter.
    #[error("You are not fighting anything.")]
    NotInCombat,

    /// No living creature remains to strike.
    #[error("There is nothing left to fight.")]
    NoLivingEnemy,

    /// The acting entity no longer exists.
    #[error("Nothing happens.")]
    ActorMissing,

    /// Dead actors act through no ability but resurrection's receiving end.
    #[error("You can't do that while dead.")]
    ActorDead,

    /// A stun window is still open on the actor.
    #[error("You are stunned!")]
    ActorStunned,

    /// Caster has no active pet to act through.
    #[error("You have no companion to command.")]
    NoActivePet,

    /// Catalog names a pet/creature record that does not exist.
    #[error("Nothing answers the call.")]
    MissingContent(AbilityKey),
}
