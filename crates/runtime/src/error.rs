//! Runtime error types.

use combat_core::{AbilityError, CharacterId, EncounterId};

use crate::store::StoreError;

/// Errors surfaced by the runtime facade.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Ability validation rejection; surfaced to the actor, no state change.
    #[error(transparent)]
    Ability(#[from] AbilityError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A character may be in at most one active encounter.
    #[error("{0} is already in combat")]
    CharacterInCombat(CharacterId),

    #[error("unknown character {0}")]
    UnknownCharacter(CharacterId),

    #[error("unknown encounter {0}")]
    UnknownEncounter(EncounterId),

    /// Spawn slot held no creatures; combat cannot start.
    #[error("spawn has no creatures")]
    EmptySpawn,

    /// The worker task is gone; the runtime was shut down.
    #[error("runtime channel closed")]
    ChannelClosed,

    #[error("worker task failed to join")]
    WorkerJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
