//! Repository-backed combat state.
//!
//! Rows live in [`CombatState`]; [`CombatStore`] wraps it in
//! clone-stage-commit transactions. Components never share live objects:
//! they read and update rows by id inside a transaction.

mod memory;
mod state;
pub mod types;

pub use memory::CombatStore;
pub use state::CombatState;
pub use types::{
    ActivePet, CastTarget, CharacterCooldown, CharacterRow, CombatEncounter, CombatEnemy,
    CombatParticipant, CombatResult, EncounterState, EnemyCast, EnemyCooldown, ParticipantStatus,
};

/// Storage-level failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A previous writer panicked while holding the lock.
    #[error("combat store lock poisoned")]
    LockPoisoned,
}
