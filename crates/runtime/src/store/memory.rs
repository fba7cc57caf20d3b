//! Transactional in-memory combat store.

use std::sync::RwLock;

use super::state::CombatState;
use super::StoreError;

/// In-memory implementation of the combat store.
///
/// Every tick runs as one transaction: the working set is cloned, the
/// closure mutates the copy, and the copy is committed atomically on
/// `Ok` or discarded on `Err`. Partial state (damage applied but threat
/// not recorded) can never be observed.
///
/// Conflicting concurrent transactions are serialized by the store's
/// write lock, not by the engine; there is no other locking anywhere in
/// the runtime.
pub struct CombatStore {
    inner: RwLock<CombatState>,
}

impl CombatStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CombatState::new()),
        }
    }

    /// Create with a prepared working set (tests, imports).
    pub fn with_state(state: CombatState) -> Self {
        Self {
            inner: RwLock::new(state),
        }
    }

    /// Run a transaction against the working set.
    ///
    /// All reads/writes inside `f` either fully commit or fully roll
    /// back. The error type only needs a conversion from [`StoreError`]
    /// so callers can thread their own failure enums through.
    pub fn transaction<R, E>(
        &self,
        f: impl FnOnce(&mut CombatState) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;

        // Stage against a clone so a failed transaction leaves no trace.
        let mut working = guard.clone();
        match f(&mut working) {
            Ok(value) => {
                *guard = working;
                Ok(value)
            }
            Err(error) => Err(error),
        }
    }

    /// Read-only access to the committed working set.
    pub fn read<R>(&self, f: impl FnOnce(&CombatState) -> R) -> Result<R, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&guard))
    }
}

impl Default for CombatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::CharacterRow;
    use combat_core::stats::{CharacterClass, Race, StatBlock};
    use combat_core::types::{CharacterId, LocationId};

    fn seed_character(state: &mut CombatState) {
        state.insert_character(CharacterRow::new(
            CharacterId(1),
            "Ana",
            CharacterClass::Mage,
            Race::Elf,
            3,
            StatBlock::default(),
            LocationId(1),
        ));
    }

    #[test]
    fn committed_transactions_are_visible() {
        let store = CombatStore::new();
        store
            .transaction::<_, StoreError>(|state| {
                seed_character(state);
                Ok(())
            })
            .unwrap();

        let found = store.read(|state| state.character(CharacterId(1)).is_some()).unwrap();
        assert!(found);
    }

    #[test]
    fn failed_transactions_roll_back() {
        let store = CombatStore::new();
        let result = store.transaction::<(), StoreError>(|state| {
            seed_character(state);
            Err(StoreError::LockPoisoned)
        });
        assert!(result.is_err());

        let found = store.read(|state| state.character(CharacterId(1)).is_some()).unwrap();
        assert!(!found, "rolled-back writes must not be observable");
    }
}
