//! Runtime orchestration for the combat simulation.
//!
//! This crate wires the pure rules of `combat-core` into a running
//! server: the transactional combat store, the ability execution engine,
//! the enemy AI selector, the encounter state machine, the timer queue,
//! and the reward dispatcher. Consumers embed [`CombatRuntime`] and talk
//! to it through a cloneable [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`store`] holds every combat row behind clone-stage-commit transactions
//! - [`executor`] validates and executes abilities for all actor kinds
//! - [`ai`] scores and gates creature ability casts
//! - [`encounter`] owns encounter lifecycle and the tick handler
//! - [`scheduler`] is the min-heap timer queue driven by the worker
//! - [`resolution`] computes rewards at the collaborator boundary
//! - [`events`] provides the broadcast event stream
//! - [`content`] ships a small built-in catalog for local runs and tests
pub mod ai;
pub mod content;
pub mod encounter;
pub mod error;
pub mod events;
pub mod executor;
pub mod handle;
pub mod resolution;
pub mod runtime;
pub mod scheduler;
pub mod store;

pub use ai::{EnemyAiSelector, PlannedCast};
pub use content::{FixedGearOracle, StaticContent};
pub use encounter::{EncounterEngine, TickOutcome};
pub use error::{Result, RuntimeError};
pub use events::{CombatEvent, EncounterOutcome, EventBus, NarrativeScope};
pub use executor::AbilityExecutor;
pub use handle::{AbilityAction, RuntimeHandle};
pub use resolution::{RewardDispatcher, StandardRewardDispatcher, XpAward, xp_to_reach};
pub use runtime::{CombatRuntime, CombatRuntimeBuilder, RuntimeConfig};
pub use scheduler::{TaskKind, TaskQueue};
pub use store::{
    ActivePet, CastTarget, CharacterRow, CombatEncounter, CombatEnemy, CombatParticipant,
    CombatResult, CombatState, CombatStore, EncounterState, EnemyCast, ParticipantStatus,
    StoreError,
};
