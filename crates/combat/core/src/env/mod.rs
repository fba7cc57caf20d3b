//! Collaborator interfaces consumed by the engine.
//!
//! Each component depends only on the narrow trait it needs: the ability
//! catalog, the gear aggregator, creature/spawn data, the narrative sink,
//! and the reward collaborators. The runtime provides implementations;
//! tests substitute small fakes.

mod catalog;
mod creatures;
mod events;
mod gear;
mod rewards;

pub use catalog::AbilityOracle;
pub use creatures::{CreatureOracle, CreatureTemplate};
pub use events::{EventSink, NullEventSink};
pub use gear::{GearBonus, GearOracle};
pub use rewards::{NullRewardSink, RewardSink};
