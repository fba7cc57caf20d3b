//! Combat event stream.
//!
//! Observers subscribe to a broadcast channel of [`CombatEvent`]s. The
//! narrative [`EventSink`] consumed by the engine is bridged onto the
//! same channel, so one subscription sees lifecycle events and combat
//! text together. Publishing is best-effort: no subscribers is normal,
//! not an error.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use combat_core::env::EventSink;
use combat_core::types::{CharacterId, CreatureId, EncounterId, LocationId};

/// Why an encounter ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EncounterOutcome {
    Victory,
    Defeat,
    /// Everyone fled or the encounter emptied out; no rewards either way.
    Abandoned,
}

/// Scope of a narrative line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarrativeScope {
    Private(CharacterId),
    Group(EncounterId),
}

/// Events published by the combat runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CombatEvent {
    EncounterStarted {
        encounter: EncounterId,
        location: LocationId,
    },
    EncounterResolved {
        encounter: EncounterId,
        outcome: EncounterOutcome,
    },
    CharacterDied {
        encounter: EncounterId,
        character: CharacterId,
    },
    CreatureSlain {
        encounter: EncounterId,
        creature: CreatureId,
        name: String,
    },
    /// Narrative combat text, mirrored from the engine's event sink.
    Narrative {
        scope: NarrativeScope,
        text: String,
    },
}

/// Broadcast bus for [`CombatEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CombatEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CombatEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: CombatEvent) {
        if self.tx.send(event).is_err() {
            // No subscribers - this is normal, not an error
            tracing::trace!("no subscribers for combat event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for EventBus {
    fn append_private(&self, character: CharacterId, text: &str) {
        self.publish(CombatEvent::Narrative {
            scope: NarrativeScope::Private(character),
            text: text.to_owned(),
        });
    }

    fn append_group(&self, encounter: EncounterId, text: &str) {
        self.publish(CombatEvent::Narrative {
            scope: NarrativeScope::Group(encounter),
            text: text.to_owned(),
        });
    }
}
