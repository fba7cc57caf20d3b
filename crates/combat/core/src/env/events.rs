//! Narrative event sink.

use crate::types::{CharacterId, EncounterId};

/// Fire-and-forget log writers for narrative combat text.
///
/// Never consulted for control flow; a sink that drops everything is a
/// valid implementation.
pub trait EventSink: Send + Sync {
    /// Line visible only to one character.
    fn append_private(&self, character: CharacterId, text: &str);

    /// Line visible to everyone in the encounter.
    fn append_group(&self, encounter: EncounterId, text: &str);
}

/// Sink that discards everything. Useful in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn append_private(&self, _character: CharacterId, _text: &str) {}

    fn append_group(&self, _encounter: EncounterId, _text: &str) {}
}
