//! History of events.

use crate::error::{FerretError, FerretResult};
use crate::event::{BattleEvent, EventId, EventWrapper};

/// History is the place where all events are kept, in a way such that they
/// construct a single, consistent timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    events: Vec<EventWrapper>,
}

impl History {
    /// Creates a new History.
    pub(crate) fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Returns all events inside this timeline.
    pub fn events(&self) -> &[EventWrapper] {
        &self.events
    }

    /// Stores a new event in the history logs.
    pub(crate) fn archive(&mut self, event: &EventWrapper) {
        assert_eq!(event.id(), self.next_id());
        self.events.push(event.clone());
    }

    /// Verifies if an event has an id compatible with the current timeline.
    /// Timeline only accepts monotonically increasing ids with no gaps.
    pub fn verify_event(&self, event: &EventWrapper) -> FerretResult<()> {
        if event.id() != self.next_id() {
            return Err(FerretError::NonContiguousEventId(
                event.id(),
                self.next_id(),
            ));
        }
        Ok(())
    }

    /// Returns the id for the next event.
    pub(crate) fn next_id(&self) -> EventId {
        self.events.len() as EventId
    }

    /// Returns the number of events in this history.
    pub fn len(&self) -> EventId {
        self.events.len() as EventId
    }

    /// Returns whether this history is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns an iterator over the events, without their wrappers.
    pub fn iter(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events.iter().map(EventWrapper::event)
    }
}
