//! Module for long lasting states affecting a battler.

use crate::data::{AutoRemoval, Restriction, StateId, StateRecord, Trait};
use indexmap::IndexMap;

/// Remaining turns of a state that never expires by itself.
pub const INDEFINITE: i32 = -1;

/// A state applied to a battler, with its remaining duration.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEntry {
    state_id: StateId,
    turns_left: i32,
    timing: AutoRemoval,
    restriction: Restriction,
    traits: Vec<Trait>,
}

impl StateEntry {
    /// Creates a new entry for `record`, lasting `turns_left` turns.
    /// Use `INDEFINITE` for a state without duration.
    pub fn new(record: &StateRecord, turns_left: i32) -> Self {
        Self {
            state_id: record.id,
            turns_left,
            timing: record.auto_removal,
            restriction: record.restriction,
            traits: record.traits.clone(),
        }
    }

    /// Returns the id of the state.
    pub fn state_id(&self) -> StateId {
        self.state_id
    }

    /// Returns the remaining duration. `INDEFINITE` means infinite duration.
    pub fn turns_left(&self) -> i32 {
        self.turns_left
    }

    /// Returns true if this state never expires by itself.
    pub fn is_indefinite(&self) -> bool {
        self.turns_left < 0
    }

    /// Returns when the timer of this state advances.
    pub fn timing(&self) -> AutoRemoval {
        self.timing
    }

    /// Returns the restriction imposed by this state.
    pub fn restriction(&self) -> Restriction {
        self.restriction
    }

    /// Returns the traits granted by this state.
    pub fn traits(&self) -> &[Trait] {
        &self.traits
    }

    /// Extends the duration to `turns_left`, if that's longer than the current one.
    pub fn refresh(&mut self, turns_left: i32) {
        if self.is_indefinite() {
            return;
        }
        if turns_left < 0 || turns_left > self.turns_left {
            self.turns_left = turns_left;
        }
    }

    /// Decreases the duration by one.
    pub fn advance(&mut self) {
        if self.turns_left > 0 {
            self.turns_left -= 1;
        }
    }

    /// Returns `true` if this state has ended.
    pub fn finished(&self) -> bool {
        self.turns_left == 0
    }
}

/// The active states of a battler, in order of application.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct States {
    entries: IndexMap<StateId, StateEntry>,
}

impl States {
    /// Adds a state or refreshes the existing one.
    /// Returns true if the state wasn't active before.
    pub fn add(&mut self, record: &StateRecord, turns_left: i32) -> bool {
        if let Some(entry) = self.entries.get_mut(&record.id) {
            entry.refresh(turns_left);
            false
        } else {
            self.entries
                .insert(record.id, StateEntry::new(record, turns_left));
            true
        }
    }

    /// Removes a state. Returns the removed entry, if present.
    pub fn remove(&mut self, id: StateId) -> Option<StateEntry> {
        self.entries.shift_remove(&id)
    }

    /// Removes every state.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns true if the given state is active.
    pub fn contains(&self, id: StateId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns the entry of the given state.
    pub fn get(&self, id: StateId) -> Option<&StateEntry> {
        self.entries.get(&id)
    }

    /// Returns an iterator over all entries.
    pub fn iter(&self) -> impl Iterator<Item = &StateEntry> {
        self.entries.values()
    }

    /// Returns the number of active states.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no state is active.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the traits of all active states.
    pub fn traits(&self) -> impl Iterator<Item = &Trait> {
        self.entries.values().flat_map(|entry| entry.traits.iter())
    }

    /// Returns true if any state prevents its owner from acting.
    pub fn restricted(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.restriction == Restriction::CannotMove)
    }

    /// Advances the timers of every state with the given timing.
    /// Expired states are removed and their ids returned.
    pub fn tick(&mut self, timing: AutoRemoval) -> Vec<StateId> {
        let mut expired = Vec::new();
        for entry in self.entries.values_mut() {
            if entry.timing != timing || entry.is_indefinite() {
                continue;
            }
            entry.advance();
            if entry.finished() {
                expired.push(entry.state_id);
            }
        }
        for id in &expired {
            self.entries.shift_remove(id);
        }
        expired
    }
}
