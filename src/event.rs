//! Events published by a battle and the bus carrying them to observers.
//!
//! Events are the only information leaving the battle while it runs. Each one is wrapped
//! with an id, archived in the [History](../history/struct.History.html) and then
//! broadcast to every subscribed observer.

use crate::action::{Action, ActionOutcome};
use crate::battler::{Battler, Regeneration};
use crate::data::{Param, StateId};
use crate::history::History;
use crate::loot::Rewards;
use crate::metric::system::EVENTS_DROPPED;
use crate::metric::WriteMetrics;
use crate::round::RoundsCount;
use crate::team::BattlerRef;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Type to represent an event id.
pub type EventId = u64;

/// Snapshot of a battler's vital values.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Vitals {
    /// Position of the battler.
    pub battler: BattlerRef,
    /// Name.
    pub name: String,
    /// Current hit points.
    pub hp: i32,
    /// Current magic points.
    pub mp: i32,
    /// Current tactical points.
    pub tp: i32,
    /// Maximum hit points.
    pub mhp: i32,
    /// Maximum magic points.
    pub mmp: i32,
    /// Active states.
    pub states: Vec<StateId>,
}

impl From<&Battler> for Vitals {
    fn from(battler: &Battler) -> Self {
        Self {
            battler: battler.position(),
            name: battler.name().to_string(),
            hp: battler.hp(),
            mp: battler.mp(),
            tp: battler.tp(),
            mhp: battler.mhp(),
            mmp: battler.mmp(),
            states: battler.states().iter().map(|e| e.state_id()).collect(),
        }
    }
}

/// Regeneration applied to one battler at the end of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct RegenDelta {
    /// Who regenerated.
    pub battler: BattlerRef,
    /// Actual changes.
    pub delta: Regeneration,
}

/// States that expired on one battler.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ExpiredStates {
    /// Owner of the states.
    pub battler: BattlerRef,
    /// Expired states.
    pub states: Vec<StateId>,
}

/// Buffs that expired on one battler.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ExpiredBuffs {
    /// Owner of the buffs.
    pub battler: BattlerRef,
    /// Parameters whose buff expired.
    pub params: Vec<Param>,
}

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum BattleOutcome {
    /// Every enemy is dead.
    Won,
    /// Every actor is dead, or the battle was aborted.
    Lost,
    /// The party ran away.
    Escaped,
}

/// Everything that can happen during a battle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum BattleEvent {
    /// The battle begins.
    BattleStart {
        /// Actors at the start.
        actors: Vec<Vitals>,
        /// Enemies at the start.
        enemies: Vec<Vitals>,
    },
    /// The battle waits for an actor's input.
    InputRequest {
        /// Current round.
        round: RoundsCount,
        /// Index of the actor.
        actor: usize,
    },
    /// Every action of the round has been decided.
    TurnStart {
        /// Current round.
        round: RoundsCount,
        /// Order of acting.
        order: Vec<BattlerRef>,
    },
    /// A battler acted.
    ActionResult {
        /// Who acted.
        subject: BattlerRef,
        /// What it did.
        action: Action,
        /// Effects on each target.
        outcomes: Vec<ActionOutcome>,
    },
    /// The round is over.
    TurnEnd {
        /// Current round.
        round: RoundsCount,
        /// Regeneration applied to living battlers.
        regen: Vec<RegenDelta>,
        /// States that ran out.
        expired_states: Vec<ExpiredStates>,
        /// Buffs that ran out.
        expired_buffs: Vec<ExpiredBuffs>,
    },
    /// The battle is over.
    BattleEnd {
        /// How it ended.
        outcome: BattleOutcome,
        /// Rewards, only after a victory.
        rewards: Option<Rewards>,
        /// True if the defeat ends the game.
        game_over: bool,
    },
}

impl BattleEvent {
    /// Returns true if this event closes the battle.
    pub fn is_end(&self) -> bool {
        matches!(self, BattleEvent::BattleEnd { .. })
    }
}

/// Decorator for events, carrying their position in the timeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct EventWrapper {
    id: EventId,
    event: BattleEvent,
}

impl EventWrapper {
    /// Creates a new EventWrapper.
    pub fn new(id: EventId, event: BattleEvent) -> Self {
        Self { id, event }
    }

    /// Returns the id of this event.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Returns the wrapped event.
    pub fn event(&self) -> &BattleEvent {
        &self.event
    }

    /// Consumes the wrapper and returns the event.
    pub fn into_event(self) -> BattleEvent {
        self.event
    }
}

/// Outbound queue of a battle.
///
/// Publishing never blocks: when the queue is full the oldest pending event is evicted,
/// observers that missed it get `RecvError::Lagged`.
pub(crate) struct EventBus {
    sender: broadcast::Sender<EventWrapper>,
    capacity: usize,
    history: History,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            // The channel rounds its buffer up to a power of two.
            capacity: capacity.next_power_of_two(),
            history: History::new(),
        }
    }

    /// Returns a new receiver, seeing every event published from now on.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<EventWrapper> {
        self.sender.subscribe()
    }

    /// Archives `event` and broadcasts it to every observer.
    pub(crate) fn publish(&mut self, event: BattleEvent, metrics: &mut WriteMetrics) {
        let wrapper = EventWrapper::new(self.history.next_id(), event);
        self.history.archive(&wrapper);
        if self.sender.receiver_count() > 0 && self.sender.len() >= self.capacity {
            metrics.increment(EVENTS_DROPPED);
            log::warn!(
                "outbound queue full, evicting the oldest event before #{}",
                wrapper.id()
            );
        }
        if self.sender.send(wrapper).is_err() {
            log::trace!("no observers for the event");
        }
    }

    /// Returns the events published so far.
    pub(crate) fn history(&self) -> &History {
        &self.history
    }

    /// Consumes the bus, closing the stream. Returns the archived events.
    pub(crate) fn close(self) -> History {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::Metrics;

    fn request(round: RoundsCount) -> BattleEvent {
        BattleEvent::InputRequest { round, actor: 0 }
    }

    #[test]
    fn ids_are_contiguous() {
        let mut metrics = Metrics::default();
        let mut bus = EventBus::new(4);
        bus.publish(request(1), &mut metrics.write_handle());
        bus.publish(request(2), &mut metrics.write_handle());
        let ids: Vec<_> = bus.history().events().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut metrics = Metrics::default();
        let mut bus = EventBus::new(2);
        let mut receiver = bus.subscribe();
        for round in 1..=3 {
            bus.publish(request(round), &mut metrics.write_handle());
        }
        assert_eq!(metrics.read_handle().count(EVENTS_DROPPED), 1);
        assert_eq!(receiver.try_recv(), Err(broadcast::error::TryRecvError::Lagged(1)));
        assert_eq!(receiver.try_recv().map(|e| e.id()), Ok(1));
        assert_eq!(receiver.try_recv().map(|e| e.id()), Ok(2));
        // Every event is archived regardless of observers.
        assert_eq!(bus.history().len(), 3);
        let history = bus.close();
        assert_eq!(history.len(), 3);
        assert_eq!(receiver.try_recv(), Err(broadcast::error::TryRecvError::Closed));
    }
}
