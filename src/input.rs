//! Inbound side of a battle: player submissions and cancellation.

use crate::action::{Action, ActionInput};
use crate::error::{FerretError, FerretResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::{timeout_at, Duration, Instant};

/// Cloneable handle to drive a battle from outside its task.
#[derive(Debug, Clone)]
pub struct BattleHandle {
    input: mpsc::Sender<ActionInput>,
    cancel: Arc<watch::Sender<bool>>,
}

impl BattleHandle {
    pub(crate) fn new(input: mpsc::Sender<ActionInput>, cancel: Arc<watch::Sender<bool>>) -> Self {
        Self { input, cancel }
    }

    /// Submits an action for an actor. Never blocks.
    ///
    /// A submission for an actor the battle isn't waiting for is kept until that actor
    /// is asked for input; a later submission for the same actor replaces it.
    pub fn submit(&self, input: ActionInput) -> FerretResult<()> {
        self.input.try_send(input).map_err(|err| match err {
            TrySendError::Full(_) => FerretError::InputQueueFull,
            TrySendError::Closed(_) => FerretError::BattleClosed,
        })
    }

    /// Aborts the battle. It resolves as lost at the next suspension point.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Returns true if the battle no longer accepts input.
    pub fn is_closed(&self) -> bool {
        self.input.is_closed()
    }
}

/// Receiving end of the cancellation flag.
#[derive(Debug, Clone)]
pub(crate) struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl CancelToken {
    pub(crate) fn new(receiver: watch::Receiver<bool>) -> Self {
        Self { receiver }
    }

    /// Returns true if the battle has been cancelled.
    pub(crate) fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Completes once the battle is cancelled. Never completes if every handle is gone.
    pub(crate) async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Why an input wait ended without an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitError {
    /// No input arrived in time.
    TimedOut,
    /// The battle was cancelled.
    Cancelled,
    /// Every handle has been dropped.
    Closed,
}

/// Bounded inbound queue, demultiplexed into one slot per actor.
///
/// Submissions for actors outside the party are discarded.
#[derive(Debug)]
pub(crate) struct Inbox {
    receiver: mpsc::Receiver<ActionInput>,
    slots: HashMap<usize, Action>,
    actors: usize,
}

impl Inbox {
    pub(crate) fn new(receiver: mpsc::Receiver<ActionInput>, actors: usize) -> Self {
        Self {
            receiver,
            slots: HashMap::new(),
            actors,
        }
    }

    /// Returns the number of parked submissions.
    #[cfg(test)]
    pub(crate) fn parked(&self) -> usize {
        self.slots.len()
    }

    /// Forgets every parked submission.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    /// Waits for the action of `actor`, up to `timeout`.
    ///
    /// Submissions for other actors arriving meanwhile are parked in their slots.
    pub(crate) async fn wait_for(
        &mut self,
        actor: usize,
        timeout: Duration,
        cancel: &mut CancelToken,
    ) -> Result<Action, WaitError> {
        if cancel.is_cancelled() {
            return Err(WaitError::Cancelled);
        }
        self.drain();
        if let Some(action) = self.slots.remove(&actor) {
            return Ok(action);
        }
        let deadline = Instant::now() + timeout;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                received = timeout_at(deadline, self.receiver.recv()) => match received {
                    Err(_) => return Err(WaitError::TimedOut),
                    Ok(None) => return Err(WaitError::Closed),
                    Ok(Some(input)) if input.actor == actor => return Ok(input.action),
                    Ok(Some(input)) => self.park(input),
                },
            }
        }
    }

    /// Moves every queued submission into its slot, latest wins.
    fn drain(&mut self) {
        while let Ok(input) = self.receiver.try_recv() {
            self.park(input);
        }
    }

    fn park(&mut self, input: ActionInput) {
        if input.actor >= self.actors {
            log::debug!("discarding input for unknown actor#{}", input.actor);
            return;
        }
        log::debug!("parking input for actor#{}", input.actor);
        self.slots.insert(input.actor, input.action);
    }
}

/// Creates the inbound plumbing of a battle.
pub(crate) fn channels(capacity: usize, actors: usize) -> (BattleHandle, Inbox, CancelToken) {
    let (input_tx, input_rx) = mpsc::channel(capacity.max(1));
    let (cancel_tx, cancel_rx) = watch::channel(false);
    (
        BattleHandle::new(input_tx, Arc::new(cancel_tx)),
        Inbox::new(input_rx, actors),
        CancelToken::new(cancel_rx),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latest_submission_wins() {
        let (handle, mut inbox, mut cancel) = channels(8, 2);
        handle.submit(ActionInput::new(1, Action::attack())).unwrap();
        handle.submit(ActionInput::new(0, Action::guard())).unwrap();
        handle.submit(ActionInput::new(1, Action::escape())).unwrap();
        let timeout = Duration::from_millis(50);
        assert_eq!(
            inbox.wait_for(0, timeout, &mut cancel).await,
            Ok(Action::guard())
        );
        assert_eq!(
            inbox.wait_for(1, timeout, &mut cancel).await,
            Ok(Action::escape())
        );
    }

    #[tokio::test]
    async fn unknown_actors_are_discarded() {
        let (handle, mut inbox, mut cancel) = channels(16, 2);
        for actor in 0..8 {
            handle.submit(ActionInput::new(actor, Action::guard())).unwrap();
        }
        let timeout = Duration::from_millis(10);
        assert_eq!(
            inbox.wait_for(0, timeout, &mut cancel).await,
            Ok(Action::guard())
        );
        // Only the other party member is waiting for its turn.
        assert_eq!(inbox.parked(), 1);
        inbox.clear();
        assert_eq!(inbox.parked(), 0);
        assert_eq!(
            inbox.wait_for(1, timeout, &mut cancel).await,
            Err(WaitError::TimedOut)
        );
    }

    #[tokio::test]
    async fn full_queue_rejects() {
        let (handle, _inbox, _cancel) = channels(1, 1);
        handle.submit(ActionInput::new(0, Action::attack())).unwrap();
        assert_eq!(
            handle.submit(ActionInput::new(0, Action::attack())),
            Err(FerretError::InputQueueFull)
        );
    }

    #[tokio::test]
    async fn wait_ends_on_timeout_and_cancel() {
        let (handle, mut inbox, mut cancel) = channels(4, 1);
        let timeout = Duration::from_millis(10);
        assert_eq!(
            inbox.wait_for(0, timeout, &mut cancel).await,
            Err(WaitError::TimedOut)
        );
        handle.cancel();
        assert_eq!(
            inbox.wait_for(0, Duration::from_secs(60), &mut cancel).await,
            Err(WaitError::Cancelled)
        );
    }

    #[tokio::test]
    async fn dropped_handles_close_the_inbox() {
        let (handle, mut inbox, mut cancel) = channels(4, 1);
        drop(handle);
        assert_eq!(
            inbox.wait_for(0, Duration::from_secs(60), &mut cancel).await,
            Err(WaitError::Closed)
        );
        assert_eq!(
            BattleHandle::new(mpsc::channel(1).0, Arc::new(watch::channel(false).0))
                .submit(ActionInput::new(0, Action::guard())),
            Err(FerretError::BattleClosed)
        );
    }
}
