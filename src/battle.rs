//! Battle module.

use crate::action::ActionKind;
use crate::ai::make_action;
use crate::battler::{ActorSetup, Battler, BattlerKind};
use crate::data::{AutoRemoval, DataProvider, EnemyId, TroopId, DEATH_STATE_ID};
use crate::entropy::Entropy;
use crate::error::{FerretError, FerretResult};
use crate::event::{
    BattleEvent, BattleOutcome, EventBus, EventWrapper, ExpiredBuffs, ExpiredStates, RegenDelta,
    Vitals,
};
use crate::fight::process_action;
use crate::history::History;
use crate::input::{channels, BattleHandle, CancelToken, Inbox, WaitError};
use crate::loot::{roll_drops, split_experience, Rewards};
use crate::metric::system::{ESCAPE_ATTEMPTS, INPUTS_TIMED_OUT, INPUT_WAIT, ROUNDS_STARTED};
use crate::metric::{Metrics, ReadMetrics};
use crate::round::{order_for_round, Rounds, RoundsCount};
use crate::team::{BattlerRef, Parties, Side};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};

/// Escape probability of the first attempt.
pub const BASE_ESCAPE_RATIO: f64 = 0.5;

/// Increase of the escape probability after each failed attempt.
pub const ESCAPE_RATIO_STEP: f64 = 0.1;

/// Tunable options of a battle.
#[derive(Debug, Clone, PartialEq)]
pub struct BattleOptions {
    /// Troop the enemies come from, only reported.
    pub troop_id: Option<TroopId>,
    /// Whether the party may run away.
    pub can_escape: bool,
    /// Whether a defeat is part of the story rather than a game over.
    pub can_lose: bool,
    /// How long to wait for each actor's input.
    pub input_timeout: Duration,
    /// Capacity of the inbound queue.
    pub input_capacity: usize,
    /// Capacity of the outbound queue.
    pub event_capacity: usize,
}

impl Default for BattleOptions {
    fn default() -> Self {
        Self {
            troop_id: None,
            can_escape: true,
            can_lose: false,
            input_timeout: Duration::from_secs(120),
            input_capacity: 32,
            event_capacity: 256,
        }
    }
}

impl BattleOptions {
    /// Sets the troop id.
    pub fn troop_id(mut self, troop_id: TroopId) -> Self {
        self.troop_id = Some(troop_id);
        self
    }

    /// Sets whether the party may run away.
    pub fn can_escape(mut self, can_escape: bool) -> Self {
        self.can_escape = can_escape;
        self
    }

    /// Sets whether a defeat is allowed.
    pub fn can_lose(mut self, can_lose: bool) -> Self {
        self.can_lose = can_lose;
        self
    }

    /// Sets how long to wait for each actor's input.
    pub fn input_timeout(mut self, input_timeout: Duration) -> Self {
        self.input_timeout = input_timeout;
        self
    }

    /// Sets the capacity of the inbound queue.
    pub fn input_capacity(mut self, input_capacity: usize) -> Self {
        self.input_capacity = input_capacity;
        self
    }

    /// Sets the capacity of the outbound queue.
    pub fn event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity;
        self
    }
}

/// All possible phases in which a battle can be.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BattlePhase {
    /// The battle hasn't run yet.
    NotStarted,
    /// The battle is running.
    Running,
    /// The battle has ended.
    Ended(BattleOutcome),
}

/// Owns the parts of the battle that change while it runs.
#[derive(Debug)]
pub struct BattleState {
    parties: Parties,
    rounds: Rounds,
    phase: BattlePhase,
    escape_ratio: f64,
}

impl BattleState {
    /// Returns both sides.
    pub fn parties(&self) -> &Parties {
        &self.parties
    }

    /// Returns the rounds manager.
    pub fn rounds(&self) -> &Rounds {
        &self.rounds
    }

    /// Returns in which phase is the battle.
    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// Returns the probability of the next escape attempt.
    pub fn escape_ratio(&self) -> f64 {
        self.escape_ratio
    }
}

/// What's left of a battle once it's over.
#[derive(Debug)]
pub struct BattleReport {
    /// How the battle ended.
    pub outcome: BattleOutcome,
    /// Rewards, only after a victory.
    pub rewards: Option<Rewards>,
    /// Number of rounds started.
    pub rounds: RoundsCount,
    /// Final values of every actor, for the caller to persist.
    pub actors: Vec<Vitals>,
    /// Every event published.
    pub history: History,
    /// System counters.
    pub metrics: Metrics,
}

impl BattleReport {
    /// Returns true if the defeat ends the game.
    pub fn game_over(&self) -> bool {
        self.history
            .iter()
            .any(|event| matches!(event, BattleEvent::BattleEnd { game_over: true, .. }))
    }
}

/// A single encounter between the party and a group of enemies.
///
/// Battles are built with a [BattleBuilder](struct.BattleBuilder.html), driven through
/// [BattleHandle](../input/struct.BattleHandle.html)s and observed by subscribing to
/// their event stream. `run` consumes the battle; once it returns the stream is closed.
pub struct Battle {
    handle: BattleHandle,
    engine: Engine,
}

impl Battle {
    /// Returns a battle builder.
    pub fn builder(
        actors: Vec<ActorSetup>,
        enemies: Vec<EnemyId>,
        data: Arc<dyn DataProvider>,
    ) -> BattleBuilder {
        BattleBuilder {
            actors,
            enemies,
            data,
            options: BattleOptions::default(),
            entropy: None,
        }
    }

    /// Returns a new handle to submit inputs and cancel the battle.
    pub fn handle(&self) -> BattleHandle {
        self.handle.clone()
    }

    /// Returns a receiver for all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventWrapper> {
        self.engine.bus.subscribe()
    }

    /// Returns the current state of the battle.
    pub fn state(&self) -> &BattleState {
        &self.engine.state
    }

    /// Returns the options of this battle.
    pub fn options(&self) -> &BattleOptions {
        &self.engine.options
    }

    /// Returns the history of this battle.
    pub fn history(&self) -> &History {
        self.engine.bus.history()
    }

    /// Returns a handle from which metrics can be read.
    pub fn metrics(&self) -> ReadMetrics {
        self.engine.metrics.read_handle()
    }

    /// Runs the battle until it ends.
    pub async fn run(self) -> BattleReport {
        // Only external handles keep the inbox open from now on.
        let Battle { handle, engine } = self;
        drop(handle);
        engine.run().await
    }
}

/// A builder object to create a battle.
pub struct BattleBuilder {
    actors: Vec<ActorSetup>,
    enemies: Vec<EnemyId>,
    data: Arc<dyn DataProvider>,
    options: BattleOptions,
    entropy: Option<Entropy>,
}

impl BattleBuilder {
    /// Sets the battle options.
    pub fn options(mut self, options: BattleOptions) -> BattleBuilder {
        self.options = options;
        self
    }

    /// Sets the source of randomness.
    pub fn entropy(mut self, entropy: Entropy) -> BattleBuilder {
        self.entropy = Some(entropy);
        self
    }

    /// Creates a new battle.
    ///
    /// Fails if an enemy template or an actor's class doesn't exist.
    pub fn build(self) -> FerretResult<Battle> {
        let data = self.data;
        let actors = self
            .actors
            .into_iter()
            .map(|setup| Battler::actor(setup, &*data))
            .collect::<FerretResult<Vec<_>>>()?;
        let enemies = self
            .enemies
            .into_iter()
            .map(|id| {
                data.enemy(id)
                    .map(Battler::enemy)
                    .ok_or(FerretError::EnemyNotFound(id))
            })
            .collect::<FerretResult<Vec<_>>>()?;
        let (handle, inbox, cancel) = channels(self.options.input_capacity, actors.len());
        let engine = Engine {
            state: BattleState {
                parties: Parties::new(actors, enemies),
                rounds: Rounds::default(),
                phase: BattlePhase::NotStarted,
                escape_ratio: BASE_ESCAPE_RATIO,
            },
            entropy: self.entropy.unwrap_or_else(default_entropy),
            bus: EventBus::new(self.options.event_capacity),
            metrics: Metrics::new(),
            options: self.options,
            data,
            inbox,
            cancel,
        };
        Ok(Battle { handle, engine })
    }
}

#[cfg(feature = "random")]
fn default_entropy() -> Entropy {
    Entropy::new(crate::rules::entropy::UniformDistribution::new(0))
}

#[cfg(not(feature = "random"))]
fn default_entropy() -> Entropy {
    Entropy::new(crate::rules::entropy::FixedAverage)
}

/// Why a round was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abort {
    Cancelled,
    Input(WaitError),
}

/// The round loop and everything it mutates.
struct Engine {
    state: BattleState,
    entropy: Entropy,
    data: Arc<dyn DataProvider>,
    options: BattleOptions,
    metrics: Metrics,
    bus: EventBus,
    inbox: Inbox,
    cancel: CancelToken,
}

impl Engine {
    async fn run(mut self) -> BattleReport {
        self.state.phase = BattlePhase::Running;
        log::info!(
            "battle started: {} actors against {} enemies (troop {:?})",
            self.state.parties.actors().len(),
            self.state.parties.enemies().len(),
            self.options.troop_id
        );
        let actors = self.state.parties.actors().iter().map(Vitals::from).collect();
        let enemies = self.state.parties.enemies().iter().map(Vitals::from).collect();
        self.publish(BattleEvent::BattleStart { actors, enemies });
        let outcome = match self.fight().await {
            Ok(outcome) => outcome,
            Err(Abort::Cancelled) => {
                log::info!("battle cancelled");
                BattleOutcome::Lost
            }
            Err(Abort::Input(reason)) => {
                log::warn!("battle aborted while waiting for input: {:?}", reason);
                BattleOutcome::Lost
            }
        };
        self.finish(outcome)
    }

    /// Plays rounds until the battle is decided.
    async fn fight(&mut self) -> Result<BattleOutcome, Abort> {
        if let Some(outcome) = self.conclusion() {
            return Ok(outcome);
        }
        loop {
            if self.cancel.is_cancelled() {
                return Err(Abort::Cancelled);
            }
            let round = self.state.rounds.begin();
            self.metrics.write_handle().increment(ROUNDS_STARTED);
            log::debug!("round {} started", round);
            for battler in self.state.parties.iter_mut() {
                battler.set_guarding(false);
                battler.clear_action();
            }
            self.collect_actions(round).await?;
            let order = order_for_round(&self.state.parties, &mut self.entropy);
            self.publish(BattleEvent::TurnStart {
                round,
                order: order.clone(),
            });
            for subject in order {
                if let Some(outcome) = self.act(subject) {
                    return Ok(outcome);
                }
            }
            self.end_round(round);
            self.inbox.clear();
            if let Some(outcome) = self.conclusion() {
                return Ok(outcome);
            }
            // Rounds where nobody waits for input never suspend otherwise.
            tokio::task::yield_now().await;
        }
    }

    /// Asks every mobile actor for input, then lets the AI decide for the enemies.
    async fn collect_actions(&mut self, round: RoundsCount) -> Result<(), Abort> {
        for index in 0..self.state.parties.actors().len() {
            if !self.state.parties.actors()[index].can_move() {
                continue;
            }
            self.publish(BattleEvent::InputRequest {
                round,
                actor: index,
            });
            let timeout = self.options.input_timeout;
            let started = Instant::now();
            let received = self.inbox.wait_for(index, timeout, &mut self.cancel).await;
            self.metrics
                .write_handle()
                .add_time(INPUT_WAIT, started.elapsed());
            match received {
                Ok(action) => {
                    if let Some(actor) = self.state.parties.get_mut(BattlerRef::actor(index)) {
                        actor.set_action(action);
                    }
                }
                Err(WaitError::Cancelled) => return Err(Abort::Cancelled),
                Err(reason) => {
                    if reason == WaitError::TimedOut {
                        self.metrics.write_handle().increment(INPUTS_TIMED_OUT);
                    }
                    return Err(Abort::Input(reason));
                }
            }
        }
        for position in self.state.parties.alive(Side::Enemies) {
            let mobile = self
                .state
                .parties
                .get(position)
                .map_or(false, Battler::can_move);
            if !mobile {
                continue;
            }
            let action = make_action(
                &self.state.parties,
                position,
                round,
                &*self.data,
                &mut self.entropy,
            );
            if let Some(enemy) = self.state.parties.get_mut(position) {
                enemy.set_action(action);
            }
        }
        Ok(())
    }

    /// Executes the action of `subject`. Returns the outcome if the battle is over.
    fn act(&mut self, subject: BattlerRef) -> Option<BattleOutcome> {
        let action = match self.state.parties.get(subject) {
            Some(battler) if battler.can_move() => battler.action().cloned()?,
            _ => return None,
        };
        if action.kind == ActionKind::Escape {
            if self.try_escape() {
                return Some(BattleOutcome::Escaped);
            }
            return None;
        }
        let outcomes = process_action(
            &mut self.state.parties,
            subject,
            &action,
            &*self.data,
            &mut self.entropy,
            &mut self.metrics.write_handle(),
        );
        self.publish(BattleEvent::ActionResult {
            subject,
            action,
            outcomes,
        });
        if let Some(battler) = self.state.parties.get_mut(subject) {
            battler.tick_states(AutoRemoval::ActionEnd);
        }
        self.apply_deaths();
        self.conclusion()
    }

    fn try_escape(&mut self) -> bool {
        self.metrics.write_handle().increment(ESCAPE_ATTEMPTS);
        if !self.options.can_escape {
            log::debug!("escape attempt in an inescapable battle");
            return false;
        }
        if self.entropy.chance(self.state.escape_ratio) {
            log::info!("party escaped");
            true
        } else {
            self.state.escape_ratio += ESCAPE_RATIO_STEP;
            log::debug!("escape failed, ratio now {}", self.state.escape_ratio);
            false
        }
    }

    /// Applies regeneration and advances turn-end timers.
    fn end_round(&mut self, round: RoundsCount) {
        let mut regen = Vec::new();
        let mut expired_states = Vec::new();
        let mut expired_buffs = Vec::new();
        for battler in self.state.parties.iter_mut() {
            if battler.is_dead() {
                continue;
            }
            let delta = battler.regenerate();
            if !delta.is_empty() {
                regen.push(RegenDelta {
                    battler: battler.position(),
                    delta,
                });
            }
            let states = battler.tick_states(AutoRemoval::TurnEnd);
            if !states.is_empty() {
                expired_states.push(ExpiredStates {
                    battler: battler.position(),
                    states,
                });
            }
            let params = battler.tick_buffs();
            if !params.is_empty() {
                expired_buffs.push(ExpiredBuffs {
                    battler: battler.position(),
                    params,
                });
            }
        }
        self.apply_deaths();
        self.publish(BattleEvent::TurnEnd {
            round,
            regen,
            expired_states,
            expired_buffs,
        });
    }

    /// Knocks out every battler left with zero hit points.
    fn apply_deaths(&mut self) {
        let data = &*self.data;
        for battler in self.state.parties.iter_mut() {
            if battler.hp() == 0 && !battler.has_state(DEATH_STATE_ID) {
                log::debug!("{} is knocked out", battler.position());
                battler.die(data);
            }
        }
    }

    /// Victory is checked before defeat.
    fn conclusion(&self) -> Option<BattleOutcome> {
        if self.state.parties.all_dead(Side::Enemies) {
            Some(BattleOutcome::Won)
        } else if self.state.parties.all_dead(Side::Actors) {
            Some(BattleOutcome::Lost)
        } else {
            None
        }
    }

    fn rewards(&mut self) -> Rewards {
        let mut rewards = Rewards::default();
        let mut experience = 0u32;
        for enemy in self.state.parties.enemies() {
            if let BattlerKind::Enemy(profile) = enemy.kind() {
                experience = experience.saturating_add(profile.exp);
                rewards.gold = rewards.gold.saturating_add(profile.gold);
                rewards
                    .drops
                    .extend(roll_drops(&profile.drops, &mut self.entropy));
            }
        }
        let survivors = self.state.parties.alive(Side::Actors);
        let share = split_experience(experience, survivors.len());
        rewards.experience = survivors
            .into_iter()
            .map(|position| (position.index, share))
            .collect();
        rewards
    }

    fn finish(mut self, outcome: BattleOutcome) -> BattleReport {
        let rewards = if outcome == BattleOutcome::Won {
            Some(self.rewards())
        } else {
            None
        };
        let game_over = outcome == BattleOutcome::Lost && !self.options.can_lose;
        log::info!(
            "battle ended after {} rounds: {:?}",
            self.state.rounds.current(),
            outcome
        );
        self.publish(BattleEvent::BattleEnd {
            outcome,
            rewards: rewards.clone(),
            game_over,
        });
        self.state.phase = BattlePhase::Ended(outcome);
        BattleReport {
            outcome,
            rewards,
            rounds: self.state.rounds.current(),
            actors: self
                .state
                .parties
                .actors()
                .iter()
                .map(Vitals::from)
                .collect(),
            history: self.bus.close(),
            metrics: self.metrics,
        }
    }

    fn publish(&mut self, event: BattleEvent) {
        self.bus.publish(event, &mut self.metrics.write_handle());
    }
}
