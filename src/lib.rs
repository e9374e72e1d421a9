#![deny(missing_docs)]
#![doc(test(attr(warn(warnings))))]

//!
//! ferret is a server-authoritative battle system for turn-based role-playing games.
//!
//! * Data-driven combatants: abilities, items, enemies, states and classes come from tables.
//! * Classic damage mathematics, with damage formulas written in a small expression language.
//! * Live player input under timeout, while enemies are driven by a rating based AI.
//! * Every battle event is archived in a replayable timeline and broadcast to observers.
//!
//! ## Examples
//!
//! ```
//! use ferret::data::{Class, EnemyTemplate};
//! use ferret::rules::database::Database;
//! use ferret::{ActorSetup, Battle, BattlePhase};
//! use std::sync::Arc;
//!
//! let data = Database::new()
//!     .with_class(Class { id: 1, name: "Knight".into(), traits: vec![] })
//!     .with_enemy(EnemyTemplate {
//!         id: 1,
//!         name: "Slime".into(),
//!         level: 1,
//!         params: [50, 0, 10, 10, 10, 10, 10, 10],
//!         traits: vec![],
//!         actions: vec![],
//!         drops: vec![],
//!         exp: 10,
//!         gold: 5,
//!     });
//! let hero = ActorSetup {
//!     actor_id: 1,
//!     name: "Hero".into(),
//!     class_id: 1,
//!     level: 1,
//!     params: [100, 20, 15, 10, 10, 10, 12, 10],
//!     equip_bonus: [0; 8],
//!     traits: vec![],
//!     equip_traits: vec![],
//!     abilities: vec![],
//!     hp: 100,
//!     mp: 20,
//!     tp: 0,
//! };
//!
//! let battle = Battle::builder(vec![hero], vec![1], Arc::new(data)).build().unwrap();
//! assert_eq!(battle.state().phase(), BattlePhase::NotStarted);
//! assert_eq!(battle.state().parties().enemies()[0].hp(), 50);
//! ```
//!
//! ## How does it work?
//!
//! A `Battle` is built from plain actor values, enemy template ids and a `DataProvider`.
//! Calling `run` consumes it and plays rounds on the current tokio task until one side
//! wins, the party escapes or the battle is cancelled.\
//! Callers interact with a running battle through two channels:
//!
//! - a `BattleHandle`, to submit actions on behalf of actors and to cancel the battle;
//! - a broadcast receiver obtained with `subscribe`, carrying every `BattleEvent`.
//!
//! When `run` returns, the `BattleReport` contains the outcome, the rewards, the final
//! values of each actor and the full history of events.
//!
//! ## Randomness
//!
//! Every stochastic decision draws from a single `Entropy`, injected at build time.
//! Two battles with the same entropy rules and the same inputs produce the same history.
//!
//! ## Metrics
//!
//! There's a built-in storage of system counters and timers, readable through `ReadMetrics`.
//!
//! # Optional Features
//!
//! The following optional features are available:
//!
//! - `random`: enables built-in entropy rules that use a pseudorandom number generator.
//! - `serialization`: enables serialization and deserialization of data records and events.

pub mod action;
pub use crate::action::{Action, ActionInput, ActionKind, ActionOutcome};

pub mod ai;

pub mod battle;
pub use crate::battle::{
    Battle, BattleBuilder, BattleOptions, BattlePhase, BattleReport, BattleState,
};

pub mod battler;
pub use crate::battler::{ActorSetup, Battler, BattlerKind};

pub mod buff;

pub mod data;
pub use crate::data::DataProvider;

pub mod entropy;
pub use crate::entropy::{Entropy, EntropyRules};

pub mod error;
pub use crate::error::{FerretError, FerretResult, FormulaError, FormulaResult};

pub mod event;
pub use crate::event::{BattleEvent, BattleOutcome, EventId, EventWrapper, Vitals};

pub mod fight;

pub mod formula;
pub use crate::formula::{evaluate, CharacterStats, Formula};

pub mod history;
pub use crate::history::History;

pub mod input;
pub use crate::input::BattleHandle;

pub mod loot;
pub use crate::loot::Rewards;

pub mod metric;
pub use crate::metric::{ReadMetrics, SystemMetricId};

pub mod round;
pub use crate::round::RoundsCount;

pub mod rules;

pub mod status;

pub mod target;

pub mod team;
pub use crate::team::{BattlerRef, Parties, Side};
