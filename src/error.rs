//! Error and Result module.

use crate::data::{ClassId, EnemyId};
use crate::event::EventId;
use crate::metric::SystemMetricId;
use thiserror::Error;

/// Error type for all fallible operations of ferret.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FerretError {
    /// A damage formula could not be evaluated.
    #[error(transparent)]
    Formula(#[from] FormulaError),
    /// The data provider has no enemy template with the given id.
    #[error("enemy template {0} not found")]
    EnemyNotFound(EnemyId),
    /// The data provider has no class with the given id.
    #[error("class {0} not found")]
    ClassNotFound(ClassId),
    /// The inbound queue is full: the submission has been dropped.
    #[error("input queue is full, submission dropped")]
    InputQueueFull,
    /// The battle is over and no longer accepts input.
    #[error("battle is no longer accepting input")]
    BattleClosed,
    /// An event id doesn't follow the last one in the history.
    #[error("event id {0} is not contiguous, expected {1}")]
    NonContiguousEventId(EventId, EventId),
    /// A metric exists with a different type.
    #[error("metric {0} has a different type")]
    WrongMetricType(SystemMetricId),
}

/// Errors produced while parsing or evaluating a damage formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// The expression uses syntax, a field or a function outside the formula language.
    #[error("parse error at {position}: {message}")]
    Parse {
        /// Byte offset of the offending token.
        position: usize,
        /// Description of the problem.
        message: String,
    },
    /// The expression divided by zero.
    #[error("division by zero")]
    DivisionByZero,
}

impl FormulaError {
    pub(crate) fn parse<S: Into<String>>(position: usize, message: S) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Returns true if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Alias for a `Result` returning a `FerretError`.
pub type FerretResult<T> = Result<T, FerretError>;

/// Alias for a `Result` returning a `FormulaError`.
pub type FormulaResult<T> = Result<T, FormulaError>;
