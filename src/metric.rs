//! Metrics for battles.

use crate::error::{FerretError, FerretResult};
use std::collections::HashMap;
use std::time::Duration;

/// Storage of every metric recorded by a battle.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    map: HashMap<SystemMetricId, Metric>,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Returns a handle to read metrics.
    pub fn read_handle(&self) -> ReadMetrics {
        ReadMetrics { metrics: self }
    }

    /// Returns a handle to write metrics.
    pub fn write_handle(&mut self) -> WriteMetrics {
        WriteMetrics { metrics: self }
    }
}

/// Alias for system metrics id.
pub type SystemMetricId = u16;

/// A single measurement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Metric {
    /// Number of occurrences.
    Counter(u64),
    /// Accumulated time, in seconds.
    Seconds(f64),
}

/// Read access to metrics.
pub struct ReadMetrics<'a> {
    metrics: &'a Metrics,
}

impl<'a> ReadMetrics<'a> {
    /// Returns the metric with the given id, if it was ever written.
    pub fn get(&self, id: SystemMetricId) -> Option<Metric> {
        self.metrics.map.get(&id).copied()
    }

    /// Returns the value of a counter. Missing counters are zero.
    pub fn count(&self, id: SystemMetricId) -> u64 {
        match self.get(id) {
            Some(Metric::Counter(value)) => value,
            _ => 0,
        }
    }

    /// Returns the value of a timer, in seconds. Missing timers are zero.
    pub fn seconds(&self, id: SystemMetricId) -> f64 {
        match self.get(id) {
            Some(Metric::Seconds(value)) => value,
            _ => 0.0,
        }
    }
}

/// Write access to metrics.
pub struct WriteMetrics<'a> {
    metrics: &'a mut Metrics,
}

impl<'a> WriteMetrics<'a> {
    /// Merges `value` into the metric with the given `id`, creating it if needed.
    ///
    /// Returns an error if the metric exists with a different type.
    pub(crate) fn add(&mut self, id: SystemMetricId, value: Metric) -> FerretResult<()> {
        match (self.metrics.map.get_mut(&id), value) {
            (None, value) => {
                self.metrics.map.insert(id, value);
                Ok(())
            }
            (Some(Metric::Counter(total)), Metric::Counter(value)) => {
                *total = total.saturating_add(value);
                Ok(())
            }
            (Some(Metric::Seconds(total)), Metric::Seconds(value)) => {
                *total += value;
                Ok(())
            }
            _ => Err(FerretError::WrongMetricType(id)),
        }
    }

    /// Increments one of the counters in `system` by one.
    pub(crate) fn increment(&mut self, id: SystemMetricId) {
        self.add(id, Metric::Counter(1))
            .unwrap_or_else(|err| panic!("constraint violated: {:?}", err));
    }

    /// Adds `elapsed` to one of the timers in `system`.
    pub(crate) fn add_time(&mut self, id: SystemMetricId, elapsed: Duration) {
        self.add(id, Metric::Seconds(elapsed.as_secs_f64()))
            .unwrap_or_else(|err| panic!("constraint violated: {:?}", err));
    }
}

pub mod system {
    //! Contains the id of all system metrics.
    use super::*;

    /// Number of rounds started.
    pub const ROUNDS_STARTED: SystemMetricId = 0;
    /// Number of actions run through the action processor.
    pub const ACTIONS_RESOLVED: SystemMetricId = 1;
    /// Number of input waits that ran out of time.
    pub const INPUTS_TIMED_OUT: SystemMetricId = 2;
    /// Number of events evicted from the outbound queue before every observer read them.
    pub const EVENTS_DROPPED: SystemMetricId = 3;
    /// Number of escape attempts.
    pub const ESCAPE_ATTEMPTS: SystemMetricId = 4;
    /// Number of damage formulas replaced by the default one.
    pub const FORMULA_FALLBACKS: SystemMetricId = 5;
    /// Time spent waiting for player input.
    pub const INPUT_WAIT: SystemMetricId = 6;
}
