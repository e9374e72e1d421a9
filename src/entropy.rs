//! Entropy module: the single source of randomness of a battle.

use std::fmt::{Debug, Formatter, Result};

/// Rules to generate the raw randomness consumed by a battle.
///
/// Every stochastic decision (hit rolls, variance, AI selection, turn order, loot) draws
/// from one implementation of this trait, injected at construction. Two battles built with
/// equal rules and equal inputs always produce the same outcome.
pub trait EntropyRules: Send {
    /// Returns a value in the half-open range `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Wrapper around the `EntropyRules` in use, exposing the helpers the battle system needs.
pub struct Entropy {
    rules: Box<dyn EntropyRules>,
}

impl Entropy {
    /// Creates a new entropy source from the given rules.
    pub fn new<E: EntropyRules + 'static>(rules: E) -> Self {
        Self {
            rules: Box::new(rules),
        }
    }

    /// Returns a float uniformly distributed in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        let value = self.rules.next_unit();
        if value.is_nan() {
            0.0
        } else {
            num_traits::clamp(value, 0.0, ONE_MINUS_EPSILON)
        }
    }

    /// Generates a float within the half-open range `[low, high)`.
    pub fn generate_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.unit()
    }

    /// Generates an integer within the half-open range `[low, high)`.
    ///
    /// Returns `low` when the range is empty.
    pub fn generate_int(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        let span = (high - low) as f64;
        low + ((span * self.unit()).floor() as i64).min(high - low - 1)
    }

    /// Returns an index within `[0, len)`. `len` must be greater than zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.generate_int(0, len as i64) as usize
    }

    /// Returns true with the given probability.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.unit() < probability
    }
}

const ONE_MINUS_EPSILON: f64 = 1.0 - f64::EPSILON;

impl Debug for Entropy {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "Entropy {{ .. }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::entropy::{FixedAverage, FixedHigh, FixedLow};

    #[test]
    fn generate_int_bounds() {
        let mut low = Entropy::new(FixedLow);
        assert_eq!(low.generate_int(2, 12), 2);
        let mut high = Entropy::new(FixedHigh);
        assert_eq!(high.generate_int(2, 12), 11);
        let mut average = Entropy::new(FixedAverage);
        assert_eq!(average.generate_int(2, 12), 7);
        assert_eq!(average.generate_int(4, 3), 4);
    }

    #[test]
    fn chance_edges() {
        let mut low = Entropy::new(FixedLow);
        assert!(low.chance(0.01));
        assert!(!low.chance(0.0));
        let mut high = Entropy::new(FixedHigh);
        assert!(!high.chance(0.99));
        assert!(high.chance(1.0));
    }
}
