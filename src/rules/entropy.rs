//! Predefined rules for entropy.

use crate::entropy::EntropyRules;
#[cfg(feature = "random")]
use rand::{Rng, SeedableRng};
#[cfg(feature = "random")]
use rand_pcg::Lcg64Xsh32;

/// A deterministic rule that always returns the lowest value.
///
/// Every probability check succeeds and every range yields its lower bound.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedLow;

impl EntropyRules for FixedLow {
    fn next_unit(&mut self) -> f64 {
        0.0
    }
}

/// A deterministic rule that always generates an average result.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedAverage;

impl EntropyRules for FixedAverage {
    fn next_unit(&mut self) -> f64 {
        0.5
    }
}

/// A deterministic rule that always returns the highest value.
///
/// Every probability check below certainty fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedHigh;

impl EntropyRules for FixedHigh {
    fn next_unit(&mut self) -> f64 {
        1.0 - f64::EPSILON
    }
}

/// Replays a fixed list of unit values, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct Sequence {
    values: Vec<f64>,
    cursor: usize,
}

impl Sequence {
    /// Creates a new sequence. An empty list behaves like `FixedLow`.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl EntropyRules for Sequence {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

/// Generate random numbers with uniform distribution.
/// It uses a seedable pseudo random number generator with deterministic output.
///
/// A seed is required to ensure a good level of entropy.
#[cfg(feature = "random")]
#[derive(Debug, Clone)]
pub struct UniformDistribution {
    model: Lcg64Xsh32,
}

#[cfg(feature = "random")]
impl UniformDistribution {
    /// Creates a new generator from the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            model: Lcg64Xsh32::seed_from_u64(seed),
        }
    }
}

#[cfg(feature = "random")]
impl EntropyRules for UniformDistribution {
    fn next_unit(&mut self) -> f64 {
        self.model.gen::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_cycles() {
        let mut rule = Sequence::new(vec![0.1, 0.9]);
        assert_eq!(rule.next_unit(), 0.1);
        assert_eq!(rule.next_unit(), 0.9);
        assert_eq!(rule.next_unit(), 0.1);
        assert_eq!(Sequence::new(Vec::new()).next_unit(), 0.0);
    }

    #[cfg(feature = "random")]
    #[test]
    fn uniform_distribution() {
        let seed = 1_204_678_643_940_597_513;
        let first = UniformDistribution::new(seed).next_unit();
        for _ in 0..2 {
            let mut rule = UniformDistribution::new(seed);
            let value = rule.next_unit();
            assert_eq!(value, first);
            assert!((0.0..1.0).contains(&value));
        }
    }
}
