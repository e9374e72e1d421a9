//! Rewards granted at the end of a won battle.

use crate::data::DropItem;
use crate::entropy::Entropy;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Highest multiplier of the party experience bonus.
pub const MAX_PARTY_BONUS: f64 = 1.4;

/// Experience bonus granted for each survivor after the first.
pub const PARTY_BONUS_STEP: f64 = 0.1;

/// Everything the caller should grant after a victory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Rewards {
    /// Experience for each surviving actor, as `(actor index, amount)`.
    pub experience: Vec<(usize, u32)>,
    /// Total gold.
    pub gold: u32,
    /// Objects dropped.
    pub drops: Vec<DropItem>,
}

/// Rolls every slot of a drop table independently.
///
/// A slot with denominator `d` drops with probability `1 / d`. Slots with `d == 0` never drop.
pub fn roll_drops(table: &[DropItem], entropy: &mut Entropy) -> Vec<DropItem> {
    table
        .iter()
        .filter(|slot| slot.denominator > 0)
        .filter(|slot| entropy.chance(1.0 / f64::from(slot.denominator)))
        .copied()
        .collect()
}

/// Splits `total` experience among `survivors` actors.
///
/// Each survivor gets `floor(total * bonus / n)`, with a party bonus of ten percent per
/// additional member capped at `MAX_PARTY_BONUS`, and never less than one point.
pub fn split_experience(total: u32, survivors: usize) -> u32 {
    if survivors == 0 {
        return 0;
    }
    let n = survivors as f64;
    let bonus = (1.0 + PARTY_BONUS_STEP * (n - 1.0)).min(MAX_PARTY_BONUS);
    let share = (f64::from(total) * bonus / n).floor() as u32;
    share.max(1)
}

/// Experience needed to go from `level` to the next one.
pub fn exp_for_next_level(level: u32) -> u32 {
    let level = u64::from(level);
    let exp = level.saturating_sub(1).saturating_mul(level).saturating_mul(10);
    exp.saturating_add(30 * level).min(u64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_bonus_is_capped() {
        assert_eq!(split_experience(100, 0), 0);
        assert_eq!(split_experience(100, 1), 100);
        assert_eq!(split_experience(100, 2), 55);
        // 1.4 cap reached with five members.
        assert_eq!(split_experience(100, 5), 28);
        assert_eq!(split_experience(100, 8), 17);
        assert_eq!(split_experience(0, 3), 1);
    }

    #[test]
    fn level_curve() {
        assert_eq!(exp_for_next_level(1), 30);
        assert_eq!(exp_for_next_level(2), 80);
        assert_eq!(exp_for_next_level(10), 1200);
    }
}
