//! Everything related to the battle's turns and rounds.

use crate::battler::Battler;
use crate::data::Param;
use crate::entropy::Entropy;
use crate::team::{BattlerRef, Parties};

/// Type for counting the number of rounds.
pub type RoundsCount = u32;

/// Keeps track of the battle's rounds.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Rounds {
    rounds: RoundsCount,
}

impl Rounds {
    /// Returns the current round, starting from 1. Zero before the first round.
    pub fn current(&self) -> RoundsCount {
        self.rounds
    }

    /// Starts a new round and returns its number.
    pub(crate) fn begin(&mut self) -> RoundsCount {
        self.rounds += 1;
        self.rounds
    }
}

/// Computes the speed of a battler for one round: its agility plus a random bonus
/// in `[0, max(1, 5 + agi / 4))`.
pub fn speed(battler: &Battler, entropy: &mut Entropy) -> i64 {
    let agi = i64::from(battler.param(Param::Agi));
    agi + entropy.generate_int(0, (5 + agi / 4).max(1))
}

/// Returns the order of acting for a round.
///
/// Dead and immobile battlers are excluded. Battlers are sorted by descending speed;
/// ties keep actors before enemies and lower indices first.
pub fn order_for_round(parties: &Parties, entropy: &mut Entropy) -> Vec<BattlerRef> {
    let mut speeds: Vec<(BattlerRef, i64)> = parties
        .iter()
        .filter(|battler| battler.can_move())
        .map(|battler| (battler.position(), speed(battler, entropy)))
        .collect();
    speeds.sort_by(|a, b| b.1.cmp(&a.1));
    speeds.into_iter().map(|(position, _)| position).collect()
}
