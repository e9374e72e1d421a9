//! Action selection for enemies.

use crate::action::{Action, ActionKind};
use crate::battler::{Battler, BattlerKind};
use crate::data::{ActionPattern, Condition, DataProvider, ATTACK_ABILITY_ID};
use crate::entropy::Entropy;
use crate::round::RoundsCount;
use crate::target::{resolve_targets, scope_side};
use crate::team::{BattlerRef, Parties};

/// Only patterns rated within this distance from the best one are considered.
pub const RATING_WINDOW: i32 = 2;

/// Returns true if `condition` holds for `battler` during `round` (1-based).
pub fn condition_met(condition: &Condition, battler: &Battler, round: RoundsCount) -> bool {
    match *condition {
        Condition::Always | Condition::Other { .. } => true,
        Condition::Turn { start, every } => {
            if every == 0 {
                round == start
            } else {
                round >= start && (round - start) % every == 0
            }
        }
        Condition::HpRatio { min, max } => {
            let rate = battler.hp_rate();
            min <= rate && rate <= max
        }
        Condition::MpRatio { min, max } => {
            let rate = battler.mp_rate();
            min <= rate && rate <= max
        }
        Condition::HasState(state) => battler.has_state(state),
    }
}

/// Returns the action patterns `battler` could use right now.
pub fn candidates<'a>(
    battler: &'a Battler,
    round: RoundsCount,
    data: &dyn DataProvider,
) -> Vec<&'a ActionPattern> {
    let patterns = match battler.kind() {
        BattlerKind::Enemy(profile) => &profile.actions,
        BattlerKind::Actor(_) => return Vec::new(),
    };
    patterns
        .iter()
        .filter(|pattern| match data.ability(pattern.ability) {
            Some(ability) => battler.can_pay(ability),
            None => false,
        })
        .filter(|pattern| condition_met(&pattern.condition, battler, round))
        .collect()
}

/// Picks one pattern by cumulative roulette among the best rated ones.
///
/// Patterns rated below `best - 2` are discarded; the others weigh
/// `max(1, rating - (best - 3))`.
pub fn select_pattern<'a>(
    candidates: &[&'a ActionPattern],
    entropy: &mut Entropy,
) -> Option<&'a ActionPattern> {
    let best = candidates.iter().map(|pattern| pattern.rating).max()?;
    let mut pool: Vec<&ActionPattern> = candidates
        .iter()
        .copied()
        .filter(|pattern| pattern.rating >= best - RATING_WINDOW)
        .collect();
    if pool.is_empty() {
        pool = candidates.to_vec();
    }
    let base = best - (RATING_WINDOW + 1);
    let weights: Vec<i64> = pool
        .iter()
        .map(|pattern| i64::from((pattern.rating - base).max(1)))
        .collect();
    let total: i64 = weights.iter().sum();
    let mut roll = entropy.generate_int(0, total);
    for (pattern, weight) in pool.iter().zip(weights) {
        if roll < weight {
            return Some(*pattern);
        }
        roll -= weight;
    }
    pool.last().copied()
}

/// Decides the action of the enemy at `position` for the given round.
///
/// Without usable patterns the enemy attacks a random living opponent.
pub fn make_action(
    parties: &Parties,
    position: BattlerRef,
    round: RoundsCount,
    data: &dyn DataProvider,
    entropy: &mut Entropy,
) -> Action {
    let battler = match parties.get(position) {
        Some(battler) => battler,
        None => return Action::attack(),
    };
    let candidates = candidates(battler, round, data);
    let (kind, scope) = match select_pattern(&candidates, entropy) {
        Some(pattern) => {
            let kind = if pattern.ability == ATTACK_ABILITY_ID {
                ActionKind::Attack
            } else {
                ActionKind::Skill(pattern.ability)
            };
            // Candidates always refer to existing abilities.
            let scope = data.ability(pattern.ability).map(|ability| ability.usage.scope);
            (kind, scope)
        }
        None => {
            log::debug!("{} has no usable pattern, falling back to attack", position);
            let opponents = parties.alive(position.side.opposite());
            if opponents.is_empty() {
                return Action::attack();
            }
            let target = opponents[entropy.index(opponents.len())];
            return Action::attack().targeting(target.side, vec![target.index]);
        }
    };
    let action = Action::new(kind);
    let scope = match scope {
        Some(scope) => scope,
        None => return action,
    };
    let targets = resolve_targets(parties, position, scope, &action, entropy);
    if targets.is_empty() {
        return action;
    }
    action.targeting(
        scope_side(position, scope),
        targets.into_iter().map(|target| target.index),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::entropy::Sequence;

    fn pattern(ability: u32, rating: i32) -> ActionPattern {
        ActionPattern {
            ability,
            rating,
            condition: Condition::Always,
        }
    }

    #[test]
    fn low_ratings_are_discarded() {
        let patterns = vec![pattern(1, 9), pattern(2, 6), pattern(3, 7)];
        let candidates: Vec<_> = patterns.iter().collect();
        // Weights: 9 -> 3, 7 -> 1. Total 4, rolls map to [0, 3) and [3, 4).
        let mut entropy = Entropy::new(Sequence::new(vec![0.0, 0.7, 0.8]));
        assert_eq!(select_pattern(&candidates, &mut entropy).map(|p| p.ability), Some(1));
        assert_eq!(select_pattern(&candidates, &mut entropy).map(|p| p.ability), Some(1));
        assert_eq!(select_pattern(&candidates, &mut entropy).map(|p| p.ability), Some(3));
    }

    #[test]
    fn empty_candidates() {
        let mut entropy = Entropy::new(Sequence::new(vec![0.5]));
        assert!(select_pattern(&[], &mut entropy).is_none());
    }
}
