//! Resolution of the targets of an action.

use crate::action::Action;
use crate::data::{SParam, Scope};
use crate::entropy::Entropy;
use crate::team::{BattlerRef, Parties, Side};

/// Returns the side a scope points at, relative to `subject`.
pub fn scope_side(subject: BattlerRef, scope: Scope) -> Side {
    if scope.is_for_opponent() {
        subject.side.opposite()
    } else {
        subject.side
    }
}

/// Computes the targets of an action.
///
/// Explicit targets in `action` take priority, as long as they point at the side given
/// by the scope and are alive (dead for scopes meant for dead allies). Single target
/// scopes only keep the first valid explicit target. Without valid explicit targets the
/// scope alone decides; random opponents are weighted by their target rate.
pub fn resolve_targets(
    parties: &Parties,
    subject: BattlerRef,
    scope: Scope,
    action: &Action,
    entropy: &mut Entropy,
) -> Vec<BattlerRef> {
    match scope {
        Scope::None => return Vec::new(),
        Scope::User => return vec![subject],
        _ => {}
    }
    let explicit = explicit_targets(parties, subject, scope, action);
    if !explicit.is_empty() {
        return match scope {
            Scope::Opponent | Scope::Ally | Scope::DeadAlly => explicit[..1].to_vec(),
            _ => explicit,
        };
    }
    let side = scope_side(subject, scope);
    match scope {
        Scope::Opponent => random_weighted(parties, parties.alive(side), 1, entropy),
        Scope::RandomOpponents(count) => {
            random_weighted(parties, parties.alive(side), count as usize, entropy)
        }
        Scope::AllOpponents | Scope::AllAllies => parties.alive(side),
        Scope::Ally => random_uniform(parties.alive(side), entropy),
        Scope::DeadAlly => random_uniform(parties.dead(side), entropy),
        Scope::AllDeadAllies => parties.dead(side),
        Scope::None | Scope::User => Vec::new(),
    }
}

fn explicit_targets(
    parties: &Parties,
    subject: BattlerRef,
    scope: Scope,
    action: &Action,
) -> Vec<BattlerRef> {
    let side = scope_side(subject, scope);
    if action.target_side.map_or(false, |s| s != side) {
        return Vec::new();
    }
    action
        .targets
        .iter()
        .map(|&index| BattlerRef { side, index })
        .filter(|&target| match parties.get(target) {
            Some(battler) if scope.is_for_dead() => battler.is_dead(),
            Some(battler) => battler.is_alive(),
            None => false,
        })
        .collect()
}

fn random_uniform(candidates: Vec<BattlerRef>, entropy: &mut Entropy) -> Vec<BattlerRef> {
    if candidates.is_empty() {
        return candidates;
    }
    vec![candidates[entropy.index(candidates.len())]]
}

/// Draws `count` targets with replacement, weighted by target rate.
fn random_weighted(
    parties: &Parties,
    candidates: Vec<BattlerRef>,
    count: usize,
    entropy: &mut Entropy,
) -> Vec<BattlerRef> {
    if candidates.is_empty() {
        return candidates;
    }
    let weights: Vec<f64> = candidates
        .iter()
        .map(|&target| {
            parties
                .get(target)
                .map_or(0.0, |battler| battler.sparam(SParam::TargetRate).max(0.0))
        })
        .collect();
    let total: f64 = weights.iter().sum();
    (0..count)
        .map(|_| {
            if total <= 0.0 {
                return candidates[entropy.index(candidates.len())];
            }
            let mut roll = entropy.unit() * total;
            for (target, weight) in candidates.iter().zip(&weights) {
                if roll < *weight {
                    return *target;
                }
                roll -= weight;
            }
            candidates[candidates.len() - 1]
        })
        .collect()
}
