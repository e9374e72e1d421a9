//! Module to handle combat.
//!
//! The action processor takes a battler's action and computes its consequences: hit
//! checks, damage, healing, drains and secondary effects. It mutates the parties and
//! returns one [ActionOutcome](../action/struct.ActionOutcome.html) for each target.

use crate::action::{Action, ActionKind, ActionOutcome};
use crate::battler::Battler;
use crate::data::{
    AutoRemoval, DamageSpec, DamageType, DataProvider, Effect, ElementSource, HitType, SParam,
    Usage, XParam, ATTACK_ABILITY_ID, DEATH_STATE_ID,
};
use crate::entropy::Entropy;
use crate::formula::{default_damage, evaluate};
use crate::metric::system::{ACTIONS_RESOLVED, FORMULA_FALLBACKS};
use crate::metric::WriteMetrics;
use crate::status::INDEFINITE;
use crate::target::resolve_targets;
use crate::team::{BattlerRef, Parties};

/// Multiplier of critical hits.
pub const CRITICAL_MULTIPLIER: f64 = 3.0;

/// What an action uses.
struct Source<'a> {
    usage: &'a Usage,
    repeats: u32,
    item: bool,
}

/// Executes `action` on behalf of `subject` and returns its outcomes.
///
/// Guarding, escaping, unknown ids, abilities the subject doesn't know and unaffordable
/// abilities produce no outcomes.
pub fn process_action(
    parties: &mut Parties,
    subject: BattlerRef,
    action: &Action,
    data: &dyn DataProvider,
    entropy: &mut Entropy,
    metrics: &mut WriteMetrics,
) -> Vec<ActionOutcome> {
    let user = match parties.get_mut(subject) {
        Some(battler) if battler.is_alive() => battler,
        _ => return Vec::new(),
    };
    metrics.increment(ACTIONS_RESOLVED);
    let source = match action.kind {
        ActionKind::Guard => {
            user.set_guarding(true);
            return Vec::new();
        }
        ActionKind::Escape => return Vec::new(),
        ActionKind::Attack | ActionKind::Skill(_) => {
            let id = match action.kind {
                ActionKind::Skill(id) => id,
                _ => ATTACK_ABILITY_ID,
            };
            let ability = match data.ability(id) {
                Some(ability) => ability,
                None => {
                    log::debug!("{} uses unknown ability {}", subject, id);
                    return Vec::new();
                }
            };
            if !user.knows(id) {
                log::debug!("{} doesn't know {}", subject, ability.name);
                return Vec::new();
            }
            if !user.can_pay(ability) {
                log::debug!("{} can't pay for {}", subject, ability.name);
                return Vec::new();
            }
            user.pay(ability);
            Source {
                usage: &ability.usage,
                repeats: ability.repeats.max(1),
                item: false,
            }
        }
        ActionKind::Item(id) => match data.item(id) {
            Some(item) => Source {
                usage: &item.usage,
                repeats: 1,
                item: true,
            },
            None => {
                log::debug!("{} uses unknown item {}", subject, id);
                return Vec::new();
            }
        },
    };
    let targets = resolve_targets(parties, subject, source.usage.scope, action, entropy);
    targets
        .into_iter()
        .map(|target| apply_usage(parties, subject, target, &source, data, entropy, metrics))
        .collect()
}

/// Resolves every hit of `source` on a single target, then its secondary effects.
fn apply_usage(
    parties: &mut Parties,
    subject: BattlerRef,
    target: BattlerRef,
    source: &Source,
    data: &dyn DataProvider,
    entropy: &mut Entropy,
    metrics: &mut WriteMetrics,
) -> ActionOutcome {
    let mut outcome = ActionOutcome::new(target);
    let for_dead = source.usage.scope.is_for_dead();
    let mut hits = 0;
    for _ in 0..source.repeats {
        let (user, receiver) = match pair(parties, subject, target) {
            Some(pair) => pair,
            None => break,
        };
        if receiver.is_dead() && !for_dead {
            break;
        }
        if !entropy.chance(hit_chance(source.usage, user, receiver)) {
            continue;
        }
        hits += 1;
        if let Some(spec) = &source.usage.damage {
            let (amount, critical) =
                compute_damage(source, spec, user, receiver, entropy, metrics);
            outcome.critical |= critical;
            apply_damage(parties, subject, target, spec.kind, amount, &mut outcome);
        }
    }
    outcome.missed = hits == 0;
    if hits > 0 {
        apply_effects(parties, subject, target, source, data, entropy, &mut outcome);
    }
    if let Some(receiver) = parties.get_mut(target) {
        if receiver.settle_defeat() {
            outcome.removed_states.push(DEATH_STATE_ID);
        }
        outcome.hp_after = receiver.hp();
        outcome.mp_after = receiver.mp();
    }
    log::debug!(
        "{} -> {}: hp {} mp {}{}{}",
        subject,
        target,
        outcome.hp_damage,
        outcome.mp_damage,
        if outcome.critical { " (critical)" } else { "" },
        if outcome.missed { " (miss)" } else { "" },
    );
    outcome
}

/// Returns the subject and the target, which may be the same battler.
fn pair(
    parties: &Parties,
    subject: BattlerRef,
    target: BattlerRef,
) -> Option<(&Battler, &Battler)> {
    Some((parties.get(subject)?, parties.get(target)?))
}

/// Probability that a single hit connects.
pub fn hit_chance(usage: &Usage, user: &Battler, target: &Battler) -> f64 {
    let factor = match usage.hit_type {
        HitType::CertainHit => 1.0,
        HitType::Physical => user.xparam(XParam::Hit) * (1.0 - target.xparam(XParam::Evasion)),
        HitType::Magical => 1.0 - target.xparam(XParam::MagicEvasion),
    };
    f64::from(usage.success_rate) / 100.0 * factor
}

/// Computes the amount of a single hit, always non negative, and whether it was critical.
fn compute_damage(
    source: &Source,
    spec: &DamageSpec,
    user: &Battler,
    target: &Battler,
    entropy: &mut Entropy,
    metrics: &mut WriteMetrics,
) -> (i32, bool) {
    let a = user.stats();
    let b = target.stats();
    let base = match evaluate(&spec.formula, &a, &b, entropy) {
        Ok(value) if value.is_finite() => value,
        Ok(value) => {
            log::debug!("formula '{}' evaluated to {}, using default", spec.formula, value);
            metrics.increment(FORMULA_FALLBACKS);
            default_damage(&a, &b)
        }
        Err(err) => {
            log::debug!("formula '{}' failed ({}), using default", spec.formula, err);
            metrics.increment(FORMULA_FALLBACKS);
            default_damage(&a, &b)
        }
    };
    let mut value = base * element_rate(spec.element, user, target);
    if spec.kind.is_damage() {
        value *= match source.usage.hit_type {
            HitType::Physical => target.sparam(SParam::PhysicalDamageRate),
            HitType::Magical => target.sparam(SParam::MagicalDamageRate),
            HitType::CertainHit => 1.0,
        };
    } else {
        value *= target.sparam(SParam::RecoveryRate);
        if source.item {
            value *= user.sparam(SParam::Pharmacology);
        }
    }
    let mut critical = false;
    if spec.critical {
        let rate = user.xparam(XParam::Critical) - target.xparam(XParam::CriticalEvasion);
        if entropy.chance(rate) {
            value *= CRITICAL_MULTIPLIER;
            critical = true;
        }
    }
    if spec.variance > 0 {
        let amplitude = value.abs() * f64::from(spec.variance) / 100.0;
        value += amplitude * entropy.generate_f64(-1.0, 1.0);
    }
    if value > 0.0
        && spec.kind.is_damage()
        && source.usage.hit_type == HitType::Physical
        && target.is_guarding()
    {
        let guard = 2.0 * target.sparam(SParam::GuardRate);
        if guard > 0.0 {
            value /= guard;
        }
    }
    let amount = value.round().max(0.0);
    (amount.min(f64::from(i32::MAX)) as i32, critical)
}

/// Element multiplier of a hit. Attack elements use the most effective one.
fn element_rate(source: ElementSource, user: &Battler, target: &Battler) -> f64 {
    match source {
        ElementSource::None => 1.0,
        ElementSource::Element(element) => target.element_rate(element),
        ElementSource::Attack => user
            .attack_elements()
            .into_iter()
            .map(|element| target.element_rate(element))
            .fold(None, |max: Option<f64>, rate| {
                Some(max.map_or(rate, |max| max.max(rate)))
            })
            .unwrap_or(1.0),
    }
}

fn apply_damage(
    parties: &mut Parties,
    subject: BattlerRef,
    target: BattlerRef,
    kind: DamageType,
    amount: i32,
    outcome: &mut ActionOutcome,
) {
    let receiver = match parties.get_mut(target) {
        Some(receiver) => receiver,
        None => return,
    };
    let drained = match kind {
        DamageType::HpDamage => {
            receiver.gain_hp(-amount);
            outcome.hp_damage += amount;
            return;
        }
        DamageType::MpDamage => {
            let amount = amount.min(receiver.mp());
            receiver.gain_mp(-amount);
            outcome.mp_damage += amount;
            return;
        }
        DamageType::HpRecover => {
            receiver.gain_hp(amount);
            outcome.hp_damage -= amount;
            return;
        }
        DamageType::MpRecover => {
            receiver.gain_mp(amount);
            outcome.mp_damage -= amount;
            return;
        }
        DamageType::HpDrain => {
            let amount = amount.min(receiver.hp());
            receiver.gain_hp(-amount);
            outcome.hp_damage += amount;
            amount
        }
        DamageType::MpDrain => {
            let amount = amount.min(receiver.mp());
            receiver.gain_mp(-amount);
            outcome.mp_damage += amount;
            amount
        }
    };
    outcome.drain += drained;
    if let Some(user) = parties.get_mut(subject) {
        if kind == DamageType::HpDrain {
            user.gain_hp(drained);
        } else {
            user.gain_mp(drained);
        }
    }
}

fn apply_effects(
    parties: &mut Parties,
    subject: BattlerRef,
    target: BattlerRef,
    source: &Source,
    data: &dyn DataProvider,
    entropy: &mut Entropy,
    outcome: &mut ActionOutcome,
) {
    let pharmacology = match parties.get(subject) {
        Some(user) if source.item => user.sparam(SParam::Pharmacology),
        _ => 1.0,
    };
    let receiver = match parties.get_mut(target) {
        Some(receiver) => receiver,
        None => return,
    };
    let mut effects: Vec<&Effect> = source.usage.effects.iter().collect();
    effects.sort_by_key(|effect| effect.order());
    for effect in effects {
        match *effect {
            Effect::RecoverHp { rate, flat } => {
                let value = (f64::from(receiver.mhp()) * rate + flat)
                    * receiver.sparam(SParam::RecoveryRate)
                    * pharmacology;
                let value = value.floor() as i32;
                if value != 0 {
                    receiver.gain_hp(value);
                    outcome.hp_damage -= value;
                }
            }
            Effect::RecoverMp { rate, flat } => {
                let value = (f64::from(receiver.mmp()) * rate + flat)
                    * receiver.sparam(SParam::RecoveryRate)
                    * pharmacology;
                let value = value.floor() as i32;
                if value != 0 {
                    receiver.gain_mp(value);
                    outcome.mp_damage -= value;
                }
            }
            Effect::GainTp { value } => {
                let value = value.floor() as i32;
                outcome.tp_gain += receiver.gain_tp(value);
            }
            Effect::AddState { state, chance } => {
                let record = match data.state(state) {
                    Some(record) => record,
                    None => continue,
                };
                if !entropy.chance(chance * receiver.state_rate(state)) {
                    continue;
                }
                let turns = match record.auto_removal {
                    AutoRemoval::None => INDEFINITE,
                    _ => {
                        let min = i64::from(record.min_turns);
                        let max = i64::from(record.max_turns.max(record.min_turns));
                        entropy.generate_int(min, max + 1) as i32
                    }
                };
                if receiver.add_state(record, turns) {
                    outcome.added_states.push(state);
                }
            }
            Effect::RemoveState { state, chance } => {
                if entropy.chance(chance) && receiver.remove_state(state) {
                    outcome.removed_states.push(state);
                }
            }
            Effect::AddBuff { param, turns } => {
                if receiver.is_alive() {
                    receiver.add_buff(param, turns);
                    outcome.added_buffs.push(param);
                }
            }
            Effect::AddDebuff { param, turns } => {
                if receiver.is_alive() {
                    receiver.add_debuff(param, turns);
                    outcome.added_debuffs.push(param);
                }
            }
            Effect::RemoveBuff { param } => {
                if receiver.remove_buff(param) {
                    outcome.removed_buffs.push(param);
                }
            }
            Effect::RemoveDebuff { param } => {
                if receiver.remove_debuff(param) {
                    outcome.removed_buffs.push(param);
                }
            }
            Effect::CommonEvent { id } => outcome.common_events.push(id),
            // Handled outside of battles.
            Effect::Special { .. }
            | Effect::Grow { .. }
            | Effect::LearnAbility { .. }
            | Effect::Unknown { .. } => {}
        }
    }
}
