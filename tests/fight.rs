use ferret::data::{SParam, Scope, Trait, XParam};
use ferret::entropy::Entropy;
use ferret::fight::{hit_chance, process_action};
use ferret::metric::system::{ACTIONS_RESOLVED, FORMULA_FALLBACKS};
use ferret::metric::Metrics;
use ferret::rules::entropy::FixedLow;
use ferret::{Action, ActionOutcome, Battler, BattlerRef, DataProvider, Parties, Side};
use util::*;

static HERO: BattlerRef = BattlerRef {
    side: Side::Actors,
    index: 0,
};
static FIRST_ENEMY: BattlerRef = BattlerRef {
    side: Side::Enemies,
    index: 0,
};

fn act(parties: &mut Parties, subject: BattlerRef, action: Action) -> Vec<ActionOutcome> {
    let mut metrics = Metrics::default();
    process_action(
        parties,
        subject,
        &action,
        &database(),
        &mut average(),
        &mut metrics.write_handle(),
    )
}

#[test]
fn attack() {
    let mut parties = parties(vec![hero()], &[SLIME]);
    let outcomes = act(
        &mut parties,
        HERO,
        Action::attack().targeting(Side::Enemies, vec![0]),
    );
    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.target, FIRST_ENEMY);
    // 40 * 4 - 8 * 2, variance centered on zero.
    assert_eq!(outcome.hp_damage, 144);
    assert_eq!(outcome.hp_after, 0);
    assert!(!outcome.missed);
    assert!(parties.get(FIRST_ENEMY).unwrap().is_dead());
    // Attacks charge tactical points.
    assert_eq!(parties.get(HERO).unwrap().tp(), 10);
}

#[test]
fn magic_costs_mana() {
    let mut parties = parties(vec![hero()], &[SLIME]);
    let outcomes = act(&mut parties, HERO, Action::skill(FIRE));
    assert_eq!(outcomes.len(), 1);
    // 100 + 30 * 2 - 5 * 2.
    assert_eq!(outcomes[0].hp_damage, 150);
    assert_eq!(parties.get(HERO).unwrap().mp(), 45);
    // Not enough mana: nothing happens.
    parties.get_mut(HERO).unwrap().set_mp(4);
    parties.get_mut(FIRST_ENEMY).unwrap().set_hp(60);
    assert!(act(&mut parties, HERO, Action::skill(FIRE)).is_empty());
    assert_eq!(parties.get(HERO).unwrap().mp(), 4);
    assert_eq!(parties.get(FIRST_ENEMY).unwrap().hp(), 60);
}

#[test]
fn unknown_ids_do_nothing() {
    let mut parties = parties(vec![hero()], &[SLIME]);
    assert!(act(&mut parties, HERO, Action::skill(99)).is_empty());
    assert!(act(&mut parties, HERO, Action::item(99)).is_empty());
    assert_eq!(parties.get(FIRST_ENEMY).unwrap().hp(), 60);
}

#[test]
fn only_known_abilities_can_be_used() {
    let mut novice = hero();
    novice.abilities = vec![ATTACK];
    let mut parties = parties(vec![novice], &[SLIME]);
    let fire = Action::skill(FIRE).targeting(Side::Enemies, vec![0]);
    assert!(act(&mut parties, HERO, fire).is_empty());
    assert_eq!(parties.get(HERO).unwrap().mp(), 50);
    assert_eq!(parties.get(FIRST_ENEMY).unwrap().hp(), 60);
    // Attacking needs no training.
    assert_eq!(act(&mut parties, HERO, Action::attack()).len(), 1);
}

#[test]
fn dead_subjects_do_nothing() {
    let mut parties = parties(vec![hero()], &[SLIME]);
    parties.get_mut(HERO).unwrap().set_hp(0);
    let mut metrics = Metrics::default();
    let outcomes = process_action(
        &mut parties,
        HERO,
        &Action::attack(),
        &database(),
        &mut average(),
        &mut metrics.write_handle(),
    );
    assert!(outcomes.is_empty());
    assert_eq!(metrics.read_handle().count(ACTIONS_RESOLVED), 0);
}

#[test]
fn heal_and_items() {
    let mut parties = parties(vec![hero()], &[SLIME]);
    parties.get_mut(HERO).unwrap().set_hp(100);
    let outcomes = act(
        &mut parties,
        HERO,
        Action::skill(HEAL).targeting(Side::Actors, vec![0]),
    );
    // 200 + 30.
    assert_eq!(outcomes[0].hp_damage, -230);
    assert_eq!(outcomes[0].hp_after, 330);
    let outcomes = act(&mut parties, HERO, Action::item(POTION));
    assert_eq!(outcomes[0].target, HERO);
    assert_eq!(outcomes[0].hp_damage, -100);
    assert_eq!(parties.get(HERO).unwrap().hp(), 430);
}

#[test]
fn revive() {
    let mut fallen = hero();
    fallen.hp = 0;
    let mut parties = parties(vec![hero(), fallen], &[SLIME]);
    let ally = BattlerRef::actor(1);
    assert!(parties.get(ally).unwrap().has_state(KNOCKOUT));
    // Revival items ignore living allies.
    let outcomes = act(&mut parties, HERO, Action::item(REVIVE));
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].target, ally);
    assert_eq!(outcomes[0].hp_damage, -250);
    assert_eq!(outcomes[0].removed_states, vec![KNOCKOUT]);
    let revived = parties.get(ally).unwrap();
    assert!(revived.is_alive());
    assert_eq!(revived.hp(), 250);
}

#[test]
fn healing_the_fallen_revives_them() {
    const RAISE: u32 = 99;
    let mut data = database();
    let mut raise = data.ability(HEAL).unwrap().clone();
    raise.id = RAISE;
    raise.usage.scope = Scope::DeadAlly;
    data = data.with_ability(raise);
    let mut caster = hero();
    caster.abilities.push(RAISE);
    let mut fallen = hero();
    fallen.hp = 0;
    let mut parties = parties(vec![caster, fallen], &[SLIME]);
    let ally = BattlerRef::actor(1);
    let mut metrics = Metrics::default();
    let outcomes = process_action(
        &mut parties,
        HERO,
        &Action::skill(RAISE),
        &data,
        &mut average(),
        &mut metrics.write_handle(),
    );
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].target, ally);
    assert_eq!(outcomes[0].hp_damage, -230);
    assert_eq!(outcomes[0].hp_after, 230);
    assert_eq!(outcomes[0].removed_states, vec![KNOCKOUT]);
    let revived = parties.get(ally).unwrap();
    assert!(revived.is_alive());
    assert!(!revived.has_state(KNOCKOUT));
    assert_eq!(revived.hp(), 230);
}

#[test]
fn drain() {
    let mut parties = parties(vec![hero()], &[SLIME]);
    parties.get_mut(HERO).unwrap().set_hp(400);
    let outcomes = act(&mut parties, HERO, Action::skill(DRAIN));
    assert_eq!(outcomes[0].hp_damage, 50);
    assert_eq!(outcomes[0].drain, 50);
    assert_eq!(parties.get(FIRST_ENEMY).unwrap().hp(), 10);
    assert_eq!(parties.get(HERO).unwrap().hp(), 450);
    // Drains can't take more than what's left.
    let outcomes = act(&mut parties, HERO, Action::skill(DRAIN));
    assert_eq!(outcomes[0].drain, 10);
    assert_eq!(parties.get(HERO).unwrap().hp(), 460);
}

#[test]
fn states_are_added_after_damage() {
    let mut parties = parties(vec![hero()], &[DRAGON]);
    let outcomes = act(&mut parties, HERO, Action::skill(POISON_STING));
    assert_eq!(outcomes[0].hp_damage, 80);
    assert_eq!(outcomes[0].added_states, vec![POISON]);
    let dragon = parties.get(FIRST_ENEMY).unwrap();
    assert_eq!(dragon.states().get(POISON).unwrap().turns_left(), 3);
    // Dead targets don't receive states.
    let mut parties = util::parties(vec![hero()], &[SLIME]);
    parties.get_mut(FIRST_ENEMY).unwrap().set_hp(10);
    let outcomes = act(&mut parties, HERO, Action::skill(POISON_STING));
    assert!(outcomes[0].added_states.is_empty());
}

#[test]
fn buffs() {
    let mut parties = parties(vec![hero()], &[SLIME]);
    let outcomes = act(&mut parties, HERO, Action::skill(POWER_UP));
    assert_eq!(outcomes[0].target, HERO);
    assert_eq!(outcomes[0].added_buffs, vec![ferret::data::Param::Atk]);
    assert_eq!(
        parties.get(HERO).unwrap().param(ferret::data::Param::Atk),
        50
    );
}

#[test]
fn guard_halves_physical_damage() {
    let mut parties = parties(vec![hero()], &[SLIME]);
    assert!(act(&mut parties, HERO, Action::guard()).is_empty());
    assert!(parties.get(HERO).unwrap().is_guarding());
    let outcomes = act(&mut parties, FIRST_ENEMY, Action::attack());
    // (12 * 4 - 20 * 2) / 2.
    assert_eq!(outcomes[0].hp_damage, 4);
}

#[test]
fn evasion() {
    let mut ghost = enemy_template(99, "Ghost", [100, 0, 10, 10, 10, 10, 10, 10]);
    ghost.traits.push(Trait::XParam {
        param: XParam::Evasion,
        value: 1.0,
    });
    let mut parties = Parties::new(vec![actor(hero())], vec![Battler::enemy(&ghost)]);
    let data = database();
    let sting = data.ability(POISON_STING).unwrap();
    assert_eq!(
        hit_chance(
            &sting.usage,
            parties.get(HERO).unwrap(),
            parties.get(FIRST_ENEMY).unwrap()
        ),
        0.0
    );
    let outcomes = act(&mut parties, HERO, Action::skill(POISON_STING));
    assert!(outcomes[0].missed);
    assert_eq!(outcomes[0].hp_damage, 0);
    // Effects of missed actions are skipped.
    assert!(outcomes[0].added_states.is_empty());
    assert_eq!(parties.get(FIRST_ENEMY).unwrap().hp(), 100);
}

#[test]
fn area_of_effect() {
    let mut parties = parties(vec![hero()], &[SLIME, SLIME, BAT]);
    let outcomes = act(&mut parties, HERO, Action::skill(WHIRLWIND));
    let targets: Vec<_> = outcomes.iter().map(|outcome| outcome.target).collect();
    assert_eq!(
        targets,
        vec![
            BattlerRef::enemy(0),
            BattlerRef::enemy(1),
            BattlerRef::enemy(2)
        ]
    );
    assert!(parties.all_dead(Side::Enemies));
    assert_eq!(parties.get(HERO).unwrap().mp(), 40);
}

#[test]
fn targets_fall_back_to_the_living() {
    let mut parties = parties(vec![hero()], &[SLIME, BAT]);
    parties.get_mut(FIRST_ENEMY).unwrap().set_hp(0);
    let outcomes = act(
        &mut parties,
        HERO,
        Action::attack().targeting(Side::Enemies, vec![0]),
    );
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].target, BattlerRef::enemy(1));
}

#[test]
fn target_rate_weights_random_targets() {
    let mut decoy = enemy_template(99, "Decoy", [100, 0, 10, 10, 10, 10, 10, 10]);
    decoy.traits.push(Trait::SParam {
        param: SParam::TargetRate,
        rate: 0.0,
    });
    let mut parties = Parties::new(
        vec![actor(hero())],
        vec![Battler::enemy(&decoy), enemy(SLIME)],
    );
    let mut metrics = Metrics::default();
    let outcomes = process_action(
        &mut parties,
        HERO,
        &Action::attack(),
        &database(),
        &mut Entropy::new(FixedLow),
        &mut metrics.write_handle(),
    );
    assert_eq!(outcomes[0].target, BattlerRef::enemy(1));
}

#[test]
fn broken_formulas_fall_back() {
    let mut parties = parties(vec![hero()], &[SLIME]);
    let mut metrics = Metrics::default();
    let outcomes = process_action(
        &mut parties,
        HERO,
        &Action::skill(BROKEN),
        &database(),
        &mut average(),
        &mut metrics.write_handle(),
    );
    assert_eq!(outcomes[0].hp_damage, 144);
    let reader = metrics.read_handle();
    assert_eq!(reader.count(FORMULA_FALLBACKS), 1);
    assert_eq!(reader.count(ACTIONS_RESOLVED), 1);
}
