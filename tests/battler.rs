use ferret::battler::MAX_TP;
use ferret::data::{DataProvider, Param, SParam, Trait, XParam};
use ferret::{Battler, FerretError};
use util::*;

fn equipped() -> Battler {
    let mut setup = actor_setup("Knight", [250, 80, 30, 20, 25, 18, 15, 10]);
    setup.equip_bonus = [0, 0, 10, 5, 0, 0, 3, 0];
    actor(setup)
}

#[test]
fn parameters() {
    let knight = equipped();
    assert_eq!(knight.base_param(Param::Atk), 40);
    assert_eq!(knight.param(Param::Atk), 40);
    assert_eq!(knight.param(Param::Def), 25);
    assert_eq!(knight.param(Param::Agi), 18);
    assert_eq!(knight.mhp(), 250);
    assert_eq!(knight.mmp(), 80);
    let stats = knight.stats();
    assert_eq!(stats.atk, 40);
    assert_eq!(stats.hp, 250);
    assert_eq!(stats.level, 1);
}

#[test]
fn buff_levels() {
    let mut knight = equipped();
    knight.add_buff(Param::Atk, 3);
    assert_eq!(knight.param(Param::Atk), 50);
    knight.add_buff(Param::Atk, 3);
    knight.add_buff(Param::Atk, 3);
    // Capped at two levels.
    assert_eq!(knight.param(Param::Atk), 60);
    knight.add_debuff(Param::Def, 2);
    assert_eq!(knight.param(Param::Def), 18);
    assert!(knight.remove_debuff(Param::Def));
    assert!(!knight.remove_debuff(Param::Def));
    assert_eq!(knight.param(Param::Def), 25);
    assert!(knight.tick_buffs().is_empty());
    assert!(knight.tick_buffs().is_empty());
    assert_eq!(knight.tick_buffs(), vec![Param::Atk]);
    assert_eq!(knight.param(Param::Atk), 40);
}

#[test]
fn lowering_max_values_clamps_current_ones() {
    let mut knight = equipped();
    knight.add_debuff(Param::MaxHp, 1);
    assert_eq!(knight.mhp(), 187);
    assert_eq!(knight.hp(), 187);
}

#[test]
fn traits_accumulate() {
    let mut setup = hero();
    setup.traits = vec![
        Trait::XParam {
            param: XParam::Hit,
            value: -0.2,
        },
        Trait::ParamRate {
            param: Param::MaxHp,
            rate: 1.5,
        },
        Trait::ElementRate {
            element: FIRE_ELEMENT,
            rate: 0.5,
        },
        Trait::AttackElement { element: 3 },
    ];
    setup.equip_traits = vec![
        Trait::ElementRate {
            element: FIRE_ELEMENT,
            rate: 4.0,
        },
        Trait::AttackElement { element: 3 },
        Trait::AttackElement { element: 4 },
    ];
    let hero = actor(setup);
    // Class accuracy plus the penalty.
    assert!((hero.xparam(XParam::Hit) - 0.8).abs() < 1e-9);
    assert_eq!(hero.element_rate(FIRE_ELEMENT), 2.0);
    assert_eq!(hero.element_rate(9), 1.0);
    assert_eq!(hero.attack_elements(), vec![3, 4]);
    assert_eq!(hero.sparam(SParam::GuardRate), 1.0);
    assert_eq!(hero.mhp(), 750);
    assert_eq!(hero.hp(), 500);
}

#[test]
fn starting_values_are_clamped() {
    let mut setup = hero();
    setup.hp = 9999;
    setup.mp = -5;
    setup.tp = 150;
    let hero = actor(setup);
    assert_eq!(hero.hp(), 500);
    assert_eq!(hero.mp(), 0);
    assert_eq!(hero.tp(), MAX_TP);
    assert_eq!(hero.hp_rate(), 1.0);
}

#[test]
fn costs() {
    let data = database();
    let fire = data.ability(FIRE).unwrap();
    let mut setup = hero();
    setup.equip_traits.push(Trait::SParam {
        param: SParam::MpCostRate,
        rate: 0.5,
    });
    let mut hero = actor(setup);
    assert_eq!(hero.mp_cost(fire), 2);
    hero.pay(fire);
    assert_eq!(hero.mp(), 48);
    hero.set_mp(1);
    assert!(!hero.can_pay(fire));
    let attack = data.ability(ATTACK).unwrap();
    assert!(hero.can_pay(attack));
    hero.pay(attack);
    assert_eq!(hero.tp(), 10);
}

#[test]
fn fallen_actors_start_dead() {
    let mut setup = hero();
    setup.hp = 0;
    let hero = actor(setup);
    assert!(hero.is_dead());
    assert!(hero.has_state(KNOCKOUT));
    assert!(!hero.can_move());
}

#[test]
fn enemies() {
    let slime = enemy(SLIME);
    assert!(slime.is_enemy());
    assert_eq!(slime.name(), "Slime");
    assert_eq!(slime.hp(), 60);
    // Max values never go below one.
    assert_eq!(slime.mmp(), 1);
    assert_eq!(slime.abilities(), vec![ATTACK]);
}

#[test]
fn unknown_class() {
    let mut setup = hero();
    setup.class_id = 42;
    assert_eq!(
        Battler::actor(setup, &database()).err(),
        Some(FerretError::ClassNotFound(42))
    );
}
