use ferret::data::DataProvider;
use ferret::entropy::Entropy;
use ferret::round::{order_for_round, speed};
use ferret::rules::entropy::{FixedHigh, FixedLow, UniformDistribution};
use ferret::BattlerRef;
use util::*;

#[test]
fn speed_bonus() {
    let hero = actor(hero());
    assert_eq!(speed(&hero, &mut Entropy::new(FixedLow)), 15);
    // 15 + [0, 5 + 15 / 4).
    assert_eq!(speed(&hero, &mut Entropy::new(FixedHigh)), 22);
    let weakling = actor(weakling());
    assert_eq!(speed(&weakling, &mut Entropy::new(FixedHigh)), 5);
}

#[test]
fn fastest_first() {
    let parties = parties(vec![hero(), champion()], &[SLIME, BAT]);
    assert_eq!(
        order_for_round(&parties, &mut Entropy::new(FixedLow)),
        vec![
            BattlerRef::actor(1),
            BattlerRef::enemy(1),
            BattlerRef::actor(0),
            BattlerRef::enemy(0)
        ]
    );
}

#[test]
fn ties_keep_actors_first() {
    let parties = parties(vec![hero(), hero()], &[SLIME]);
    let mut twin = actor_setup("Twin", [500, 50, 40, 20, 30, 20, 15, 10]);
    twin.actor_id = 2;
    let twins = util::parties(vec![hero(), twin], &[]);
    assert_eq!(
        order_for_round(&twins, &mut Entropy::new(FixedLow)),
        vec![BattlerRef::actor(0), BattlerRef::actor(1)]
    );
    assert_eq!(
        order_for_round(&parties, &mut Entropy::new(FixedLow)),
        vec![BattlerRef::actor(0), BattlerRef::actor(1), BattlerRef::enemy(0)]
    );
}

#[test]
fn only_mobile_battlers_act() {
    let data = database();
    let mut parties = parties(vec![hero(), hero()], &[SLIME, BAT]);
    parties.get_mut(BattlerRef::actor(0)).unwrap().set_hp(0);
    parties
        .get_mut(BattlerRef::enemy(1))
        .unwrap()
        .add_state(data.state(SLEEP).unwrap(), 1);
    let mut entropy = Entropy::new(UniformDistribution::new(3));
    for _ in 0..10 {
        let mut order = order_for_round(&parties, &mut entropy);
        order.sort();
        assert_eq!(order, vec![BattlerRef::actor(1), BattlerRef::enemy(0)]);
    }
}
