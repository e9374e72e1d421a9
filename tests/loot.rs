use ferret::data::{DropItem, DropKind};
use ferret::entropy::Entropy;
use ferret::loot::{exp_for_next_level, roll_drops, split_experience};
use ferret::rules::entropy::{FixedHigh, FixedLow};
use util::*;

fn slot(id: u32, denominator: u32) -> DropItem {
    DropItem {
        kind: DropKind::Item,
        id,
        denominator,
    }
}

#[test]
fn drops() {
    let table = vec![slot(1, 1), slot(2, 2), slot(3, 3), slot(4, 0)];
    let ids = |drops: Vec<DropItem>| drops.into_iter().map(|d| d.id).collect::<Vec<_>>();
    assert_eq!(ids(roll_drops(&table, &mut average())), vec![1]);
    // Slots with a zero denominator never drop.
    assert_eq!(
        ids(roll_drops(&table, &mut Entropy::new(FixedLow))),
        vec![1, 2, 3]
    );
    assert_eq!(
        ids(roll_drops(&table, &mut Entropy::new(FixedHigh))),
        vec![1]
    );
    assert!(roll_drops(&[], &mut average()).is_empty());
}

#[test]
fn experience_split() {
    let shares: Vec<_> = (1..=6).map(|n| split_experience(60, n)).collect();
    assert_eq!(shares, vec![60, 33, 24, 19, 16, 14]);
    assert_eq!(split_experience(60, 0), 0);
    assert_eq!(split_experience(1, 4), 1);
}

#[test]
fn level_curve_grows() {
    let curve: Vec<_> = (1..=20).map(exp_for_next_level).collect();
    assert!(curve.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(exp_for_next_level(0), 0);
    assert_eq!(exp_for_next_level(u32::MAX), u32::MAX);
}
