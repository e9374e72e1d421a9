use ferret::battler::{ActorSetup, Battler};
use ferret::data::{
    Ability, ActionPattern, AutoRemoval, Class, Condition, DamageSpec, DamageType, DataProvider,
    DropItem, DropKind, Effect, ElementSource, EnemyTemplate, HitType, Item, Param, Restriction,
    Scope, StateRecord, Trait, Usage, XParam,
};
use ferret::entropy::Entropy;
use ferret::rules::database::Database;
use ferret::rules::entropy::FixedAverage;
use ferret::team::Parties;
use std::sync::Arc;

pub const ATTACK: u32 = 1;
pub const FIRE: u32 = 3;
pub const HEAL: u32 = 4;
pub const POISON_STING: u32 = 5;
pub const DRAIN: u32 = 6;
pub const POWER_UP: u32 = 7;
pub const WHIRLWIND: u32 = 8;
pub const BROKEN: u32 = 9;

pub const POTION: u32 = 1;
pub const REVIVE: u32 = 2;

pub const KNOCKOUT: u32 = 1;
pub const POISON: u32 = 4;
pub const SLEEP: u32 = 5;

pub const FIGHTER: u32 = 1;

pub const SLIME: u32 = 1;
pub const DRAGON: u32 = 2;
pub const BAT: u32 = 3;

pub const FIRE_ELEMENT: u32 = 2;

/// Traits giving perfect accuracy.
pub fn accurate() -> Vec<Trait> {
    vec![Trait::XParam {
        param: XParam::Hit,
        value: 1.0,
    }]
}

fn damage(formula: &str, kind: DamageType) -> Option<DamageSpec> {
    Some(DamageSpec {
        formula: formula.to_string(),
        element: ElementSource::None,
        kind,
        critical: false,
        variance: 0,
    })
}

fn ability(id: u32, name: &str, mp_cost: i32, usage: Usage) -> Ability {
    Ability {
        id,
        name: name.to_string(),
        mp_cost,
        tp_cost: 0,
        tp_gain: 0,
        repeats: 1,
        usage,
    }
}

fn usage(
    scope: Scope,
    hit_type: HitType,
    damage: Option<DamageSpec>,
    effects: Vec<Effect>,
) -> Usage {
    Usage {
        scope,
        hit_type,
        success_rate: 100,
        damage,
        effects,
    }
}

fn state(id: u32, name: &str, auto_removal: AutoRemoval, turns: u32) -> StateRecord {
    StateRecord {
        id,
        name: name.to_string(),
        auto_removal,
        min_turns: turns,
        max_turns: turns,
        restriction: Restriction::None,
        traits: Vec::new(),
    }
}

/// Returns an enemy template with perfect accuracy.
pub fn enemy_template(id: u32, name: &str, params: [i32; 8]) -> EnemyTemplate {
    EnemyTemplate {
        id,
        name: name.to_string(),
        level: 1,
        params,
        traits: accurate(),
        actions: vec![ActionPattern {
            ability: ATTACK,
            rating: 5,
            condition: Condition::Always,
        }],
        drops: Vec::new(),
        exp: 0,
        gold: 0,
    }
}

/// Creates the database shared by all tests.
pub fn database() -> Database {
    let mut attack = ability(
        ATTACK,
        "Attack",
        0,
        usage(
            Scope::Opponent,
            HitType::Physical,
            damage("a.atk * 4 - b.def * 2", DamageType::HpDamage),
            Vec::new(),
        ),
    );
    attack.tp_gain = 10;
    if let Some(spec) = attack.usage.damage.as_mut() {
        spec.element = ElementSource::Attack;
        spec.variance = 20;
    }
    let mut fire = ability(
        FIRE,
        "Fire",
        5,
        usage(
            Scope::Opponent,
            HitType::Magical,
            damage("100 + a.mat * 2 - b.mdf * 2", DamageType::HpDamage),
            Vec::new(),
        ),
    );
    if let Some(spec) = fire.usage.damage.as_mut() {
        spec.element = ElementSource::Element(FIRE_ELEMENT);
    }
    let heal = ability(
        HEAL,
        "Heal",
        5,
        usage(
            Scope::Ally,
            HitType::CertainHit,
            damage("200 + a.mat", DamageType::HpRecover),
            Vec::new(),
        ),
    );
    let sting = ability(
        POISON_STING,
        "Poison Sting",
        0,
        usage(
            Scope::Opponent,
            HitType::Physical,
            damage("a.atk * 2", DamageType::HpDamage),
            vec![Effect::AddState {
                state: POISON,
                chance: 1.0,
            }],
        ),
    );
    let drain = ability(
        DRAIN,
        "Drain",
        0,
        usage(
            Scope::Opponent,
            HitType::Magical,
            damage("50", DamageType::HpDrain),
            Vec::new(),
        ),
    );
    let power_up = ability(
        POWER_UP,
        "Power Up",
        0,
        usage(
            Scope::User,
            HitType::CertainHit,
            None,
            vec![Effect::AddBuff {
                param: Param::Atk,
                turns: 3,
            }],
        ),
    );
    let whirlwind = ability(
        WHIRLWIND,
        "Whirlwind",
        10,
        usage(
            Scope::AllOpponents,
            HitType::Physical,
            damage("a.atk * 2", DamageType::HpDamage),
            Vec::new(),
        ),
    );
    let broken = ability(
        BROKEN,
        "Broken",
        0,
        usage(
            Scope::Opponent,
            HitType::CertainHit,
            damage("if a.atk", DamageType::HpDamage),
            Vec::new(),
        ),
    );
    let potion = Item {
        id: POTION,
        name: "Potion".to_string(),
        usage: usage(
            Scope::Ally,
            HitType::CertainHit,
            None,
            vec![Effect::RecoverHp {
                rate: 0.0,
                flat: 100.0,
            }],
        ),
    };
    let revive = Item {
        id: REVIVE,
        name: "Revive".to_string(),
        usage: usage(
            Scope::DeadAlly,
            HitType::CertainHit,
            None,
            vec![
                Effect::RecoverHp {
                    rate: 0.5,
                    flat: 0.0,
                },
                Effect::RemoveState {
                    state: KNOCKOUT,
                    chance: 1.0,
                },
            ],
        ),
    };
    let mut knockout = state(KNOCKOUT, "Knockout", AutoRemoval::None, 0);
    knockout.restriction = Restriction::CannotMove;
    let mut poison = state(POISON, "Poison", AutoRemoval::TurnEnd, 3);
    poison.traits.push(Trait::XParam {
        param: XParam::HpRegen,
        value: -0.1,
    });
    let mut sleep = state(SLEEP, "Sleep", AutoRemoval::TurnEnd, 1);
    sleep.restriction = Restriction::CannotMove;

    let mut slime = enemy_template(SLIME, "Slime", [60, 0, 12, 8, 5, 5, 6, 5]);
    slime.exp = 10;
    slime.gold = 5;
    slime.drops = vec![DropItem {
        kind: DropKind::Item,
        id: POTION,
        denominator: 1,
    }];
    let mut dragon = enemy_template(DRAGON, "Dragon", [50000, 500, 400, 300, 300, 300, 40, 30]);
    dragon.exp = 1000;
    dragon.gold = 800;
    let mut bat = enemy_template(BAT, "Bat", [40, 0, 10, 5, 5, 5, 30, 5]);
    bat.exp = 7;
    bat.gold = 3;
    bat.drops = vec![DropItem {
        kind: DropKind::Armor,
        id: 4,
        denominator: 0,
    }];

    Database::new()
        .with_ability(attack)
        .with_ability(fire)
        .with_ability(heal)
        .with_ability(sting)
        .with_ability(drain)
        .with_ability(power_up)
        .with_ability(whirlwind)
        .with_ability(broken)
        .with_item(potion)
        .with_item(revive)
        .with_state(knockout)
        .with_state(poison)
        .with_state(sleep)
        .with_class(Class {
            id: FIGHTER,
            name: "Fighter".to_string(),
            traits: accurate(),
        })
        .with_enemy(slime)
        .with_enemy(dragon)
        .with_enemy(bat)
}

/// Returns the shared database behind an `Arc`, as battles want it.
pub fn shared_database() -> Arc<dyn DataProvider> {
    Arc::new(database())
}

/// Returns an actor with the given name and parameters, at full hit and magic points.
/// It knows every ability of the shared database.
pub fn actor_setup(name: &str, params: [i32; 8]) -> ActorSetup {
    ActorSetup {
        actor_id: 1,
        name: name.to_string(),
        class_id: FIGHTER,
        level: 1,
        params,
        equip_bonus: [0; 8],
        traits: Vec::new(),
        equip_traits: Vec::new(),
        abilities: vec![
            ATTACK,
            FIRE,
            HEAL,
            POISON_STING,
            DRAIN,
            POWER_UP,
            WHIRLWIND,
            BROKEN,
        ],
        hp: params[0],
        mp: params[1],
        tp: 0,
    }
}

/// A balanced actor.
pub fn hero() -> ActorSetup {
    actor_setup("Hero", [500, 50, 40, 20, 30, 20, 15, 10])
}

/// An actor strong enough to end every battle in one hit.
pub fn champion() -> ActorSetup {
    actor_setup("Champion", [9999, 999, 9999, 999, 999, 999, 999, 99])
}

/// An actor that can't survive a single hit.
pub fn weakling() -> ActorSetup {
    actor_setup("Weakling", [1, 0, 1, 0, 1, 0, 1, 1])
}

/// Builds an actor battler from the shared database.
pub fn actor(setup: ActorSetup) -> Battler {
    Battler::actor(setup, &database()).unwrap()
}

/// Builds an enemy battler from the shared database.
pub fn enemy(id: u32) -> Battler {
    Battler::enemy(database().enemy(id).unwrap())
}

/// Builds parties from actor setups and enemy ids.
pub fn parties(actors: Vec<ActorSetup>, enemies: &[u32]) -> Parties {
    Parties::new(
        actors.into_iter().map(actor).collect(),
        enemies.iter().map(|&id| enemy(id)).collect(),
    )
}

/// Entropy always returning the middle of every range.
pub fn average() -> Entropy {
    Entropy::new(FixedAverage)
}
