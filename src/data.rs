//! Read-only game data consumed by the battle system.
//!
//! Records in this module mirror the external tables of abilities, items, enemies,
//! states and classes. The battle system never mutates them; it reads them through a
//! [DataProvider](trait.DataProvider.html).

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Id of an ability.
pub type AbilityId = u32;
/// Id of an item.
pub type ItemId = u32;
/// Id of a state.
pub type StateId = u32;
/// Id of an enemy template.
pub type EnemyId = u32;
/// Id of an element.
pub type ElementId = u32;
/// Id of a class.
pub type ClassId = u32;
/// Id of an actor in the caller's database.
pub type ActorId = u32;
/// Id of a common event, run by the external scripting engine.
pub type CommonEventId = u32;
/// Id of a troop.
pub type TroopId = u32;

/// Ability used by the basic attack command.
pub const ATTACK_ABILITY_ID: AbilityId = 1;

/// Reserved state applied to battlers whose hit points drop to zero.
pub const DEATH_STATE_ID: StateId = 1;

/// Number of basic parameters.
pub const PARAM_COUNT: usize = 8;

/// Basic parameters of a battler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Param {
    /// Maximum hit points.
    MaxHp,
    /// Maximum magic points.
    MaxMp,
    /// Attack.
    Atk,
    /// Defense.
    Def,
    /// Magic attack.
    Mat,
    /// Magic defense.
    Mdf,
    /// Agility.
    Agi,
    /// Luck.
    Luk,
}

impl Param {
    /// All parameters, in table order.
    pub const ALL: [Param; PARAM_COUNT] = [
        Param::MaxHp,
        Param::MaxMp,
        Param::Atk,
        Param::Def,
        Param::Mat,
        Param::Mdf,
        Param::Agi,
        Param::Luk,
    ];

    /// Returns the position of this parameter in a parameter table.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Additive rate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum XParam {
    /// Hit rate.
    Hit,
    /// Evasion rate.
    Evasion,
    /// Critical rate.
    Critical,
    /// Critical evasion rate.
    CriticalEvasion,
    /// Magic evasion rate.
    MagicEvasion,
    /// Magic reflection rate.
    MagicReflection,
    /// Counter attack rate.
    Counter,
    /// Hit points regeneration rate.
    HpRegen,
    /// Magic points regeneration rate.
    MpRegen,
    /// Tactical points regeneration rate.
    TpRegen,
}

/// Multiplicative rate parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum SParam {
    /// Weight used when picking random targets.
    TargetRate,
    /// Effectiveness of guarding.
    GuardRate,
    /// Effectiveness of recovery received.
    RecoveryRate,
    /// Effectiveness of recovery items used.
    Pharmacology,
    /// Multiplier of magic point costs.
    MpCostRate,
    /// Multiplier of tactical points gained.
    TpChargeRate,
    /// Multiplier of physical damage received.
    PhysicalDamageRate,
    /// Multiplier of magical damage received.
    MagicalDamageRate,
}

/// A data-driven modifier attached to a class, a piece of equipment, an enemy or a state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Trait {
    /// Multiplies the damage received from an element.
    ElementRate {
        /// Element affected.
        element: ElementId,
        /// Multiplier.
        rate: f64,
    },
    /// Multiplies the chance of receiving a state.
    StateRate {
        /// State affected.
        state: StateId,
        /// Multiplier.
        rate: f64,
    },
    /// Grants immunity to a state.
    StateResist {
        /// State affected.
        state: StateId,
    },
    /// Multiplies a basic parameter.
    ParamRate {
        /// Parameter affected.
        param: Param,
        /// Multiplier.
        rate: f64,
    },
    /// Adds to an additive rate parameter.
    XParam {
        /// Parameter affected.
        param: XParam,
        /// Amount added.
        value: f64,
    },
    /// Multiplies a multiplicative rate parameter.
    SParam {
        /// Parameter affected.
        param: SParam,
        /// Multiplier.
        rate: f64,
    },
    /// Element carried by the basic attack.
    AttackElement {
        /// Element added.
        element: ElementId,
    },
}

/// Targeting rule of an ability or item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Scope {
    /// No target.
    None,
    /// One opponent, chosen at random unless explicitly targeted.
    Opponent,
    /// All living opponents.
    AllOpponents,
    /// The given number of random opponents, with replacement.
    RandomOpponents(u8),
    /// One living ally, chosen at random unless explicitly targeted.
    Ally,
    /// All living allies.
    AllAllies,
    /// One dead ally, chosen at random unless explicitly targeted.
    DeadAlly,
    /// All dead allies.
    AllDeadAllies,
    /// The user.
    User,
}

impl Scope {
    /// Decodes a scope from its table code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Scope::None,
            1 => Scope::Opponent,
            2 => Scope::AllOpponents,
            3 => Scope::RandomOpponents(1),
            4 => Scope::RandomOpponents(2),
            5 => Scope::RandomOpponents(3),
            6 => Scope::RandomOpponents(4),
            7 => Scope::Ally,
            8 => Scope::AllAllies,
            9 => Scope::DeadAlly,
            10 => Scope::AllDeadAllies,
            11 => Scope::User,
            _ => return None,
        })
    }

    /// Returns true if this scope targets the opposite side.
    pub fn is_for_opponent(self) -> bool {
        matches!(
            self,
            Scope::Opponent | Scope::AllOpponents | Scope::RandomOpponents(_)
        )
    }

    /// Returns true if this scope targets dead battlers.
    pub fn is_for_dead(self) -> bool {
        matches!(self, Scope::DeadAlly | Scope::AllDeadAllies)
    }
}

/// How the hit chance of an ability is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum HitType {
    /// Always hits, subject only to the success rate.
    CertainHit,
    /// Subject to hit rate and evasion.
    Physical,
    /// Subject to magic evasion.
    Magical,
}

/// What a damage roll changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum DamageType {
    /// Code 1.
    HpDamage,
    /// Code 2.
    MpDamage,
    /// Code 3.
    HpRecover,
    /// Code 4.
    MpRecover,
    /// Code 5.
    HpDrain,
    /// Code 6.
    MpDrain,
}

impl DamageType {
    /// Decodes a damage type from its table code. Code 0 means no damage.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => DamageType::HpDamage,
            2 => DamageType::MpDamage,
            3 => DamageType::HpRecover,
            4 => DamageType::MpRecover,
            5 => DamageType::HpDrain,
            6 => DamageType::MpDrain,
            _ => return None,
        })
    }

    /// Returns true if this type lowers the target's values.
    pub fn is_damage(self) -> bool {
        !self.is_recover()
    }

    /// Returns true if this type restores the target's values.
    pub fn is_recover(self) -> bool {
        matches!(self, DamageType::HpRecover | DamageType::MpRecover)
    }

    /// Returns true if this type transfers the amount to the subject.
    pub fn is_drain(self) -> bool {
        matches!(self, DamageType::HpDrain | DamageType::MpDrain)
    }
}

/// Where the element of a damage roll comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ElementSource {
    /// Non elemental.
    None,
    /// The subject's attack elements; the most effective one is used.
    Attack,
    /// A fixed element.
    Element(ElementId),
}

impl Default for ElementSource {
    fn default() -> Self {
        ElementSource::None
    }
}

/// Damage portion of an ability or item.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct DamageSpec {
    /// Formula producing the base amount.
    pub formula: String,
    /// Element of the damage.
    pub element: ElementSource,
    /// What the damage changes.
    pub kind: DamageType,
    /// Whether the damage can be critical.
    pub critical: bool,
    /// Variance, in percent.
    pub variance: u32,
}

/// A secondary effect of an ability or item, applied after damage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Effect {
    /// Restores `rate` of max hp plus `flat` hit points.
    RecoverHp {
        /// Fraction of max hp.
        rate: f64,
        /// Flat amount.
        flat: f64,
    },
    /// Restores `rate` of max mp plus `flat` magic points.
    RecoverMp {
        /// Fraction of max mp.
        rate: f64,
        /// Flat amount.
        flat: f64,
    },
    /// Grants tactical points.
    GainTp {
        /// Amount.
        value: f64,
    },
    /// Adds a state with the given probability.
    AddState {
        /// State to add.
        state: StateId,
        /// Base probability.
        chance: f64,
    },
    /// Removes a state with the given probability.
    RemoveState {
        /// State to remove.
        state: StateId,
        /// Base probability.
        chance: f64,
    },
    /// Raises a parameter's buff level.
    AddBuff {
        /// Parameter affected.
        param: Param,
        /// Duration in turns.
        turns: u32,
    },
    /// Lowers a parameter's buff level.
    AddDebuff {
        /// Parameter affected.
        param: Param,
        /// Duration in turns.
        turns: u32,
    },
    /// Clears a positive buff.
    RemoveBuff {
        /// Parameter affected.
        param: Param,
    },
    /// Clears a negative buff.
    RemoveDebuff {
        /// Parameter affected.
        param: Param,
    },
    /// Asks the scripting engine to run a common event.
    CommonEvent {
        /// Event to run.
        id: CommonEventId,
    },
    /// Special effect, such as escape. Handled outside the battle core.
    Special {
        /// Kind of special effect.
        kind: u32,
    },
    /// Permanent parameter growth. Handled outside the battle core.
    Grow {
        /// Parameter affected.
        param: Param,
        /// Amount.
        value: i32,
    },
    /// Teaches an ability. Handled outside the battle core.
    LearnAbility {
        /// Ability learned.
        ability: AbilityId,
    },
    /// An effect code this version does not know about.
    Unknown {
        /// Raw code.
        code: u32,
    },
}

impl Effect {
    /// Position of this effect in the fixed application order.
    pub fn order(&self) -> u8 {
        match self {
            Effect::RecoverHp { .. } => 0,
            Effect::RecoverMp { .. } => 1,
            Effect::GainTp { .. } => 2,
            Effect::AddState { .. } => 3,
            Effect::RemoveState { .. } => 4,
            Effect::AddBuff { .. } => 5,
            Effect::AddDebuff { .. } => 6,
            Effect::RemoveBuff { .. } | Effect::RemoveDebuff { .. } => 7,
            Effect::CommonEvent { .. } => 8,
            Effect::Special { .. } => 9,
            Effect::Grow { .. } | Effect::LearnAbility { .. } => 10,
            Effect::Unknown { .. } => 11,
        }
    }
}

/// Everything an ability and an item have in common.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Usage {
    /// Targeting rule.
    pub scope: Scope,
    /// Hit chance model.
    pub hit_type: HitType,
    /// Base success rate, in percent.
    pub success_rate: u32,
    /// Optional damage roll.
    pub damage: Option<DamageSpec>,
    /// Secondary effects.
    pub effects: Vec<Effect>,
}

/// An ability (skill) record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Ability {
    /// Id.
    pub id: AbilityId,
    /// Name.
    pub name: String,
    /// Magic points spent on use.
    pub mp_cost: i32,
    /// Tactical points spent on use.
    pub tp_cost: i32,
    /// Tactical points gained on use.
    pub tp_gain: i32,
    /// Times the ability hits each target.
    pub repeats: u32,
    /// Targeting, hit, damage and effects.
    pub usage: Usage,
}

/// An item record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Item {
    /// Id.
    pub id: ItemId,
    /// Name.
    pub name: String,
    /// Targeting, hit, damage and effects.
    pub usage: Usage,
}

/// When a state's timer advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum AutoRemoval {
    /// Never expires by itself.
    None,
    /// Ticks after each action of its owner.
    ActionEnd,
    /// Ticks at the end of every round.
    TurnEnd,
}

/// What a state prevents its owner from doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Restriction {
    /// No restriction.
    None,
    /// The owner cannot act.
    CannotMove,
}

/// A state record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct StateRecord {
    /// Id.
    pub id: StateId,
    /// Name.
    pub name: String,
    /// Timer behavior.
    pub auto_removal: AutoRemoval,
    /// Minimum duration, in turns.
    pub min_turns: u32,
    /// Maximum duration, in turns.
    pub max_turns: u32,
    /// Restriction imposed on the owner.
    pub restriction: Restriction,
    /// Traits granted to the owner.
    pub traits: Vec<Trait>,
}

/// A class record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Class {
    /// Id.
    pub id: ClassId,
    /// Name.
    pub name: String,
    /// Traits granted to members of this class.
    pub traits: Vec<Trait>,
}

/// Precondition of an enemy action pattern.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Condition {
    /// Always satisfied.
    Always,
    /// Satisfied on round `start + every * k`, for any `k >= 0`.
    /// With `every` equal to zero only round `start` matches.
    Turn {
        /// First round.
        start: u32,
        /// Period.
        every: u32,
    },
    /// Satisfied while the hp ratio is within `[min, max]`.
    HpRatio {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// Satisfied while the mp ratio is within `[min, max]`.
    MpRatio {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// Satisfied while the enemy has the given state.
    HasState(StateId),
    /// A condition this version does not evaluate. Always satisfied.
    Other {
        /// Raw code.
        code: u32,
    },
}

/// A candidate action of an enemy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ActionPattern {
    /// Ability used.
    pub ability: AbilityId,
    /// Preference, from 1 to 9.
    pub rating: i32,
    /// Precondition.
    pub condition: Condition,
}

/// Kind of object dropped by an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum DropKind {
    /// An item.
    Item,
    /// A weapon.
    Weapon,
    /// An armor.
    Armor,
}

/// A slot of an enemy's drop table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct DropItem {
    /// Kind of object.
    pub kind: DropKind,
    /// Id of the object in its table.
    pub id: u32,
    /// The object drops with probability `1 / denominator`. Zero disables the slot.
    pub denominator: u32,
}

/// An enemy template.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct EnemyTemplate {
    /// Id.
    pub id: EnemyId,
    /// Name.
    pub name: String,
    /// Level, used by formulas.
    pub level: i32,
    /// Basic parameters, in `Param::ALL` order.
    pub params: [i32; PARAM_COUNT],
    /// Traits.
    pub traits: Vec<Trait>,
    /// Candidate actions.
    pub actions: Vec<ActionPattern>,
    /// Drop table.
    pub drops: Vec<DropItem>,
    /// Experience granted on defeat.
    pub exp: u32,
    /// Gold granted on defeat.
    pub gold: u32,
}

/// Read-only access to the game's data tables.
pub trait DataProvider: Send + Sync {
    /// Returns the ability with the given id.
    fn ability(&self, id: AbilityId) -> Option<&Ability>;

    /// Returns the item with the given id.
    fn item(&self, id: ItemId) -> Option<&Item>;

    /// Returns the enemy template with the given id.
    fn enemy(&self, id: EnemyId) -> Option<&EnemyTemplate>;

    /// Returns the state with the given id.
    fn state(&self, id: StateId) -> Option<&StateRecord>;

    /// Returns the class with the given id.
    fn class(&self, id: ClassId) -> Option<&Class>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_codes() {
        assert_eq!(Scope::from_code(1), Some(Scope::Opponent));
        assert_eq!(Scope::from_code(5), Some(Scope::RandomOpponents(3)));
        assert_eq!(Scope::from_code(11), Some(Scope::User));
        assert_eq!(Scope::from_code(12), None);
        assert!(Scope::RandomOpponents(2).is_for_opponent());
        assert!(!Scope::AllAllies.is_for_opponent());
        assert!(Scope::DeadAlly.is_for_dead());
    }

    #[test]
    fn damage_type_codes() {
        assert_eq!(DamageType::from_code(0), None);
        assert!(DamageType::from_code(3).unwrap().is_recover());
        assert!(DamageType::from_code(6).unwrap().is_drain());
        assert!(DamageType::from_code(5).unwrap().is_damage());
    }

    #[test]
    fn effect_order_is_fixed() {
        let mut effects = vec![
            Effect::CommonEvent { id: 3 },
            Effect::AddState {
                state: 4,
                chance: 1.0,
            },
            Effect::RecoverHp {
                rate: 0.0,
                flat: 10.0,
            },
        ];
        effects.sort_by_key(Effect::order);
        assert_eq!(
            effects[0],
            Effect::RecoverHp {
                rate: 0.0,
                flat: 10.0
            }
        );
        assert_eq!(effects[2], Effect::CommonEvent { id: 3 });
    }
}
