//! Actions chosen by battlers and the outcomes they produce.

use crate::data::{AbilityId, CommonEventId, ItemId, Param, StateId};
use crate::team::{BattlerRef, Side};
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// What a battler does with its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ActionKind {
    /// Basic attack.
    Attack,
    /// Use an ability.
    Skill(AbilityId),
    /// Use an item.
    Item(ItemId),
    /// Halve the physical damage received this round.
    Guard,
    /// Try to flee from the battle.
    Escape,
}

/// An action chosen for a round, with optional explicit targets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Action {
    /// What to do.
    pub kind: ActionKind,
    /// Indices of the chosen targets within `target_side`. May be empty.
    pub targets: Vec<usize>,
    /// Side of the chosen targets. When absent it's deduced from the scope.
    pub target_side: Option<Side>,
}

impl Action {
    /// Creates an action without explicit targets.
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            targets: Vec::new(),
            target_side: None,
        }
    }

    /// Basic attack.
    pub fn attack() -> Self {
        Self::new(ActionKind::Attack)
    }

    /// Use of an ability.
    pub fn skill(ability: AbilityId) -> Self {
        Self::new(ActionKind::Skill(ability))
    }

    /// Use of an item.
    pub fn item(item: ItemId) -> Self {
        Self::new(ActionKind::Item(item))
    }

    /// Guard.
    pub fn guard() -> Self {
        Self::new(ActionKind::Guard)
    }

    /// Escape attempt.
    pub fn escape() -> Self {
        Self::new(ActionKind::Escape)
    }

    /// Sets explicit targets.
    pub fn targeting<I: IntoIterator<Item = usize>>(mut self, side: Side, targets: I) -> Self {
        self.target_side = Some(side);
        self.targets = targets.into_iter().collect();
        self
    }
}

/// An action submitted by the caller on behalf of an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ActionInput {
    /// Index of the actor in the actors' side.
    pub actor: usize,
    /// Chosen action.
    pub action: Action,
}

impl ActionInput {
    /// Creates a new input.
    pub fn new(actor: usize, action: Action) -> Self {
        Self { actor, action }
    }
}

/// Consequences of an action on a single target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ActionOutcome {
    /// Who received the action.
    pub target: BattlerRef,
    /// Hit points lost. Negative values are healing.
    pub hp_damage: i32,
    /// Magic points lost. Negative values are recovery.
    pub mp_damage: i32,
    /// Tactical points gained.
    pub tp_gain: i32,
    /// At least one hit was critical.
    pub critical: bool,
    /// Every hit missed.
    pub missed: bool,
    /// Amount transferred to the subject by drain damage.
    pub drain: i32,
    /// States added.
    pub added_states: Vec<StateId>,
    /// States removed.
    pub removed_states: Vec<StateId>,
    /// Parameters buffed.
    pub added_buffs: Vec<Param>,
    /// Parameters debuffed.
    pub added_debuffs: Vec<Param>,
    /// Parameters whose buff or debuff got cleared.
    pub removed_buffs: Vec<Param>,
    /// Common events the scripting engine should run.
    pub common_events: Vec<CommonEventId>,
    /// Target's hit points once the action resolved.
    pub hp_after: i32,
    /// Target's magic points once the action resolved.
    pub mp_after: i32,
}

impl ActionOutcome {
    /// Creates an empty outcome for the given target.
    pub fn new(target: BattlerRef) -> Self {
        Self {
            target,
            hp_damage: 0,
            mp_damage: 0,
            tp_gain: 0,
            critical: false,
            missed: false,
            drain: 0,
            added_states: Vec::new(),
            removed_states: Vec::new(),
            added_buffs: Vec::new(),
            added_debuffs: Vec::new(),
            removed_buffs: Vec::new(),
            common_events: Vec::new(),
            hp_after: 0,
            mp_after: 0,
        }
    }
}
