//! Battlers: the participants of a battle.
//!
//! A `Battler` holds all the machinery shared by every participant: vital values,
//! parameters, traits, states and buffs. The few things that differ between player
//! controlled actors and AI controlled enemies live in `BattlerKind`.

use crate::action::Action;
use crate::buff::Buffs;
use crate::data::{
    Ability, AbilityId, ActionPattern, ActorId, AutoRemoval, ClassId, DataProvider, DropItem,
    ElementId, EnemyId, EnemyTemplate, Param, Restriction, SParam, StateId, StateRecord, Trait,
    XParam, ATTACK_ABILITY_ID, DEATH_STATE_ID, PARAM_COUNT,
};
use crate::error::{FerretError, FerretResult};
use crate::formula::CharacterStats;
use crate::status::{States, INDEFINITE};
use crate::team::{BattlerRef, Side};
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Maximum amount of tactical points.
pub const MAX_TP: i32 = 100;

/// Plain values describing an actor, as stored by the caller's persistence layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ActorSetup {
    /// Id of the actor in the caller's database.
    pub actor_id: ActorId,
    /// Name.
    pub name: String,
    /// Class, providing traits.
    pub class_id: ClassId,
    /// Level.
    pub level: i32,
    /// Base parameters, in `Param::ALL` order.
    pub params: [i32; PARAM_COUNT],
    /// Equipment bonus for each parameter.
    pub equip_bonus: [i32; PARAM_COUNT],
    /// Traits of the actor itself.
    pub traits: Vec<Trait>,
    /// Traits granted by equipment.
    pub equip_traits: Vec<Trait>,
    /// Abilities the actor may use.
    pub abilities: Vec<AbilityId>,
    /// Current hit points.
    pub hp: i32,
    /// Current magic points.
    pub mp: i32,
    /// Current tactical points.
    pub tp: i32,
}

/// Identity of a player controlled battler.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorProfile {
    /// Id of the actor in the caller's database.
    pub actor_id: ActorId,
    /// Class.
    pub class_id: ClassId,
    /// Level.
    pub level: i32,
    /// Abilities the actor may use.
    pub abilities: Vec<AbilityId>,
}

/// Identity of an AI controlled battler.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyProfile {
    /// Template this enemy was built from.
    pub enemy_id: EnemyId,
    /// Level.
    pub level: i32,
    /// Candidate actions.
    pub actions: Vec<ActionPattern>,
    /// Drop table.
    pub drops: Vec<DropItem>,
    /// Experience granted on defeat.
    pub exp: u32,
    /// Gold granted on defeat.
    pub gold: u32,
}

/// The part of a battler that depends on who controls it.
#[derive(Debug, Clone, PartialEq)]
pub enum BattlerKind {
    /// Player controlled.
    Actor(ActorProfile),
    /// AI controlled.
    Enemy(EnemyProfile),
}

/// Values restored at the end of a round.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Regeneration {
    /// Hit points gained. Negative for slip damage.
    pub hp: i32,
    /// Magic points gained.
    pub mp: i32,
    /// Tactical points gained.
    pub tp: i32,
}

impl Regeneration {
    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.hp == 0 && self.mp == 0 && self.tp == 0
    }
}

/// A participant in a battle.
#[derive(Debug, Clone)]
pub struct Battler {
    name: String,
    position: BattlerRef,
    hp: i32,
    mp: i32,
    tp: i32,
    params: [i32; PARAM_COUNT],
    equip_bonus: [i32; PARAM_COUNT],
    traits: Vec<Trait>,
    states: States,
    buffs: Buffs,
    guarding: bool,
    action: Option<Action>,
    kind: BattlerKind,
}

impl Battler {
    /// Creates an actor from the caller's plain values.
    ///
    /// Class traits are looked up in `data`. An actor entering with zero hit points
    /// starts the battle dead.
    pub fn actor(setup: ActorSetup, data: &dyn DataProvider) -> FerretResult<Battler> {
        let class = data
            .class(setup.class_id)
            .ok_or(FerretError::ClassNotFound(setup.class_id))?;
        let mut traits = class.traits.clone();
        traits.extend(setup.traits);
        traits.extend(setup.equip_traits);
        let mut battler = Battler {
            name: setup.name,
            position: BattlerRef::actor(0),
            hp: setup.hp,
            mp: setup.mp,
            tp: 0,
            params: setup.params,
            equip_bonus: setup.equip_bonus,
            traits,
            states: States::default(),
            buffs: Buffs::default(),
            guarding: false,
            action: None,
            kind: BattlerKind::Actor(ActorProfile {
                actor_id: setup.actor_id,
                class_id: setup.class_id,
                level: setup.level,
                abilities: setup.abilities,
            }),
        };
        battler.set_tp(setup.tp);
        battler.refresh();
        if battler.hp == 0 {
            battler.die(data);
        }
        Ok(battler)
    }

    /// Creates an enemy from its template, at full hit and magic points.
    pub fn enemy(template: &EnemyTemplate) -> Battler {
        let mut battler = Battler {
            name: template.name.clone(),
            position: BattlerRef::enemy(0),
            hp: 0,
            mp: 0,
            tp: 0,
            params: template.params,
            equip_bonus: [0; PARAM_COUNT],
            traits: template.traits.clone(),
            states: States::default(),
            buffs: Buffs::default(),
            guarding: false,
            action: None,
            kind: BattlerKind::Enemy(EnemyProfile {
                enemy_id: template.id,
                level: template.level,
                actions: template.actions.clone(),
                drops: template.drops.clone(),
                exp: template.exp,
                gold: template.gold,
            }),
        };
        battler.hp = battler.mhp();
        battler.mp = battler.mmp();
        battler
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the position of this battler in the parties.
    pub fn position(&self) -> BattlerRef {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: BattlerRef) {
        self.position = position;
    }

    /// Returns the side of this battler.
    pub fn side(&self) -> Side {
        self.position.side
    }

    /// Returns the index of this battler within its side.
    pub fn index(&self) -> usize {
        self.position.index
    }

    /// Returns the variant specific data.
    pub fn kind(&self) -> &BattlerKind {
        &self.kind
    }

    /// Returns true for player controlled battlers.
    pub fn is_actor(&self) -> bool {
        matches!(self.kind, BattlerKind::Actor(_))
    }

    /// Returns true for AI controlled battlers.
    pub fn is_enemy(&self) -> bool {
        matches!(self.kind, BattlerKind::Enemy(_))
    }

    /// Returns the level used by formulas.
    pub fn level(&self) -> i32 {
        match &self.kind {
            BattlerKind::Actor(profile) => profile.level,
            BattlerKind::Enemy(profile) => profile.level,
        }
    }

    /// Returns the abilities this battler may choose from.
    pub fn abilities(&self) -> Vec<AbilityId> {
        match &self.kind {
            BattlerKind::Actor(profile) => profile.abilities.clone(),
            BattlerKind::Enemy(profile) => profile.actions.iter().map(|a| a.ability).collect(),
        }
    }

    /// Returns true if this battler may use the ability `id`. Everyone can attack.
    pub fn knows(&self, id: AbilityId) -> bool {
        if id == ATTACK_ABILITY_ID {
            return true;
        }
        match &self.kind {
            BattlerKind::Actor(profile) => profile.abilities.contains(&id),
            BattlerKind::Enemy(profile) => profile.actions.iter().any(|a| a.ability == id),
        }
    }

    /// Settles the defeat state after hit points changed: a battler holding the death
    /// state with hit points left is revived. Returns true if it was revived.
    pub fn settle_defeat(&mut self) -> bool {
        self.hp > 0 && self.remove_state(DEATH_STATE_ID)
    }

    /// Returns the own traits, including class and equipment traits.
    pub fn traits(&self) -> &[Trait] {
        &self.traits
    }

    fn all_traits(&self) -> impl Iterator<Item = &Trait> {
        self.traits.iter().chain(self.states.traits())
    }

    /// Returns a parameter before rates and buffs: base plus equipment bonus.
    pub fn base_param(&self, param: Param) -> i32 {
        self.params[param.index()] + self.equip_bonus[param.index()]
    }

    /// Returns the product of all rate traits affecting a parameter.
    pub fn param_rate(&self, param: Param) -> f64 {
        self.all_traits()
            .filter_map(|t| match t {
                Trait::ParamRate { param: p, rate } if *p == param => Some(*rate),
                _ => None,
            })
            .product()
    }

    /// Returns the effective value of a parameter.
    pub fn param(&self, param: Param) -> i32 {
        let value = f64::from(self.base_param(param))
            * self.param_rate(param)
            * self.buffs.rate(param);
        let value = value.floor() as i32;
        match param {
            Param::MaxHp | Param::MaxMp => value.max(1),
            _ => value.max(0),
        }
    }

    /// Returns an additive rate parameter.
    pub fn xparam(&self, param: XParam) -> f64 {
        self.all_traits()
            .filter_map(|t| match t {
                Trait::XParam { param: p, value } if *p == param => Some(*value),
                _ => None,
            })
            .sum()
    }

    /// Returns a multiplicative rate parameter.
    pub fn sparam(&self, param: SParam) -> f64 {
        self.all_traits()
            .filter_map(|t| match t {
                Trait::SParam { param: p, rate } if *p == param => Some(*rate),
                _ => None,
            })
            .product()
    }

    /// Returns the multiplier of damage received from an element.
    pub fn element_rate(&self, element: ElementId) -> f64 {
        self.all_traits()
            .filter_map(|t| match t {
                Trait::ElementRate { element: e, rate } if *e == element => Some(*rate),
                _ => None,
            })
            .product()
    }

    /// Returns the elements carried by the basic attack.
    pub fn attack_elements(&self) -> Vec<ElementId> {
        let mut elements = Vec::new();
        for t in self.all_traits() {
            if let Trait::AttackElement { element } = t {
                if !elements.contains(element) {
                    elements.push(*element);
                }
            }
        }
        elements
    }

    /// Returns the multiplier applied to the chance of receiving a state.
    pub fn state_rate(&self, state: StateId) -> f64 {
        if self.is_state_resisted(state) {
            return 0.0;
        }
        self.all_traits()
            .filter_map(|t| match t {
                Trait::StateRate { state: s, rate } if *s == state => Some(*rate),
                _ => None,
            })
            .product()
    }

    /// Returns true if this battler is immune to a state.
    pub fn is_state_resisted(&self, state: StateId) -> bool {
        self.all_traits()
            .any(|t| matches!(t, Trait::StateResist { state: s } if *s == state))
    }

    /// Returns the maximum hit points.
    pub fn mhp(&self) -> i32 {
        self.param(Param::MaxHp)
    }

    /// Returns the maximum magic points.
    pub fn mmp(&self) -> i32 {
        self.param(Param::MaxMp)
    }

    /// Returns the current hit points.
    pub fn hp(&self) -> i32 {
        self.hp
    }

    /// Returns the current magic points.
    pub fn mp(&self) -> i32 {
        self.mp
    }

    /// Returns the current tactical points.
    pub fn tp(&self) -> i32 {
        self.tp
    }

    /// Sets the hit points, clamped to `[0, mhp]`.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = num_traits::clamp(hp, 0, self.mhp());
    }

    /// Sets the magic points, clamped to `[0, mmp]`.
    pub fn set_mp(&mut self, mp: i32) {
        self.mp = num_traits::clamp(mp, 0, self.mmp());
    }

    /// Sets the tactical points, clamped to `[0, 100]`.
    pub fn set_tp(&mut self, tp: i32) {
        self.tp = num_traits::clamp(tp, 0, MAX_TP);
    }

    /// Adds `delta` hit points. Returns the actual change.
    pub fn gain_hp(&mut self, delta: i32) -> i32 {
        let before = self.hp;
        self.set_hp(self.hp.saturating_add(delta));
        self.hp - before
    }

    /// Adds `delta` magic points. Returns the actual change.
    pub fn gain_mp(&mut self, delta: i32) -> i32 {
        let before = self.mp;
        self.set_mp(self.mp.saturating_add(delta));
        self.mp - before
    }

    /// Adds `delta` tactical points. Returns the actual change.
    pub fn gain_tp(&mut self, delta: i32) -> i32 {
        let before = self.tp;
        self.set_tp(self.tp.saturating_add(delta));
        self.tp - before
    }

    /// Returns the ratio between current and maximum hit points.
    pub fn hp_rate(&self) -> f64 {
        f64::from(self.hp) / f64::from(self.mhp())
    }

    /// Returns the ratio between current and maximum magic points.
    pub fn mp_rate(&self) -> f64 {
        f64::from(self.mp) / f64::from(self.mmp())
    }

    /// Returns true if the battler is out of the fight.
    pub fn is_dead(&self) -> bool {
        self.hp == 0 || self.states.contains(DEATH_STATE_ID)
    }

    /// Returns true if the battler is still fighting.
    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// Returns true if the battler is alive and no state prevents it from acting.
    pub fn can_move(&self) -> bool {
        self.is_alive() && !self.states.restricted()
    }

    /// Re-clamps current values after a change of the maximums.
    fn refresh(&mut self) {
        self.set_hp(self.hp);
        self.set_mp(self.mp);
    }

    /// Returns a snapshot of the statistics used by formulas.
    pub fn stats(&self) -> CharacterStats {
        CharacterStats {
            hp: self.hp,
            mp: self.mp,
            atk: self.param(Param::Atk),
            def: self.param(Param::Def),
            mat: self.param(Param::Mat),
            mdf: self.param(Param::Mdf),
            agi: self.param(Param::Agi),
            luk: self.param(Param::Luk),
            level: self.level(),
        }
    }

    /// Returns the magic points this battler pays for `ability`.
    pub fn mp_cost(&self, ability: &Ability) -> i32 {
        (f64::from(ability.mp_cost) * self.sparam(SParam::MpCostRate)).floor() as i32
    }

    /// Returns true if this battler can pay for `ability`.
    pub fn can_pay(&self, ability: &Ability) -> bool {
        self.mp >= self.mp_cost(ability) && self.tp >= ability.tp_cost
    }

    /// Pays the costs of `ability` and collects the tactical points it grants.
    pub fn pay(&mut self, ability: &Ability) {
        let cost = self.mp_cost(ability);
        self.gain_mp(-cost);
        self.gain_tp(-ability.tp_cost);
        let gain = f64::from(ability.tp_gain) * self.sparam(SParam::TpChargeRate);
        self.gain_tp(gain.floor() as i32);
    }

    /// Returns the active states.
    pub fn states(&self) -> &States {
        &self.states
    }

    /// Returns true if the given state is active.
    pub fn has_state(&self, id: StateId) -> bool {
        self.states.contains(id)
    }

    /// Adds a state lasting `turns_left` turns, or refreshes it upward.
    ///
    /// Adding the death state knocks the battler out. Dead battlers receive no other
    /// state. Returns true if the state wasn't active before.
    pub fn add_state(&mut self, record: &StateRecord, turns_left: i32) -> bool {
        if record.id == DEATH_STATE_ID {
            if self.has_state(DEATH_STATE_ID) {
                return false;
            }
            self.states.clear();
            self.buffs.clear();
            self.hp = 0;
            return self.states.add(record, INDEFINITE);
        }
        if self.is_dead() {
            return false;
        }
        let added = self.states.add(record, turns_left);
        self.refresh();
        added
    }

    /// Removes a state. Removing the death state revives the battler with at least
    /// one hit point. Returns true if the state was active.
    pub fn remove_state(&mut self, id: StateId) -> bool {
        let removed = self.states.remove(id).is_some();
        if removed && id == DEATH_STATE_ID && self.hp == 0 {
            self.hp = 1;
        }
        self.refresh();
        removed
    }

    /// Knocks the battler out, using the death state from `data` when available.
    pub fn die(&mut self, data: &dyn DataProvider) {
        let record = data
            .state(DEATH_STATE_ID)
            .cloned()
            .unwrap_or_else(death_record);
        self.add_state(&record, INDEFINITE);
    }

    /// Advances the timers of states with the given timing.
    /// Returns the ids of the expired states.
    pub fn tick_states(&mut self, timing: AutoRemoval) -> Vec<StateId> {
        let expired = self.states.tick(timing);
        if !expired.is_empty() {
            self.refresh();
        }
        expired
    }

    /// Returns buff levels and counters.
    pub fn buffs(&self) -> &Buffs {
        &self.buffs
    }

    /// Raises the buff level of a parameter.
    pub fn add_buff(&mut self, param: Param, turns: u32) {
        self.buffs.add_buff(param, turns);
        self.refresh();
    }

    /// Lowers the buff level of a parameter.
    pub fn add_debuff(&mut self, param: Param, turns: u32) {
        self.buffs.add_debuff(param, turns);
        self.refresh();
    }

    /// Clears a positive buff. Returns true if there was one.
    pub fn remove_buff(&mut self, param: Param) -> bool {
        let removed = self.buffs.remove_buff(param);
        self.refresh();
        removed
    }

    /// Clears a negative buff. Returns true if there was one.
    pub fn remove_debuff(&mut self, param: Param) -> bool {
        let removed = self.buffs.remove_debuff(param);
        self.refresh();
        removed
    }

    /// Advances all buff counters. Returns the parameters whose buff expired.
    pub fn tick_buffs(&mut self) -> Vec<Param> {
        let expired = self.buffs.tick();
        if !expired.is_empty() {
            self.refresh();
        }
        expired
    }

    /// Returns true if the battler is guarding this round.
    pub fn is_guarding(&self) -> bool {
        self.guarding
    }

    /// Sets the guarding flag.
    pub fn set_guarding(&mut self, guarding: bool) {
        self.guarding = guarding;
    }

    /// Returns the action chosen for the current round.
    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Sets the action for the current round.
    pub fn set_action(&mut self, action: Action) {
        self.action = Some(action);
    }

    /// Forgets the action for the current round.
    pub fn clear_action(&mut self) {
        self.action = None;
    }

    /// Applies the regeneration rates. Returns the actual changes.
    pub fn regenerate(&mut self) -> Regeneration {
        if self.is_dead() {
            return Regeneration::default();
        }
        let hp = (f64::from(self.mhp()) * self.xparam(XParam::HpRegen)).floor() as i32;
        let mp = (f64::from(self.mmp()) * self.xparam(XParam::MpRegen)).floor() as i32;
        let tp = (f64::from(MAX_TP) * self.xparam(XParam::TpRegen)).floor() as i32;
        Regeneration {
            hp: self.gain_hp(hp),
            mp: self.gain_mp(mp),
            tp: self.gain_tp(tp),
        }
    }
}

/// Death state used when the data provider doesn't define one.
fn death_record() -> StateRecord {
    StateRecord {
        id: DEATH_STATE_ID,
        name: "Knockout".to_string(),
        auto_removal: AutoRemoval::None,
        min_turns: 0,
        max_turns: 0,
        restriction: Restriction::CannotMove,
        traits: Vec::new(),
    }
}
