//! The two sides fighting a battle.

use crate::battler::Battler;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};

/// One of the two sides of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum Side {
    /// Player controlled battlers.
    Actors,
    /// AI controlled battlers.
    Enemies,
}

impl Side {
    /// Returns the other side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Actors => Side::Enemies,
            Side::Enemies => Side::Actors,
        }
    }
}

/// Address of a battler: its side and its index within that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct BattlerRef {
    /// Side.
    pub side: Side,
    /// Index within the side.
    pub index: usize,
}

impl BattlerRef {
    /// Creates a reference to an actor.
    pub fn actor(index: usize) -> Self {
        Self {
            side: Side::Actors,
            index,
        }
    }

    /// Creates a reference to an enemy.
    pub fn enemy(index: usize) -> Self {
        Self {
            side: Side::Enemies,
            index,
        }
    }
}

impl Display for BattlerRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.side {
            Side::Actors => write!(f, "actor#{}", self.index),
            Side::Enemies => write!(f, "enemy#{}", self.index),
        }
    }
}

/// Both sides of a battle.
///
/// Parties own every battler for the whole battle and hand out references by `BattlerRef`.
#[derive(Debug, Clone)]
pub struct Parties {
    actors: Vec<Battler>,
    enemies: Vec<Battler>,
}

impl Parties {
    /// Creates the parties, assigning to each battler its position.
    pub fn new(mut actors: Vec<Battler>, mut enemies: Vec<Battler>) -> Self {
        for (index, battler) in actors.iter_mut().enumerate() {
            battler.set_position(BattlerRef::actor(index));
        }
        for (index, battler) in enemies.iter_mut().enumerate() {
            battler.set_position(BattlerRef::enemy(index));
        }
        Self { actors, enemies }
    }

    /// Returns all battlers of a side.
    pub fn side(&self, side: Side) -> &[Battler] {
        match side {
            Side::Actors => &self.actors,
            Side::Enemies => &self.enemies,
        }
    }

    /// Returns all battlers of a side, mutably.
    pub fn side_mut(&mut self, side: Side) -> &mut [Battler] {
        match side {
            Side::Actors => &mut self.actors,
            Side::Enemies => &mut self.enemies,
        }
    }

    /// Returns the actors.
    pub fn actors(&self) -> &[Battler] {
        &self.actors
    }

    /// Returns the enemies.
    pub fn enemies(&self) -> &[Battler] {
        &self.enemies
    }

    /// Returns the battler at `position`.
    pub fn get(&self, position: BattlerRef) -> Option<&Battler> {
        self.side(position.side).get(position.index)
    }

    /// Returns the battler at `position`, mutably.
    pub fn get_mut(&mut self, position: BattlerRef) -> Option<&mut Battler> {
        self.side_mut(position.side).get_mut(position.index)
    }

    /// Returns an iterator over every battler, actors first.
    pub fn iter(&self) -> impl Iterator<Item = &Battler> {
        self.actors.iter().chain(self.enemies.iter())
    }

    /// Returns a mutable iterator over every battler, actors first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Battler> {
        self.actors.iter_mut().chain(self.enemies.iter_mut())
    }

    /// Returns the positions of the living battlers of a side.
    pub fn alive(&self, side: Side) -> Vec<BattlerRef> {
        self.side(side)
            .iter()
            .filter(|battler| battler.is_alive())
            .map(Battler::position)
            .collect()
    }

    /// Returns the positions of the dead battlers of a side.
    pub fn dead(&self, side: Side) -> Vec<BattlerRef> {
        self.side(side)
            .iter()
            .filter(|battler| battler.is_dead())
            .map(Battler::position)
            .collect()
    }

    /// Returns true if every battler of a side is dead. An empty side is all dead.
    pub fn all_dead(&self, side: Side) -> bool {
        self.side(side).iter().all(Battler::is_dead)
    }
}
