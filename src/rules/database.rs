//! In-memory implementation of `DataProvider`.

use crate::data::{
    Ability, AbilityId, Class, ClassId, DataProvider, EnemyId, EnemyTemplate, Item, ItemId,
    StateId, StateRecord,
};
use indexmap::IndexMap;
#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Raw data tables, as exported by the game's editor.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct Tables {
    /// Abilities.
    pub abilities: Vec<Ability>,
    /// Items.
    pub items: Vec<Item>,
    /// Enemy templates.
    pub enemies: Vec<EnemyTemplate>,
    /// States.
    pub states: Vec<StateRecord>,
    /// Classes.
    pub classes: Vec<Class>,
}

/// A `DataProvider` keeping every table in memory, indexed by id.
///
/// Records with the same id replace the previous ones.
#[derive(Debug, Default, Clone)]
pub struct Database {
    abilities: IndexMap<AbilityId, Ability>,
    items: IndexMap<ItemId, Item>,
    enemies: IndexMap<EnemyId, EnemyTemplate>,
    states: IndexMap<StateId, StateRecord>,
    classes: IndexMap<ClassId, Class>,
}

impl Database {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ability.
    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.abilities.insert(ability.id, ability);
        self
    }

    /// Adds an item.
    pub fn with_item(mut self, item: Item) -> Self {
        self.items.insert(item.id, item);
        self
    }

    /// Adds an enemy template.
    pub fn with_enemy(mut self, enemy: EnemyTemplate) -> Self {
        self.enemies.insert(enemy.id, enemy);
        self
    }

    /// Adds a state.
    pub fn with_state(mut self, state: StateRecord) -> Self {
        self.states.insert(state.id, state);
        self
    }

    /// Adds a class.
    pub fn with_class(mut self, class: Class) -> Self {
        self.classes.insert(class.id, class);
        self
    }

    /// Returns an iterator over all abilities.
    pub fn abilities(&self) -> impl Iterator<Item = &Ability> {
        self.abilities.values()
    }

    /// Returns an iterator over all enemy templates.
    pub fn enemies(&self) -> impl Iterator<Item = &EnemyTemplate> {
        self.enemies.values()
    }
}

impl From<Tables> for Database {
    fn from(tables: Tables) -> Self {
        let mut database = Database::new();
        database.abilities = tables.abilities.into_iter().map(|e| (e.id, e)).collect();
        database.items = tables.items.into_iter().map(|e| (e.id, e)).collect();
        database.enemies = tables.enemies.into_iter().map(|e| (e.id, e)).collect();
        database.states = tables.states.into_iter().map(|e| (e.id, e)).collect();
        database.classes = tables.classes.into_iter().map(|e| (e.id, e)).collect();
        database
    }
}

impl DataProvider for Database {
    fn ability(&self, id: AbilityId) -> Option<&Ability> {
        self.abilities.get(&id)
    }

    fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    fn enemy(&self, id: EnemyId) -> Option<&EnemyTemplate> {
        self.enemies.get(&id)
    }

    fn state(&self, id: StateId) -> Option<&StateRecord> {
        self.states.get(&id)
    }

    fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(id: ClassId, name: &str) -> Class {
        Class {
            id,
            name: name.to_string(),
            traits: Vec::new(),
        }
    }

    #[test]
    fn later_records_replace_earlier_ones() {
        let tables = Tables {
            classes: vec![class(1, "fighter"), class(1, "mage"), class(2, "thief")],
            ..Default::default()
        };
        let database = Database::from(tables);
        assert_eq!(database.class(1).map(|c| c.name.as_str()), Some("mage"));
        assert_eq!(database.class(2).map(|c| c.name.as_str()), Some("thief"));
        assert!(database.class(3).is_none());
    }
}
