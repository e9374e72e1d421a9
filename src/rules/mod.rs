//! Predefined implementations of the pluggable parts of a battle.

pub mod database;
pub mod entropy;
