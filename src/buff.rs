//! Temporary buffs and debuffs on basic parameters.

use crate::data::{Param, PARAM_COUNT};

/// Highest buff level.
pub const MAX_BUFF_LEVEL: i8 = 2;

/// Multiplier granted by each buff level.
pub const BUFF_STEP: f64 = 0.25;

/// Buff levels and turn counters for each basic parameter.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buffs {
    levels: [i8; PARAM_COUNT],
    turns: [u32; PARAM_COUNT],
}

impl Buffs {
    /// Returns the buff level of a parameter, within `[-2, 2]`.
    pub fn level(&self, param: Param) -> i8 {
        self.levels[param.index()]
    }

    /// Returns the remaining turns of a parameter's buff.
    pub fn turns(&self, param: Param) -> u32 {
        self.turns[param.index()]
    }

    /// Returns the multiplier applied to a parameter.
    pub fn rate(&self, param: Param) -> f64 {
        1.0 + BUFF_STEP * f64::from(self.level(param))
    }

    /// Raises the level by one and resets the counter.
    pub fn add_buff(&mut self, param: Param, turns: u32) {
        self.shift(param, 1, turns);
    }

    /// Lowers the level by one and resets the counter.
    pub fn add_debuff(&mut self, param: Param, turns: u32) {
        self.shift(param, -1, turns);
    }

    fn shift(&mut self, param: Param, delta: i8, turns: u32) {
        let i = param.index();
        self.levels[i] = num_traits::clamp(self.levels[i] + delta, -MAX_BUFF_LEVEL, MAX_BUFF_LEVEL);
        self.turns[i] = turns;
        if self.levels[i] == 0 {
            self.turns[i] = 0;
        }
    }

    /// Clears a positive buff. Returns true if there was one.
    pub fn remove_buff(&mut self, param: Param) -> bool {
        if self.level(param) > 0 {
            self.erase(param);
            true
        } else {
            false
        }
    }

    /// Clears a negative buff. Returns true if there was one.
    pub fn remove_debuff(&mut self, param: Param) -> bool {
        if self.level(param) < 0 {
            self.erase(param);
            true
        } else {
            false
        }
    }

    fn erase(&mut self, param: Param) {
        self.levels[param.index()] = 0;
        self.turns[param.index()] = 0;
    }

    /// Clears every buff and debuff.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Advances all counters by one turn.
    /// Buffs whose counter reaches zero are cleared and their parameters returned.
    pub fn tick(&mut self) -> Vec<Param> {
        let mut expired = Vec::new();
        for param in Param::ALL.iter().copied() {
            let i = param.index();
            if self.levels[i] == 0 {
                continue;
            }
            if self.turns[i] > 0 {
                self.turns[i] -= 1;
            }
            if self.turns[i] == 0 {
                self.levels[i] = 0;
                expired.push(param);
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_capped() {
        let mut buffs = Buffs::default();
        for _ in 0..5 {
            buffs.add_buff(Param::Atk, 3);
        }
        assert_eq!(buffs.level(Param::Atk), 2);
        assert_eq!(buffs.rate(Param::Atk), 1.5);
        for _ in 0..6 {
            buffs.add_debuff(Param::Atk, 3);
        }
        assert_eq!(buffs.level(Param::Atk), -2);
        assert_eq!(buffs.rate(Param::Atk), 0.5);
    }

    #[test]
    fn tick_expires() {
        let mut buffs = Buffs::default();
        buffs.add_buff(Param::Def, 2);
        buffs.add_debuff(Param::Agi, 1);
        assert_eq!(buffs.tick(), vec![Param::Agi]);
        assert_eq!(buffs.level(Param::Def), 1);
        assert_eq!(buffs.tick(), vec![Param::Def]);
        assert_eq!(buffs.level(Param::Def), 0);
        assert!(buffs.tick().is_empty());
    }

    #[test]
    fn removal_is_directional() {
        let mut buffs = Buffs::default();
        buffs.add_buff(Param::Mat, 3);
        assert!(!buffs.remove_debuff(Param::Mat));
        assert!(buffs.remove_buff(Param::Mat));
        assert_eq!(buffs.level(Param::Mat), 0);
    }
}
