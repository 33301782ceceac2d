use std::{fmt, str::FromStr};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub mod api;
pub mod combat;
pub mod combatant;
pub mod conditions;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod factory;
pub mod items;
pub mod life;
pub mod logging;
pub mod manager;
pub mod merchant;
pub mod render;
pub mod save;
pub mod scenario;
pub mod scene;
pub mod state;

pub use combat::{resolve_attack, run_combat, AttackOutcome, CombatOutcome, CombatReport, CombatSystem};
pub use combatant::{AttackProfile, Character, CharacterClass, Combatant, Monster, MonsterAction};
pub use config::{CombatVariant, GameConfig, TextSpeed};
pub use context::GameContext;
pub use error::{ContentError, DiceError, SceneError, TradeError};
pub use manager::{RunSummary, SceneManager};
pub use scene::{Scene, SceneOutcome, SceneResult};
pub use state::GameState;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum AdMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

enum DiceSource {
    Seeded(ChaCha8Rng),
    Scripted { values: Vec<i32>, cursor: usize },
}

/// Randomness source for every roll in the engine.
///
/// Scripted dice replay a fixed sequence (cycling when exhausted), which is
/// how tests pin attack and damage rolls.
pub struct Dice {
    source: DiceSource,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self { source: DiceSource::Seeded(ChaCha8Rng::seed_from_u64(seed)) }
    }

    pub fn from_entropy() -> Self {
        Self { source: DiceSource::Seeded(ChaCha8Rng::from_entropy()) }
    }

    pub fn from_scripted(values: Vec<i32>) -> Self {
        Self { source: DiceSource::Scripted { values, cursor: 0 } }
    }

    /// Uniform roll in `1..=sides`. Scripted values are clamped into that range.
    pub fn roll(&mut self, sides: u32) -> i32 {
        let sides = sides.max(1) as i32;
        match &mut self.source {
            DiceSource::Seeded(rng) => rng.gen_range(1..=sides),
            DiceSource::Scripted { values, cursor } => {
                if values.is_empty() {
                    return 1;
                }
                let v = values[*cursor % values.len()];
                *cursor += 1;
                v.clamp(1, sides)
            }
        }
    }

    pub fn d20(&mut self, mode: AdMode) -> i32 {
        self.d20_detailed(mode).0
    }

    /// Returns the kept d20 and every raw die rolled.
    pub fn d20_detailed(&mut self, mode: AdMode) -> (i32, Vec<i32>) {
        match mode {
            AdMode::Normal => {
                let a = self.roll(20);
                (a, vec![a])
            }
            AdMode::Advantage => {
                let a = self.roll(20);
                let b = self.roll(20);
                (a.max(b), vec![a, b])
            }
            AdMode::Disadvantage => {
                let a = self.roll(20);
                let b = self.roll(20);
                (a.min(b), vec![a, b])
            }
        }
    }

    pub fn roll_dice(&mut self, dice: DamageDice) -> i32 {
        (0..dice.count).map(|_| self.roll(dice.sides as u32)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityScores {
    #[serde(rename = "str")]
    pub str_: i32,
    pub dex: i32,
    pub con: i32,
    #[serde(rename = "int")]
    pub int_: i32,
    pub wis: i32,
    pub cha: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self { str_: 10, dex: 10, con: 10, int_: 10, wis: 10, cha: 10 }
    }
}

impl AbilityScores {
    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Str => self.str_,
            Ability::Dex => self.dex,
            Ability::Con => self.con,
            Ability::Int => self.int_,
            Ability::Wis => self.wis,
            Ability::Cha => self.cha,
        }
    }

    pub fn mod_of(&self, ability: Ability) -> i32 {
        ability_mod(self.score(ability))
    }
}

/// D&D ability modifier = floor((score - 10) / 2) for integer scores.
pub fn ability_mod(score: i32) -> i32 {
    // `div_euclid` with positive divisor matches mathematical floor division.
    (score - 10).div_euclid(2)
}

/// 2 at levels 1-4, 3 at 5-8, and so on.
pub fn proficiency_bonus(level: u32) -> i32 {
    2 + (level.max(1) as i32 - 1) / 4
}

/// A damage expression such as `2d6+3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageDice {
    pub count: u8,
    pub sides: u8,
    #[serde(default)]
    pub bonus: i32,
}

impl DamageDice {
    pub const FALLBACK: DamageDice = DamageDice { count: 1, sides: 6, bonus: 0 };

    pub const fn new(count: u8, sides: u8) -> Self {
        Self { count, sides, bonus: 0 }
    }

    pub const fn with_bonus(self, bonus: i32) -> Self {
        Self { bonus, ..self }
    }

    /// Parses the expression, falling back to a flat d6 when it is unusable.
    pub fn parse_or_default(expr: &str) -> Self {
        match expr.parse() {
            Ok(dice) => dice,
            Err(err) => {
                warn!(expr, error = %err, "unparsable damage expression, using 1d6");
                Self::FALLBACK
            }
        }
    }
}

impl FromStr for DamageDice {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase();
        if cleaned.is_empty() {
            return Err(DiceError::Empty);
        }
        let (dice_part, bonus) = match cleaned.find(['+', '-']) {
            Some(idx) => {
                let bonus: i32 = cleaned[idx..]
                    .trim_start_matches('+')
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
                (&cleaned[..idx], bonus)
            }
            None => (cleaned.as_str(), 0),
        };
        let (count_str, sides_str) = dice_part
            .split_once('d')
            .ok_or_else(|| DiceError::InvalidNotation(s.to_string()))?;
        let count: u8 = if count_str.is_empty() {
            1
        } else {
            count_str.parse().map_err(|_| DiceError::InvalidNotation(s.to_string()))?
        };
        let sides: u8 = sides_str.parse().map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
        if count == 0 {
            return Err(DiceError::NoDice(s.to_string()));
        }
        if sides < 2 {
            return Err(DiceError::InvalidDieSize(sides as u32));
        }
        Ok(Self { count, sides, bonus })
    }
}

impl fmt::Display for DamageDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{}", b),
            b => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackResult {
    pub raw_rolls: Vec<i32>,
    pub roll: i32,
    pub total: i32,
    pub ac: i32,
    pub nat1: bool,
    pub nat20: bool,
    pub is_crit: bool,
    pub hit: bool,
}

/// Roll to hit: a natural 1 always misses, a natural 20 always hits and crits.
pub fn attack(dice: &mut Dice, mode: AdMode, bonus: i32, ac: i32) -> AttackResult {
    let (roll, raw_rolls) = dice.d20_detailed(mode);
    let total = roll + bonus;
    let nat1 = roll == 1;
    let nat20 = roll == 20;
    let hit = nat20 || (!nat1 && total >= ac);
    AttackResult { raw_rolls, roll, total, ac, nat1, nat20, is_crit: nat20, hit }
}

/// Damage roll; a critical rolls the dice twice. Never less than 1.
pub fn damage(dice: &mut Dice, spec: DamageDice, modifier: i32, crit: bool) -> i32 {
    let mut total = dice.roll_dice(spec);
    if crit {
        total += dice.roll_dice(spec);
    }
    (total + spec.bonus + modifier).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_expressions() {
        assert_eq!("1d8".parse::<DamageDice>().unwrap(), DamageDice::new(1, 8));
        assert_eq!("2d6+3".parse::<DamageDice>().unwrap(), DamageDice::new(2, 6).with_bonus(3));
        assert_eq!("d4 - 1".parse::<DamageDice>().unwrap(), DamageDice::new(1, 4).with_bonus(-1));
    }

    #[test]
    fn rejects_garbage_and_falls_back() {
        assert!("fireball".parse::<DamageDice>().is_err());
        assert!("0d6".parse::<DamageDice>().is_err());
        assert!("1d1".parse::<DamageDice>().is_err());
        assert_eq!(DamageDice::parse_or_default("two swords"), DamageDice::FALLBACK);
    }

    #[test]
    fn proficiency_steps_every_four_levels() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(17), 6);
    }

    #[test]
    fn display_round_trips_notation() {
        assert_eq!(DamageDice::new(2, 6).with_bonus(-2).to_string(), "2d6-2");
        assert_eq!(DamageDice::new(1, 10).to_string(), "1d10");
    }
}
