use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const COMBAT_VICTORIES: &str = "combat_victories";
pub const TOTAL_XP: &str = "total_xp";
pub const GOLD: &str = "gold";
pub const GOLD_SPENT: &str = "gold_spent";
pub const LOCATIONS_VISITED: &str = "locations_visited";
pub const NPCS_MET: &str = "npcs_met";
pub const QUESTS_COMPLETED: &str = "quests_completed";
pub const DEATHS: &str = "deaths";
/// Gold that could not be split evenly by a treasure scene.
pub const TREASURE_PURSE: &str = "treasure_purse";

const STANDARD_COUNTERS: [&str; 8] = [
    COMBAT_VICTORIES,
    TOTAL_XP,
    GOLD,
    GOLD_SPENT,
    LOCATIONS_VISITED,
    NPCS_MET,
    QUESTS_COMPLETED,
    DEATHS,
];

/// Named integer counters adjusted by scene effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameState {
    counters: IndexMap<String, i64>,
}

impl Default for GameState {
    fn default() -> Self {
        let counters = STANDARD_COUNTERS.iter().map(|k| (k.to_string(), 0)).collect();
        Self { counters }
    }
}

impl GameState {
    pub fn get(&self, key: &str) -> i64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.counters.contains_key(key)
    }

    /// Adds `delta`, creating the counter on first use.
    pub fn add(&mut self, key: &str, delta: i64) {
        *self.counters.entry(key.to_string()).or_insert(0) += delta;
    }

    pub fn apply_effects(&mut self, effects: &IndexMap<String, i64>) {
        for (key, delta) in effects {
            self.add(key, *delta);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.counters.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
