use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::factory::{CharacterDef, MonsterDef};
use crate::items::Weapon;

pub const GOBLIN_AMBUSH: &str = include_str!("../content/scenarios/goblin_ambush.json");

pub fn builtin_scenarios() -> IndexMap<&'static str, &'static str> {
    IndexMap::from([("goblin_ambush", GOBLIN_AMBUSH)])
}

pub fn builtin_monsters() -> Result<IndexMap<String, MonsterDef>> {
    serde_json::from_str(include_str!("../content/monsters/basic.json")).context("failed to parse built-in monsters")
}

pub fn builtin_weapons() -> Result<Vec<Weapon>> {
    serde_json::from_str(include_str!("../content/weapons/basic.json")).context("failed to parse built-in weapons")
}

pub fn builtin_characters() -> Result<IndexMap<String, CharacterDef>> {
    serde_json::from_str(include_str!("../content/characters/templates.json"))
        .context("failed to parse built-in character templates")
}
