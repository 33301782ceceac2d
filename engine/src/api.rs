//! Headless encounters for balancing: party templates against monster ids,
//! no renderer and no scene graph.

use std::fs;

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::combat::{CombatOutcome, CombatSystem, DEFAULT_MAX_ROUNDS};
use crate::combatant::{Character, Combatant, Monster};
use crate::config::CombatVariant;
use crate::factory::{CharacterFactory, MonsterDef, MonsterFactory};
use crate::Dice;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EncounterConfig {
    /// Character template ids, front row first.
    pub party: Vec<String>,
    /// Monster ids resolved against `monsters_path` then the built-in table.
    pub monsters: Vec<String>,
    #[serde(default)]
    pub monsters_path: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub variant: CombatVariant,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

fn default_max_rounds() -> u32 {
    DEFAULT_MAX_ROUNDS
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EncounterResult {
    pub outcome: CombatOutcome,
    pub rounds: u32,
    pub xp: u32,
    pub survivors: Vec<String>,
    pub party_hp_end: Vec<i32>,
    pub log: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchSummary {
    pub trials: u32,
    pub victories: u32,
    pub defeats: u32,
    pub stalemates: u32,
    pub win_rate: f64,
    pub avg_rounds: f64,
    pub median_rounds: u32,
}

struct Roster {
    party: Vec<Character>,
    monsters: Vec<Monster>,
}

fn build_roster(cfg: &EncounterConfig) -> Result<Roster> {
    if cfg.party.is_empty() {
        bail!("encounter needs at least one party member");
    }
    if cfg.monsters.is_empty() {
        bail!("encounter needs at least one monster");
    }

    let local = match &cfg.monsters_path {
        Some(path) => load_monsters(path)?,
        None => IndexMap::new(),
    };
    let factory = MonsterFactory::new(local).with_source(Box::new(crate::content::builtin_monsters()?));
    let heroes = CharacterFactory::builtin();

    let party = cfg
        .party
        .iter()
        .map(|id| heroes.create(id, None).with_context(|| format!("unknown character template '{}'", id)))
        .collect::<Result<Vec<_>>>()?;
    let monsters = cfg
        .monsters
        .iter()
        .map(|id| factory.create(id).with_context(|| format!("monster '{}' not found", id)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Roster { party, monsters })
}

fn load_monsters(path: &str) -> Result<IndexMap<String, MonsterDef>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read monsters JSON: {}", path))?;
    let data = serde_json::from_str(&text).with_context(|| format!("failed to parse monsters JSON: {}", path))?;
    Ok(data)
}

fn fight(roster: &mut Roster, cfg: &EncounterConfig, seed: u64) -> EncounterResult {
    let mut system = CombatSystem::new(cfg.variant, cfg.max_rounds, Dice::from_seed(seed));
    let report = system.run(&mut roster.party, &mut roster.monsters);
    EncounterResult {
        outcome: report.outcome,
        rounds: report.rounds,
        xp: report.xp,
        survivors: roster.party.iter().filter(|c| c.is_alive()).map(|c| c.name.clone()).collect(),
        party_hp_end: roster.party.iter().map(|c| c.hit_points()).collect(),
        log: report.log,
    }
}

pub fn simulate_encounter(cfg: &EncounterConfig) -> Result<EncounterResult> {
    let mut roster = build_roster(cfg)?;
    Ok(fight(&mut roster, cfg, cfg.seed))
}

/// Run `trials` fresh copies of the encounter; trial `i` uses `seed + i`.
pub fn simulate_encounter_many(cfg: &EncounterConfig, trials: u32) -> Result<BatchSummary> {
    if trials == 0 {
        bail!("trials must be at least 1");
    }
    let template = build_roster(cfg)?;
    let mut victories = 0u32;
    let mut defeats = 0u32;
    let mut stalemates = 0u32;
    let mut rounds_vec: Vec<u32> = Vec::with_capacity(trials as usize);

    for i in 0..trials {
        let mut roster = Roster { party: template.party.clone(), monsters: template.monsters.clone() };
        let result = fight(&mut roster, cfg, cfg.seed.wrapping_add(u64::from(i)));
        match result.outcome {
            CombatOutcome::Victory => {
                victories += 1;
                rounds_vec.push(result.rounds);
            }
            CombatOutcome::Defeat => defeats += 1,
            CombatOutcome::Stalemate => stalemates += 1,
        }
    }

    rounds_vec.sort_unstable();
    let avg_rounds = if rounds_vec.is_empty() {
        0.0
    } else {
        rounds_vec.iter().map(|&r| f64::from(r)).sum::<f64>() / rounds_vec.len() as f64
    };
    let median_rounds = if rounds_vec.is_empty() {
        0
    } else {
        let m = rounds_vec.len() / 2;
        if rounds_vec.len() % 2 == 1 {
            rounds_vec[m]
        } else {
            (rounds_vec[m - 1] + rounds_vec[m]) / 2
        }
    };

    Ok(BatchSummary {
        trials,
        victories,
        defeats,
        stalemates,
        win_rate: f64::from(victories) / f64::from(trials),
        avg_rounds,
        median_rounds,
    })
}
