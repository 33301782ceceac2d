//! Scenario documents and the driver that plays them.
//!
//! A document names its start scene, party and local tables, and lists scene
//! records. Loading never fails because of one bad scene; it only fails when
//! the document itself cannot be read.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::combatant::{Character, Combatant};
use crate::config::GameConfig;
use crate::context::GameContext;
use crate::error::SceneError;
use crate::factory::{build_scenes, CharacterFactory, CharacterOverrides, MonsterDef, MonsterFactory};
use crate::items::{find_weapon, MagicItem, Weapon};
use crate::manager::{RunSummary, SceneManager};
use crate::merchant::MerchantSystem;
use crate::render::Renderer;
use crate::scene::{Scene, GAME_OVER};
use crate::state::{GameState, DEATHS, GOLD, GOLD_SPENT, QUESTS_COMPLETED, TOTAL_XP};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyEntry {
    pub template: String,
    /// Weapon name looked up in the equipment table, replacing the template's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    #[serde(flatten)]
    pub overrides: CharacterOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioDoc {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub party: Vec<PartyEntry>,
    #[serde(default)]
    pub monsters: IndexMap<String, MonsterDef>,
    #[serde(default)]
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub magic_items: Vec<MagicItem>,
    #[serde(default)]
    pub merchants: MerchantSystem,
    #[serde(default)]
    pub scenes: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rank {
    Novice,
    Brave,
    Valiant,
    Heroic,
    Legendary,
}

impl Rank {
    pub fn for_score(score: i64) -> Self {
        match score {
            s if s >= 2000 => Rank::Legendary,
            s if s >= 1500 => Rank::Heroic,
            s if s >= 1000 => Rank::Valiant,
            s if s >= 500 => Rank::Brave,
            _ => Rank::Novice,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalStats {
    pub score: i64,
    pub rank: Rank,
    pub survivors: usize,
    pub state: GameState,
}

impl FinalStats {
    /// XP, net gold, survivors and their remaining HP, quests, minus deaths.
    pub fn compute(party: &[Character], state: &GameState) -> Self {
        let alive: Vec<&Character> = party.iter().filter(|c| c.is_alive()).collect();
        let mut score = state.get(TOTAL_XP);
        score += (state.get(GOLD) - state.get(GOLD_SPENT)).div_euclid(10);
        score += alive.len() as i64 * 100;
        for member in &alive {
            score += (member.health.ratio() * 50.0).floor() as i64;
        }
        score += state.get(QUESTS_COMPLETED) * 200;
        score -= state.get(DEATHS) * 100;
        let score = score.max(0);
        Self { score, rank: Rank::for_score(score), survivors: alive.len(), state: state.clone() }
    }
}

pub struct PlayReport {
    pub summary: RunSummary,
    pub stats: FinalStats,
}

pub struct Scenario {
    pub name: String,
    pub description: String,
    pub start: String,
    pub manager: SceneManager,
    /// Scene records that could not be converted.
    pub skipped: usize,
    party: Vec<PartyEntry>,
    monsters: IndexMap<String, MonsterDef>,
    weapons: Vec<Weapon>,
    magic_items: Vec<MagicItem>,
    merchants: MerchantSystem,
}

impl Scenario {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let doc: ScenarioDoc = serde_json::from_str(text).context("failed to parse scenario JSON")?;
        Ok(Self::from_doc(doc))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let doc: ScenarioDoc = serde_yaml::from_str(text).context("failed to parse scenario YAML")?;
        Ok(Self::from_doc(doc))
    }

    /// Picks the parser from the file extension; anything but `.yaml`/`.yml`
    /// is read as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("failed to read scenario: {}", path.display()))?;
        Self::parse(&text, path)
    }

    /// Same as [`Scenario::load`] for text that was already read.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        let scenario = if yaml { Self::from_yaml_str(text) } else { Self::from_json_str(text) };
        scenario.with_context(|| format!("invalid scenario: {}", path.display()))
    }

    pub fn from_doc(doc: ScenarioDoc) -> Self {
        let load = build_scenes(&doc.scenes);
        let mut manager = SceneManager::new();
        for scene in load.scenes {
            manager.add_scene(scene);
        }
        if !manager.contains(GAME_OVER) {
            manager.add_scene(Scene::narrative(
                GAME_OVER,
                "Game Over",
                "Your adventure ends here. The darkness claims another band of heroes.",
            ));
        }
        if load.skipped > 0 {
            warn!(scenario = %doc.name, skipped = load.skipped, "some scene records were skipped");
        }
        info!(scenario = %doc.name, scenes = manager.len(), "scenario loaded");
        Self {
            name: doc.name,
            description: doc.description,
            start: doc.start,
            manager,
            skipped: load.skipped,
            party: doc.party,
            monsters: doc.monsters,
            weapons: doc.weapons,
            magic_items: doc.magic_items,
            merchants: doc.merchants,
        }
    }

    /// Dangling successors reachable from the start scene.
    pub fn validate(&self) -> Vec<(String, String)> {
        if self.start.is_empty() {
            return vec![(String::new(), String::new())];
        }
        self.manager.validate(&self.start)
    }

    /// Scenario weapons followed by the built-in table.
    pub fn equipment(&self) -> Vec<Weapon> {
        let mut table = self.weapons.clone();
        match crate::content::builtin_weapons() {
            Ok(builtin) => table.extend(builtin),
            Err(err) => warn!(error = %err, "built-in weapons unavailable"),
        }
        table
    }

    /// Party from the document, falling back to one of each built-in template.
    pub fn build_party(&self, factory: &CharacterFactory, equipment: &[Weapon]) -> Vec<Character> {
        if self.party.is_empty() {
            let ids: Vec<String> = factory.template_ids().map(String::from).collect();
            return ids.iter().filter_map(|id| factory.create(id, None)).collect();
        }
        self.party
            .iter()
            .filter_map(|entry| {
                let mut member = factory.create(&entry.template, Some(&entry.overrides))?;
                if let Some(name) = &entry.weapon {
                    match find_weapon(equipment, name) {
                        Some(weapon) => member.weapon = Some(weapon.clone()),
                        None => warn!(member = %member.name, weapon = %name, "unknown weapon, keeping template gear"),
                    }
                }
                Some(member)
            })
            .collect()
    }

    /// Fresh context with every table the document carries. Monster ids the
    /// document does not define fall back to the built-in table.
    pub fn context(&self, config: GameConfig, renderer: Box<dyn Renderer>) -> GameContext {
        let mut monsters = MonsterFactory::new(self.monsters.clone());
        match crate::content::builtin_monsters() {
            Ok(table) => monsters = monsters.with_source(Box::new(table)),
            Err(err) => warn!(error = %err, "built-in monsters unavailable"),
        }
        let equipment = self.equipment();
        let party = self.build_party(&CharacterFactory::builtin(), &equipment);
        GameContext::new(party, config, renderer)
            .with_name(self.name.clone())
            .with_monsters(monsters)
            .with_weapons(equipment)
            .with_magic_items(self.magic_items.clone())
            .with_merchants(self.merchants.clone())
    }

    /// Run from `start` (or the document's start scene) and score the result.
    pub fn run(&mut self, ctx: &mut GameContext, start: Option<&str>) -> PlayReport {
        let start = start.unwrap_or(&self.start).to_string();
        let summary = if start.is_empty() {
            let err = SceneError::NoStartScene;
            warn!(scenario = %self.name, error = %err, "nothing to play");
            RunSummary {
                result: crate::scene::SceneResult::Failure,
                steps: 0,
                history: Vec::new(),
                pending: None,
                error: Some(err),
            }
        } else {
            self.manager.run(ctx, &start)
        };
        let stats = FinalStats::compute(&ctx.party, &ctx.state);
        ctx.renderer.print_line(&format!("Final score: {} ({})", stats.score, stats.rank));
        PlayReport { summary, stats }
    }

    pub fn play(&mut self, config: GameConfig, renderer: Box<dyn Renderer>) -> PlayReport {
        let mut ctx = self.context(config, renderer);
        self.run(&mut ctx, None)
    }
}
