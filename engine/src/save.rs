//! Save slots as pretty JSON files in one directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::combatant::Character;
use crate::context::GameContext;
use crate::items::MagicItem;
use crate::merchant::MerchantSystem;
use crate::state::GameState;

pub const AUTOSAVE_SLOT: &str = "autosave";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub scenario: String,
    /// Scene to resume at.
    pub scene: Option<String>,
    pub state: GameState,
    pub party: Vec<Character>,
    /// What is left of the shared treasure pool.
    #[serde(default)]
    pub magic_items: Vec<MagicItem>,
    /// Shop stock as it stood, if the run had merchants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchants: Option<MerchantSystem>,
}

impl SaveGame {
    pub fn capture(ctx: &GameContext) -> Self {
        Self {
            scenario: ctx.scenario_name.clone(),
            scene: ctx.current_scene.clone(),
            state: ctx.state.clone(),
            party: ctx.party.clone(),
            magic_items: ctx.magic_items.iter().cloned().collect(),
            merchants: ctx.merchants.clone(),
        }
    }

    /// Put the saved party, counters, treasure pool and shop stock back
    /// into `ctx`.
    pub fn restore_into(self, ctx: &mut GameContext) {
        ctx.party = self.party;
        ctx.state = self.state;
        ctx.current_scene = self.scene;
        ctx.magic_items = self.magic_items.into();
        if self.merchants.is_some() {
            ctx.merchants = self.merchants;
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        let clean: String = slot
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", clean))
    }

    pub fn save(&self, slot: &str, game: &SaveGame) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create save directory: {}", self.dir.display()))?;
        let path = self.slot_path(slot);
        let text = serde_json::to_string_pretty(game).context("failed to encode save")?;
        fs::write(&path, text).with_context(|| format!("failed to write save: {}", path.display()))?;
        info!(slot, path = %path.display(), "game saved");
        Ok(path)
    }

    pub fn load(&self, slot: &str) -> Result<SaveGame> {
        let path = self.slot_path(slot);
        let text = fs::read_to_string(&path).with_context(|| format!("failed to read save: {}", path.display()))?;
        let game = serde_json::from_str(&text).with_context(|| format!("failed to parse save: {}", path.display()))?;
        Ok(game)
    }

    /// Slot names, sorted. A missing directory means no saves.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut slots = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to list saves: {}", self.dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    slots.push(stem.to_string());
                }
            }
        }
        slots.sort();
        Ok(slots)
    }
}

/// Write the context to `slot` of its save store, if it has one.
pub fn save_context(ctx: &GameContext, slot: &str) -> Result<PathBuf> {
    let store = ctx.saves.as_ref().context("no save store configured")?;
    store.save(slot, &SaveGame::capture(ctx))
}
