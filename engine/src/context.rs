use std::collections::VecDeque;

use crate::combat::CombatSystem;
use crate::combatant::{Character, Combatant};
use crate::config::GameConfig;
use crate::factory::MonsterFactory;
use crate::items::{find_weapon, MagicItem, Weapon};
use crate::merchant::MerchantSystem;
use crate::render::Renderer;
use crate::save::SaveStore;
use crate::state::GameState;

/// Everything a scene may read or change while it runs.
///
/// Built once per run by the scenario driver and lent to each scene in turn.
/// Collaborator services are optional so a scene can report their absence
/// instead of assuming them.
pub struct GameContext {
    pub scenario_name: String,
    /// Roster order matters: the first slots are the front row.
    pub party: Vec<Character>,
    pub state: GameState,
    pub config: GameConfig,
    pub renderer: Box<dyn Renderer>,
    pub combat: Option<CombatSystem>,
    pub merchants: Option<MerchantSystem>,
    pub monsters: MonsterFactory,
    /// Equipment table, scenario entries first.
    pub weapons: Vec<Weapon>,
    /// Shared pool drawn from by treasure scenes; items are consumed.
    pub magic_items: VecDeque<MagicItem>,
    pub saves: Option<SaveStore>,
    /// Scene being executed, kept for saves.
    pub current_scene: Option<String>,
}

impl GameContext {
    /// A context with a combat system built from `config` and no other services.
    pub fn new(party: Vec<Character>, config: GameConfig, renderer: Box<dyn Renderer>) -> Self {
        let combat = Some(CombatSystem::from_config(&config));
        Self {
            scenario_name: String::new(),
            party,
            state: GameState::default(),
            config,
            renderer,
            combat,
            merchants: None,
            monsters: MonsterFactory::default(),
            weapons: Vec::new(),
            magic_items: VecDeque::new(),
            saves: None,
            current_scene: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.scenario_name = name.into();
        self
    }

    pub fn with_combat(mut self, combat: Option<CombatSystem>) -> Self {
        self.combat = combat;
        self
    }

    pub fn with_merchants(mut self, merchants: MerchantSystem) -> Self {
        self.merchants = Some(merchants);
        self
    }

    pub fn with_monsters(mut self, monsters: MonsterFactory) -> Self {
        self.monsters = monsters;
        self
    }

    pub fn with_weapons(mut self, weapons: Vec<Weapon>) -> Self {
        self.weapons = weapons;
        self
    }

    pub fn with_magic_items(mut self, items: impl IntoIterator<Item = MagicItem>) -> Self {
        self.magic_items = items.into_iter().collect();
        self
    }

    pub fn with_saves(mut self, saves: SaveStore) -> Self {
        self.saves = Some(saves);
        self
    }

    pub fn weapon(&self, name: &str) -> Option<&Weapon> {
        find_weapon(&self.weapons, name)
    }

    pub fn living_party(&self) -> impl Iterator<Item = &Character> {
        self.party.iter().filter(|c| c.is_alive())
    }

    /// Indices of living members, in roster order.
    pub fn living_indices(&self) -> Vec<usize> {
        (0..self.party.len()).filter(|&i| self.party[i].is_alive()).collect()
    }

    pub fn party_gold(&self) -> u32 {
        self.party.iter().map(|c| c.gold).sum()
    }

    /// Echo a batch of log lines to the renderer.
    pub fn show_lines(&mut self, lines: &[String]) {
        for line in lines {
            self.renderer.print_line(line);
        }
    }

    pub fn show_party_status(&mut self) {
        let lines: Vec<String> = self.party.iter().map(|c| format!("  {}", c.status_line())).collect();
        self.show_lines(&lines);
    }
}
