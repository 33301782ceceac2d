//! Combat resolution: one attack ([`resolve_attack`]) and the round loop
//! ([`run_combat`]) that drives two rosters until one side is down.

pub mod actions;
mod resolver;

use serde::Serialize;
use tracing::info;

use crate::combatant::{Character, Combatant, Monster};
use crate::config::{CombatVariant, GameConfig};
use crate::Dice;

use actions::{cast_heal, choose_party_action, drink_potion, select_monster_target, PartyAction};
pub use resolver::{resolve_attack, AttackOutcome};

pub const DEFAULT_MAX_ROUNDS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    Victory,
    /// No party member left standing, including a mutual wipe.
    Defeat,
    /// Round cap reached with both sides still up.
    Stalemate,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombatReport {
    pub outcome: CombatOutcome,
    pub rounds: u32,
    /// XP of every monster that ended the fight at 0 HP.
    pub xp: u32,
    pub monsters_defeated: usize,
    /// Party members who were up at the start and down at the end.
    pub downed_party: Vec<String>,
    pub log: Vec<String>,
}

/// The combat service wired into the game context.
pub struct CombatSystem {
    pub variant: CombatVariant,
    pub max_rounds: u32,
    dice: Dice,
}

impl CombatSystem {
    pub fn new(variant: CombatVariant, max_rounds: u32, dice: Dice) -> Self {
        Self { variant, max_rounds: max_rounds.max(1), dice }
    }

    pub fn from_config(cfg: &GameConfig) -> Self {
        let dice = match cfg.seed {
            Some(seed) => Dice::from_seed(seed),
            None => Dice::from_entropy(),
        };
        Self::new(cfg.combat_variant, cfg.max_rounds, dice)
    }

    pub fn run(&mut self, party: &mut [Character], monsters: &mut [Monster]) -> CombatReport {
        run_combat(self, party, monsters)
    }
}

/// Run rounds until one roster has nobody standing or the round cap is hit.
///
/// Each round the whole living party acts in roster order, then every living
/// monster does.
pub fn run_combat(system: &mut CombatSystem, party: &mut [Character], monsters: &mut [Monster]) -> CombatReport {
    let mut logs: Vec<String> = Vec::new();
    let mut alive_party: Vec<usize> = (0..party.len()).filter(|&i| party[i].is_alive()).collect();
    let mut alive_monsters: Vec<usize> = (0..monsters.len()).filter(|&i| monsters[i].is_alive()).collect();
    let starting_party = alive_party.clone();

    logs.push(format!(
        "[START] {} party member(s) vs {} monster(s)",
        alive_party.len(),
        alive_monsters.len()
    ));

    let mut rounds = 0u32;
    while !alive_party.is_empty() && !alive_monsters.is_empty() && rounds < system.max_rounds {
        rounds += 1;
        logs.push(format!("[ROUND] {}", rounds));

        for actor in alive_party.clone() {
            if alive_monsters.is_empty() {
                break;
            }
            if !party[actor].is_alive() {
                alive_party.retain(|&i| i != actor);
                continue;
            }
            let action =
                choose_party_action(system.variant, actor, party, &alive_party, monsters, &alive_monsters);
            match action {
                PartyAction::Attack { target } => {
                    let out = resolve_attack(&mut system.dice, &party[actor], &mut monsters[target], |m| logs.push(m));
                    if out.target_down {
                        alive_monsters.retain(|&i| i != target);
                    }
                }
                PartyAction::CastHeal { ally } => {
                    cast_heal(&mut system.dice, party, actor, ally, |m| logs.push(m));
                }
                PartyAction::DrinkPotion => {
                    drink_potion(&mut system.dice, &mut party[actor], |m| logs.push(m));
                }
            }
        }

        for actor in alive_monsters.clone() {
            if !monsters[actor].is_alive() {
                alive_monsters.retain(|&i| i != actor);
                continue;
            }
            let Some(target) = select_monster_target(party, &alive_party) else {
                break;
            };
            let out = resolve_attack(&mut system.dice, &monsters[actor], &mut party[target], |m| logs.push(m));
            if out.target_down {
                alive_party.retain(|&i| i != target);
            }
        }
    }

    let outcome = if alive_party.is_empty() {
        CombatOutcome::Defeat
    } else if alive_monsters.is_empty() {
        CombatOutcome::Victory
    } else {
        CombatOutcome::Stalemate
    };

    let defeated: Vec<&Monster> = monsters.iter().filter(|m| !m.is_alive()).collect();
    let xp = defeated.iter().map(|m| m.xp).sum();
    let downed_party: Vec<String> = starting_party
        .iter()
        .filter(|&&i| !party[i].is_alive())
        .map(|&i| party[i].name.clone())
        .collect();

    logs.push(format!("[END] outcome={:?} rounds={} xp={}", outcome, rounds, xp));
    info!(?outcome, rounds, xp, downed = downed_party.len(), "combat finished");

    CombatReport {
        outcome,
        rounds,
        xp,
        monsters_defeated: defeated.len(),
        downed_party,
        log: logs,
    }
}
