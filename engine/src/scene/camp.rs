use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::combatant::Combatant;
use crate::conditions::strip_short_duration;
use crate::context::GameContext;
use crate::items::Item;
use crate::life::heal;
use crate::state::{GOLD, TREASURE_PURSE};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasureScene {
    #[serde(default)]
    pub gold: u32,
    /// Plain item names, handed out round-robin.
    #[serde(default)]
    pub items: Vec<String>,
    /// How many items to draw from the shared magic item pool.
    #[serde(default, alias = "magic_items_count")]
    pub magic_items: usize,
}

impl TreasureScene {
    pub fn gold(gold: u32) -> Self {
        Self { gold, ..Self::default() }
    }

    /// Gold is split evenly between living members. Whatever does not divide
    /// evenly goes to the `treasure_purse` counter.
    pub(super) fn distribute(&self, ctx: &mut GameContext) {
        let living = ctx.living_indices();
        if living.is_empty() {
            warn!(gold = self.gold, "treasure found with nobody alive to carry it");
            ctx.state.add(TREASURE_PURSE, i64::from(self.gold));
            return;
        }
        let members = living.len() as u32;

        if self.gold > 0 {
            let share = self.gold / members;
            let remainder = self.gold % members;
            for &i in &living {
                ctx.party[i].gold += share;
            }
            ctx.state.add(GOLD, i64::from(share * members));
            ctx.state.add(TREASURE_PURSE, i64::from(remainder));
            ctx.renderer.print_line(&format!("You find {} gold pieces!", self.gold));
            ctx.renderer.print_line(&format!("   Each member receives {} gp", share));
            if remainder > 0 {
                ctx.renderer.print_line(&format!("   {} gp goes into the party purse", remainder));
            }
        }

        for (n, name) in self.items.iter().enumerate() {
            let who = living[n % living.len()];
            ctx.party[who].inventory.push(Item::gear(name.clone()));
            let line = format!("   - {} → {}", name, ctx.party[who].name);
            ctx.renderer.print_line(&line);
        }

        let mut handed = 0;
        while handed < self.magic_items {
            let Some(item) = ctx.magic_items.pop_front() else {
                break;
            };
            let who = living[handed % living.len()];
            let line = format!("   ✨ {} ({}) → {}", item.name, item.rarity, ctx.party[who].name);
            ctx.party[who].inventory.push(Item::Magic(item));
            ctx.renderer.print_line(&line);
            handed += 1;
        }
        info!(gold = self.gold, items = self.items.len(), magic = handed, "treasure distributed");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestType {
    Short,
    #[default]
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestScene {
    pub rest_type: RestType,
}

impl RestScene {
    /// Only living members benefit; a downed member stays down.
    pub(super) fn apply(&self, ctx: &mut GameContext) {
        let GameContext { party, renderer, .. } = ctx;
        match self.rest_type {
            RestType::Long => {
                renderer.print_slow("You make camp for the night...");
                for member in party.iter_mut().filter(|c| c.is_alive()) {
                    let before = member.hit_points();
                    member.health.restore_full();
                    member.spell_slots.restore();
                    for item in member.magic_items_mut() {
                        item.recharge();
                    }
                    let cleared = strip_short_duration(&member.name, &mut member.conditions, |_| {});
                    renderer.print_line(&format!(
                        "{}: {} → {} HP, spells restored",
                        member.name,
                        before,
                        member.hit_points()
                    ));
                    if !cleared.is_empty() {
                        renderer.print_line(&format!("{} shakes off {:?}", member.name, cleared));
                    }
                }
                renderer.print_slow("The party is fully rested!");
            }
            RestType::Short => {
                renderer.print_slow("You take a short rest...");
                for member in party.iter_mut().filter(|c| c.is_alive()) {
                    let amount = (member.class.hit_die() / 2 + member.ability_mod(crate::Ability::Con)).max(1);
                    let name = member.name.clone();
                    let gained = heal(&name, &mut member.health, amount, |_| {});
                    if gained > 0 {
                        renderer.print_line(&format!("{}: +{} HP", member.name, gained));
                    }
                }
            }
        }
        info!(rest = ?self.rest_type, "party rested");
    }
}
