//! Shops: stock tables and the buy/sell loop run by merchant scenes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::combatant::{Character, Combatant};
use crate::context::GameContext;
use crate::error::TradeError;
use crate::items::Item;
use crate::render::Renderer;
use crate::state::{GameState, GOLD, GOLD_SPENT};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub item: Item,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Overrides the item's list price.
    #[serde(default)]
    pub price: Option<u32>,
}

fn one() -> u32 {
    1
}

impl StockEntry {
    pub fn price(&self) -> u32 {
        self.price.unwrap_or_else(|| self.item.price())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub name: String,
    #[serde(default)]
    pub greeting: String,
    #[serde(default)]
    pub stock: IndexMap<String, StockEntry>,
}

/// Buyers get half the list price, rounded down.
pub fn sale_price(item: &Item) -> u32 {
    item.price() / 2
}

impl Merchant {
    /// Take gold from `buyer` and hand back the item. Stock and gold are left
    /// untouched when the purchase is refused.
    pub fn buy(&mut self, item_id: &str, buyer: &mut Character) -> Result<(Item, u32), TradeError> {
        let entry = self
            .stock
            .get_mut(item_id)
            .ok_or_else(|| TradeError::UnknownItem(item_id.to_string()))?;
        if entry.quantity == 0 {
            return Err(TradeError::OutOfStock(item_id.to_string()));
        }
        let price = entry.price();
        if buyer.gold < price {
            return Err(TradeError::CannotAfford { price, gold: buyer.gold });
        }
        entry.quantity -= 1;
        buyer.gold -= price;
        Ok((entry.item.clone(), price))
    }

    /// Ids of items in stock that `gold` can pay for.
    pub fn affordable(&self, gold: u32) -> Vec<&str> {
        self.stock
            .iter()
            .filter(|(_, e)| e.quantity > 0 && e.price() <= gold)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerchantSystem {
    merchants: IndexMap<String, Merchant>,
}

impl MerchantSystem {
    pub fn new(merchants: IndexMap<String, Merchant>) -> Self {
        Self { merchants }
    }

    pub fn insert(&mut self, id: impl Into<String>, merchant: Merchant) {
        self.merchants.insert(id.into(), merchant);
    }

    pub fn get(&self, id: &str) -> Option<&Merchant> {
        self.merchants.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Merchant> {
        self.merchants.get_mut(id)
    }
}

/// Put a bought item where it belongs. Weapons and armor may be equipped
/// straight away, pushing the old piece into the pack.
fn stow(buyer: &mut Character, item: Item, equip: bool) {
    match item {
        Item::Weapon(w) if equip => {
            if let Some(old) = buyer.weapon.replace(w) {
                buyer.inventory.push(Item::Weapon(old));
            }
        }
        Item::Armor(a) if equip => {
            if let Some(old) = buyer.armor.replace(a) {
                buyer.inventory.push(Item::Armor(old));
            }
        }
        other => buyer.inventory.push(other),
    }
}

/// Run the shop menu for `merchant_id` until the player leaves.
pub fn visit(merchant_id: &str, ctx: &mut GameContext) {
    let GameContext { merchants, party, renderer, state, .. } = ctx;
    let Some(shop) = merchants.as_mut().and_then(|m| m.get_mut(merchant_id)) else {
        warn!(merchant = merchant_id, "unknown merchant, moving on");
        renderer.print_line("The stall is empty. Nobody is here to trade.");
        return;
    };

    if !shop.greeting.is_empty() {
        renderer.print_slow(&shop.greeting);
    }
    let menu = ["Buy".to_string(), "Sell".to_string(), "View inventories".to_string(), "Leave".to_string()];
    loop {
        match renderer.get_choice(&menu) {
            0 => buy_menu(shop, party, &mut **renderer, state),
            1 => sell_menu(party, &mut **renderer, state),
            2 => {
                for member in party.iter() {
                    let items: Vec<&str> = member.inventory.iter().map(Item::name).collect();
                    renderer.print_line(&format!(
                        "{} ({} gp, {} potions): {}",
                        member.name,
                        member.gold,
                        member.potion_count(),
                        if items.is_empty() { "nothing".to_string() } else { items.join(", ") }
                    ));
                }
            }
            _ => break,
        }
    }
    renderer.print_line(&format!("You leave {}.", shop.name));
}

/// Living member picked from a menu with a trailing "Cancel".
fn pick_member(party: &[Character], renderer: &mut dyn Renderer) -> Option<usize> {
    let living: Vec<usize> = (0..party.len()).filter(|&i| party[i].is_alive()).collect();
    let mut labels: Vec<String> = living.iter().map(|&i| format!("{} ({} gp)", party[i].name, party[i].gold)).collect();
    labels.push("Cancel".to_string());
    let idx = renderer.get_choice(&labels);
    living.get(idx).copied()
}

fn buy_menu(shop: &mut Merchant, party: &mut [Character], renderer: &mut dyn Renderer, state: &mut GameState) {
    let Some(who) = pick_member(party, renderer) else {
        return;
    };
    let ids: Vec<String> = shop.affordable(party[who].gold).into_iter().map(String::from).collect();
    if ids.is_empty() {
        renderer.print_line("Nothing here you can afford.");
        return;
    }
    let mut labels: Vec<String> = ids
        .iter()
        .filter_map(|id| shop.stock.get(id))
        .map(|e| format!("{} - {} gp ({} left)", e.item.name(), e.price(), e.quantity))
        .collect();
    labels.push("Cancel".to_string());
    let Some(item_id) = ids.get(renderer.get_choice(&labels)) else {
        return;
    };

    let buyer = &mut party[who];
    match shop.buy(item_id, buyer) {
        Ok((item, price)) => {
            state.add(GOLD_SPENT, i64::from(price));
            renderer.print_line(&format!("{} buys {} for {} gp.", buyer.name, item.name(), price));
            let equip = matches!(item, Item::Weapon(_) | Item::Armor(_))
                && renderer.get_choice(&["Equip now".to_string(), "Keep in pack".to_string()]) == 0;
            info!(buyer = %buyer.name, item = item.name(), price, equip, "purchase");
            stow(buyer, item, equip);
        }
        Err(err) => renderer.print_line(&format!("Cannot buy: {}", err)),
    }
}

fn sell_menu(party: &mut [Character], renderer: &mut dyn Renderer, state: &mut GameState) {
    let Some(who) = pick_member(party, renderer) else {
        return;
    };
    let seller = &mut party[who];
    if seller.inventory.is_empty() {
        renderer.print_line(&format!("{} has nothing to sell.", seller.name));
        return;
    }
    let mut labels: Vec<String> = seller
        .inventory
        .iter()
        .map(|item| format!("{} - {} gp", item.name(), sale_price(item)))
        .collect();
    labels.push("Cancel".to_string());
    let idx = renderer.get_choice(&labels);
    if idx >= seller.inventory.len() {
        return;
    }
    let item = seller.inventory.remove(idx);
    let price = sale_price(&item);
    seller.gold += price;
    state.add(GOLD, i64::from(price));
    renderer.print_line(&format!("{} sells {} for {} gp.", seller.name, item.name(), price));
}
