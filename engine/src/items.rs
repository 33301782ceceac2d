use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DamageDice;

/// Serde adapter storing dice as notation strings. Bad notation falls back
/// to a flat d6 instead of failing the whole record.
pub(crate) mod lenient_dice {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::DamageDice;

    pub fn serialize<S: Serializer>(dice: &DamageDice, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(dice)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DamageDice, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(DamageDice::parse_or_default(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    #[serde(with = "lenient_dice")]
    pub damage: DamageDice,
    #[serde(default)]
    pub finesse: bool,
    #[serde(default)]
    pub ranged: bool,
    #[serde(default)]
    pub price: u32,
}

/// Case-insensitive lookup in an equipment table.
pub fn find_weapon<'a>(table: &'a [Weapon], name: &str) -> Option<&'a Weapon> {
    table.iter().find(|w| w.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Armor {
    pub name: String,
    pub base_ac: i32,
    /// Maximum DEX bonus; `None` means uncapped (light armor).
    #[serde(default)]
    pub dex_cap: Option<i32>,
    #[serde(default)]
    pub price: u32,
}

impl Armor {
    pub fn armor_class(&self, dex_mod: i32) -> i32 {
        let dex = match self.dex_cap {
            Some(cap) => dex_mod.min(cap),
            None => dex_mod,
        };
        self.base_ac + dex
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    VeryRare,
    Legendary,
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::VeryRare => "very rare",
            Rarity::Legendary => "legendary",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicItem {
    pub name: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub ac_bonus: i32,
    #[serde(default)]
    pub charges: Option<u32>,
    #[serde(default)]
    pub max_charges: Option<u32>,
    #[serde(default)]
    pub price: u32,
}

impl MagicItem {
    /// Returns true when charges were actually restored.
    pub fn recharge(&mut self) -> bool {
        match (self.charges, self.max_charges) {
            (Some(current), Some(max)) if current < max => {
                self.charges = Some(max);
                true
            }
            _ => false,
        }
    }
}

/// What a plain potion of healing restores.
pub const STANDARD_POTION_DICE: DamageDice = DamageDice::new(2, 4).with_bonus(2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Weapon(Weapon),
    Armor(Armor),
    Magic(MagicItem),
    Potion {
        name: String,
        #[serde(with = "lenient_dice")]
        heal: DamageDice,
        #[serde(default)]
        price: u32,
    },
    Gear {
        name: String,
        #[serde(default)]
        price: u32,
    },
}

impl Item {
    pub fn gear(name: impl Into<String>) -> Self {
        Item::Gear { name: name.into(), price: 0 }
    }

    pub fn healing_potion() -> Self {
        Item::Potion {
            name: "Potion of Healing".to_string(),
            heal: STANDARD_POTION_DICE,
            price: 50,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Weapon(w) => &w.name,
            Item::Armor(a) => &a.name,
            Item::Magic(m) => &m.name,
            Item::Potion { name, .. } | Item::Gear { name, .. } => name,
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            Item::Weapon(w) => w.price,
            Item::Armor(a) => a.price,
            Item::Magic(m) => m.price,
            Item::Potion { price, .. } | Item::Gear { price, .. } => *price,
        }
    }
}
