//! Battle participants.
//!
//! The combat loop only ever talks to the [`Combatant`] trait; party members
//! ([`Character`]) and enemies ([`Monster`]) are the two concrete rosters.

use serde::{Deserialize, Serialize};

use crate::conditions::{ActiveCondition, AttackStyle};
use crate::items::{lenient_dice, Armor, Item, MagicItem, Weapon, STANDARD_POTION_DICE};
use crate::life::{apply_damage, heal, Health};
use crate::{proficiency_bonus, Ability, AbilityScores, DamageDice};

/// Everything the turn resolver needs to know about one attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackProfile {
    pub label: String,
    pub to_hit: i32,
    pub dice: DamageDice,
    pub damage_mod: i32,
    pub style: AttackStyle,
}

pub trait Combatant {
    fn name(&self) -> &str;
    fn health(&self) -> &Health;
    fn health_mut(&mut self) -> &mut Health;
    fn armor_class(&self) -> i32;
    fn level(&self) -> u32;
    fn ability_mod(&self, ability: Ability) -> i32;
    fn attack_profile(&self) -> AttackProfile;

    fn conditions(&self) -> &[ActiveCondition] {
        &[]
    }

    /// Current HP, never negative.
    fn hit_points(&self) -> i32 {
        self.health().current()
    }

    fn max_hit_points(&self) -> i32 {
        self.health().max()
    }

    fn is_alive(&self) -> bool {
        self.health().is_alive()
    }

    /// Returns true if this hit dropped the combatant to 0.
    fn take_damage(&mut self, dmg: i32, log: &mut dyn FnMut(String)) -> bool {
        let name = self.name().to_string();
        apply_damage(&name, self.health_mut(), dmg, log)
    }

    /// Returns the HP actually gained.
    fn heal(&mut self, amount: i32, log: &mut dyn FnMut(String)) -> i32 {
        let name = self.name().to_string();
        heal(&name, self.health_mut(), amount, log)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    Fighter,
    Cleric,
    Rogue,
    Wizard,
    Ranger,
    Paladin,
    Sorcerer,
}

impl CharacterClass {
    pub fn hit_die(self) -> i32 {
        match self {
            CharacterClass::Fighter | CharacterClass::Paladin | CharacterClass::Ranger => 10,
            CharacterClass::Cleric | CharacterClass::Rogue => 8,
            CharacterClass::Wizard | CharacterClass::Sorcerer => 6,
        }
    }

    /// Weapon swung when nothing is equipped.
    pub fn default_attack(self) -> (&'static str, DamageDice, Ability) {
        match self {
            CharacterClass::Fighter | CharacterClass::Paladin => ("longsword", DamageDice::new(1, 8), Ability::Str),
            CharacterClass::Rogue | CharacterClass::Ranger => ("shortsword", DamageDice::new(1, 6), Ability::Dex),
            CharacterClass::Cleric => ("mace", DamageDice::new(1, 6), Ability::Str),
            CharacterClass::Wizard | CharacterClass::Sorcerer => ("dagger", DamageDice::new(1, 4), Ability::Dex),
        }
    }

    pub fn spellcasting_ability(self) -> Option<Ability> {
        match self {
            CharacterClass::Cleric | CharacterClass::Ranger => Some(Ability::Wis),
            CharacterClass::Wizard => Some(Ability::Int),
            CharacterClass::Sorcerer | CharacterClass::Paladin => Some(Ability::Cha),
            CharacterClass::Fighter | CharacterClass::Rogue => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealingSpell {
    pub name: String,
    #[serde(with = "lenient_dice")]
    pub dice: DamageDice,
    #[serde(default = "default_slot_level")]
    pub slot_level: u32,
}

fn default_slot_level() -> u32 {
    1
}

/// Spell slots per level, index 0 = 1st level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlots {
    pub current: Vec<u32>,
    pub max: Vec<u32>,
}

impl SpellSlots {
    pub fn new(max: Vec<u32>) -> Self {
        Self { current: max.clone(), max }
    }

    pub fn has_slot(&self, min_level: u32) -> bool {
        self.current
            .iter()
            .enumerate()
            .any(|(idx, n)| idx as u32 + 1 >= min_level && *n > 0)
    }

    /// Spend the lowest available slot of at least `min_level`.
    pub fn spend(&mut self, min_level: u32) -> Option<u32> {
        let idx = self
            .current
            .iter()
            .enumerate()
            .position(|(idx, n)| idx as u32 + 1 >= min_level && *n > 0)?;
        self.current[idx] -= 1;
        Some(idx as u32 + 1)
    }

    pub fn restore(&mut self) {
        self.current = self.max.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub class: CharacterClass,
    pub level: u32,
    pub abilities: AbilityScores,
    pub health: Health,
    pub base_ac: i32,
    #[serde(default)]
    pub weapon: Option<Weapon>,
    #[serde(default)]
    pub armor: Option<Armor>,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub inventory: Vec<Item>,
    #[serde(default)]
    pub conditions: Vec<ActiveCondition>,
    #[serde(default)]
    pub spell_slots: SpellSlots,
    #[serde(default)]
    pub healing_spell: Option<HealingSpell>,
    #[serde(default)]
    pub healing_potions: u32,
}

impl Character {
    pub fn is_spellcaster(&self) -> bool {
        self.class.spellcasting_ability().is_some() && !self.spell_slots.max.is_empty()
    }

    pub fn can_cast_heal(&self) -> bool {
        match &self.healing_spell {
            Some(spell) => self.spell_slots.has_slot(spell.slot_level),
            None => false,
        }
    }

    pub fn magic_items(&self) -> impl Iterator<Item = &MagicItem> {
        self.inventory.iter().filter_map(|item| match item {
            Item::Magic(m) => Some(m),
            _ => None,
        })
    }

    pub fn magic_items_mut(&mut self) -> impl Iterator<Item = &mut MagicItem> {
        self.inventory.iter_mut().filter_map(|item| match item {
            Item::Magic(m) => Some(m),
            _ => None,
        })
    }

    /// Potions in the pack plus standard issue ones.
    pub fn potion_count(&self) -> u32 {
        let carried = self.inventory.iter().filter(|i| matches!(i, Item::Potion { .. })).count() as u32;
        self.healing_potions + carried
    }

    /// Take the next potion and the dice it heals. Bought potions in the pack
    /// go first, then standard issue.
    pub fn take_potion(&mut self) -> Option<(String, DamageDice)> {
        if let Some(pos) = self.inventory.iter().position(|i| matches!(i, Item::Potion { .. })) {
            if let Item::Potion { name, heal: dice, .. } = self.inventory.remove(pos) {
                return Some((name, dice));
            }
        }
        if self.healing_potions == 0 {
            return None;
        }
        self.healing_potions -= 1;
        Some(("Potion of Healing".to_string(), STANDARD_POTION_DICE))
    }

    /// One-line status like `Aria: 12/20 HP [Poisoned]`.
    pub fn status_line(&self) -> String {
        let mut line = format!("{}: {}/{} HP", self.name, self.hit_points(), self.max_hit_points());
        if !self.conditions.is_empty() {
            let names: Vec<String> = self.conditions.iter().map(|c| format!("{:?}", c.kind)).collect();
            line.push_str(&format!(" [{}]", names.join(", ")));
        }
        line
    }
}

impl Combatant for Character {
    fn name(&self) -> &str {
        &self.name
    }

    fn health(&self) -> &Health {
        &self.health
    }

    fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    fn armor_class(&self) -> i32 {
        let dex = self.abilities.mod_of(Ability::Dex);
        let base = match &self.armor {
            Some(armor) => armor.armor_class(dex),
            None => self.base_ac,
        };
        base + self.magic_items().map(|m| m.ac_bonus).sum::<i32>()
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn ability_mod(&self, ability: Ability) -> i32 {
        self.abilities.mod_of(ability)
    }

    fn conditions(&self) -> &[ActiveCondition] {
        &self.conditions
    }

    fn attack_profile(&self) -> AttackProfile {
        let str_mod = self.ability_mod(Ability::Str);
        let dex_mod = self.ability_mod(Ability::Dex);
        let (label, dice, ability_mod, style) = match &self.weapon {
            Some(w) if w.ranged => (w.name.clone(), w.damage, dex_mod, AttackStyle::Ranged),
            Some(w) if w.finesse => (w.name.clone(), w.damage, str_mod.max(dex_mod), AttackStyle::Melee),
            Some(w) => (w.name.clone(), w.damage, str_mod, AttackStyle::Melee),
            None => {
                let (label, dice, ability) = self.class.default_attack();
                (label.to_string(), dice, self.ability_mod(ability), AttackStyle::Melee)
            }
        };
        AttackProfile {
            label,
            to_hit: ability_mod + proficiency_bonus(self.level),
            dice,
            damage_mod: ability_mod,
            style,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterAction {
    pub name: String,
    pub attack_bonus: i32,
    #[serde(with = "lenient_dice")]
    pub damage: DamageDice,
    #[serde(default)]
    pub ranged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Monster {
    pub id: String,
    pub name: String,
    pub armor_class: i32,
    pub health: Health,
    pub abilities: AbilityScores,
    pub xp: u32,
    pub challenge_rating: f32,
    pub actions: Vec<MonsterAction>,
}

impl Monster {
    /// Bare monster, mostly for tests and quick encounters.
    pub fn new(name: impl Into<String>, hp: i32, armor_class: i32) -> Self {
        let name = name.into();
        Self {
            id: name.to_lowercase().replace(' ', "-"),
            name,
            armor_class,
            health: Health::new(hp),
            abilities: AbilityScores::default(),
            xp: 0,
            challenge_rating: 0.0,
            actions: Vec::new(),
        }
    }

    pub fn with_xp(mut self, xp: u32) -> Self {
        self.xp = xp;
        self
    }

    pub fn with_action(mut self, action: MonsterAction) -> Self {
        self.actions.push(action);
        self
    }
}

impl Combatant for Monster {
    fn name(&self) -> &str {
        &self.name
    }

    fn health(&self) -> &Health {
        &self.health
    }

    fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    fn armor_class(&self) -> i32 {
        self.armor_class
    }

    fn level(&self) -> u32 {
        (self.challenge_rating.ceil() as u32).max(1)
    }

    fn ability_mod(&self, ability: Ability) -> i32 {
        self.abilities.mod_of(ability)
    }

    fn attack_profile(&self) -> AttackProfile {
        match self.actions.first() {
            Some(action) => AttackProfile {
                label: action.name.clone(),
                to_hit: action.attack_bonus,
                dice: action.damage,
                damage_mod: 0,
                style: if action.ranged { AttackStyle::Ranged } else { AttackStyle::Melee },
            },
            None => AttackProfile {
                label: "Slam".to_string(),
                to_hit: 0,
                dice: DamageDice::new(1, 4),
                damage_mod: 0,
                style: AttackStyle::Melee,
            },
        }
    }
}
