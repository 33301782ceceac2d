//! Turning data into combatants and scenes.
//!
//! Monsters come from a two-tier lookup (scenario table first, then an
//! injected source), characters from named templates, scenes from loosely
//! typed records where a bad record costs only itself.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::combatant::{Character, CharacterClass, HealingSpell, Monster, MonsterAction, SpellSlots};
use crate::error::ContentError;
use crate::items::{Armor, Weapon};
use crate::life::Health;
use crate::scene::{Choice, CombatScene, EnemySource, EnemySpec, RestType, Scene, TreasureScene, GAME_OVER};
use crate::{Ability, AbilityScores};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterDef {
    pub name: String,
    #[serde(alias = "ac")]
    pub armor_class: i32,
    #[serde(alias = "hp")]
    pub hit_points: i32,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default)]
    pub xp: u32,
    #[serde(default, alias = "cr", deserialize_with = "challenge_rating")]
    pub challenge_rating: f32,
    #[serde(default)]
    pub actions: Vec<MonsterAction>,
}

impl MonsterDef {
    pub fn instantiate(&self, id: &str) -> Monster {
        Monster {
            id: id.to_string(),
            name: self.name.clone(),
            armor_class: self.armor_class,
            health: Health::new(self.hit_points.max(1)),
            abilities: self.abilities,
            xp: self.xp,
            challenge_rating: self.challenge_rating,
            actions: self.actions.clone(),
        }
    }
}

/// Accepts `2`, `0.25` or `"1/4"`.
fn challenge_rating<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f32),
        Text(String),
    }
    match Raw::deserialize(d)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => parse_fraction(&s).ok_or_else(|| serde::de::Error::custom(format!("bad challenge rating: {}", s))),
    }
}

fn parse_fraction(s: &str) -> Option<f32> {
    let s = s.trim();
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f32 = num.trim().parse().ok()?;
            let den: f32 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => s.parse().ok(),
    }
}

/// External monster data consulted when the scenario table has no entry.
pub trait MonsterSource {
    fn lookup(&self, id: &str) -> Option<MonsterDef>;
}

impl MonsterSource for IndexMap<String, MonsterDef> {
    fn lookup(&self, id: &str) -> Option<MonsterDef> {
        self.get(id).cloned()
    }
}

#[derive(Default)]
pub struct MonsterFactory {
    local: IndexMap<String, MonsterDef>,
    fallback: Option<Box<dyn MonsterSource>>,
}

impl MonsterFactory {
    pub fn new(local: IndexMap<String, MonsterDef>) -> Self {
        Self { local, fallback: None }
    }

    pub fn with_source(mut self, source: Box<dyn MonsterSource>) -> Self {
        self.fallback = Some(source);
        self
    }

    /// Monster table shipped with the engine.
    pub fn builtin() -> anyhow::Result<Self> {
        Ok(Self::new(crate::content::builtin_monsters()?))
    }

    /// Fresh monster for `id`, or `None` (logged) when no tier knows it.
    pub fn create(&self, id: &str) -> Option<Monster> {
        match self.find(id) {
            Some(def) => Some(def.instantiate(id)),
            None => {
                warn!(monster = id, "unknown monster id");
                None
            }
        }
    }

    fn find(&self, id: &str) -> Option<MonsterDef> {
        let normalized = id.trim().to_lowercase().replace('_', "-");
        for key in [id, normalized.as_str()] {
            if let Some(def) = self.local.get(key) {
                return Some(def.clone());
            }
        }
        let source = self.fallback.as_ref()?;
        let found = source.lookup(id).or_else(|| source.lookup(&normalized));
        if found.is_some() {
            debug!(monster = id, "monster resolved by fallback source");
        }
        found
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDef {
    pub name: String,
    pub class: CharacterClass,
    #[serde(default = "one")]
    pub level: u32,
    #[serde(default)]
    pub abilities: AbilityScores,
    /// Computed from class hit die and CON when absent.
    #[serde(default)]
    pub hit_points: Option<i32>,
    #[serde(default = "unarmored")]
    pub base_ac: i32,
    #[serde(default)]
    pub weapon: Option<Weapon>,
    #[serde(default)]
    pub armor: Option<Armor>,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub spell_slots: Vec<u32>,
    #[serde(default)]
    pub healing_spell: Option<HealingSpell>,
    #[serde(default)]
    pub healing_potions: u32,
}

fn one() -> u32 {
    1
}

fn unarmored() -> i32 {
    10
}

/// Per-character tweaks applied on top of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterOverrides {
    pub name: Option<String>,
    pub level: Option<u32>,
    pub hit_points: Option<i32>,
}

/// Max HP for a class at `level`: full hit die at 1st, average roll after.
pub fn max_hit_points(class: CharacterClass, level: u32, con_mod: i32) -> i32 {
    let die = class.hit_die();
    let first = (die + con_mod).max(1);
    let per_level = (die / 2 + 1 + con_mod).max(1);
    first + per_level * level.saturating_sub(1) as i32
}

impl CharacterDef {
    pub fn build(&self, overrides: Option<&CharacterOverrides>) -> Character {
        let level = overrides.and_then(|o| o.level).unwrap_or(self.level).max(1);
        let name = overrides.and_then(|o| o.name.clone()).unwrap_or_else(|| self.name.clone());
        let con = self.abilities.mod_of(Ability::Con);
        let hp = overrides
            .and_then(|o| o.hit_points)
            .or(if level == self.level { self.hit_points } else { None })
            .unwrap_or_else(|| max_hit_points(self.class, level, con));
        Character {
            name,
            class: self.class,
            level,
            abilities: self.abilities,
            health: Health::new(hp.max(1)),
            base_ac: self.base_ac,
            weapon: self.weapon.clone(),
            armor: self.armor.clone(),
            gold: self.gold,
            inventory: Vec::new(),
            conditions: Vec::new(),
            spell_slots: SpellSlots::new(self.spell_slots.clone()),
            healing_spell: self.healing_spell.clone(),
            healing_potions: self.healing_potions,
        }
    }
}

pub struct CharacterFactory {
    templates: IndexMap<String, CharacterDef>,
}

impl CharacterFactory {
    pub fn new(templates: IndexMap<String, CharacterDef>) -> Self {
        Self { templates }
    }

    /// The four stock adventurers: fighter, cleric, rogue, wizard.
    pub fn builtin() -> Self {
        match crate::content::builtin_characters() {
            Ok(templates) => Self::new(templates),
            Err(err) => {
                warn!(error = %err, "built-in character templates unavailable");
                Self::new(IndexMap::new())
            }
        }
    }

    pub fn add_template(&mut self, id: impl Into<String>, def: CharacterDef) {
        self.templates.insert(id.into(), def);
    }

    pub fn template_ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn create(&self, template: &str, overrides: Option<&CharacterOverrides>) -> Option<Character> {
        match self.templates.get(template) {
            Some(def) => Some(def.build(overrides)),
            None => {
                warn!(error = %ContentError::UnknownTemplate(template.to_string()), "character not created");
                None
            }
        }
    }
}

/// Scenes built from a batch of records, plus how many records were dropped.
pub struct SceneLoad {
    pub scenes: Vec<Scene>,
    pub skipped: usize,
}

#[derive(Deserialize)]
struct CommonFields {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "body", alias = "text")]
    description: String,
    #[serde(default, alias = "next_scene_id", alias = "next_scene")]
    next: Option<String>,
    #[serde(default)]
    map: Option<String>,
    #[serde(default)]
    position: Option<(i32, i32)>,
}

#[derive(Deserialize)]
struct ChoiceFields {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct CombatFields {
    #[serde(alias = "monsters")]
    enemies: Vec<EnemySpec>,
    #[serde(default)]
    on_victory: Option<String>,
    #[serde(default)]
    on_defeat: Option<String>,
    #[serde(default)]
    on_stalemate: Option<String>,
}

#[derive(Deserialize)]
struct MerchantFields {
    #[serde(alias = "merchant_id")]
    merchant: String,
}

#[derive(Deserialize)]
struct RestFields {
    #[serde(default)]
    rest_type: RestType,
}

fn fields<'a, T: Deserialize<'a>>(id: &str, record: &'a Value) -> Result<T, ContentError> {
    T::deserialize(record).map_err(|source| ContentError::Malformed { id: id.to_string(), source })
}

/// Convert one record such as
/// `{"id": "gate", "type": "narrative", "description": "...", "next_scene_id": "yard"}`.
pub fn scene_from_record(index: usize, record: &Value) -> Result<Scene, ContentError> {
    let id = record
        .get("id")
        .and_then(Value::as_str)
        .ok_or(ContentError::MissingField { index, field: "id" })?;
    let kind = record
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ContentError::MissingField { index, field: "type" })?;
    let common: CommonFields = fields(id, record)?;
    let title = common.title.clone().unwrap_or_else(|| id.to_string());
    let desc = common.description.clone();

    let scene = match kind {
        "narrative" => Scene::narrative(id, title, desc),
        "choice" => {
            let f: ChoiceFields = fields(id, record)?;
            Scene::choice(id, title, desc, f.choices)
        }
        "combat" => {
            let f: CombatFields = fields(id, record)?;
            let on_victory = f.on_victory.or_else(|| common.next.clone());
            let combat = CombatScene {
                enemies: EnemySource::Roster(f.enemies),
                on_victory,
                on_defeat: Some(f.on_defeat.unwrap_or_else(|| GAME_OVER.to_string())),
                on_stalemate: f.on_stalemate,
            };
            Scene::combat(id, title, desc, combat)
        }
        "merchant" => {
            let f: MerchantFields = fields(id, record)?;
            Scene::merchant(id, title, desc, f.merchant)
        }
        "treasure" => {
            let loot: TreasureScene = fields(id, record)?;
            Scene::treasure(id, title, desc, loot)
        }
        "rest" => {
            let f: RestFields = fields(id, record)?;
            Scene::rest(id, title, desc, f.rest_type)
        }
        other => {
            return Err(ContentError::UnknownSceneType { id: id.to_string(), kind: other.to_string() });
        }
    };

    let scene = match common.map {
        Some(ascii) => scene.with_map(ascii, common.position),
        None => scene,
    };
    Ok(match (common.next, scene.kind.label()) {
        (Some(next), "narrative" | "merchant" | "treasure" | "rest") => scene.then(next),
        _ => scene,
    })
}

/// Convert every record, skipping and counting the ones that fail.
pub fn build_scenes(records: &[Value]) -> SceneLoad {
    let mut scenes = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for (index, record) in records.iter().enumerate() {
        match scene_from_record(index, record) {
            Ok(scene) => scenes.push(scene),
            Err(err) => {
                warn!(index, error = %err, "skipping scene record");
                skipped += 1;
            }
        }
    }
    SceneLoad { scenes, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn challenge_rating_accepts_fractions() {
        let def: MonsterDef = serde_json::from_value(json!({
            "name": "Goblin", "ac": 15, "hp": 7, "cr": "1/4", "xp": 50
        }))
        .unwrap();
        assert!((def.challenge_rating - 0.25).abs() < f32::EPSILON);
    }

    struct Bestiary;

    impl MonsterSource for Bestiary {
        fn lookup(&self, id: &str) -> Option<MonsterDef> {
            (id == "giant-rat").then(|| MonsterDef {
                name: "Giant Rat".into(),
                armor_class: 12,
                hit_points: 7,
                abilities: AbilityScores::default(),
                xp: 25,
                challenge_rating: 0.125,
                actions: Vec::new(),
            })
        }
    }

    #[test]
    fn local_table_wins_then_fallback_with_normalized_id() {
        let mut local = IndexMap::new();
        local.insert(
            "giant-rat".to_string(),
            MonsterDef {
                name: "Sewer Rat".into(),
                armor_class: 10,
                hit_points: 3,
                abilities: AbilityScores::default(),
                xp: 10,
                challenge_rating: 0.0,
                actions: Vec::new(),
            },
        );
        let with_local = MonsterFactory::new(local).with_source(Box::new(Bestiary));
        assert_eq!(with_local.create("giant_rat").map(|m| m.name), Some("Sewer Rat".to_string()));

        let fallback_only = MonsterFactory::default().with_source(Box::new(Bestiary));
        assert_eq!(fallback_only.create("giant_rat").map(|m| m.name), Some("Giant Rat".to_string()));
        assert!(fallback_only.create("beholder").is_none());
    }

    #[test]
    fn overrides_rescale_hit_points() {
        let factory = CharacterFactory::builtin();
        let base = factory.create("fighter", None).unwrap();
        let overrides = CharacterOverrides { name: Some("Brenna".into()), level: Some(3), hit_points: None };
        let hero = factory.create("fighter", Some(&overrides)).unwrap();
        assert_eq!(hero.name, "Brenna");
        assert_eq!(hero.level, 3);
        assert!(hero.health.max() > base.health.max());
        assert!(factory.create("bard", None).is_none());
    }

    #[test]
    fn record_errors_are_typed() {
        let no_type = json!({"id": "x"});
        assert!(matches!(scene_from_record(0, &no_type), Err(ContentError::MissingField { field: "type", .. })));
        let odd = json!({"id": "x", "type": "puzzle"});
        assert!(matches!(scene_from_record(1, &odd), Err(ContentError::UnknownSceneType { .. })));
        let bad = json!({"id": "x", "type": "choice", "choices": "left"});
        assert!(matches!(scene_from_record(2, &bad), Err(ContentError::Malformed { .. })));
    }

    #[test]
    fn combat_record_defaults_defeat_to_game_over() {
        let rec = json!({
            "id": "ambush", "type": "combat", "next_scene_id": "loot",
            "enemies": [{"monster": "goblin", "count": 2}]
        });
        let scene = scene_from_record(0, &rec).unwrap();
        assert_eq!(scene.targets(), vec!["loot", GAME_OVER]);
    }

    #[test]
    fn records_may_carry_a_map() {
        let rec = json!({"id": "vale", "type": "narrative", "map": "#@#", "position": [1, 0]});
        let scene = scene_from_record(0, &rec).unwrap();
        assert_eq!(scene.map, Some(("#@#".to_string(), Some((1, 0)))));
    }
}
