use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
    Instant,
}

impl TextSpeed {
    /// Delay between characters for the typewriter effect; zero disables it.
    pub fn char_delay(self) -> Duration {
        match self {
            TextSpeed::Slow => Duration::from_millis(50),
            TextSpeed::Normal => Duration::from_millis(30),
            TextSpeed::Fast => Duration::from_millis(10),
            TextSpeed::Instant => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatVariant {
    /// Every party action is a weapon attack.
    Core,
    /// Casters heal wounded allies and wounded members drink potions.
    #[default]
    Enhanced,
}

/// Session settings, built once before a scenario starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub text_speed: TextSpeed,
    pub auto_save: bool,
    pub combat_variant: CombatVariant,
    pub max_rounds: u32,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            text_speed: TextSpeed::Normal,
            auto_save: true,
            combat_variant: CombatVariant::Enhanced,
            max_rounds: crate::combat::DEFAULT_MAX_ROUNDS,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Parses YAML (a superset of JSON, so JSON config files work too).
    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg = serde_yaml::from_str(text)?;
        Ok(cfg)
    }

    /// Fully deterministic, non-blocking settings for tests and simulations.
    pub fn headless(seed: u64) -> Self {
        Self {
            text_speed: TextSpeed::Instant,
            auto_save: false,
            seed: Some(seed),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg = GameConfig::from_yaml_str("text_speed: instant\ncombat_variant: core\n").unwrap();
        assert_eq!(cfg.text_speed, TextSpeed::Instant);
        assert_eq!(cfg.combat_variant, CombatVariant::Core);
        assert!(cfg.auto_save);
        assert_eq!(cfg.max_rounds, 50);
    }

    #[test]
    fn json_config_parses_through_yaml() {
        let cfg = GameConfig::from_yaml_str(r#"{"auto_save": false, "seed": 7}"#).unwrap();
        assert!(!cfg.auto_save);
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn instant_disables_typewriter() {
        assert!(TextSpeed::Instant.char_delay().is_zero());
        assert!(TextSpeed::Slow.char_delay() > TextSpeed::Fast.char_delay());
    }
}
