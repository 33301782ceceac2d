use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{SceneOutcome, SceneResult};
use crate::combat::CombatOutcome;
use crate::combatant::Monster;
use crate::context::GameContext;
use crate::error::SceneError;
use crate::state::{COMBAT_VICTORIES, DEATHS, TOTAL_XP};

/// Shared terminal scene every defeat leads to unless told otherwise.
pub const GAME_OVER: &str = "game_over";

/// One line of an enemy roster: `count` copies of a monster id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpec {
    pub monster: String,
    #[serde(default = "one")]
    pub count: u32,
    /// Display name override.
    #[serde(default)]
    pub name: Option<String>,
}

fn one() -> u32 {
    1
}

impl EnemySpec {
    pub fn new(monster: impl Into<String>, count: u32) -> Self {
        Self { monster: monster.into(), count, name: None }
    }
}

#[derive(Clone)]
pub enum EnemySource {
    /// Monster ids resolved through the context's monster factory.
    Roster(Vec<EnemySpec>),
    /// Scenario code that composes the encounter from the context.
    Custom(Rc<dyn Fn(&GameContext) -> Vec<Monster>>),
}

impl EnemySource {
    pub fn custom(build: impl Fn(&GameContext) -> Vec<Monster> + 'static) -> Self {
        EnemySource::Custom(Rc::new(build))
    }

    fn build(&self, ctx: &GameContext) -> Vec<Monster> {
        match self {
            EnemySource::Custom(build) => build(ctx),
            EnemySource::Roster(specs) => {
                let mut out = Vec::new();
                for spec in specs {
                    for n in 1..=spec.count {
                        let Some(mut monster) = ctx.monsters.create(&spec.monster) else {
                            warn!(monster = %spec.monster, "unknown monster left out of encounter");
                            break;
                        };
                        if let Some(name) = &spec.name {
                            monster.name = name.clone();
                        }
                        if spec.count > 1 {
                            monster.name = format!("{} {}", monster.name, n);
                        }
                        out.push(monster);
                    }
                }
                out
            }
        }
    }
}

pub struct CombatScene {
    pub enemies: EnemySource,
    pub on_victory: Option<String>,
    pub on_defeat: Option<String>,
    /// Where a fight that hits the round cap goes. Falls back to `on_victory`.
    pub on_stalemate: Option<String>,
}

impl CombatScene {
    pub fn new(enemies: EnemySource, on_victory: impl Into<String>) -> Self {
        Self {
            enemies,
            on_victory: Some(on_victory.into()),
            on_defeat: Some(GAME_OVER.to_string()),
            on_stalemate: None,
        }
    }

    pub fn roster(specs: Vec<EnemySpec>, on_victory: impl Into<String>) -> Self {
        Self::new(EnemySource::Roster(specs), on_victory)
    }

    pub fn on_defeat(mut self, target: impl Into<String>) -> Self {
        self.on_defeat = Some(target.into());
        self
    }

    pub fn on_stalemate(mut self, target: impl Into<String>) -> Self {
        self.on_stalemate = Some(target.into());
        self
    }

    pub(super) fn branch_targets(&self) -> impl Iterator<Item = &str> {
        [&self.on_victory, &self.on_defeat, &self.on_stalemate]
            .into_iter()
            .filter_map(|t| t.as_deref())
    }

    pub(super) fn execute(&mut self, scene_id: &str, description: &str, ctx: &mut GameContext) -> SceneOutcome {
        if !description.is_empty() {
            ctx.renderer.print_slow(description);
        }
        if ctx.combat.is_none() {
            let err = SceneError::MissingCombatSystem;
            error!(scene = scene_id, error = %err, "cannot run combat");
            ctx.renderer.print_line("The fight cannot take place: no combat system.");
            return SceneOutcome::failure();
        }

        let mut monsters = self.enemies.build(ctx);
        if monsters.is_empty() {
            let err = SceneError::NoEnemies(scene_id.to_string());
            warn!(error = %err, "treating empty encounter as won");
            ctx.renderer.print_line("The area is quiet. Nobody to fight.");
            return SceneOutcome::new(SceneResult::Success, self.on_victory.clone());
        }

        let names: Vec<&str> = monsters.iter().map(|m| m.name.as_str()).collect();
        ctx.renderer.print_line(&format!("Enemies: {}", names.join(", ")));

        let Some(system) = ctx.combat.as_mut() else {
            return SceneOutcome::failure();
        };
        let report = system.run(&mut ctx.party, &mut monsters);
        ctx.show_lines(&report.log);

        ctx.state.add(TOTAL_XP, i64::from(report.xp));
        ctx.state.add(DEATHS, report.downed_party.len() as i64);
        info!(scene = scene_id, outcome = ?report.outcome, xp = report.xp, "encounter resolved");

        let outcome = match report.outcome {
            CombatOutcome::Victory => {
                ctx.state.add(COMBAT_VICTORIES, 1);
                ctx.renderer.print_line(&format!("Victory! {} XP earned.", report.xp));
                SceneOutcome::new(SceneResult::Success, self.on_victory.clone())
            }
            CombatOutcome::Defeat => {
                ctx.renderer.print_line("The party has fallen...");
                SceneOutcome::new(SceneResult::Failure, self.on_defeat.clone())
            }
            CombatOutcome::Stalemate => {
                ctx.renderer.print_line("Both sides pull back, exhausted.");
                let next = self.on_stalemate.clone().or_else(|| self.on_victory.clone());
                SceneOutcome::proceed(next)
            }
        };
        ctx.show_party_status();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::factory::CharacterFactory;
    use crate::render::ScriptedRenderer;
    use crate::Dice;

    fn party() -> Vec<crate::Character> {
        let factory = CharacterFactory::builtin();
        vec![factory.create("fighter", None).unwrap()]
    }

    #[test]
    fn missing_combat_system_fails() {
        let mut ctx = GameContext::new(party(), GameConfig::headless(1), Box::new(ScriptedRenderer::default()))
            .with_combat(None);
        let mut scene = CombatScene::new(EnemySource::custom(|_| vec![Monster::new("Rat", 1, 8)]), "after");
        let out = scene.execute("cellar", "", &mut ctx);
        assert_eq!(out, SceneOutcome::failure());
        assert_eq!(ctx.state.get(COMBAT_VICTORIES), 0);
    }

    #[test]
    fn stalemate_routes_to_its_own_branch() {
        let mut ctx = GameContext::new(party(), GameConfig::headless(1), Box::new(ScriptedRenderer::default()));
        // Every d20 is a 2: nobody ever lands a blow.
        ctx.combat = Some(crate::CombatSystem::new(crate::CombatVariant::Core, 3, Dice::from_scripted(vec![2])));
        let mut scene = CombatScene::new(EnemySource::custom(|_| vec![Monster::new("Golem", 30, 25)]), "won")
            .on_stalemate("retreat");
        let out = scene.execute("hall", "", &mut ctx);
        assert_eq!(out, SceneOutcome::proceed(Some("retreat".into())));
        assert_eq!(ctx.state.get(COMBAT_VICTORIES), 0);
        assert_eq!(ctx.state.get(TOTAL_XP), 0);
    }
}
