//! Walks the scene graph.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::context::GameContext;
use crate::error::SceneError;
use crate::scene::{Scene, SceneResult};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub result: SceneResult,
    pub steps: usize,
    /// Scene ids in execution order.
    pub history: Vec<String>,
    /// Successor the last scene pointed at, if any.
    pub pending: Option<String>,
    pub error: Option<SceneError>,
}

impl RunSummary {
    pub fn is_failure(&self) -> bool {
        self.result == SceneResult::Failure
    }
}

#[derive(Default)]
pub struct SceneManager {
    scenes: IndexMap<String, Scene>,
    current: Option<String>,
    history: Vec<String>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `scene`, replacing any scene with the same id.
    pub fn add_scene(&mut self, scene: Scene) {
        if self.scenes.contains_key(&scene.id) {
            warn!(scene = %scene.id, "scene id registered twice, replacing");
        }
        self.scenes.insert(scene.id.clone(), scene);
    }

    pub fn get(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scene_ids(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Run from `start` until a scene has no successor, or returns failure or
    /// exit. An unknown scene id ends the run as a failure.
    pub fn run(&mut self, ctx: &mut GameContext, start: &str) -> RunSummary {
        self.current = Some(start.to_string());
        let first = self.history.len();
        let mut result = SceneResult::Continue;
        let mut error = None;

        while let Some(id) = self.current.clone() {
            let Some(scene) = self.scenes.get_mut(&id) else {
                let err = SceneError::UnregisteredScene(id.clone());
                error!(error = %err, "run halted");
                ctx.renderer.print_line(&format!("Error: {}", err));
                result = SceneResult::Failure;
                error = Some(err);
                break;
            };

            ctx.current_scene = Some(id.clone());
            let outcome = scene.execute(ctx);
            self.history.push(id);
            self.current = outcome.next;
            result = outcome.result;

            if result.is_terminal() {
                break;
            }
            // Autosaves point at the successor, never at the scene that just ran.
            if ctx.config.auto_save && self.current.is_some() {
                ctx.current_scene = self.current.clone();
                autosave(ctx);
            }
        }

        match result {
            SceneResult::Exit => ctx.renderer.print_line("The adventure ends here."),
            SceneResult::Failure => ctx.renderer.print_line("Game Over"),
            _ => ctx.renderer.print_line("The end. Thanks for playing!"),
        }

        let history = self.history[first..].to_vec();
        info!(?result, steps = history.len(), "run finished");
        RunSummary {
            result,
            steps: history.len(),
            history,
            pending: self.current.clone(),
            error,
        }
    }

    /// Successor ids reachable from `start` that are not registered, as
    /// `(from, to)` pairs. A missing start is reported with an empty `from`.
    pub fn validate(&self, start: &str) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        if !self.scenes.contains_key(start) {
            dangling.push((String::new(), start.to_string()));
            return dangling;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![start.to_string()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let Some(scene) = self.scenes.get(&id) else {
                continue;
            };
            for target in scene.targets() {
                if self.scenes.contains_key(target) {
                    stack.push(target.to_string());
                } else {
                    dangling.push((id.clone(), target.to_string()));
                }
            }
        }
        dangling
    }
}

fn autosave(ctx: &GameContext) {
    if ctx.saves.is_none() {
        return;
    }
    if let Err(err) = crate::save::save_context(ctx, crate::save::AUTOSAVE_SLOT) {
        warn!(error = %err, "autosave failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::render::ScriptedRenderer;

    fn ctx() -> GameContext {
        GameContext::new(Vec::new(), GameConfig::headless(2), Box::new(ScriptedRenderer::default()))
    }

    #[test]
    fn follows_chain_and_records_history() {
        let mut manager = SceneManager::new();
        manager.add_scene(Scene::narrative("a", "A", "").then("b"));
        manager.add_scene(Scene::narrative("b", "B", ""));
        let summary = manager.run(&mut ctx(), "a");
        assert_eq!(summary.result, SceneResult::Continue);
        assert_eq!(summary.history, vec!["a", "b"]);
        assert_eq!(summary.pending, None);
    }

    #[test]
    fn dangling_next_fails_after_running_the_valid_prefix() {
        let mut manager = SceneManager::new();
        manager.add_scene(Scene::narrative("a", "A", "").then("nowhere"));
        let summary = manager.run(&mut ctx(), "a");
        assert!(summary.is_failure());
        assert_eq!(summary.history, vec!["a"]);
        assert_eq!(summary.error, Some(SceneError::UnregisteredScene("nowhere".into())));
    }

    #[test]
    fn re_registering_overwrites() {
        let mut manager = SceneManager::new();
        manager.add_scene(Scene::narrative("a", "First", ""));
        manager.add_scene(Scene::narrative("a", "Second", ""));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.get("a").map(|s| s.title.as_str()), Some("Second"));
    }

    #[test]
    fn validate_reports_reachable_dangling_targets() {
        let mut manager = SceneManager::new();
        manager.add_scene(Scene::narrative("a", "A", "").then("b"));
        manager.add_scene(Scene::narrative("b", "B", "").then("ghost"));
        manager.add_scene(Scene::narrative("island", "I", "").then("also_ghost"));
        assert_eq!(manager.validate("a"), vec![("b".to_string(), "ghost".to_string())]);
        assert_eq!(manager.validate("zzz"), vec![(String::new(), "zzz".to_string())]);
    }
}
