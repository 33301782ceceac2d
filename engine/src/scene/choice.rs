use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{SceneOutcome, SceneResult};
use crate::context::GameContext;
use crate::error::SceneError;

const SAVE_OPTION: &str = "Save the game";
const SAVE_SLOT: &str = "quicksave";

pub type Guard = Rc<dyn Fn(&GameContext) -> bool>;
pub type Callback = Rc<dyn Fn(&mut GameContext)>;

/// Data guard on a choice, loadable from scenario files.
///
/// A bare `true`/`false` is accepted as well as a tagged rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Literal(bool),
    Rule(Rule),
}

impl Default for Condition {
    fn default() -> Self {
        Condition::Literal(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    CounterAtLeast { counter: String, value: i64 },
    CounterBelow { counter: String, value: i64 },
    PartyGoldAtLeast { amount: u32 },
    AliveAtLeast { count: usize },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    pub fn holds(&self, ctx: &GameContext) -> bool {
        match self {
            Condition::Literal(b) => *b,
            Condition::Rule(rule) => match rule {
                Rule::CounterAtLeast { counter, value } => ctx.state.get(counter) >= *value,
                Rule::CounterBelow { counter, value } => ctx.state.get(counter) < *value,
                Rule::PartyGoldAtLeast { amount } => ctx.party_gold() >= *amount,
                Rule::AliveAtLeast { count } => ctx.living_party().count() >= *count,
                Rule::All { conditions } => conditions.iter().all(|c| c.holds(ctx)),
                Rule::Any { conditions } => conditions.iter().any(|c| c.holds(ctx)),
                Rule::Not { condition } => !condition.holds(ctx),
            },
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default, alias = "next_scene", alias = "next_scene_id")]
    pub next: Option<String>,
    #[serde(default)]
    pub effects: IndexMap<String, i64>,
    #[serde(default)]
    pub condition: Condition,
    /// Picking this ends the run.
    #[serde(default)]
    pub exit: bool,
    #[serde(skip)]
    guard: Option<Guard>,
    #[serde(skip)]
    callback: Option<Callback>,
}

impl Choice {
    pub fn new(text: impl Into<String>, next: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next: Some(next.into()),
            effects: IndexMap::new(),
            condition: Condition::default(),
            exit: false,
            guard: None,
            callback: None,
        }
    }

    /// A choice that ends the run when picked.
    pub fn exit(text: impl Into<String>) -> Self {
        Self { next: None, exit: true, ..Self::new(text, "") }
    }

    pub fn with_effect(mut self, counter: impl Into<String>, delta: i64) -> Self {
        *self.effects.entry(counter.into()).or_insert(0) += delta;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Code-level guard, checked in addition to `condition`.
    pub fn with_guard(mut self, guard: impl Fn(&GameContext) -> bool + 'static) -> Self {
        self.guard = Some(Rc::new(guard));
        self
    }

    pub fn with_callback(mut self, callback: impl Fn(&mut GameContext) + 'static) -> Self {
        self.callback = Some(Rc::new(callback));
        self
    }

    pub fn is_available(&self, ctx: &GameContext) -> bool {
        self.condition.holds(ctx) && self.guard.as_ref().is_none_or(|g| g(ctx))
    }
}

pub struct ChoiceScene {
    pub choices: Vec<Choice>,
}

impl ChoiceScene {
    pub(super) fn execute(&mut self, scene_id: &str, description: &str, ctx: &mut GameContext) -> SceneOutcome {
        if !description.is_empty() {
            ctx.renderer.print_slow(description);
        }

        let available: Vec<usize> = (0..self.choices.len()).filter(|&i| self.choices[i].is_available(ctx)).collect();
        if available.is_empty() {
            let err = SceneError::NoChoicesAvailable(scene_id.to_string());
            warn!(error = %err, "choice scene has nothing to offer");
            ctx.renderer.print_line("No choices available!");
            return SceneOutcome::failure();
        }

        let mut offer_save = ctx.saves.is_some();
        let picked = loop {
            let mut labels: Vec<String> = available.iter().map(|&i| self.choices[i].text.clone()).collect();
            if offer_save {
                labels.push(SAVE_OPTION.to_string());
            }
            let idx = ctx.renderer.get_choice(&labels);
            if offer_save && idx == available.len() {
                match crate::save::save_context(ctx, SAVE_SLOT) {
                    Ok(path) => ctx.renderer.print_line(&format!("Game saved: {}", path.display())),
                    Err(err) => {
                        warn!(error = %err, "save failed");
                        ctx.renderer.print_line("Could not save the game.");
                    }
                }
                offer_save = false;
                continue;
            }
            break available[idx.min(available.len() - 1)];
        };

        let choice = self.choices[picked].clone();
        info!(scene = scene_id, choice = %choice.text, "choice made");
        ctx.state.apply_effects(&choice.effects);
        if let Some(callback) = &choice.callback {
            callback(ctx);
        }

        let result = if choice.exit { SceneResult::Exit } else { SceneResult::Continue };
        SceneOutcome::new(result, choice.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::render::ScriptedRenderer;
    use crate::state::GOLD;

    fn ctx_with(choices: Vec<usize>) -> (GameContext, Rc<std::cell::RefCell<crate::render::Transcript>>) {
        let renderer = ScriptedRenderer::new(choices);
        let transcript = renderer.transcript();
        (GameContext::new(Vec::new(), GameConfig::headless(3), Box::new(renderer)), transcript)
    }

    #[test]
    fn rules_parse_from_json() {
        let raw = r#"{"kind":"all","conditions":[true,{"kind":"counter_at_least","counter":"gold","value":5}]}"#;
        let cond: Condition = serde_json::from_str(raw).unwrap();
        let (mut ctx, _) = ctx_with(vec![]);
        assert!(!cond.holds(&ctx));
        ctx.state.add(GOLD, 5);
        assert!(cond.holds(&ctx));
        let not: Condition = serde_json::from_str(r#"{"kind":"not","condition":false}"#).unwrap();
        assert!(not.holds(&ctx));
    }

    #[test]
    fn effects_and_callback_run_on_pick() {
        let (mut ctx, _) = ctx_with(vec![1]);
        let mut scene = ChoiceScene {
            choices: vec![
                Choice::new("Walk away", "road"),
                Choice::new("Help the farmer", "farm")
                    .with_effect("reputation", 2)
                    .with_callback(|ctx| ctx.state.add("favours", 1)),
            ],
        };
        let out = scene.execute("square", "", &mut ctx);
        assert_eq!(out, SceneOutcome::proceed(Some("farm".into())));
        assert_eq!(ctx.state.get("reputation"), 2);
        assert_eq!(ctx.state.get("favours"), 1);
    }

    #[test]
    fn programmatic_guard_hides_choice() {
        let (mut ctx, transcript) = ctx_with(vec![0]);
        let mut scene = ChoiceScene {
            choices: vec![
                Choice::new("Bribe the guard", "inside").with_guard(|ctx| ctx.party_gold() >= 50),
                Choice::new("Turn back", "road"),
            ],
        };
        let out = scene.execute("gate", "", &mut ctx);
        assert_eq!(out.next.as_deref(), Some("road"));
        assert_eq!(transcript.borrow().offered[0], vec!["Turn back".to_string()]);
    }

    #[test]
    fn exit_choice_ends_run() {
        let (mut ctx, _) = ctx_with(vec![0]);
        let mut scene = ChoiceScene { choices: vec![Choice::exit("Retire to the tavern")] };
        let out = scene.execute("end", "", &mut ctx);
        assert_eq!(out.result, SceneResult::Exit);
    }
}
