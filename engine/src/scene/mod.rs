//! Nodes of the adventure graph.
//!
//! A [`Scene`] carries the metadata every node shares plus a [`SceneKind`]
//! naming its variant. Scenes never see the manager: `execute` hands back a
//! [`SceneOutcome`] saying how the scene ended and where to go next.

mod camp;
mod choice;
mod encounter;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::GameContext;

pub use camp::{RestScene, RestType, TreasureScene};
pub use choice::{Choice, ChoiceScene, Condition, Rule};
pub use encounter::{CombatScene, EnemySource, EnemySpec, GAME_OVER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneResult {
    Continue,
    Success,
    Failure,
    Exit,
}

impl SceneResult {
    /// Failure and exit stop the run no matter what `next` says.
    pub fn is_terminal(self) -> bool {
        matches!(self, SceneResult::Failure | SceneResult::Exit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneOutcome {
    pub result: SceneResult,
    pub next: Option<String>,
}

impl SceneOutcome {
    pub fn new(result: SceneResult, next: Option<String>) -> Self {
        Self { result, next }
    }

    pub fn proceed(next: Option<String>) -> Self {
        Self::new(SceneResult::Continue, next)
    }

    pub fn failure() -> Self {
        Self::new(SceneResult::Failure, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantScene {
    pub merchant_id: String,
}

pub enum SceneKind {
    Narrative,
    Choice(ChoiceScene),
    Combat(CombatScene),
    Merchant(MerchantScene),
    Treasure(TreasureScene),
    Rest(RestScene),
}

impl SceneKind {
    pub fn label(&self) -> &'static str {
        match self {
            SceneKind::Narrative => "narrative",
            SceneKind::Choice(_) => "choice",
            SceneKind::Combat(_) => "combat",
            SceneKind::Merchant(_) => "merchant",
            SceneKind::Treasure(_) => "treasure",
            SceneKind::Rest(_) => "rest",
        }
    }
}

pub struct Scene {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Fixed successor. Choice and combat scenes pick their own instead.
    pub next: Option<String>,
    /// ASCII map shown under the header, with an optional party position.
    pub map: Option<(String, Option<(i32, i32)>)>,
    pub visited: bool,
    pub kind: SceneKind,
}

impl Scene {
    fn build(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>, kind: SceneKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            next: None,
            map: None,
            visited: false,
            kind,
        }
    }

    pub fn narrative(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self::build(id, title, text, SceneKind::Narrative)
    }

    pub fn choice(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        choices: Vec<Choice>,
    ) -> Self {
        Self::build(id, title, description, SceneKind::Choice(ChoiceScene { choices }))
    }

    pub fn combat(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>, combat: CombatScene) -> Self {
        Self::build(id, title, description, SceneKind::Combat(combat))
    }

    pub fn merchant(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        merchant_id: impl Into<String>,
    ) -> Self {
        let kind = SceneKind::Merchant(MerchantScene { merchant_id: merchant_id.into() });
        Self::build(id, title, description, kind)
    }

    pub fn treasure(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>, loot: TreasureScene) -> Self {
        Self::build(id, title, description, SceneKind::Treasure(loot))
    }

    pub fn rest(id: impl Into<String>, title: impl Into<String>, description: impl Into<String>, rest_type: RestType) -> Self {
        Self::build(id, title, description, SceneKind::Rest(RestScene { rest_type }))
    }

    pub fn then(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_map(mut self, ascii: impl Into<String>, pos: Option<(i32, i32)>) -> Self {
        self.map = Some((ascii.into(), pos));
        self
    }

    /// Every scene id this scene can hand control to.
    pub fn targets(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.next.as_deref().into_iter().collect();
        match &self.kind {
            SceneKind::Choice(c) => out.extend(c.choices.iter().filter_map(|c| c.next.as_deref())),
            SceneKind::Combat(c) => out.extend(c.branch_targets()),
            _ => {}
        }
        out
    }

    pub fn execute(&mut self, ctx: &mut GameContext) -> SceneOutcome {
        self.visited = true;
        debug!(scene = %self.id, kind = self.kind.label(), "entering scene");
        ctx.renderer.print_header(&self.title);
        if let Some((ascii, pos)) = &self.map {
            ctx.renderer.display_map(ascii, *pos);
        }

        let outcome = match &mut self.kind {
            SceneKind::Narrative => {
                if !self.description.is_empty() {
                    ctx.renderer.print_slow(&self.description);
                }
                ctx.renderer.wait_for_input(None);
                SceneOutcome::proceed(self.next.clone())
            }
            SceneKind::Choice(choice) => choice.execute(&self.id, &self.description, ctx),
            SceneKind::Combat(combat) => combat.execute(&self.id, &self.description, ctx),
            SceneKind::Merchant(shop) => {
                if !self.description.is_empty() {
                    ctx.renderer.print_slow(&self.description);
                }
                crate::merchant::visit(&shop.merchant_id, ctx);
                SceneOutcome::proceed(self.next.clone())
            }
            SceneKind::Treasure(loot) => {
                if !self.description.is_empty() {
                    ctx.renderer.print_slow(&self.description);
                }
                loot.distribute(ctx);
                ctx.renderer.wait_for_input(None);
                SceneOutcome::proceed(self.next.clone())
            }
            SceneKind::Rest(rest) => {
                if !self.description.is_empty() {
                    ctx.renderer.print_slow(&self.description);
                }
                rest.apply(ctx);
                ctx.renderer.wait_for_input(None);
                SceneOutcome::proceed(self.next.clone())
            }
        };
        debug!(scene = %self.id, result = ?outcome.result, next = ?outcome.next, "scene finished");
        outcome
    }
}
