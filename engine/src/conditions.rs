use serde::{Deserialize, Serialize};

use crate::AdMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Poisoned,
    Prone,
    Restrained,
    Frightened,
    Blinded,
    Charmed,
}

impl ConditionKind {
    /// Conditions that a long rest clears.
    pub fn is_short_duration(self) -> bool {
        matches!(
            self,
            ConditionKind::Poisoned | ConditionKind::Frightened | ConditionKind::Restrained | ConditionKind::Prone
        )
    }
}

/// A condition that is currently active on a party member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCondition {
    pub kind: ConditionKind,
    /// Where it came from, for display only.
    #[serde(default)]
    pub source: Option<String>,
}

impl ActiveCondition {
    pub fn new(kind: ConditionKind) -> Self {
        Self { kind, source: None }
    }
}

/// Net vantage result for attack rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vantage {
    Normal,
    Advantage,
    Disadvantage,
}

impl Vantage {
    pub fn combine(self, other: Vantage) -> Vantage {
        use Vantage::*;
        match (self, other) {
            (Disadvantage, Advantage) | (Advantage, Disadvantage) => Normal,
            (Normal, x) => x,
            (x, Normal) => x,
            (Advantage, Advantage) => Advantage,
            (Disadvantage, Disadvantage) => Disadvantage,
        }
    }
}

impl From<Vantage> for AdMode {
    fn from(v: Vantage) -> Self {
        match v {
            Vantage::Normal => AdMode::Normal,
            Vantage::Advantage => AdMode::Advantage,
            Vantage::Disadvantage => AdMode::Disadvantage,
        }
    }
}

/// Whether the attack is melee or ranged (used for prone interactions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStyle {
    Melee,
    Ranged,
}

/// Compute vantage modifiers from conditions on attacker and target.
pub fn vantage_from_conditions(
    attacker_conds: &[ActiveCondition],
    target_conds: &[ActiveCondition],
    style: AttackStyle,
) -> Vantage {
    use ConditionKind::*;
    use Vantage::*;

    let mut net = Normal;

    if attacker_conds
        .iter()
        .any(|c| matches!(c.kind, Poisoned | Restrained | Frightened | Blinded))
    {
        net = net.combine(Disadvantage);
    }

    for c in target_conds {
        match c.kind {
            Restrained | Blinded => {
                net = net.combine(Advantage);
            }
            Prone => match style {
                AttackStyle::Melee => net = net.combine(Advantage),
                AttackStyle::Ranged => net = net.combine(Disadvantage),
            },
            Poisoned | Frightened | Charmed => {}
        }
    }

    net
}

/// Drop every short-duration condition, returning what was removed.
pub fn strip_short_duration(
    name: &str,
    conds: &mut Vec<ActiveCondition>,
    mut log: impl FnMut(String),
) -> Vec<ConditionKind> {
    let mut removed = Vec::new();
    conds.retain(|c| {
        if c.kind.is_short_duration() {
            removed.push(c.kind);
            false
        } else {
            true
        }
    });
    for kind in &removed {
        log(format!("[COND][{}] is no longer {:?}", name, kind));
    }
    removed
}
