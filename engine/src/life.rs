use serde::{Deserialize, Serialize};

/// Hit point pool. The raw value may go below zero while damage stacks up;
/// every reader sees it clamped at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    hp: i32,
    max_hp: i32,
}

impl Health {
    pub fn new(max_hp: i32) -> Self {
        let max_hp = max_hp.max(1);
        Self { hp: max_hp, max_hp }
    }

    pub fn with_current(current: i32, max_hp: i32) -> Self {
        let max_hp = max_hp.max(1);
        Self { hp: current.min(max_hp), max_hp }
    }

    pub fn current(&self) -> i32 {
        self.hp.max(0)
    }

    pub fn raw(&self) -> i32 {
        self.hp
    }

    pub fn max(&self) -> i32 {
        self.max_hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn ratio(&self) -> f64 {
        self.current() as f64 / self.max_hp as f64
    }

    pub fn below_fraction(&self, fraction: f64) -> bool {
        (self.current() as f64) < fraction * self.max_hp as f64
    }

    pub fn restore_full(&mut self) {
        self.hp = self.max_hp;
    }
}

/// Apply damage. Returns true if the creature dropped to 0 this call.
pub fn apply_damage(name: &str, health: &mut Health, dmg: i32, mut log: impl FnMut(String)) -> bool {
    let before = health.current();
    if before == 0 || dmg <= 0 {
        return false;
    }
    health.hp -= dmg;
    log(format!("[HP][{}] {} → {} (−{})", name, before, health.current(), dmg));
    if health.current() == 0 {
        log(format!("[DOWN][{}] drops to 0 HP", name));
        return true;
    }
    false
}

/// Healing is capped at max HP; a creature below zero is lifted from 0.
/// Returns the HP actually gained.
pub fn heal(name: &str, health: &mut Health, amount: i32, mut log: impl FnMut(String)) -> i32 {
    if amount <= 0 {
        return 0;
    }
    let before = health.current();
    health.hp = (before + amount).min(health.max_hp);
    let gained = health.hp - before;
    log(format!("[HEAL][{}] +{} HP ({} → {})", name, gained, before, health.hp));
    gained
}
