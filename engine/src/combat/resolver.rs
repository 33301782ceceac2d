use tracing::debug;

use crate::combatant::Combatant;
use crate::conditions::vantage_from_conditions;
use crate::{attack, damage, AdMode, AttackResult, DamageDice, Dice};

/// What happened when one combatant swung at another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOutcome {
    pub attacker: String,
    pub target: String,
    pub label: String,
    /// Kept d20; 0 when no roll was made because the target was already down.
    pub roll: i32,
    pub total: i32,
    pub ac: i32,
    pub nat1: bool,
    pub crit: bool,
    pub hit: bool,
    pub damage: i32,
    pub target_down: bool,
}

/// Resolve one attack from `actor` against `target`, applying damage in place.
///
/// A target that is already down takes no damage and the attack reports as a
/// miss without consuming any dice.
pub fn resolve_attack<A, T>(dice: &mut Dice, actor: &A, target: &mut T, mut log: impl FnMut(String)) -> AttackOutcome
where
    A: Combatant + ?Sized,
    T: Combatant + ?Sized,
{
    let profile = actor.attack_profile();
    let target_name = target.name().to_string();
    let ac = target.armor_class();

    if !target.is_alive() {
        log(format!("[ATTACK][{}] {} is already down", actor.name(), target_name));
        return AttackOutcome {
            attacker: actor.name().to_string(),
            target: target_name,
            label: profile.label,
            roll: 0,
            total: 0,
            ac,
            nat1: false,
            crit: false,
            hit: false,
            damage: 0,
            target_down: true,
        };
    }

    let mode: AdMode = vantage_from_conditions(actor.conditions(), target.conditions(), profile.style).into();
    let atk = attack(dice, mode, profile.to_hit, ac);
    log_attack(&mut log, actor.name(), &target_name, &profile.label, &atk);

    let mut dealt = 0;
    let mut target_down = false;
    if atk.hit {
        dealt = damage(dice, profile.dice, profile.damage_mod, atk.is_crit);
        log_damage(&mut log, actor.name(), profile.dice, profile.damage_mod, atk.is_crit, dealt);
        target_down = target.take_damage(dealt, &mut log);
    }

    debug!(
        attacker = actor.name(),
        target = %target_name,
        roll = atk.roll,
        total = atk.total,
        ac,
        hit = atk.hit,
        crit = atk.is_crit,
        damage = dealt,
        "attack resolved"
    );

    AttackOutcome {
        attacker: actor.name().to_string(),
        target: target_name,
        label: profile.label,
        roll: atk.roll,
        total: atk.total,
        ac,
        nat1: atk.nat1,
        crit: atk.is_crit,
        hit: atk.hit,
        damage: dealt,
        target_down,
    }
}

fn format_d20_sequence(raw: &[i32], kept: i32) -> String {
    match raw {
        [] => format!("d20=? (keep={})", kept),
        [only] => format!("d20={}", only),
        [first, second] => format!("d20={} vs d20={} (keep={})", first, second, kept),
        _ => {
            let joined = raw.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ");
            format!("d20s=[{}] (keep={})", joined, kept)
        }
    }
}

pub(crate) fn format_modifier(modifier: i32) -> String {
    if modifier >= 0 {
        format!("+{}", modifier)
    } else {
        format!("-{}", modifier.abs())
    }
}

fn log_attack(log: &mut impl FnMut(String), name: &str, target: &str, label: &str, atk: &AttackResult) {
    let rolls = format_d20_sequence(&atk.raw_rolls, atk.roll);
    let outcome = if atk.is_crit {
        "CRIT!"
    } else if atk.hit {
        "HIT"
    } else if atk.nat1 {
        "MISS (NAT1)"
    } else {
        "MISS"
    };
    log(format!(
        "[ATTACK][{}] {} → {} with {}: {} to-hit={} vs AC={}",
        name, target, outcome, label, rolls, atk.total, atk.ac
    ));
}

fn log_damage(log: &mut impl FnMut(String), name: &str, dice: DamageDice, modifier: i32, crit: bool, total: i32) {
    let dice_expr = if crit { format!("2×({})", dice) } else { dice.to_string() };
    let prefix = if crit { "crit: " } else { "" };
    log(format!("[DMG][{}] {}rolled {} {} = {}", name, prefix, dice_expr, format_modifier(modifier), total));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{Monster, MonsterAction};

    fn orc() -> Monster {
        Monster::new("Orc", 15, 13).with_action(MonsterAction {
            name: "Greataxe".into(),
            attack_bonus: 5,
            damage: DamageDice::new(1, 12).with_bonus(3),
            ranged: false,
        })
    }

    #[test]
    fn hit_logs_attack_damage_and_hp() {
        let mut dice = Dice::from_scripted(vec![15, 7]);
        let mut target = Monster::new("Goblin", 7, 15);
        let mut logs = Vec::new();
        let out = resolve_attack(&mut dice, &orc(), &mut target, |m| logs.push(m));
        assert!(out.hit);
        assert_eq!(out.damage, 10);
        assert!(out.target_down);
        insta::assert_snapshot!(logs.join("\n"), @r"
        [ATTACK][Orc] Goblin → HIT with Greataxe: d20=15 to-hit=20 vs AC=15
        [DMG][Orc] rolled 1d12+3 +0 = 10
        [HP][Goblin] 7 → 0 (−10)
        [DOWN][Goblin] drops to 0 HP
        ");
    }

    #[test]
    fn downed_target_is_a_no_op() {
        let mut dice = Dice::from_scripted(vec![20]);
        let mut target = Monster::new("Goblin", 7, 15);
        target.health = crate::life::Health::with_current(0, 7);
        let out = resolve_attack(&mut dice, &orc(), &mut target, |_| {});
        assert!(!out.hit);
        assert_eq!(out.damage, 0);
        assert_eq!(out.roll, 0);
    }
}
