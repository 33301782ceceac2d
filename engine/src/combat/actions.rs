//! Per-actor decisions: what a party member does on its turn and whom a
//! monster swings at.

use crate::combatant::{Character, Combatant, Monster};
use crate::config::CombatVariant;
use crate::life::heal;
use crate::{Ability, Dice};

/// Below this fraction of max HP an ally is worth a healing spell.
const HEAL_ALLY_BELOW: f64 = 0.5;
/// Below this fraction of max HP a member drinks a potion.
const DRINK_POTION_BELOW: f64 = 0.3;
/// Roster slots 0..MELEE_SLOTS form the front row.
pub const MELEE_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyAction {
    Attack { target: usize },
    CastHeal { ally: usize },
    DrinkPotion,
}

/// Pick the action for `party[actor]`. `alive_monsters` must be non-empty.
pub fn choose_party_action(
    variant: CombatVariant,
    actor: usize,
    party: &[Character],
    alive_party: &[usize],
    monsters: &[Monster],
    alive_monsters: &[usize],
) -> PartyAction {
    let me = &party[actor];
    if variant == CombatVariant::Enhanced {
        if me.can_cast_heal() {
            let wounded = alive_party
                .iter()
                .copied()
                .filter(|&i| party[i].is_alive() && party[i].health.below_fraction(HEAL_ALLY_BELOW))
                .min_by(|&a, &b| party[a].health.ratio().total_cmp(&party[b].health.ratio()));
            if let Some(ally) = wounded {
                return PartyAction::CastHeal { ally };
            }
        }
        if me.potion_count() > 0 && me.health.below_fraction(DRINK_POTION_BELOW) {
            return PartyAction::DrinkPotion;
        }
    }
    PartyAction::Attack { target: weakest_monster(monsters, alive_monsters) }
}

/// Living monster with the fewest HP; roster order breaks ties.
pub fn weakest_monster(monsters: &[Monster], alive_monsters: &[usize]) -> usize {
    alive_monsters
        .iter()
        .copied()
        .filter(|&i| monsters[i].is_alive())
        .min_by_key(|&i| monsters[i].hit_points())
        .unwrap_or(alive_monsters[0])
}

/// Monsters go for the front row; the back row is only reachable once the
/// front row is down. Within the reachable set the most wounded member is
/// targeted. Returns `None` when nobody is left standing.
pub fn select_monster_target(party: &[Character], alive_party: &[usize]) -> Option<usize> {
    let living: Vec<usize> = alive_party.iter().copied().filter(|&i| party[i].is_alive()).collect();
    let front: Vec<usize> = living.iter().copied().filter(|&i| i < MELEE_SLOTS).collect();
    let reachable = if front.is_empty() { living } else { front };
    reachable.into_iter().min_by_key(|&i| party[i].hit_points())
}

/// Caster spends a slot and heals `party[ally]`. Returns HP restored.
pub fn cast_heal(dice: &mut Dice, party: &mut [Character], caster: usize, ally: usize, mut log: impl FnMut(String)) -> i32 {
    let (spell, ability) = {
        let c = &party[caster];
        match (&c.healing_spell, c.class.spellcasting_ability()) {
            (Some(spell), ability) => (spell.clone(), ability.unwrap_or(Ability::Wis)),
            (None, _) => return 0,
        }
    };
    let Some(slot) = party[caster].spell_slots.spend(spell.slot_level) else {
        return 0;
    };
    let amount = (dice.roll_dice(spell.dice) + spell.dice.bonus + party[caster].ability_mod(ability)).max(1);
    log(format!(
        "[SPELL][{}] casts {} (level {} slot) on {}",
        party[caster].name, spell.name, slot, party[ally].name
    ));
    let target = &mut party[ally];
    heal(&target.name, &mut target.health, amount, log)
}

/// Drink a healing potion. Returns HP restored.
pub fn drink_potion(dice: &mut Dice, member: &mut Character, mut log: impl FnMut(String)) -> i32 {
    let Some((potion, heals)) = member.take_potion() else {
        return 0;
    };
    let amount = (dice.roll_dice(heals) + heals.bonus).max(1);
    log(format!("[ITEM][{}] drinks {} ({} left)", member.name, potion, member.potion_count()));
    heal(&member.name, &mut member.health, amount, log)
}
