use adventure_engine::combat::actions::{choose_party_action, drink_potion, select_monster_target, PartyAction};
use adventure_engine::factory::{CharacterFactory, CharacterOverrides, MonsterFactory};
use adventure_engine::items::Item;
use adventure_engine::life::Health;
use adventure_engine::render::ScriptedRenderer;
use adventure_engine::scene::{CombatScene, EnemySource, EnemySpec};
use adventure_engine::state::{COMBAT_VICTORIES, TOTAL_XP};
use adventure_engine::{
    attack, damage, run_combat, AdMode, Character, CombatOutcome, CombatSystem, CombatVariant, DamageDice, Dice,
    GameConfig, GameContext, Monster, Scene, SceneResult,
};
use proptest::prelude::*;

fn fighter(name: &str, hp: i32) -> Character {
    let overrides = CharacterOverrides { name: Some(name.into()), level: None, hit_points: Some(hp) };
    CharacterFactory::builtin().create("fighter", Some(&overrides)).unwrap()
}

fn scripted(variant: CombatVariant, rolls: Vec<i32>) -> CombatSystem {
    CombatSystem::new(variant, 50, Dice::from_scripted(rolls))
}

#[test]
fn first_blow_ends_a_one_monster_fight() {
    let mut party = vec![fighter("A", 10), fighter("B", 10)];
    let mut monsters = vec![Monster::new("Kobold", 5, 10).with_xp(25)];
    // d20 = 19 hits AC 10, longsword d8 = 8 plus STR.
    let mut system = scripted(CombatVariant::Core, vec![19, 8]);

    let report = run_combat(&mut system, &mut party, &mut monsters);

    assert_eq!(report.outcome, CombatOutcome::Victory);
    assert_eq!(report.rounds, 1);
    assert_eq!(report.xp, 25);
    // Only A swung; B never needed to act and the monster never did.
    let attacks: Vec<&String> = report.log.iter().filter(|l| l.starts_with("[ATTACK]")).collect();
    assert_eq!(attacks.len(), 1);
    assert!(attacks[0].starts_with("[ATTACK][A]"));
    assert!(party.iter().all(|c| c.health.current() == 10));
}

#[test]
fn combat_scene_reports_success_and_takes_victory_branch() {
    let party = vec![fighter("A", 10), fighter("B", 10)];
    let mut ctx = GameContext::new(party, GameConfig::headless(1), Box::new(ScriptedRenderer::default()));
    ctx.combat = Some(scripted(CombatVariant::Enhanced, vec![19, 8]));
    let encounter = CombatScene::new(EnemySource::custom(|_| vec![Monster::new("Kobold", 5, 10).with_xp(25)]), "loot");
    let mut scene = Scene::combat("fight", "Fight", "", encounter);

    let out = scene.execute(&mut ctx);

    assert_eq!(out.result, SceneResult::Success);
    assert_eq!(out.next.as_deref(), Some("loot"));
    assert_eq!(ctx.state.get(COMBAT_VICTORIES), 1);
    assert_eq!(ctx.state.get(TOTAL_XP), 25);
}

#[test]
fn roster_numbers_duplicates_and_drops_unknown_ids() {
    let renderer = ScriptedRenderer::default();
    let transcript = renderer.transcript();
    let mut ctx = GameContext::new(vec![fighter("A", 10)], GameConfig::headless(1), Box::new(renderer))
        .with_monsters(MonsterFactory::builtin().unwrap());
    // Every d20 is a 10: A hits AC 15 and each goblin misses AC 16.
    ctx.combat = Some(scripted(CombatVariant::Core, vec![10]));
    let roster = vec![EnemySpec::new("goblin", 2), EnemySpec::new("beholder", 1)];
    let mut scene = Scene::combat("ambush", "Ambush", "", CombatScene::roster(roster, "loot"));

    let out = scene.execute(&mut ctx);

    assert_eq!(out.result, SceneResult::Success);
    let transcript = transcript.borrow();
    assert!(transcript.contains("[START] 1 party member(s) vs 2 monster(s)"));
    assert!(transcript.contains("[ATTACK][A] Goblin 1 → HIT"));
    assert!(transcript.contains("[DOWN][Goblin 2]"));
    assert_eq!(ctx.state.get(TOTAL_XP), 100);
}

#[test]
fn no_survivors_on_either_side_is_a_defeat() {
    let mut downed = fighter("A", 10);
    downed.health = Health::with_current(0, 10);
    let mut gone = Monster::new("Ghoul", 5, 10);
    gone.health = Health::with_current(-3, 5);
    let mut system = scripted(CombatVariant::Core, vec![10]);

    let report = run_combat(&mut system, &mut [downed], &mut [gone]);

    assert_eq!(report.outcome, CombatOutcome::Defeat);
    assert_eq!(report.rounds, 0);
}

#[test]
fn defeat_routes_to_game_over() {
    let mut ctx = GameContext::new(vec![fighter("A", 1)], GameConfig::headless(1), Box::new(ScriptedRenderer::default()));
    // 2 misses AC 30; the ogre then crits with its slam.
    ctx.combat = Some(scripted(CombatVariant::Core, vec![2, 20, 4]));
    let encounter = CombatScene::new(EnemySource::custom(|_| vec![Monster::new("Ogre", 50, 30)]), "loot");
    let mut scene = Scene::combat("fight", "Fight", "", encounter);

    let out = scene.execute(&mut ctx);

    assert_eq!(out.result, SceneResult::Failure);
    assert_eq!(out.next.as_deref(), Some("game_over"));
    assert_eq!(ctx.state.get("deaths"), 1);
}

#[test]
fn monsters_ignore_the_back_row_while_the_front_stands() {
    let mut party: Vec<Character> = (0..5).map(|i| fighter(&format!("M{}", i), 20)).collect();
    party[4].health = Health::with_current(1, 20);
    party[1].health = Health::with_current(7, 20);
    let alive: Vec<usize> = (0..5).collect();
    assert_eq!(select_monster_target(&party, &alive), Some(1));

    for i in 0..3 {
        party[i].health = Health::with_current(0, 20);
    }
    assert_eq!(select_monster_target(&party, &alive), Some(4));
}

#[test]
fn enhanced_cleric_heals_a_badly_hurt_ally() {
    let factory = CharacterFactory::builtin();
    let mut party = vec![fighter("A", 20), factory.create("cleric", None).unwrap()];
    party[0].health = Health::with_current(4, 20);
    let monsters = vec![Monster::new("Rat", 3, 10)];
    let alive = vec![0, 1];

    let action = choose_party_action(CombatVariant::Enhanced, 1, &party, &alive, &monsters, &[0]);
    assert_eq!(action, PartyAction::CastHeal { ally: 0 });

    let core = choose_party_action(CombatVariant::Core, 1, &party, &alive, &monsters, &[0]);
    assert_eq!(core, PartyAction::Attack { target: 0 });
}

#[test]
fn natural_one_always_misses() {
    let mut dice = Dice::from_scripted(vec![1]);
    let res = attack(&mut dice, AdMode::Normal, 30, 5);
    assert!(res.nat1);
    assert!(!res.hit);
}

#[test]
fn bought_potions_heal_with_their_own_dice() {
    let mut hero = fighter("A", 30);
    hero.health = Health::with_current(1, 30);
    let standard = hero.healing_potions;
    hero.inventory.push(Item::Potion {
        name: "Potion of Greater Healing".into(),
        heal: DamageDice::new(1, 1).with_bonus(9),
        price: 150,
    });
    let mut dice = Dice::from_scripted(vec![1]);
    let mut log = Vec::new();

    let healed = drink_potion(&mut dice, &mut hero, |m| log.push(m));

    assert_eq!(healed, 10);
    assert_eq!(hero.health.current(), 11);
    assert!(hero.inventory.is_empty());
    assert_eq!(hero.healing_potions, standard);
    assert!(log[0].contains("drinks Potion of Greater Healing"));
}

proptest! {
    #[test]
    fn natural_twenty_hits_any_armor(ac in 0i32..60, bonus in -10i32..10) {
        let mut dice = Dice::from_scripted(vec![20]);
        let res = attack(&mut dice, AdMode::Normal, bonus, ac);
        prop_assert!(res.hit);
        prop_assert!(res.is_crit);
    }

    #[test]
    fn crit_damage_never_below_plain_damage(
        seed in any::<u64>(),
        count in 1u8..5,
        sides in prop::sample::select(vec![4u8, 6, 8, 10, 12]),
        modifier in -3i32..6,
    ) {
        let spec = DamageDice::new(count, sides);
        let plain = damage(&mut Dice::from_seed(seed), spec, modifier, false);
        let crit = damage(&mut Dice::from_seed(seed), spec, modifier, true);
        prop_assert!(crit >= plain);
        prop_assert!(plain >= 1);
    }
}
