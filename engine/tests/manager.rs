use adventure_engine::render::ScriptedRenderer;
use adventure_engine::save::{SaveStore, AUTOSAVE_SLOT};
use adventure_engine::scene::Choice;
use adventure_engine::{GameConfig, GameContext, Scene, SceneError, SceneManager, SceneResult};
use proptest::prelude::*;

fn ctx() -> GameContext {
    GameContext::new(Vec::new(), GameConfig::headless(5), Box::new(ScriptedRenderer::default()))
}

#[test]
fn unregistered_start_fails_without_running_anything() {
    let mut manager = SceneManager::new();
    manager.add_scene(Scene::narrative("intro", "Intro", "Once upon a time."));

    let summary = manager.run(&mut ctx(), "x");

    assert_eq!(summary.result, SceneResult::Failure);
    assert_eq!(summary.error, Some(SceneError::UnregisteredScene("x".into())));
    assert!(summary.history.is_empty());
    assert_eq!(summary.steps, 0);
}

#[test]
fn exit_stops_even_with_a_successor() {
    let mut manager = SceneManager::new();
    manager.add_scene(Scene::choice(
        "door",
        "Door",
        "",
        vec![Choice::exit("Go home"), Choice::new("Enter", "hall")],
    ));
    manager.add_scene(Scene::narrative("hall", "Hall", ""));
    let renderer = ScriptedRenderer::new([0]);
    let transcript = renderer.transcript();
    let mut ctx = GameContext::new(Vec::new(), GameConfig::headless(5), Box::new(renderer));

    let summary = manager.run(&mut ctx, "door");

    assert_eq!(summary.result, SceneResult::Exit);
    assert_eq!(summary.history, vec!["door"]);
    assert!(transcript.borrow().contains("The adventure ends here."));
}

#[test]
fn autosave_follows_the_config_flag() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = SceneManager::new();
    manager.add_scene(Scene::narrative("a", "A", "").then("b"));
    manager.add_scene(Scene::narrative("b", "B", ""));

    let mut config = GameConfig::headless(5);
    config.auto_save = true;
    let store = SaveStore::new(dir.path().join("saves"));
    let mut ctx = GameContext::new(Vec::new(), config, Box::new(ScriptedRenderer::default())).with_saves(store.clone());

    manager.run(&mut ctx, "a");

    assert_eq!(store.list().unwrap(), vec![AUTOSAVE_SLOT.to_string()]);
    // Written after "a" finished, pointing at its successor. "b" ends the
    // run, so there is nothing later to resume at.
    let saved = store.load(AUTOSAVE_SLOT).unwrap();
    assert_eq!(saved.scene.as_deref(), Some("b"));
}

#[test]
fn validate_reports_dangling_edges() {
    let mut manager = SceneManager::new();
    manager.add_scene(Scene::choice(
        "fork",
        "Fork",
        "",
        vec![Choice::new("Left", "left"), Choice::new("Right", "cliff")],
    ));
    manager.add_scene(Scene::narrative("left", "Left", "").then("fork"));

    assert_eq!(manager.validate("fork"), vec![("fork".to_string(), "cliff".to_string())]);
    assert_eq!(manager.validate("nope"), vec![(String::new(), "nope".to_string())]);
}

proptest! {
    #[test]
    fn acyclic_chains_visit_each_scene_once(len in 1usize..20) {
        let mut manager = SceneManager::new();
        for i in 0..len {
            let mut scene = Scene::narrative(format!("s{}", i), format!("Scene {}", i), "");
            if i + 1 < len {
                scene = scene.then(format!("s{}", i + 1));
            }
            manager.add_scene(scene);
        }

        let summary = manager.run(&mut ctx(), "s0");

        prop_assert!(summary.steps <= len);
        prop_assert_eq!(summary.steps, len);
        prop_assert_eq!(summary.result, SceneResult::Continue);
        prop_assert!(manager.validate("s0").is_empty());
    }
}
