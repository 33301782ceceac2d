use adventure_engine::api::{simulate_encounter, simulate_encounter_many, EncounterConfig};
use adventure_engine::combat::DEFAULT_MAX_ROUNDS;
use adventure_engine::content::builtin_scenarios;
use adventure_engine::logging::init_logging;
use adventure_engine::render::ConsoleRenderer;
use adventure_engine::save::SaveStore;
use adventure_engine::scenario::Scenario;
use adventure_engine::{CombatVariant, GameConfig, TextSpeed};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use encoding_rs::Encoding;
use std::{fs, path::Path, path::PathBuf};
use tracing::info;

#[derive(Copy, Clone, ValueEnum)]
enum Speed {
    Slow,
    Normal,
    Fast,
    Instant,
}

#[derive(Copy, Clone, ValueEnum)]
enum Variant {
    Core,
    Enhanced,
}

#[derive(Subcommand)]
enum Cmd {
    /// Play a scenario in the terminal
    Play {
        /// Built-in scenario name or path to a JSON/YAML scenario file
        #[arg(default_value = "goblin_ambush")]
        scenario: String,
        /// Config file (YAML or JSON); flags below override it
        #[arg(long)]
        config: Option<PathBuf>,
        /// RNG seed for determinism
        #[arg(long)]
        seed: Option<u64>,
        /// Typewriter speed for narrative text
        #[arg(long, value_enum)]
        speed: Option<Speed>,
        /// Combat tactics for the party
        #[arg(long, value_enum)]
        variant: Option<Variant>,
        /// Directory for save slots; enables saving
        #[arg(long)]
        saves: Option<PathBuf>,
        /// Resume from this save slot (needs --saves)
        #[arg(long, requires = "saves")]
        resume: Option<String>,
        /// Disable the autosave after every scene
        #[arg(long, default_value_t = false)]
        no_autosave: bool,
    },
    /// Check a scenario for unreadable records and dangling scene links
    Validate {
        /// Built-in scenario name or path to a JSON/YAML scenario file
        scenario: String,
    },
    /// Monte Carlo sim: party templates vs monster ids, no scenes
    Simulate {
        /// Character template ids, front row first
        #[arg(long, value_delimiter = ',', default_value = "fighter,cleric,rogue,wizard")]
        party: Vec<String>,
        /// Monster ids
        #[arg(long, value_delimiter = ',', default_value = "goblin,goblin")]
        monsters: Vec<String>,
        /// Optional monsters JSON file checked before the built-in table
        #[arg(long)]
        monsters_file: Option<PathBuf>,
        /// Number of trials; 1 prints the full combat log
        #[arg(long, default_value_t = 1000)]
        trials: u32,
        /// RNG base seed (trial i uses seed+i)
        #[arg(long, default_value_t = 12345)]
        seed: u64,
        /// Safety cap on rounds per trial
        #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
        max_rounds: u32,
        #[arg(long, value_enum, default_value_t = Variant::Enhanced)]
        variant: Variant,
        /// Print the result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Parser)]
#[command(name = "adventure")]
#[command(about = "Scene-graph D&D 5e adventure runner")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

impl From<Speed> for TextSpeed {
    fn from(s: Speed) -> Self {
        match s {
            Speed::Slow => TextSpeed::Slow,
            Speed::Normal => TextSpeed::Normal,
            Speed::Fast => TextSpeed::Fast,
            Speed::Instant => TextSpeed::Instant,
        }
    }
}

impl From<Variant> for CombatVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Core => CombatVariant::Core,
            Variant::Enhanced => CombatVariant::Enhanced,
        }
    }
}

fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", path.display()))?)
    }
}

/// A built-in name wins over a file of the same name in the working directory.
fn load_scenario(name_or_path: &str) -> anyhow::Result<Scenario> {
    if let Some(text) = builtin_scenarios().get(name_or_path) {
        return Scenario::from_json_str(text);
    }
    let path = Path::new(name_or_path);
    if !path.exists() {
        let names: Vec<&str> = builtin_scenarios().keys().copied().collect();
        bail!(
            "no scenario file or built-in named '{}' (built-ins: {})",
            name_or_path,
            names.join(", ")
        );
    }
    let text = read_text_auto(path)?;
    Scenario::parse(&text, path)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GameConfig> {
    match path {
        Some(p) => {
            let text = read_text_auto(p)?;
            GameConfig::from_yaml_str(&text).with_context(|| format!("invalid config: {}", p.display()))
        }
        None => Ok(GameConfig::default()),
    }
}

#[allow(clippy::too_many_arguments)]
fn play(
    scenario: &str,
    config: Option<&Path>,
    seed: Option<u64>,
    speed: Option<Speed>,
    variant: Option<Variant>,
    saves: Option<PathBuf>,
    resume: Option<String>,
    no_autosave: bool,
) -> anyhow::Result<()> {
    let mut scenario = load_scenario(scenario)?;
    let mut cfg = load_config(config)?;
    if seed.is_some() {
        cfg.seed = seed;
    }
    if let Some(s) = speed {
        cfg.text_speed = s.into();
    }
    if let Some(v) = variant {
        cfg.combat_variant = v.into();
    }
    if no_autosave {
        cfg.auto_save = false;
    }

    let renderer = Box::new(ConsoleRenderer::stdio(cfg.text_speed));
    let mut ctx = scenario.context(cfg, renderer);
    if let Some(dir) = saves {
        ctx = ctx.with_saves(SaveStore::new(dir));
    }

    let mut start = None;
    if let (Some(slot), Some(store)) = (resume.as_deref(), ctx.saves.clone()) {
        let game = store.load(slot)?;
        if game.scenario != scenario.name {
            bail!("save '{}' belongs to '{}', not '{}'", slot, game.scenario, scenario.name);
        }
        info!(slot, scene = ?game.scene, "resuming");
        start = game.scene.clone();
        game.restore_into(&mut ctx);
    }

    println!("=== {} ===", scenario.name);
    if !scenario.description.is_empty() {
        println!("{}", scenario.description);
    }
    let report = scenario.run(&mut ctx, start.as_deref());
    if let Some(err) = &report.summary.error {
        eprintln!("error: {}", err);
    }
    println!();
    println!("scenes played:      {}", report.summary.steps);
    println!("survivors:          {}", report.stats.survivors);
    println!("score:              {}", report.stats.score);
    println!("rank:               {}", report.stats.rank);
    Ok(())
}

fn validate(name_or_path: &str) -> anyhow::Result<()> {
    let scenario = load_scenario(name_or_path)?;
    let dangling = scenario.validate();
    if scenario.skipped > 0 {
        println!("skipped records:    {}", scenario.skipped);
    }
    for (from, to) in &dangling {
        if from.is_empty() {
            println!("missing start scene '{}'", to);
        } else {
            println!("dangling link: {} -> {}", from, to);
        }
    }
    if !dangling.is_empty() || scenario.skipped > 0 {
        bail!("scenario '{}' has problems", scenario.name);
    }
    println!("ok: {} ({} scenes, start '{}')", scenario.name, scenario.manager.len(), scenario.start);
    Ok(())
}

fn simulate(cfg: EncounterConfig, trials: u32, json: bool) -> anyhow::Result<()> {
    if trials == 1 {
        let result = simulate_encounter(&cfg)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            for line in &result.log {
                println!("{}", line);
            }
            println!();
            println!("outcome:            {:?}", result.outcome);
            println!("rounds:             {}", result.rounds);
            println!("xp:                 {}", result.xp);
            println!("survivors:          {}", result.survivors.join(", "));
        }
        return Ok(());
    }

    let summary = simulate_encounter_many(&cfg, trials)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("simulate results");
    println!("----------------");
    println!("trials:             {}", summary.trials);
    println!("party:              {}", cfg.party.join(", "));
    println!("monsters:           {}", cfg.monsters.join(", "));
    println!();
    println!("win rate:           {:.1}%", summary.win_rate * 100.0);
    println!("victories:          {}", summary.victories);
    println!("defeats:            {}", summary.defeats);
    println!("stalemates:         {}", summary.stalemates);
    println!("avg rounds (wins):  {:.2}", summary.avg_rounds);
    println!("median rounds:      {}", summary.median_rounds);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Cmd::Play {
            scenario,
            config,
            seed,
            speed,
            variant,
            saves,
            resume,
            no_autosave,
        } => play(
            &scenario,
            config.as_deref(),
            seed,
            speed,
            variant,
            saves,
            resume,
            no_autosave,
        ),
        Cmd::Validate { scenario } => validate(&scenario),
        Cmd::Simulate {
            party,
            monsters,
            monsters_file,
            trials,
            seed,
            max_rounds,
            variant,
            json,
        } => {
            let cfg = EncounterConfig {
                party,
                monsters,
                monsters_path: monsters_file.map(|p| p.display().to_string()),
                seed,
                variant: variant.into(),
                max_rounds,
            };
            simulate(cfg, trials, json)
        }
    }
}
