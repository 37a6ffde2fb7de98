//! Shroom - Entry Point
//!
//! Terminal driver for the mushroom. Runs the frame loop and the trigger
//! poll on a tokio runtime while reading commands from stdin.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;
use tokio::time::{Instant, MissedTickBehavior};

use shroom::core::config::GameConfig;
use shroom::core::error::Result;
use shroom::core::types::{Clock, SystemClock};
use shroom::entity::food::{available_foods, FoodType};
use shroom::llm::client::{DialogueTransport, LlmClient};
use shroom::llm::mock::MockBackend;
use shroom::simulation::game::{Game, GameOptions, Interaction};
use shroom::simulation::tick::SimulationEvent;
use shroom::storage::{FileStore, KeyValueStore, MemoryStore};
use shroom::ui::state::{MarkerEvent, MarkerWatcher, SpeechLog};

/// Frame interval for the simulation loop
const FRAME_MS: u64 = 50;

#[derive(Parser, Debug)]
#[command(name = "shroom")]
#[command(about = "Keep a talkative mushroom fed, misted and entertained")]
struct Args {
    /// TOML file overriding the default tunables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the offline mock backend even if an API key is set
    #[arg(long)]
    mock: bool,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Your name, so the mushroom can use it
    #[arg(long)]
    name: Option<String>,

    /// Where to keep the best survival time (defaults to the platform data dir)
    #[arg(long)]
    store: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shroom=info")),
        )
        .init();

    let args = Args::parse();
    let rt = Runtime::new()?;
    rt.block_on(run(args))
}

fn load_config(args: &Args) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Ok(model) = std::env::var("LLM_MODEL") {
        if !model.is_empty() {
            config.dialogue.model = model;
        }
    }
    config.validate()?;
    Ok(config)
}

fn open_store(args: &Args) -> Box<dyn KeyValueStore> {
    if let Some(path) = &args.store {
        return Box::new(FileStore::new(path));
    }
    match FileStore::in_project_dir() {
        Ok(store) => {
            tracing::debug!("Best time stored at {}", store.path().display());
            Box::new(store)
        }
        Err(e) => {
            tracing::warn!("No data directory ({}); best time will not persist", e);
            Box::new(MemoryStore::new())
        }
    }
}

fn pick_backend(args: &Args, seed: u64) -> Arc<dyn DialogueTransport> {
    if args.mock {
        tracing::info!("Using mock dialogue backend");
        return Arc::new(MockBackend::new(seed));
    }
    match LlmClient::from_env() {
        Ok(client) => {
            tracing::info!("Using dialogue backend at {}", client.api_url());
            Arc::new(client)
        }
        Err(e) => {
            tracing::warn!("{} - falling back to mock dialogue backend", e);
            Arc::new(MockBackend::new(seed))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let seed = args.seed.unwrap_or_else(|| clock.now_ms());
    let poll_every = Duration::from_millis(config.behavior.check_interval);

    let mut game = Game::new(
        config,
        pick_backend(&args, seed),
        open_store(&args),
        clock,
        GameOptions {
            seed,
            player_name: args.name.clone(),
            ..GameOptions::default()
        },
    );

    print_welcome(&game);

    let mut watcher = MarkerWatcher::primed(&game.snapshot());
    let mut speech = SpeechLog::new();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let mut frame = tokio::time::interval(Duration::from_millis(FRAME_MS));
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut poll = tokio::time::interval(poll_every);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            _ = frame.tick() => {
                let now = Instant::now();
                let dt = (now - last_frame).as_secs_f32();
                last_frame = now;

                for event in game.step(dt) {
                    report_simulation_event(&event);
                }
                let events = watcher.poll(&game.snapshot());
                for event in &events {
                    report_marker_event(event);
                }
                speech.extend_from(&events);
            }
            _ = poll.tick() => {
                if let Some(trigger) = game.poll_conversation() {
                    tracing::debug!("Trigger fired: {}", trigger);
                    game.spawn_initiation(trigger);
                }
            }
            line = input.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(&mut game, &mut speech, line.trim()) {
                    break;
                }
            }
        }
    }

    let session = game.session();
    println!(
        "\nGoodbye! Survived {:.1}s this time, best {:.1}s.",
        session.survival_time, session.best_survival_time
    );
    Ok(())
}

/// Run one command. Returns false to quit.
fn handle_command(game: &mut Game, speech: &mut SpeechLog, input: &str) -> bool {
    let (cmd, rest) = match input.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    };

    let result = match cmd {
        "" => Ok(None),
        "quit" | "q" => return false,
        "help" | "h" => {
            print_help();
            Ok(None)
        }
        "status" | "s" => {
            display_status(game);
            Ok(None)
        }
        "log" => {
            for entry in speech.iter() {
                println!("  #{} {}", entry.id, entry.text);
            }
            Ok(None)
        }
        "foods" => {
            let foods = &game.config().foods;
            for food in available_foods(game.snapshot().stage, foods) {
                println!("  {:<10} -{:.0} hunger", food.key(), foods.get(food).hunger_relief);
            }
            Ok(None)
        }
        "restart" => {
            game.restart();
            speech.clear();
            println!("A new sprout pokes out of the soil.");
            Ok(None)
        }
        "feed" | "f" => {
            let food = if rest.is_empty() { "barkChip" } else { rest };
            food.parse::<FoodType>()
                .and_then(|food| game.feed(food))
                .map(Some)
        }
        "mist" | "m" => game.mist().map(Some),
        "poke" | "p" => game.poke().map(Some),
        "scoop" => game.start_jar_drag().map(|picked| {
            if picked {
                println!("You pick up the jar. Type `catch` to scoop fireflies.");
            } else {
                println!("The jar isn't ready yet.");
            }
            None
        }),
        "catch" | "c" => game.catch_firefly().map(|caught| {
            if caught {
                println!("Caught one! The jar holds {}.", game.jar().count());
            } else {
                println!("Pick up the jar first (scoop).");
            }
            None
        }),
        "release" | "gift" | "g" => game.release_jar().map(|gift| {
            if gift.is_none() {
                println!("You set the empty jar down.");
            }
            gift
        }),
        "say" => say(game, rest),
        _ => say(game, input),
    };

    match result {
        Ok(Some(interaction)) => report_interaction(game, &interaction),
        Ok(None) => {}
        Err(e) => println!("{}", e),
    }
    true
}

fn say(game: &Game, text: &str) -> Result<Option<Interaction>> {
    if text.is_empty() {
        return Ok(None);
    }
    if game.dialogue().is_busy() {
        println!("(The mushroom is busy talking.)");
        return Ok(None);
    }
    game.spawn_chat(text)?;
    Ok(None)
}

fn report_interaction(game: &Game, interaction: &Interaction) {
    match interaction {
        Interaction::Fed { food, stage_up } => {
            println!("You toss a {}.", game.config().foods.get(*food).label);
            if let Some(stage) = stage_up {
                println!("The mushroom grows! Stage {}.", stage);
            }
        }
        Interaction::Misted { stage_up } => {
            println!("Psssht.");
            if let Some(stage) = stage_up {
                println!("The mushroom grows! Stage {}.", stage);
            }
        }
        Interaction::Poked { .. } => {}
        Interaction::PokeIgnored => println!("(It is still wobbling from the last poke.)"),
        Interaction::Gifted { count, .. } => {
            println!("You hand over {} firefl{}.", count, if *count == 1 { "y" } else { "ies" });
        }
    }

    if let Some(reaction) = interaction.reaction() {
        game.spawn_reaction(reaction);
    }
}

fn report_simulation_event(event: &SimulationEvent) {
    match event {
        SimulationEvent::EvolutionChanged { to, .. } => {
            println!("~ The mushroom turns {}. ~", to);
        }
        SimulationEvent::GameOver {
            survival_time,
            best_survival_time,
        } => {
            println!();
            println!("=== GAME OVER ===");
            println!("The mushroom went demonic after {:.1}s.", survival_time);
            println!("Best: {:.1}s. Type `restart` to try again.", best_survival_time);
        }
    }
}

fn report_marker_event(event: &MarkerEvent) {
    if let MarkerEvent::Spoke { text, .. } = event {
        println!("Shroom: {}", text);
    }
}

fn print_welcome(game: &Game) {
    println!("\n=== SHROOM ===");
    println!("A mushroom sprouts in front of you. It looks hungry.");
    let best = game.session().best_survival_time;
    if best > 0.0 {
        println!("Best survival so far: {:.1}s", best);
    }
    println!();
    print_help();
}

fn print_help() {
    println!("Commands:");
    println!("  feed / f [food]  - Feed the mushroom (default barkChip)");
    println!("  foods            - List foods available at this stage");
    println!("  mist / m         - Spray some water");
    println!("  poke / p         - Poke it");
    println!("  scoop            - Pick up the firefly jar");
    println!("  catch / c        - Catch a firefly into the jar");
    println!("  release / g      - Hand the jar over");
    println!("  say <text>       - Talk to the mushroom (or just type)");
    println!("  status / s       - Show needs and progress");
    println!("  log              - Show what the mushroom has said");
    println!("  restart          - Start a new life");
    println!("  quit / q         - Exit");
    println!();
}

fn display_status(game: &Game) {
    let hud = game.hud();
    let c = &hud.creature;
    println!();
    println!(
        "Stage {} | {} | survived {:.1}s (best {:.1}s)",
        c.stage, c.evolution, hud.session.survival_time, hud.session.best_survival_time
    );
    for need in &c.active_needs {
        let value = c.needs.get(*need);
        let filled = (value / 10.0).round() as usize;
        println!(
            "  {:<8} [{}{}] {:>5.1}",
            format!("{:?}", need),
            "#".repeat(filled),
            ".".repeat(10 - filled.min(10)),
            value
        );
    }
    println!(
        "  feeds {} | mists {} | fireflies in jar {}",
        c.total_feeds, c.total_mists, hud.jar_count
    );
    println!();
}
