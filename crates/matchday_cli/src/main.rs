//! Headless match runner.
//!
//! Simulates a full match on the terminal: rosters from JSON files or a
//! built-in demo pair, event log as it happens, final report at the
//! whistle.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use matchday_core::{
    EventType, Formation, MatchConfig, MatchController, Player, PlayerAttributes, Role,
    TacticalConfig, Team,
};

#[derive(Parser)]
#[command(name = "matchday")]
#[command(about = "Run a headless football match simulation", long_about = None)]
struct Cli {
    /// Simulation seed; the same seed replays the same match
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Game speed multiplier (0.1..=4.0)
    #[arg(long, default_value = "4.0")]
    speed: f32,

    /// Continue a regulation draw into extra time
    #[arg(long, default_value = "false")]
    extra_time: bool,

    /// Home roster JSON file (defaults to a built-in demo team)
    #[arg(long)]
    home: Option<PathBuf>,

    /// Away roster JSON file (defaults to a built-in demo team)
    #[arg(long)]
    away: Option<PathBuf>,

    /// Print the final snapshot as JSON instead of a text report
    #[arg(long, default_value = "false")]
    json: bool,
}

fn load_team(path: Option<&PathBuf>, fallback: fn() -> Team) -> Result<Team> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading roster {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing roster {}", path.display()))
        }
        None => Ok(fallback()),
    }
}

fn demo_player(name: &str, number: u8, role: Role, rating: u8) -> Player {
    Player::new(name, number, role).with_attributes(PlayerAttributes::from_uniform(rating))
}

fn demo_home() -> Team {
    Team {
        name: "Riverton FC".into(),
        formation: Formation::F433,
        tactics: TacticalConfig::default(),
        players: vec![
            demo_player("Okafor", 1, Role::GK, 68),
            demo_player("Brandt", 2, Role::DEF, 66),
            demo_player("Silva", 4, Role::DEF, 70),
            demo_player("Kamara", 5, Role::DEF, 67),
            demo_player("Petrov", 3, Role::DEF, 64),
            demo_player("Lindqvist", 6, Role::MID, 69),
            demo_player("Moreau", 8, Role::MID, 72),
            demo_player("Tanaka", 10, Role::MID, 74),
            demo_player("Diallo", 7, Role::FWD, 73),
            demo_player("Castillo", 9, Role::FWD, 75),
            demo_player("Novak", 11, Role::FWD, 70),
        ],
        bench: vec![
            demo_player("Weiss", 13, Role::GK, 60),
            demo_player("Ade", 14, Role::DEF, 62),
            demo_player("Ricci", 15, Role::MID, 64),
            demo_player("Sorensen", 16, Role::FWD, 65),
        ],
    }
}

fn demo_away() -> Team {
    Team {
        name: "Harbor Athletic".into(),
        formation: Formation::F442,
        tactics: TacticalConfig {
            style: matchday_core::models::PlayStyle::Counter,
            defensive_style: matchday_core::models::DefensiveStyle::LowBlock,
            ..Default::default()
        },
        players: vec![
            demo_player("Mbeki", 1, Role::GK, 70),
            demo_player("Ivanov", 2, Role::DEF, 68),
            demo_player("Larsen", 4, Role::DEF, 69),
            demo_player("Costa", 5, Role::DEF, 67),
            demo_player("Yilmaz", 3, Role::DEF, 65),
            demo_player("Kovacs", 6, Role::MID, 66),
            demo_player("O'Brien", 8, Role::MID, 68),
            demo_player("Fernandez", 10, Role::MID, 71),
            demo_player("Schmidt", 7, Role::MID, 64),
            demo_player("Traore", 9, Role::FWD, 74),
            demo_player("Jensen", 11, Role::FWD, 69),
        ],
        bench: vec![
            demo_player("Park", 13, Role::GK, 61),
            demo_player("Dubois", 14, Role::DEF, 63),
            demo_player("Nwosu", 15, Role::MID, 62),
            demo_player("Rossi", 16, Role::FWD, 66),
        ],
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let home = load_team(cli.home.as_ref(), demo_home)?;
    let away = load_team(cli.away.as_ref(), demo_away)?;

    let config = MatchConfig { seed: cli.seed, game_speed: cli.speed, extra_time: cli.extra_time };
    let mut controller = MatchController::new(config);
    controller
        .initialize(home, away)
        .context("roster validation failed")?;
    controller.start().context("match failed to start")?;

    // 30 Hz host timer, printed live.
    let mut printed = 0usize;
    let mut ticks = 0u64;
    while !controller.is_finished() {
        controller.advance(1.0 / 30.0);
        ticks += 1;
        if ticks > 5_000_000 {
            bail!("simulation failed to reach full time");
        }

        if let Some(snapshot) = controller.snapshot() {
            for event in &snapshot.events[printed..] {
                if is_headline(event.event_type) {
                    println!("{:>3}' {}", event.minute, event.message);
                }
            }
            printed = snapshot.events.len();
        }
    }

    let snapshot = controller.snapshot().context("no final snapshot")?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!();
    println!(
        "FT  {} {} - {} {}",
        snapshot.home.name, snapshot.home.score, snapshot.away.score, snapshot.away.name
    );
    println!(
        "    possession {}% - {}%",
        snapshot.home.possession_percent, snapshot.away.possession_percent
    );
    println!(
        "    shots {} ({} on target) - {} ({} on target)",
        snapshot.home.stats.shots,
        snapshot.home.stats.shots_on_target,
        snapshot.away.stats.shots,
        snapshot.away.stats.shots_on_target
    );
    println!(
        "    fouls {} - {}, corners {} - {}, offsides {} - {}",
        snapshot.home.stats.fouls,
        snapshot.away.stats.fouls,
        snapshot.home.stats.corners,
        snapshot.away.stats.corners,
        snapshot.home.stats.offsides,
        snapshot.away.stats.offsides
    );
    println!(
        "    cards {}Y {}R - {}Y {}R",
        snapshot.home.stats.yellow_cards,
        snapshot.home.stats.red_cards,
        snapshot.away.stats.yellow_cards,
        snapshot.away.stats.red_cards
    );
    Ok(())
}

fn is_headline(event_type: EventType) -> bool {
    matches!(
        event_type,
        EventType::KickOff
            | EventType::Goal
            | EventType::Penalty
            | EventType::YellowCard
            | EventType::RedCard
            | EventType::Substitution
            | EventType::Injury
            | EventType::HalfTime
            | EventType::FullTime
    )
}
