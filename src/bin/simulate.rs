use std::io::Write;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vibe_chess::engine::{AiConfig, Difficulty};
use vibe_chess::game::GameState;
use vibe_chess::piece::Color;

/// Pit every pair of difficulties against each other and tally results.
#[derive(Parser, Debug)]
#[command(name = "simulate")]
struct Args {
    /// Games per pairing, split evenly between colours
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Plies before an unfinished game is scored as a draw
    #[arg(long, default_value_t = 300)]
    max_plies: usize,

    /// Optional JSON file with `AiConfig` weights shared by every player
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Debug, Default)]
struct MatchResult {
    a_wins: u32,
    b_wins: u32,
    draws: u32,
}

enum Outcome {
    White,
    Black,
    Draw,
}

fn play_game(white: &AiConfig, black: &AiConfig, max_plies: usize, rng: &mut StdRng) -> Outcome {
    let mut game = GameState::new();
    while game.history().len() < max_plies {
        let config = match game.side_to_move() {
            Color::White => white,
            Color::Black => black,
        };
        if game.computer_move_with_rng(config, rng).is_none() {
            break;
        }
        // Nothing observes these here.
        game.take_events();
    }

    match game.result().and_then(|r| r.winner()) {
        Some(Color::White) => Outcome::White,
        Some(Color::Black) => Outcome::Black,
        // Draws and games that hit the ply limit
        None => Outcome::Draw,
    }
}

fn run_matchup(
    a: &AiConfig,
    b: &AiConfig,
    games: usize,
    max_plies: usize,
    rng: &mut StdRng,
) -> MatchResult {
    let mut result = MatchResult::default();
    let half = games / 2;

    // A as white, B as black
    for _ in 0..half {
        match play_game(a, b, max_plies, rng) {
            Outcome::White => result.a_wins += 1,
            Outcome::Black => result.b_wins += 1,
            Outcome::Draw => result.draws += 1,
        }
    }
    // B as white, A as black
    for _ in 0..games - half {
        match play_game(b, a, max_plies, rng) {
            Outcome::White => result.b_wins += 1,
            Outcome::Black => result.a_wins += 1,
            Outcome::Draw => result.draws += 1,
        }
    }
    result
}

fn load_base_config(args: &Args) -> Result<AiConfig, Box<dyn std::error::Error>> {
    match &args.config {
        Some(path) => Ok(AiConfig::from_json(&std::fs::read_to_string(path)?)?),
        None => Ok(AiConfig::default()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let base = match load_base_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Could not load config: {err}");
            std::process::exit(1);
        }
    };
    let with_difficulty = |difficulty| AiConfig { difficulty, ..base.clone() };
    let mut rng = StdRng::seed_from_u64(args.seed);

    println!("--- Difficulty matchups ({} games each) ---\n", args.games);
    for (i, &a) in Difficulty::ALL.iter().enumerate() {
        for &b in &Difficulty::ALL[i + 1..] {
            print!("  {a} vs {b}... ");
            std::io::stdout().flush().ok();

            let result = run_matchup(
                &with_difficulty(a),
                &with_difficulty(b),
                args.games,
                args.max_plies,
                &mut rng,
            );
            info!(%a, %b, ?result, "matchup finished");
            println!(
                "{a} wins {}, {b} wins {}, draws {}",
                result.a_wins, result.b_wins, result.draws
            );
        }
    }
}
