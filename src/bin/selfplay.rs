use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vibe_chess::engine::{AiConfig, Difficulty};
use vibe_chess::game::GameState;
use vibe_chess::notation;
use vibe_chess::piece::Color;

/// Play one computer-vs-computer game and print the move list.
#[derive(Parser, Debug)]
#[command(name = "selfplay")]
struct Args {
    /// Difficulty for White (easy, medium, hard)
    #[arg(long, default_value_t = Difficulty::Medium)]
    white: Difficulty,

    /// Difficulty for Black
    #[arg(long, default_value_t = Difficulty::Medium)]
    black: Difficulty,

    /// Stop after this many plies if nothing else ends the game
    #[arg(long, default_value_t = 300)]
    max_plies: usize,

    /// Seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let white = AiConfig::new(args.white);
    let black = AiConfig::new(args.black);
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut game = GameState::new();
    while game.history().len() < args.max_plies {
        let config = match game.side_to_move() {
            Color::White => &white,
            Color::Black => &black,
        };
        if game.computer_move_with_rng(config, &mut rng).is_none() {
            break;
        }
        for event in game.take_events() {
            debug!(?event, "game event");
        }
    }

    println!("{}", notation::move_list(game.history()));
    match game.result() {
        Some(result) => println!("{result} after {} plies", game.history().len()),
        None => println!("Unfinished after {} plies", game.history().len()),
    }
}
