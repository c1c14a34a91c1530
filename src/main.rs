//! Morris-Rust: Nine Men's Morris from the command line.
//!
//! ## Usage
//!
//! - `morris-rust` - Play a random demo match
//! - `morris-rust play` - Drive a match through the text protocol on stdin
//! - `morris-rust demo --seed 42` - Reproducible random match

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use morris_rust::game::Match;
use morris_rust::persist::load_from_file;
use morris_rust::playout::{MAX_TURNS, random_game};
use morris_rust::protocol::TextEngine;

/// Morris-Rust: a Nine Men's Morris rule engine
#[derive(Parser)]
#[command(name = "morris-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match using text commands on stdin (type `help`)
    Play {
        /// Name of the Light player, who moves first
        #[arg(long, default_value = "Player 1")]
        light: String,
        /// Name of the Dark player
        #[arg(long, default_value = "Player 2")]
        dark: String,
        /// Resume a match saved with the `save` command
        #[arg(long)]
        load: Option<PathBuf>,
    },
    /// Let two random players fight it out
    Demo {
        /// Random seed (random if omitted)
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many turns
        #[arg(long, default_value_t = MAX_TURNS)]
        max_turns: usize,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Play { light, dark, load }) => {
            let game = match load {
                Some(path) => load_from_file(&path)?,
                None => Match::with_names(light, dark),
            };
            let mut engine = TextEngine::with_match(game);
            let stdin = io::stdin();
            engine
                .run(stdin.lock(), io::stdout())
                .context("text protocol I/O failed")?;
        }
        Some(Commands::Demo { seed, max_turns }) => run_demo(seed, max_turns)?,
        None => run_demo(None, MAX_TURNS)?,
    }
    Ok(())
}

fn run_demo(seed: Option<u64>, max_turns: usize) -> Result<()> {
    let seed = seed.unwrap_or_else(|| fastrand::u64(..));
    println!("Morris-Rust: random match (seed {seed})\n");

    let mut game = Match::with_names("Random 1", "Random 2");
    let mut rng = fastrand::Rng::with_seed(seed);
    let result = random_game(&mut game, &mut rng, max_turns)?;

    println!("{}", game.board().render_with_reference());
    println!("Turns: {}, captures: {}", result.turns, result.captures);
    match result.winner {
        Some(color) => println!("{} ({color}) wins", game.player(color).name()),
        None => println!("No winner after {max_turns} turns"),
    }
    Ok(())
}
