#![warn(non_snake_case)]
//! # RustDelve Command Line Entry Point
//!
//! Loads a room set, plans a dungeon with the backtracking generator and prints
//! the placed rooms as JSON, shaped like the generation tree.
//!
//! ## License
//! Licensed under the MIT License.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::info;

use rust_delve::{Generator, GeneratorConfig, RoomSet};

/// Jigsaw dungeon planner
#[derive(Parser, Debug)]
#[command(name = "rust_delve")]
#[command(author, version, about = "Plan a dungeon from a room set", long_about = None)]
struct Args {
    /// Room set JSON file
    room_set: PathBuf,

    /// Generator configuration JSON file
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Random seed, overrides the configuration
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Maximum tree depth, overrides the configuration
    #[arg(short = 'd', long = "max-depth")]
    max_depth: Option<usize>,

    /// Evaluate candidates on a single thread
    #[arg(long = "sequential")]
    sequential: bool,
}

fn load_config(args: &Args) -> Result<GeneratorConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_json_str(&fs::read_to_string(path)?)?,
        None => GeneratorConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if args.sequential {
        config.parallel_candidates = false;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging.
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    info!("RustDelve starting with seed {}...", config.seed);

    let room_set = Arc::new(RoomSet::from_path(&args.room_set)?);
    let mut generator = Generator::new(room_set, config);
    let placed = generator.generate()?;

    info!("{}", generator.stats());
    println!("{}", serde_json::to_string_pretty(&placed)?);
    Ok(())
}
