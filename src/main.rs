// Copyright (C) 2025 The delaney-search authors. See LICENSE for details.

//! Command-line driver for the enumeration searches.
//!
//! Seed symbols are given in the linear notation, either literally or
//! as `@path` to read one symbol per line (blank lines and `#` comments
//! skipped). Results go to stdout, one symbol per line; progress and
//! statistics go through `tracing` on stderr.

use std::fs;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use delaney_search::dsym::properties::Rational;
use delaney_search::search::{
    BranchingOptions, CombineOptions, CombineTiles, DefineBranching, SessionToken, TileSearch,
    TileSearchOptions,
};
use delaney_search::{CheckpointToken, DSymbol, Error};

#[derive(Parser)]
#[command(name = "delaney", about = "Enumerate Delaney-Dress symbols", version)]
struct Cli {
    /// Verbose engine traces (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct CheckpointArgs {
    /// Resume from a previously reported checkpoint token.
    #[arg(long)]
    resume: Option<String>,

    /// Stop just before the given checkpoint token.
    #[arg(long)]
    stop_before: Option<String>,

    /// Report a checkpoint token every N results (0 = never).
    #[arg(long, default_value_t = 0)]
    checkpoint_interval: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Define the next neighbor operation on a collection of tiles in
    /// every admissible way.
    Extend {
        /// Seed symbol, or @file with one symbol per line.
        symbol: String,

        /// Upper bound on (d-1,d)-chain lengths.
        #[arg(long)]
        edge_degree_limit: Option<usize>,

        #[command(flatten)]
        checkpoints: CheckpointArgs,
    },

    /// Complete the missing branching numbers of a symbol.
    Branch {
        /// Seed symbol, or @file with one symbol per line.
        symbol: String,

        /// Lower bound on the top-pair degrees m = v*r.
        #[arg(long, default_value_t = 3)]
        min_degree: usize,

        /// Lower curvature bound for 2-dimensional symbols, e.g. "0"
        /// or "-1/6".
        #[arg(long, default_value = "0")]
        min_curvature: String,

        /// Comma-separated candidate branching values.
        #[arg(long)]
        candidates: Option<String>,

        #[command(flatten)]
        checkpoints: CheckpointArgs,
    },

    /// Run the full pipeline: extend k copies of a tile, then branch.
    Tilings {
        /// The tile symbol, or @file with one symbol per line.
        tile: String,

        /// Number of tile copies in the final tilings.
        #[arg(short, default_value_t = 1)]
        k: usize,

        /// Lower bound on edge degrees m = v*r.
        #[arg(long, default_value_t = 3)]
        min_degree: usize,

        /// Resume from a previously reported session token.
        #[arg(long)]
        resume: Option<String>,

        /// Stop just before the given session token.
        #[arg(long)]
        stop_before: Option<String>,

        /// Report a session token every N results (0 = never).
        #[arg(long, default_value_t = 0)]
        checkpoint_interval: u64,
    },
}

fn main() {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run(cli.command) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Extend {
            symbol,
            edge_degree_limit,
            checkpoints,
        } => {
            for seed in read_symbols(&symbol)? {
                let options = CombineOptions { edge_degree_limit };
                let mut search = CombineTiles::new(&seed, options)?;
                configure(&mut search, &checkpoints)?;
                let count = drive(&mut search, checkpoints.checkpoint_interval);
                let stats = *search.stats();
                info!(
                    seed = %seed,
                    decisions = stats.decisions,
                    rejected = stats.rejected,
                    "produced {count} extended symbols"
                );
            }
        }
        Command::Branch {
            symbol,
            min_degree,
            min_curvature,
            candidates,
            checkpoints,
        } => {
            let min_curvature = Rational::from_str(&min_curvature)
                .map_err(|_| Error::Parse(format!("bad curvature bound {min_curvature:?}")))?;
            let candidates = match candidates {
                Some(list) => list
                    .split(',')
                    .map(|word| {
                        word.trim()
                            .parse()
                            .map_err(|_| Error::Parse(format!("bad candidate {word:?}")))
                    })
                    .collect::<Result<Vec<u16>, Error>>()?,
                None => BranchingOptions::default().candidates,
            };
            for seed in read_symbols(&symbol)? {
                let options = BranchingOptions {
                    min_degree,
                    min_curvature,
                    candidates: candidates.clone(),
                };
                let mut search = DefineBranching::new(&seed, options)?;
                configure(&mut search, &checkpoints)?;
                let count = drive(&mut search, checkpoints.checkpoint_interval);
                let stats = *search.stats();
                info!(
                    seed = %seed,
                    decisions = stats.decisions,
                    rejected = stats.rejected,
                    "produced {count} branched symbols"
                );
            }
        }
        Command::Tilings {
            tile,
            k,
            min_degree,
            resume,
            stop_before,
            checkpoint_interval,
        } => {
            for seed in read_symbols(&tile)? {
                let options = TileSearchOptions {
                    copies: k,
                    branching: BranchingOptions {
                        min_degree,
                        ..BranchingOptions::default()
                    },
                    ..TileSearchOptions::default()
                };
                let mut session = TileSearch::new(&seed, options)?;
                if let Some(token) = &resume {
                    session.resume(&token.parse::<SessionToken>()?)?;
                }
                if let Some(token) = &stop_before {
                    session.stop_before(token.parse::<SessionToken>()?);
                }
                let mut count = 0u64;
                while let Some(result) = session.next() {
                    count += 1;
                    println!("{}", result.symbol);
                    if checkpoint_interval > 0 && count % checkpoint_interval == 0 {
                        info!(token = %session.checkpoint(), "checkpoint");
                    }
                }
                info!(tile = %seed, summary = %session.stats().summary(), "done");
            }
        }
    }
    Ok(())
}

fn configure<S>(
    search: &mut delaney_search::BranchAndCut<S>,
    checkpoints: &CheckpointArgs,
) -> Result<(), Error>
where
    S: delaney_search::SearchSpec<Output = DSymbol>,
{
    if let Some(token) = &checkpoints.resume {
        let _ = search.resume(&token.parse::<CheckpointToken>()?)?;
    }
    if let Some(token) = &checkpoints.stop_before {
        search.stop_before(token.parse::<CheckpointToken>()?);
    }
    Ok(())
}

fn drive<S>(search: &mut delaney_search::BranchAndCut<S>, interval: u64) -> u64
where
    S: delaney_search::SearchSpec<Output = DSymbol>,
{
    let mut count = 0u64;
    while let Some(symbol) = search.next() {
        count += 1;
        println!("{symbol}");
        if interval > 0 && count % interval == 0 {
            info!(token = %search.checkpoint(), "checkpoint");
        }
    }
    count
}

/// A literal symbol, or `@path` with one symbol per line.
fn read_symbols(arg: &str) -> Result<Vec<DSymbol>, Error> {
    if let Some(path) = arg.strip_prefix('@') {
        let text = fs::read_to_string(path)
            .map_err(|error| Error::Parse(format!("cannot read {path}: {error}")))?;
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(DSymbol::parse)
            .collect()
    } else {
        Ok(vec![DSymbol::parse(arg)?])
    }
}
