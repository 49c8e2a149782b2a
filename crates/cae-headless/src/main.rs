//! Headless runner: loads a grid file, steps it, prints a summary and
//! verifies determinism by running it twice.
//!
//! Usage: `cae-headless <grid.cg> [ticks] [--config engine.toml] [--out result.cg]`
//! (`--help` for details).
//!
//! Log output is controlled by `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use cae_core::config::{ConfigError, EngineConfig};
use cae_core::grid::Grid;
use cae_core::persist::{LoadError, StoreError};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_TICKS: u64 = 100;

/// Errors that can stop the runner.
#[derive(Debug, thiserror::Error)]
enum HeadlessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("runs diverged: {first:#018x} != {second:#018x}")]
    Diverged { first: u64, second: u64 },
}

#[derive(Parser, Debug)]
#[command(
    name = "cae-headless",
    version,
    about = "Step a grid file and verify the run is deterministic"
)]
struct Args {
    /// Grid file (`.cg`) to load.
    grid: PathBuf,
    /// Generations to advance.
    #[arg(default_value_t = DEFAULT_TICKS)]
    ticks: u64,
    /// Engine configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the final state of the first run here.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn run_once(args: &Args, config: &EngineConfig) -> Result<Grid, HeadlessError> {
    let mut grid = Grid::from_file_with_config(&args.grid, config)?;
    for _ in 0..args.ticks {
        grid.update();
    }
    Ok(grid)
}

fn run(args: Args) -> Result<(), HeadlessError> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    let first = run_once(&args, &config)?;
    let second = run_once(&args, &config)?;
    let (hash1, hash2) = (first.state_hash(), second.state_hash());

    println!("{}", args.grid.display());
    println!(
        "    After {} ticks: {} cells, {} sub-grids, state hash = {hash1:#018x}",
        args.ticks,
        first.population(),
        first.linked_grids().len()
    );
    for info in first.linked_grids() {
        let generation = first.sub_grid(info.id).map_or(0, Grid::generation);
        println!(
            "      [{:>16}] speed={}, ports={}, generation={generation}",
            info.name,
            info.speed,
            info.ports.len()
        );
    }

    if hash1 != hash2 {
        return Err(HeadlessError::Diverged {
            first: hash1,
            second: hash2,
        });
    }
    println!("    Determinism: PASS (hashes match)");

    if let Some(out) = &args.out {
        first.store(out)?;
        info!(path = %out.display(), "final state written");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("cae-headless").chain(list.iter().copied()))
    }

    #[test]
    fn grid_path_is_required() {
        let err = args(&[]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn ticks_default_and_parse() {
        assert_eq!(args(&["a.cg"]).unwrap().ticks, DEFAULT_TICKS);
        assert_eq!(args(&["a.cg", "7"]).unwrap().ticks, 7);
        let err = args(&["a.cg", "seven"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn flags_in_any_position() {
        let parsed = args(&["--config", "e.toml", "a.cg", "--out", "b.cg", "3"]).unwrap();
        assert_eq!(parsed.grid, PathBuf::from("a.cg"));
        assert_eq!(parsed.ticks, 3);
        assert_eq!(parsed.config, Some(PathBuf::from("e.toml")));
        assert_eq!(parsed.out, Some(PathBuf::from("b.cg")));
    }

    #[test]
    fn dangling_flag_is_an_error() {
        assert!(args(&["a.cg", "--out"]).is_err());
        assert!(args(&["a.cg", "1", "2"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
