use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use boid_cli::{load_settings, run, Overrides};
use boid_core::Model;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless boid flocking runner", long_about = None)]
struct Args {
    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 100)]
    ticks: u64,

    /// JSON settings file; omitted fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a report every N ticks
    #[arg(short, long, default_value_t = 1)]
    every: u64,

    /// Number of boids
    #[arg(short, long)]
    population: Option<usize>,

    /// Space width
    #[arg(long)]
    width: Option<f64>,

    /// Space height
    #[arg(long)]
    height: Option<f64>,

    /// Seed for placement and activation order
    #[arg(short, long)]
    seed: Option<u64>,

    /// Bounded space instead of a torus; a boid leaving it stops the run
    #[arg(long)]
    no_torus: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let overrides = Overrides {
        population: args.population,
        width: args.width,
        height: args.height,
        seed: args.seed,
        no_torus: args.no_torus,
    };
    let settings = overrides.apply(load_settings(args.config.as_deref())?);
    log::debug!("Settings: {:?}", settings);

    let mut model = Model::new(settings).context("Failed to build model")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = run(&mut model, args.ticks, args.every, &mut out).context("Run error")?;

    log::info!(
        "Finished {} ticks (seed {}), {} reports, polarization {:.3}",
        summary.ticks,
        summary.seed,
        summary.reports,
        summary.polarization
    );

    Ok(())
}
