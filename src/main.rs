mod config;
mod core;
mod render;
mod types;
mod ui;

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use log::{info, warn, LevelFilter};
use simplelog::{Config as LogConfig, WriteLogger};

use crate::config::SimConfig;

/// Bodies spawning around a heavy star and falling into orbit, drawn in the terminal.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// JSON file with simulation settings; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target simulation steps per second.
    #[arg(long)]
    fps: Option<f32>,

    /// Maximum number of bodies, central body included.
    #[arg(long)]
    max_bodies: Option<usize>,

    /// Seed for reproducible spawns.
    #[arg(long)]
    seed: Option<u64>,

    /// World units per pixel.
    #[arg(long)]
    scale: Option<f32>,

    /// Start with trails instead of clearing every frame.
    #[arg(long)]
    no_clear: bool,

    /// Write logs to this file. The terminal itself is the drawing surface.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn sim_config(&self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        if let Some(fps) = self.fps {
            config.fps = fps;
        }
        if let Some(max_bodies) = self.max_bodies {
            config.max_bodies = max_bodies;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if self.no_clear {
            config.clear_each_frame = false;
        }
        if let Err(err) = config.validate() {
            warn!("rejected config: {err}");
            return Err(err.into());
        }
        Ok(config)
    }
}

fn init_logging(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    WriteLogger::init(LevelFilter::Debug, LogConfig::default(), file)
        .context("installing logger")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let sim_config = args.sim_config()?;
    info!("starting with {:?}", sim_config);
    ui::run(&sim_config)
}
