use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::backend::HeadlessBackend;
use crate::config::ArenaConfig;
use crate::pose::PoseStore;
use crate::render_loop::RenderLoop;
use crate::rig::DisplayRig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the arena render loop against the headless backend
    Run {
        /// Experiment configuration file (JSON)
        #[arg(long)]
        config: PathBuf,

        /// How long to run, in seconds
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
    },
    /// Validate a configuration file and report the resolved sequence
    Check {
        /// Experiment configuration file (JSON)
        #[arg(long)]
        config: PathBuf,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, duration } => run_arena(&config, duration),
        Commands::Check { config } => check_config(&config),
    }
}

fn run_arena(config_path: &std::path::Path, duration: f64) -> Result<()> {
    let config = ArenaConfig::from_path(config_path)?;
    let rig = DisplayRig::three_panel(&config.display);
    let poses = PoseStore::new();

    let backend = HeadlessBackend::new();
    let stats = backend.stats();

    log::info!(
        "starting render loop: {} displays, {:.1} Hz target",
        rig.len(),
        config.timing.target_fps
    );

    // start() blocks until the render thread's one-time setup completes.
    let handle = RenderLoop::start(config, rig, poses.clone(), backend)?;
    log::info!("render loop ready");

    // The control thread owns pose input; an external acquisition source
    // would write through `poses` clones while we wait here.
    std::thread::sleep(Duration::from_secs_f64(duration));

    let ticks = handle.ticks();
    let slow = handle.slow_frames();
    handle.stop();

    println!(
        "rendered {} frame(s) over {:.1} s ({} slow, {} tick(s))",
        stats.frames_rendered(),
        duration,
        slow,
        ticks
    );
    Ok(())
}

fn check_config(config_path: &std::path::Path) -> Result<()> {
    let config = ArenaConfig::from_path(config_path)?;

    println!("configuration OK");
    println!(
        "  displays: 3 x {:.2} m x {:.2} m ({}x{} px{})",
        config.display.width_m,
        config.display.height_m,
        config.display.width_px,
        config.display.height_px,
        if config.display.fullscreen {
            ", fullscreen"
        } else {
            ""
        }
    );
    println!("  target rate: {:.1} Hz", config.timing.target_fps);
    println!(
        "  interleave: {:.2} s, seed {}",
        config.sequence.interleave_duration, config.sequence.random_seed
    );
    println!("  sequence ({}):", config.sequence.stimulus_order.len());
    for name in &config.sequence.stimulus_order {
        println!("    {name}");
    }
    Ok(())
}
