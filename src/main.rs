//! BhittiNav - Wall-following navigation controller
//!
//! Runs the wall-follow control stack against the built-in corridor
//! simulator: loads configuration, spawns the sensor and control threads,
//! monitors progress, and shuts down cleanly. Point the `[sim]` section of
//! `bhitti.toml` at the scenario you want to exercise.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info, warn};

use bhitti_nav::config::BhittiConfig;
use bhitti_nav::error::{BhittiError, Result};
use bhitti_nav::estimator::WallSide;
use bhitti_nav::shared::SharedState;
use bhitti_nav::sim::CorridorSim;
use bhitti_nav::threads::spawn_threads;

#[derive(Parser, Debug)]
#[command(name = "bhitti-nav", version, about = "Wall-following controller (simulated run)")]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "bhitti.toml")]
    config: PathBuf,

    /// Override the followed wall side (left | right)
    #[arg(long)]
    side: Option<String>,

    /// Run duration in seconds (0 = run until stopped)
    #[arg(long, default_value_t = 30.0)]
    duration: f32,

    /// Override the simulator RNG seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bhitti_nav=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    let mut config = if args.config.exists() {
        info!("Loading configuration from {:?}", args.config);
        BhittiConfig::load(&args.config)?
    } else {
        info!("Using default configuration");
        BhittiConfig::default()
    };

    if let Some(side) = &args.side {
        config.wall.side = match side.to_lowercase().as_str() {
            "left" => WallSide::Left,
            "right" => WallSide::Right,
            other => {
                return Err(BhittiError::Config(format!(
                    "unknown wall side '{}', expected left or right",
                    other
                )));
            }
        };
    }
    if let Some(seed) = args.seed {
        config.sim.seed = seed;
    }
    config.validate()?;

    info!("BhittiNav v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Following {:?} wall at {:.2}m standoff, {:.0}Hz control",
        config.wall.side, config.wall.target_distance, config.control.rate_hz
    );

    let shared_state = Arc::new(SharedState::new());
    let link = Box::new(CorridorSim::new(config.sim_config()));

    let handles = spawn_threads(&config, Arc::clone(&shared_state), link)?;

    // Main thread: monitor and wait for completion
    let check_interval = Duration::from_millis(500);
    let started = Instant::now();

    loop {
        std::thread::sleep(check_interval);

        if shared_state.should_shutdown() {
            break;
        }

        if args.duration > 0.0 && started.elapsed().as_secs_f32() >= args.duration {
            info!("Run duration reached");
            shared_state.request_shutdown("run duration reached");
            break;
        }

        if handles.sensor.is_finished() || handles.control.is_finished() {
            warn!("A worker thread exited unexpectedly");
            shared_state.request_shutdown("worker thread exited");
            break;
        }

        let cmd = shared_state.velocity();
        info!(
            "mode {:?}: cmd ({:+.3} m/s, {:+.3} rad/s), {} scans, {} ticks",
            shared_state.mode(),
            cmd.linear,
            cmd.angular,
            shared_state.scan_count.load(Ordering::Relaxed),
            shared_state.tick_count.load(Ordering::Relaxed),
        );
    }

    shared_state.request_shutdown("main exiting");

    if let Err(e) = handles.control.join() {
        error!("Control thread panicked: {:?}", e);
    }
    if let Err(e) = handles.sensor.join() {
        error!("Sensor thread panicked: {:?}", e);
    }

    info!(
        "Finished in mode {:?} after {} ticks ({} scans, {} superseded): {}",
        shared_state.mode(),
        shared_state.tick_count.load(Ordering::Relaxed),
        shared_state.scan_count.load(Ordering::Relaxed),
        shared_state.superseded_count.load(Ordering::Relaxed),
        shared_state
            .shutdown_reason()
            .unwrap_or_else(|| "unknown".to_string()),
    );

    Ok(())
}
