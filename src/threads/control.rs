//! Control thread: fixed-rate wall-follow ticks.
//!
//! Runs the control loop at the configured rate regardless of how scans
//! arrive. Each tick takes at most one frame from the exchange, runs the
//! pipeline, and publishes the resulting command through shared state for
//! the sensor thread to deliver.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::command::VelocityCommand;
use crate::config::BhittiConfig;
use crate::follow::{FollowMode, WallFollowLoop};
use crate::shared::{ScanSlot, SharedState};

/// Control thread state and logic.
pub struct ControlThread {
    shared_state: Arc<SharedState>,
    scan_slot: Arc<ScanSlot>,
    follow: WallFollowLoop,
    period: std::time::Duration,
}

impl ControlThread {
    pub fn new(
        config: &BhittiConfig,
        shared_state: Arc<SharedState>,
        scan_slot: Arc<ScanSlot>,
    ) -> Self {
        Self {
            shared_state,
            scan_slot,
            follow: WallFollowLoop::new(config.follow_config()),
            period: config.control_period(),
        }
    }

    /// Run the control loop until shutdown or the terminal mode.
    pub fn run(&mut self) {
        tracing::info!(
            "Control thread started ({:.0} Hz)",
            1.0 / self.period.as_secs_f32()
        );

        let mut next_tick = Instant::now();

        loop {
            if self.shared_state.should_shutdown() {
                tracing::info!("Control thread shutting down");
                break;
            }

            let now = Instant::now();
            let scan = self.scan_slot.take();
            let output = self.follow.tick(scan, now);

            self.shared_state.set_velocity(output.command);
            self.shared_state.set_mode(output.mode);
            self.shared_state.tick_count.fetch_add(1, Ordering::Relaxed);

            if output.mode == FollowMode::Stopped {
                tracing::warn!("Control loop reached terminal mode");
                self.shared_state
                    .request_shutdown("sensor stale beyond hard limit");
                break;
            }

            next_tick += self.period;
            let after = Instant::now();
            if next_tick > after {
                std::thread::sleep(next_tick - after);
            } else {
                // Fell behind; realign instead of bursting ticks
                next_tick = after;
            }
        }

        // Whatever ended the loop, leave a stop command behind
        self.shared_state.set_velocity(VelocityCommand::stop());
    }
}
