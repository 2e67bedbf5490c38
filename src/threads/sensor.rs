//! Sensor thread: scan ingestion and command delivery.
//!
//! Polls the robot link for new frames and publishes them into the
//! single-slot exchange; an unprocessed frame is superseded, never
//! queued. Velocity commands flow the other way at a fixed cadence,
//! whatever the scan rate does.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::link::RobotLink;
use crate::shared::{ScanSlot, SharedState};

const COMMAND_INTERVAL: Duration = Duration::from_millis(50); // 20Hz command rate
const POLL_SLEEP: Duration = Duration::from_millis(5);

/// Sensor thread state and logic.
pub struct SensorThread {
    shared_state: Arc<SharedState>,
    scan_slot: Arc<ScanSlot>,
    link: Box<dyn RobotLink>,
}

impl SensorThread {
    pub fn new(
        shared_state: Arc<SharedState>,
        scan_slot: Arc<ScanSlot>,
        link: Box<dyn RobotLink>,
    ) -> Self {
        Self {
            shared_state,
            scan_slot,
            link,
        }
    }

    /// Run the sensor loop until shutdown or a link failure.
    pub fn run(&mut self) {
        tracing::info!("Sensor thread started");
        let mut last_command_time = Instant::now();

        loop {
            if self.shared_state.should_shutdown() {
                if let Err(e) = self.link.send_stop() {
                    tracing::error!("Failed to send stop command: {}", e);
                }
                tracing::info!("Sensor thread shutting down");
                break;
            }

            match self.link.recv_scan() {
                Ok(Some(frame)) => {
                    self.shared_state.scan_count.fetch_add(1, Ordering::Relaxed);
                    if self.scan_slot.publish(frame) {
                        // Control thread was slower than the sensor; the
                        // older frame is intentionally dropped.
                        self.shared_state
                            .superseded_count
                            .fetch_add(1, Ordering::Relaxed);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Scan receive error: {}", e);
                    self.shared_state
                        .request_shutdown(format!("robot link receive failed: {}", e));
                    let _ = self.link.send_stop();
                    break;
                }
            }

            if last_command_time.elapsed() >= COMMAND_INTERVAL {
                let cmd = self.shared_state.velocity();
                if let Err(e) = self.link.send_velocity(cmd) {
                    tracing::error!("Failed to send velocity command: {}", e);
                    self.shared_state
                        .request_shutdown(format!("robot link send failed: {}", e));
                    break;
                }
                last_command_time = Instant::now();
            }

            std::thread::sleep(POLL_SLEEP);
        }
    }
}
