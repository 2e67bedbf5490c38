//! Two-thread architecture for BhittiNav.
//!
//! - Sensor thread: polls the robot link for scans, publishes them into
//!   the single-slot exchange, and delivers velocity commands back over
//!   the link at a fixed cadence.
//! - Control thread: runs the wall-follow loop at the configured tick
//!   rate, independent of sensor arrival.

mod control;
mod sensor;

pub use control::ControlThread;
pub use sensor::SensorThread;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::BhittiConfig;
use crate::error::Result;
use crate::link::RobotLink;
use crate::shared::{ScanSlot, SharedState};

/// Thread handles for the running system.
pub struct ThreadHandles {
    pub sensor: JoinHandle<()>,
    pub control: JoinHandle<()>,
}

/// Spawn the sensor and control threads.
pub fn spawn_threads(
    config: &BhittiConfig,
    shared_state: Arc<SharedState>,
    link: Box<dyn RobotLink>,
) -> Result<ThreadHandles> {
    let scan_slot = Arc::new(ScanSlot::new());

    let sensor_state = Arc::clone(&shared_state);
    let sensor_slot = Arc::clone(&scan_slot);
    let sensor_handle = thread::Builder::new()
        .name("sensor".into())
        .spawn(move || {
            let mut sensor_thread = SensorThread::new(sensor_state, sensor_slot, link);
            sensor_thread.run();
        })
        .expect("Failed to spawn sensor thread");

    let control_config = config.clone();
    let control_handle = thread::Builder::new()
        .name("control".into())
        .spawn(move || {
            let mut control_thread = ControlThread::new(&control_config, shared_state, scan_slot);
            control_thread.run();
        })
        .expect("Failed to spawn control thread");

    Ok(ThreadHandles {
        sensor: sensor_handle,
        control: control_handle,
    })
}
