//! Shared state between the sensor and control threads.
//!
//! Two primitives cross the thread boundary:
//!
//! - [`ScanSlot`]: a single-slot, latest-wins frame exchange. The sensor
//!   thread publishes every frame it receives; the control thread takes at
//!   most one per tick. An unprocessed frame is simply superseded by a
//!   newer one, so the queue cannot grow and no backpressure is needed.
//! - [`SharedState`]: atomics for the current velocity command, counters,
//!   mode, and the shutdown flag, plus the shutdown reason.
//!
//! No lock is ever held across the compute pipeline; the slot mutex only
//! guards the pointer swap.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::command::VelocityCommand;
use crate::follow::FollowMode;
use crate::scan::ScanFrame;

/// Atomic wrapper for f32 values, via bit reinterpretation.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(val: f32) -> Self {
        Self(AtomicU32::new(val.to_bits()))
    }

    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    pub fn store(&self, val: f32, order: Ordering) {
        self.0.store(val.to_bits(), order);
    }
}

/// Single-slot latest-wins scan exchange.
#[derive(Debug, Default)]
pub struct ScanSlot {
    slot: Mutex<Option<ScanFrame>>,
}

impl ScanSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a frame, superseding any unprocessed one.
    ///
    /// Returns true when an older frame was displaced.
    pub fn publish(&self, frame: ScanFrame) -> bool {
        self.slot.lock().replace(frame).is_some()
    }

    /// Take the pending frame, leaving the slot empty.
    pub fn take(&self) -> Option<ScanFrame> {
        self.slot.lock().take()
    }
}

/// Shared state between all threads.
#[derive(Debug)]
pub struct SharedState {
    /// Velocity command: linear (m/s)
    linear_vel: AtomicF32,

    /// Velocity command: angular (rad/s)
    angular_vel: AtomicF32,

    /// Current control loop mode
    mode: AtomicU8,

    /// Shutdown signal for graceful termination
    shutdown: AtomicBool,

    /// Reason for the shutdown, when one was given
    shutdown_reason: RwLock<Option<String>>,

    /// Frames published by the sensor thread
    pub scan_count: AtomicU32,

    /// Frames superseded before the control thread took them
    pub superseded_count: AtomicU32,

    /// Control ticks executed
    pub tick_count: AtomicU32,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            linear_vel: AtomicF32::new(0.0),
            angular_vel: AtomicF32::new(0.0),
            mode: AtomicU8::new(FollowMode::Init.as_u8()),
            shutdown: AtomicBool::new(false),
            shutdown_reason: RwLock::new(None),
            scan_count: AtomicU32::new(0),
            superseded_count: AtomicU32::new(0),
            tick_count: AtomicU32::new(0),
        }
    }

    /// Get the current velocity command (linear, angular).
    pub fn velocity(&self) -> VelocityCommand {
        VelocityCommand {
            linear: self.linear_vel.load(Ordering::Acquire),
            angular: self.angular_vel.load(Ordering::Acquire),
        }
    }

    /// Set the velocity command (called by the control thread).
    pub fn set_velocity(&self, cmd: VelocityCommand) {
        self.linear_vel.store(cmd.linear, Ordering::Release);
        self.angular_vel.store(cmd.angular, Ordering::Release);
    }

    pub fn mode(&self) -> FollowMode {
        FollowMode::from_u8(self.mode.load(Ordering::Acquire))
    }

    pub fn set_mode(&self, mode: FollowMode) {
        self.mode.store(mode.as_u8(), Ordering::Release);
    }

    /// Signal shutdown with a reason. The first reason wins.
    pub fn request_shutdown(&self, reason: impl Into<String>) {
        let mut guard = self.shutdown_reason.write();
        if guard.is_none() {
            *guard = Some(reason.into());
        }
        drop(guard);
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn shutdown_reason(&self) -> Option<String> {
        self.shutdown_reason.read().clone()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::RangeSample;
    use std::time::Instant;

    fn frame(tag: f32) -> ScanFrame {
        ScanFrame::new(vec![RangeSample::new(0.0, tag)], Instant::now())
    }

    #[test]
    fn test_slot_latest_wins() {
        let slot = ScanSlot::new();
        assert!(!slot.publish(frame(1.0)));
        // Second publish displaces the first
        assert!(slot.publish(frame(2.0)));

        let taken = slot.take().unwrap();
        assert_eq!(taken.samples[0].distance, 2.0);
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_slot_empty_after_take() {
        let slot = ScanSlot::new();
        slot.publish(frame(1.0));
        assert!(slot.take().is_some());
        assert!(!slot.publish(frame(2.0)));
    }

    #[test]
    fn test_velocity_round_trip() {
        let state = SharedState::new();
        state.set_velocity(VelocityCommand::new(0.2, -0.3));
        let v = state.velocity();
        assert_eq!(v.linear, 0.2);
        assert_eq!(v.angular, -0.3);
    }

    #[test]
    fn test_first_shutdown_reason_wins() {
        let state = SharedState::new();
        state.request_shutdown("first");
        state.request_shutdown("second");
        assert!(state.should_shutdown());
        assert_eq!(state.shutdown_reason().as_deref(), Some("first"));
    }

    #[test]
    fn test_mode_round_trip() {
        let state = SharedState::new();
        assert_eq!(state.mode(), FollowMode::Init);
        state.set_mode(FollowMode::Searching);
        assert_eq!(state.mode(), FollowMode::Searching);
    }
}
