//! BhittiNav - Wall-following navigation controller
//!
//! Converts planar range scans into velocity commands that hold a target
//! standoff distance from a wall. The control core is synchronous and
//! deterministic: one tick in, one command out, every tick, regardless of
//! how irregularly sensor data arrives.
//!
//! # Pipeline
//!
//! Each control tick flows strictly downward:
//!
//! ```text
//! ScanFrame ─▶ ScanPreprocessor ─▶ WallEstimator ─▶ SafetyMonitor
//!                                                        │
//!            CommandSynthesizer ◀─ SteeringController ◀──┘
//!                    │
//!              VelocityCommand
//! ```
//!
//! - [`preprocess::ScanPreprocessor`] flags unusable readings
//! - [`estimator::WallEstimator`] triangulates wall distance and bearing
//!   from two angular beam sectors
//! - [`safety::SafetyMonitor`] decides between NORMAL, OBSTRUCTED,
//!   STALE_SENSOR, and LOST_WALL each tick
//! - [`steering::SteeringController`] is a PID on the composite
//!   distance/bearing error with anti-windup
//! - [`command::CommandSynthesizer`] applies the speed policy, the safety
//!   override, and the final envelope clamp
//! - [`follow::WallFollowLoop`] orchestrates the pipeline and the
//!   INIT → FOLLOWING ⇄ AVOIDING ⇄ SEARCHING → STOPPED machine
//!
//! # Runtime
//!
//! The binary wires the loop to a [`link::RobotLink`] (the built-in
//! corridor simulator by default) across two threads: a sensor thread
//! feeding the single-slot [`shared::ScanSlot`] exchange and delivering
//! commands, and a control thread ticking at a fixed rate.

pub mod command;
pub mod config;
pub mod error;
pub mod estimator;
pub mod follow;
pub mod link;
pub mod math;
pub mod preprocess;
pub mod safety;
pub mod scan;
pub mod shared;
pub mod sim;
pub mod steering;
pub mod threads;

pub use command::{CommandSynthesizer, SynthesizerConfig, VelocityCommand, VelocityEnvelope};
pub use config::BhittiConfig;
pub use error::{BhittiError, Result};
pub use estimator::{EstimatorConfig, WallEstimate, WallEstimator, WallSide};
pub use follow::{FollowMode, TickOutput, WallFollowConfig, WallFollowLoop};
pub use link::RobotLink;
pub use preprocess::{PreprocessConfig, ScanPreprocessor};
pub use safety::{SafetyConfig, SafetyMonitor, SafetyVerdict};
pub use scan::{RangeSample, ScanFrame};
pub use shared::{ScanSlot, SharedState};
pub use sim::{CorridorSim, SimConfig};
pub use steering::{ControllerState, SteeringConfig, SteeringController};
