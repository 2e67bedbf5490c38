//! Wall-follow control loop.
//!
//! Runs the full pipeline once per control tick:
//!
//! ```text
//! preprocess → estimate → safety check → steer → synthesize → emit
//! ```
//!
//! and drives the mode machine INIT → FOLLOWING ⇄ AVOIDING ⇄ SEARCHING →
//! STOPPED. Transitions are driven purely by the safety verdict; STOPPED is
//! terminal and entered only when staleness outlives the hard limit (or the
//! surrounding threads shut the loop down). Exactly one command is emitted
//! per tick.
//!
//! Cross-tick state is deliberately small: the controller state (reset on
//! every non-NORMAL tick), the safety monitor's hysteresis counter, and the
//! last cleaned frame retained for staleness tracking and re-estimation
//! between sensor arrivals.

use std::time::{Duration, Instant};

use crate::command::{CommandSynthesizer, SynthesizerConfig, VelocityCommand};
use crate::estimator::{EstimatorConfig, WallEstimate, WallEstimator};
use crate::preprocess::{PreprocessConfig, ScanPreprocessor};
use crate::safety::{SafetyConfig, SafetyMonitor, SafetyVerdict};
use crate::scan::ScanFrame;
use crate::steering::{ControllerState, SteeringConfig, SteeringController};

/// Control loop mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowMode {
    /// No sensor data processed yet.
    Init,
    /// Tracking the wall normally.
    Following,
    /// Turning away from a forward obstruction.
    Avoiding,
    /// Crawling with a turn bias to reacquire a lost wall.
    Searching,
    /// Terminal: staleness exceeded the hard limit or shutdown.
    Stopped,
}

impl FollowMode {
    pub fn as_u8(self) -> u8 {
        match self {
            FollowMode::Init => 0,
            FollowMode::Following => 1,
            FollowMode::Avoiding => 2,
            FollowMode::Searching => 3,
            FollowMode::Stopped => 4,
        }
    }

    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => FollowMode::Following,
            2 => FollowMode::Avoiding,
            3 => FollowMode::Searching,
            4 => FollowMode::Stopped,
            _ => FollowMode::Init,
        }
    }
}

/// Assembled configuration for the whole control loop.
#[derive(Debug, Clone)]
pub struct WallFollowConfig {
    pub preprocess: PreprocessConfig,
    pub estimator: EstimatorConfig,
    pub safety: SafetyConfig,
    pub steering: SteeringConfig,
    pub synthesizer: SynthesizerConfig,

    /// Staleness beyond this duration terminates the loop (STOPPED).
    pub stale_hard_limit: Duration,
}

impl Default for WallFollowConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            estimator: EstimatorConfig::default(),
            safety: SafetyConfig::default(),
            steering: SteeringConfig::default(),
            synthesizer: SynthesizerConfig::default(),
            stale_hard_limit: Duration::from_secs(5),
        }
    }
}

/// Result of one control tick.
#[derive(Debug, Clone, Copy)]
pub struct TickOutput {
    pub command: VelocityCommand,
    pub verdict: SafetyVerdict,
    pub mode: FollowMode,
    pub estimate: WallEstimate,
}

/// The per-tick orchestrator.
pub struct WallFollowLoop {
    preprocessor: ScanPreprocessor,
    estimator: WallEstimator,
    monitor: SafetyMonitor,
    controller: SteeringController,
    synthesizer: CommandSynthesizer,
    stale_hard_limit: Duration,

    controller_state: ControllerState,
    mode: FollowMode,
    /// Last cleaned frame, kept for staleness tracking and re-estimation
    /// on ticks without a fresh scan.
    last_frame: Option<ScanFrame>,
    started_at: Option<Instant>,
    /// Last NORMAL-mode steering output, coasted through estimate dropouts
    /// inside the hysteresis window.
    last_angular: f32,
}

impl WallFollowLoop {
    pub fn new(config: WallFollowConfig) -> Self {
        Self {
            preprocessor: ScanPreprocessor::new(config.preprocess),
            estimator: WallEstimator::new(config.estimator),
            monitor: SafetyMonitor::new(config.safety),
            controller: SteeringController::new(config.steering),
            synthesizer: CommandSynthesizer::new(config.synthesizer),
            stale_hard_limit: config.stale_hard_limit,
            controller_state: ControllerState::new(),
            mode: FollowMode::Init,
            last_frame: None,
            started_at: None,
            last_angular: 0.0,
        }
    }

    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    /// Run one control tick.
    ///
    /// `scan`, when present, is the latest raw frame from the single-slot
    /// exchange; `now` is the tick's wall-clock time. Always returns
    /// exactly one command, already inside the velocity envelope.
    pub fn tick(&mut self, scan: Option<ScanFrame>, now: Instant) -> TickOutput {
        let started_at = *self.started_at.get_or_insert(now);

        if let Some(raw) = scan {
            self.last_frame = Some(self.preprocessor.process(raw));
        }

        let sensor_age = match &self.last_frame {
            Some(frame) => now.saturating_duration_since(frame.timestamp),
            None => now.saturating_duration_since(started_at),
        };

        let estimate = self
            .last_frame
            .as_ref()
            .map(|f| self.estimator.estimate(f))
            .unwrap_or_else(WallEstimate::invalid);

        let verdict = self
            .monitor
            .assess(self.last_frame.as_ref(), &estimate, sensor_age);

        let angular = if self.mode != FollowMode::Stopped && verdict == SafetyVerdict::Normal {
            if estimate.valid {
                let a = self
                    .controller
                    .update(&mut self.controller_state, &estimate, now);
                self.last_angular = a;
                a
            } else {
                // Estimate dropout inside the hysteresis window: hold the
                // previous correction rather than jerking to zero.
                self.last_angular
            }
        } else {
            self.controller_state.reset();
            self.last_angular = 0.0;
            0.0
        };

        let mut command = self.synthesizer.synthesize(verdict, angular);

        let next_mode = if self.mode == FollowMode::Stopped {
            FollowMode::Stopped
        } else if verdict == SafetyVerdict::StaleSensor && sensor_age > self.stale_hard_limit {
            FollowMode::Stopped
        } else {
            match verdict {
                SafetyVerdict::Normal => FollowMode::Following,
                SafetyVerdict::Obstructed => FollowMode::Avoiding,
                SafetyVerdict::LostWall => FollowMode::Searching,
                // Staleness forces a stop command but holds the machine in
                // place until the hard limit decides.
                SafetyVerdict::StaleSensor => self.mode,
            }
        };

        if next_mode != self.mode {
            match next_mode {
                FollowMode::Stopped => tracing::warn!(
                    "mode {:?} -> Stopped (sensor stale for {:.1}s)",
                    self.mode,
                    sensor_age.as_secs_f32()
                ),
                _ => tracing::info!("mode {:?} -> {:?} ({:?})", self.mode, next_mode, verdict),
            }
            self.mode = next_mode;
        }

        if self.mode == FollowMode::Stopped {
            command = VelocityCommand::stop();
        }

        TickOutput {
            command,
            verdict,
            mode: self.mode,
            estimate,
        }
    }
}
