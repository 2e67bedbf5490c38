//! PID steering control.
//!
//! Converts the wall estimate into an angular velocity command. Distance
//! and bearing deviations are folded into one composite error expressed in
//! the steering frame (positive = CCW correction), so the PID itself is
//! side-agnostic: the wall side only decides the sign of the cross-track
//! term, and `bearing_error` arrives already side-adjusted from the
//! estimator.
//!
//! The controller is stateless; all cross-tick state lives in an explicit
//! [`ControllerState`] owned by the control loop and reset on every tick
//! whose safety verdict is not NORMAL (anti-windup across overrides).

use std::time::Instant;

use crate::estimator::{WallEstimate, WallSide};

/// Configuration for the steering controller.
#[derive(Debug, Clone, Copy)]
pub struct SteeringConfig {
    /// Side of the robot the wall is followed on.
    pub side: WallSide,

    /// Target standoff distance (meters).
    pub target_distance: f32,

    /// Weight of the distance deviation in the composite error.
    pub k_distance: f32,

    /// Weight of the bearing deviation in the composite error.
    pub k_bearing: f32,

    /// Proportional gain.
    pub kp: f32,

    /// Integral gain.
    pub ki: f32,

    /// Derivative gain.
    pub kd: f32,

    /// Anti-windup clamp for the integral term.
    pub integral_max: f32,

    /// Output clamp (rad/s).
    pub angular_max: f32,

    /// Minimum dt used for integration/differentiation (seconds).
    ///
    /// Irregular ticks can arrive arbitrarily close together; the floor
    /// keeps the derivative term bounded.
    pub dt_floor: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            side: WallSide::Right,
            target_distance: 0.5,
            k_distance: 1.0,
            k_bearing: 1.0,
            kp: 0.8,
            ki: 0.1,
            kd: 0.05,
            integral_max: 1.0,
            angular_max: 0.5,
            dt_floor: 0.005,
        }
    }
}

/// Cross-tick controller state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerState {
    pub integral: f32,
    pub previous_error: f32,
    pub last_tick: Option<Instant>,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the state. Called on every non-NORMAL tick so the integral
    /// cannot wind up while an override is active.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// PID steering law.
#[derive(Debug, Clone)]
pub struct SteeringController {
    config: SteeringConfig,
}

impl SteeringController {
    pub fn new(config: SteeringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SteeringConfig {
        &self.config
    }

    /// Compute the angular velocity command for one tick.
    ///
    /// A non-finite composite error degrades to a zero command and a state
    /// reset instead of propagating NaN into the command path.
    pub fn update(
        &self,
        state: &mut ControllerState,
        estimate: &WallEstimate,
        now: Instant,
    ) -> f32 {
        let cfg = &self.config;

        // Cross-track deviation in the steering frame: positive when a CCW
        // correction closes the gap.
        let cross_track = cfg.side.steer_sign() * (estimate.distance - cfg.target_distance);
        let error = cfg.k_distance * cross_track + cfg.k_bearing * estimate.bearing_error;

        if !error.is_finite() {
            tracing::warn!("steering: non-finite error, resetting controller");
            state.reset();
            return 0.0;
        }

        let dt = state
            .last_tick
            .map(|t| now.saturating_duration_since(t).as_secs_f32())
            .unwrap_or(cfg.dt_floor)
            .max(cfg.dt_floor);
        let first_tick = state.last_tick.is_none();

        state.integral =
            (state.integral + error * dt).clamp(-cfg.integral_max, cfg.integral_max);

        let derivative = if first_tick {
            0.0
        } else {
            (error - state.previous_error) / dt
        };

        state.previous_error = error;
        state.last_tick = Some(now);

        let output = cfg.kp * error + cfg.ki * state.integral + cfg.kd * derivative;
        if !output.is_finite() {
            state.reset();
            return 0.0;
        }

        output.clamp(-cfg.angular_max, cfg.angular_max)
    }
}
