//! Velocity command synthesis.
//!
//! Combines the linear speed policy with the steering output, applies the
//! safety verdict's override, and clamps the result to the configured
//! envelope. The final clamp is unconditional: it holds even when an
//! override policy is misconfigured.

use crate::estimator::WallSide;
use crate::safety::SafetyVerdict;

/// One velocity command: the loop's single output artifact per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCommand {
    /// Linear velocity (m/s)
    pub linear: f32,
    /// Angular velocity (rad/s), CCW positive
    pub angular: f32,
}

impl VelocityCommand {
    pub fn new(linear: f32, angular: f32) -> Self {
        Self { linear, angular }
    }

    /// Full stop.
    pub fn stop() -> Self {
        Self {
            linear: 0.0,
            angular: 0.0,
        }
    }
}

/// Hard velocity bounds every emitted command must satisfy.
#[derive(Debug, Clone, Copy)]
pub struct VelocityEnvelope {
    /// Most negative allowed linear velocity (m/s)
    pub linear_min: f32,
    /// Most positive allowed linear velocity (m/s)
    pub linear_max: f32,
    /// Angular velocity magnitude bound (rad/s)
    pub angular_max: f32,
}

impl Default for VelocityEnvelope {
    fn default() -> Self {
        Self {
            linear_min: -0.05,
            linear_max: 0.25,
            angular_max: 0.6,
        }
    }
}

impl VelocityEnvelope {
    /// Clamp a command into the envelope.
    ///
    /// Non-finite components collapse to zero rather than escaping.
    pub fn clamp(&self, cmd: VelocityCommand) -> VelocityCommand {
        let linear = if cmd.linear.is_finite() {
            cmd.linear.clamp(self.linear_min, self.linear_max)
        } else {
            0.0
        };
        let angular = if cmd.angular.is_finite() {
            cmd.angular.clamp(-self.angular_max, self.angular_max)
        } else {
            0.0
        };
        VelocityCommand { linear, angular }
    }

    /// Whether a command already lies inside the envelope.
    pub fn contains(&self, cmd: &VelocityCommand) -> bool {
        cmd.linear >= self.linear_min
            && cmd.linear <= self.linear_max
            && cmd.angular.abs() <= self.angular_max
    }
}

/// Configuration for command synthesis.
#[derive(Debug, Clone, Copy)]
pub struct SynthesizerConfig {
    /// Side of the robot the wall is followed on.
    pub side: WallSide,

    /// Cruise speed while following (m/s).
    pub cruise_speed: f32,

    /// Fraction of cruise speed shed at full steering deflection, in
    /// [0, 1]. Large corrections slow the robot instead of letting it
    /// skate wide.
    pub turn_slowdown: f32,

    /// Steering deflection treated as full for the slowdown ratio (rad/s).
    pub angular_max: f32,

    /// Linear velocity while obstructed (m/s), usually 0 or slightly
    /// negative.
    pub avoid_linear: f32,

    /// Turn-in-place rate while obstructed (rad/s, magnitude; the turn is
    /// directed away from the followed wall).
    pub avoid_angular: f32,

    /// Crawl speed while searching for a lost wall (m/s).
    pub search_linear: f32,

    /// Search turn bias (rad/s, magnitude; directed toward the followed
    /// wall).
    pub search_angular: f32,

    /// Final output envelope.
    pub envelope: VelocityEnvelope,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            side: WallSide::Right,
            cruise_speed: 0.2,
            turn_slowdown: 0.6,
            angular_max: 0.5,
            avoid_linear: 0.0,
            avoid_angular: 0.4,
            search_linear: 0.08,
            search_angular: 0.15,
            envelope: VelocityEnvelope::default(),
        }
    }
}

/// Combines speed policy, steering output, and safety overrides.
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    config: SynthesizerConfig,
}

impl CommandSynthesizer {
    pub fn new(config: SynthesizerConfig) -> Self {
        Self { config }
    }

    pub fn envelope(&self) -> &VelocityEnvelope {
        &self.config.envelope
    }

    /// Produce the final command for one tick.
    pub fn synthesize(&self, verdict: SafetyVerdict, angular: f32) -> VelocityCommand {
        let cfg = &self.config;
        let toward_wall = cfg.side.steer_sign();

        let raw = match verdict {
            SafetyVerdict::Normal => {
                let deflection = (angular.abs() / cfg.angular_max).clamp(0.0, 1.0);
                let linear = cfg.cruise_speed * (1.0 - cfg.turn_slowdown * deflection);
                VelocityCommand::new(linear, angular)
            }
            SafetyVerdict::Obstructed => {
                VelocityCommand::new(cfg.avoid_linear, -toward_wall * cfg.avoid_angular)
            }
            SafetyVerdict::StaleSensor => VelocityCommand::stop(),
            SafetyVerdict::LostWall => {
                VelocityCommand::new(cfg.search_linear, toward_wall * cfg.search_angular)
            }
        };

        cfg.envelope.clamp(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn synthesizer(side: WallSide) -> CommandSynthesizer {
        CommandSynthesizer::new(SynthesizerConfig {
            side,
            ..Default::default()
        })
    }

    #[test]
    fn test_normal_passes_controller_output() {
        let synth = synthesizer(WallSide::Right);
        let cmd = synth.synthesize(SafetyVerdict::Normal, -0.2);
        assert_relative_eq!(cmd.angular, -0.2);
        assert!(cmd.linear > 0.0);
    }

    #[test]
    fn test_normal_straight_runs_at_cruise() {
        let synth = synthesizer(WallSide::Right);
        let cmd = synth.synthesize(SafetyVerdict::Normal, 0.0);
        assert_relative_eq!(cmd.linear, 0.2);
    }

    #[test]
    fn test_turn_slowdown_reduces_linear() {
        let synth = synthesizer(WallSide::Right);
        let straight = synth.synthesize(SafetyVerdict::Normal, 0.0);
        let turning = synth.synthesize(SafetyVerdict::Normal, 0.5);
        assert!(turning.linear < straight.linear);
        assert!(turning.linear > 0.0);
    }

    #[test]
    fn test_stale_sensor_is_full_stop() {
        let synth = synthesizer(WallSide::Right);
        let cmd = synth.synthesize(SafetyVerdict::StaleSensor, 0.4);
        assert_eq!(cmd, VelocityCommand::stop());
    }

    #[test]
    fn test_obstructed_turns_away_from_wall() {
        // Right wall: avoidance turns left (positive)
        let cmd = synthesizer(WallSide::Right).synthesize(SafetyVerdict::Obstructed, 0.0);
        assert_relative_eq!(cmd.linear, 0.0);
        assert!(cmd.angular > 0.0);

        // Left wall: avoidance turns right (negative)
        let cmd = synthesizer(WallSide::Left).synthesize(SafetyVerdict::Obstructed, 0.0);
        assert!(cmd.angular < 0.0);
    }

    #[test]
    fn test_lost_wall_searches_toward_wall() {
        let cmd = synthesizer(WallSide::Right).synthesize(SafetyVerdict::LostWall, 0.0);
        assert!(cmd.linear > 0.0);
        assert!(cmd.linear < 0.2);
        assert!(cmd.angular < 0.0, "search bias must lean toward the right wall");

        let cmd = synthesizer(WallSide::Left).synthesize(SafetyVerdict::LostWall, 0.0);
        assert!(cmd.angular > 0.0);
    }

    #[test]
    fn test_envelope_holds_for_every_verdict() {
        // Deliberately misconfigured overrides: the final clamp still wins.
        let config = SynthesizerConfig {
            cruise_speed: 9.0,
            avoid_angular: 50.0,
            search_linear: 4.0,
            ..Default::default()
        };
        let synth = CommandSynthesizer::new(config);
        let envelope = *synth.envelope();

        for verdict in [
            SafetyVerdict::Normal,
            SafetyVerdict::Obstructed,
            SafetyVerdict::StaleSensor,
            SafetyVerdict::LostWall,
        ] {
            for angular in [-10.0, -0.3, 0.0, 0.3, 10.0] {
                let cmd = synth.synthesize(verdict, angular);
                assert!(envelope.contains(&cmd), "{:?} / {}: {:?}", verdict, angular, cmd);
            }
        }
    }

    #[test]
    fn test_envelope_zeroes_non_finite() {
        let envelope = VelocityEnvelope::default();
        let cmd = envelope.clamp(VelocityCommand::new(f32::NAN, f32::INFINITY));
        assert_eq!(cmd, VelocityCommand::stop());
    }
}
