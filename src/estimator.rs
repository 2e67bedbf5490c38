//! Wall distance and bearing estimation.
//!
//! Extracts the followed wall's perpendicular distance and the robot's
//! angular deviation from wall-parallel out of a cleaned scan, using two
//! angular sub-sectors on the configured side:
//!
//! - the *perpendicular beam*, centered at ±π/2 (abeam of the robot), and
//! - the *forward beam*, offset by the configured angle toward the heading.
//!
//! Each beam contributes the minimum valid distance in its sector, which
//! keeps the estimate robust to partial occlusion. Two-ray triangulation
//! then recovers the wall orientation:
//!
//! ```text
//! alpha         = atan2(d_fwd·cos(θ) − d_perp, d_fwd·sin(θ))
//! perpendicular = d_perp·cos(alpha)
//! projected     = perpendicular + lookahead·sin(alpha)
//! ```
//!
//! Sign convention: `bearing_error` is reported in the robot's steering
//! frame: positive means a CCW (+angular) rotation brings the robot back
//! parallel to the wall. With the beam layout mirrored per side, the raw
//! `alpha` already has that sense for a left wall and is negated for a
//! right wall. Both senses are pinned by unit tests; an inverted sign here
//! steers the robot away from the wall instead of along it.

use std::f32::consts::FRAC_PI_2;

use serde::Deserialize;

use crate::scan::ScanFrame;

/// Which side of the robot the followed wall is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallSide {
    Left,
    Right,
}

impl WallSide {
    /// Sign of a steering command that turns the robot *toward* this side.
    ///
    /// CCW-positive angular velocity: +1 turns left, so a left wall is
    /// approached with positive angular and a right wall with negative.
    #[inline]
    pub fn steer_sign(&self) -> f32 {
        match self {
            WallSide::Left => 1.0,
            WallSide::Right => -1.0,
        }
    }
}

/// Configuration for wall estimation.
#[derive(Debug, Clone, Copy)]
pub struct EstimatorConfig {
    /// Side of the robot the wall is followed on.
    pub side: WallSide,

    /// Angular offset between the perpendicular and forward beams (radians).
    pub beam_offset: f32,

    /// Half-width of each beam sector (radians).
    pub beam_half_width: f32,

    /// Forward projection distance (meters).
    ///
    /// The reported distance anticipates the wall geometry this far ahead
    /// of the robot instead of using the current offset alone.
    pub lookahead: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            side: WallSide::Right,
            beam_offset: std::f32::consts::FRAC_PI_4,
            // Narrow sectors: the sector minimum on a flat wall sits at the
            // low-incidence edge, so wide sectors skew the triangulation.
            beam_half_width: 0.05,
            lookahead: 0.25,
        }
    }
}

/// Wall estimate for one control tick.
#[derive(Debug, Clone, Copy)]
pub struct WallEstimate {
    /// Projected perpendicular distance to the wall (meters)
    pub distance: f32,
    /// Steering-frame bearing error (radians), positive = correct CCW
    pub bearing_error: f32,
    /// False when the scan could not support an estimate
    pub valid: bool,
}

impl WallEstimate {
    /// An estimate marked unusable.
    pub fn invalid() -> Self {
        Self {
            distance: 0.0,
            bearing_error: 0.0,
            valid: false,
        }
    }
}

/// Two-beam wall estimator.
#[derive(Debug, Clone)]
pub struct WallEstimator {
    config: EstimatorConfig,
}

impl WallEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Center angle of the perpendicular beam for the configured side.
    #[inline]
    fn perpendicular_center(&self) -> f32 {
        match self.config.side {
            WallSide::Left => FRAC_PI_2,
            WallSide::Right => -FRAC_PI_2,
        }
    }

    /// Center angle of the forward-oblique beam for the configured side.
    #[inline]
    fn forward_center(&self) -> f32 {
        match self.config.side {
            WallSide::Left => FRAC_PI_2 - self.config.beam_offset,
            WallSide::Right => -FRAC_PI_2 + self.config.beam_offset,
        }
    }

    /// Estimate wall distance and bearing from a cleaned frame.
    ///
    /// Never fails; a frame that cannot support both beams yields an
    /// invalid estimate, which downstream treats as wall-loss pressure.
    pub fn estimate(&self, frame: &ScanFrame) -> WallEstimate {
        let half = self.config.beam_half_width;

        let d_perp = match frame.sector_min(self.perpendicular_center(), half) {
            Some(d) => d,
            None => return WallEstimate::invalid(),
        };
        let d_fwd = match frame.sector_min(self.forward_center(), half) {
            Some(d) => d,
            None => return WallEstimate::invalid(),
        };

        let theta = self.config.beam_offset;
        let alpha = (d_fwd * theta.cos() - d_perp).atan2(d_fwd * theta.sin());
        let perpendicular = d_perp * alpha.cos();
        let projected = perpendicular + self.config.lookahead * alpha.sin();

        let bearing_error = match self.config.side {
            WallSide::Left => alpha,
            WallSide::Right => -alpha,
        };

        if !projected.is_finite() || !bearing_error.is_finite() {
            return WallEstimate::invalid();
        }

        WallEstimate {
            distance: projected,
            bearing_error,
            valid: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::RangeSample;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};
    use std::time::Instant;

    const MAX_RANGE: f32 = 12.0;

    /// Synthetic scan of a single flat wall.
    ///
    /// The wall sits at perpendicular distance `dist` on `side`, with the
    /// robot's heading rotated CCW by `heading_offset` relative to
    /// wall-parallel. Rays that miss the wall are marked invalid.
    fn wall_scan(side: WallSide, dist: f32, heading_offset: f32) -> ScanFrame {
        let n = 360;
        // Robot-frame direction of the wall normal
        let normal = match side {
            WallSide::Left => FRAC_PI_2 - heading_offset,
            WallSide::Right => -FRAC_PI_2 - heading_offset,
        };

        let samples = (0..n)
            .map(|i| {
                let angle = -PI + (i as f32 + 0.5) * (2.0 * PI / n as f32);
                let cos_incidence = (angle - normal).cos();
                if cos_incidence > 0.05 {
                    let r = dist / cos_incidence;
                    if r <= MAX_RANGE {
                        return RangeSample::new(angle, r);
                    }
                }
                RangeSample::invalid(angle)
            })
            .collect();

        ScanFrame::new(samples, Instant::now())
    }

    fn estimator(side: WallSide) -> WallEstimator {
        WallEstimator::new(EstimatorConfig {
            side,
            ..Default::default()
        })
    }

    #[test]
    fn test_parallel_wall_right() {
        let est = estimator(WallSide::Right).estimate(&wall_scan(WallSide::Right, 0.5, 0.0));
        assert!(est.valid);
        assert_relative_eq!(est.distance, 0.5, epsilon = 0.02);
        assert_relative_eq!(est.bearing_error, 0.0, epsilon = 0.06);
    }

    #[test]
    fn test_parallel_wall_left() {
        let est = estimator(WallSide::Left).estimate(&wall_scan(WallSide::Left, 0.8, 0.0));
        assert!(est.valid);
        assert_relative_eq!(est.distance, 0.8, epsilon = 0.02);
        assert_relative_eq!(est.bearing_error, 0.0, epsilon = 0.06);
    }

    #[test]
    fn test_geometry_round_trip_right() {
        // Ground truth: perpendicular distance and heading offset are known;
        // the estimate must reproduce both within sector-quantization error.
        for &psi in &[-0.2f32, -0.1, 0.1, 0.2] {
            let est = estimator(WallSide::Right).estimate(&wall_scan(WallSide::Right, 0.6, psi));
            assert!(est.valid);
            // Steering frame: correction is the negative of the heading offset
            assert_relative_eq!(est.bearing_error, -psi, epsilon = 0.06);
            let expected = 0.6 + 0.25 * psi.sin();
            assert_relative_eq!(est.distance, expected, epsilon = 0.03);
        }
    }

    #[test]
    fn test_geometry_round_trip_left() {
        for &psi in &[-0.2f32, -0.1, 0.1, 0.2] {
            let est = estimator(WallSide::Left).estimate(&wall_scan(WallSide::Left, 0.6, psi));
            assert!(est.valid);
            assert_relative_eq!(est.bearing_error, -psi, epsilon = 0.06);
            // Mirrored side: the projected distance grows when turning CW
            let expected = 0.6 - 0.25 * psi.sin();
            assert_relative_eq!(est.distance, expected, epsilon = 0.03);
        }
    }

    #[test]
    fn test_wall_on_wrong_side_is_invalid() {
        // Wall on the left, estimator configured for the right: both right
        // sectors are empty.
        let est = estimator(WallSide::Right).estimate(&wall_scan(WallSide::Left, 0.5, 0.0));
        assert!(!est.valid);
    }

    #[test]
    fn test_empty_frame_is_invalid() {
        let frame = ScanFrame::new(Vec::new(), Instant::now());
        let est = estimator(WallSide::Right).estimate(&frame);
        assert!(!est.valid);
        assert_eq!(est.distance, 0.0);
        assert_eq!(est.bearing_error, 0.0);
    }

    #[test]
    fn test_single_beam_is_not_enough() {
        // Valid samples only in the perpendicular sector
        let samples = vec![
            RangeSample::new(-FRAC_PI_2, 0.5),
            RangeSample::new(-FRAC_PI_2 + 0.05, 0.5),
        ];
        let frame = ScanFrame::new(samples, Instant::now());
        let est = estimator(WallSide::Right).estimate(&frame);
        assert!(!est.valid);
    }

    #[test]
    fn test_occlusion_takes_closest() {
        // A closer obstruction inside the perpendicular sector wins, pulling
        // the estimate toward the obstruction rather than through it.
        let mut frame = wall_scan(WallSide::Right, 1.0, 0.0);
        for s in &mut frame.samples {
            if (s.angle + FRAC_PI_2).abs() < 0.05 {
                *s = RangeSample::new(s.angle, 0.4);
            }
        }
        let est = estimator(WallSide::Right).estimate(&frame);
        assert!(est.valid);
        assert!(est.distance < 1.0);
    }
}
