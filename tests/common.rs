//! Test utilities for BhittiNav integration tests.
//!
//! Synthetic single-wall frames with known ground truth, for scenarios
//! that don't need the full corridor simulator.

#![allow(dead_code)]

use std::f32::consts::{FRAC_PI_2, PI};
use std::time::Instant;

use bhitti_nav::estimator::WallSide;
use bhitti_nav::scan::{RangeSample, ScanFrame};

pub const MAX_RANGE: f32 = 12.0;

/// Scan of a single flat wall at perpendicular distance `dist` on `side`,
/// with the robot's heading rotated CCW by `heading_offset` relative to
/// wall-parallel. Rays that miss read as out-of-range.
pub fn wall_scan(side: WallSide, dist: f32, heading_offset: f32, timestamp: Instant) -> ScanFrame {
    let n = 360;
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
            RangeSample::new(angle, f32::INFINITY)
        })
        .collect();

    ScanFrame::new(samples, timestamp)
}

/// Frame where every reading dropped out.
pub fn empty_scan(timestamp: Instant) -> ScanFrame {
    let samples = (0..360)
        .map(|i| RangeSample::invalid(-PI + i as f32 * (2.0 * PI / 360.0)))
        .collect();
    ScanFrame::new(samples, timestamp)
}
