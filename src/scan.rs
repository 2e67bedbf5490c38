//! Range scan types.
//!
//! A [`ScanFrame`] is one sweep of angularly tagged range readings from the
//! planar range sensor, stamped with its capture time. Samples keep their
//! position in the sweep even when invalid so that angular sector lookups
//! stay addressable after preprocessing.

use std::time::Instant;

use crate::math::angle_diff;

/// A single range reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSample {
    /// Beam angle in radians, (-π, π], 0 = robot heading, CCW positive
    pub angle: f32,
    /// Measured distance in meters
    pub distance: f32,
    /// False when the reading is unusable (out of range, non-finite)
    pub valid: bool,
}

impl RangeSample {
    /// Create a valid sample.
    pub fn new(angle: f32, distance: f32) -> Self {
        Self {
            angle,
            distance,
            valid: true,
        }
    }

    /// Create an explicitly invalid sample at the given angle.
    pub fn invalid(angle: f32) -> Self {
        Self {
            angle,
            distance: 0.0,
            valid: false,
        }
    }
}

/// One sweep of range readings plus its capture timestamp.
#[derive(Debug, Clone)]
pub struct ScanFrame {
    pub samples: Vec<RangeSample>,
    pub timestamp: Instant,
}

impl ScanFrame {
    /// Create a frame from samples captured at `timestamp`.
    pub fn new(samples: Vec<RangeSample>, timestamp: Instant) -> Self {
        Self { samples, timestamp }
    }

    /// Number of samples in the sweep.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of valid samples.
    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|s| s.valid).count()
    }

    /// Minimum valid distance within the angular sector centered on
    /// `center` with the given `half_width`, or `None` when the sector
    /// holds no valid sample.
    ///
    /// The sector test uses shortest angular difference, so sectors that
    /// straddle the ±π seam behave correctly.
    pub fn sector_min(&self, center: f32, half_width: f32) -> Option<f32> {
        self.samples
            .iter()
            .filter(|s| s.valid && angle_diff(center, s.angle).abs() <= half_width)
            .map(|s| s.distance)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}
