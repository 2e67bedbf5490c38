//! Scan preprocessing.
//!
//! Validity gating for raw range readings, with an optional median pass to
//! knock down single-sample spikes. The output frame always has the same
//! cardinality as the input: invalid readings are flagged, never dropped,
//! so sector lookups by angle remain addressable downstream.

use crate::scan::ScanFrame;

/// Configuration for scan preprocessing.
#[derive(Debug, Clone, Copy)]
pub struct PreprocessConfig {
    /// Minimum usable range in meters.
    ///
    /// Readings closer than this are flagged invalid (self-reflection).
    pub min_range: f32,

    /// Maximum usable range in meters.
    ///
    /// Readings farther than this are flagged invalid (unreliable).
    pub max_range: f32,

    /// Apply a 3-tap median over runs of valid samples.
    pub median_filter: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            min_range: 0.1,
            max_range: 12.0,
            median_filter: true,
        }
    }
}

/// Validity gate and spike filter for raw scans.
#[derive(Debug, Clone)]
pub struct ScanPreprocessor {
    config: PreprocessConfig,
}

impl ScanPreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Check whether a raw distance is usable.
    #[inline]
    pub fn is_valid(&self, distance: f32) -> bool {
        distance.is_finite()
            && distance >= self.config.min_range
            && distance <= self.config.max_range
    }

    /// Clean a raw frame in place and return it.
    ///
    /// Never fails: a frame where every sample ends up invalid is a normal
    /// result and is handled downstream as wall-loss pressure.
    pub fn process(&self, mut frame: ScanFrame) -> ScanFrame {
        for sample in &mut frame.samples {
            if sample.valid && !self.is_valid(sample.distance) {
                sample.valid = false;
            }
        }

        if self.config.median_filter {
            self.median_pass(&mut frame);
        }

        frame
    }

    /// 3-tap median over each sample whose immediate neighbors are valid.
    fn median_pass(&self, frame: &mut ScanFrame) {
        let n = frame.samples.len();
        if n < 3 {
            return;
        }

        let original: Vec<(f32, bool)> = frame
            .samples
            .iter()
            .map(|s| (s.distance, s.valid))
            .collect();

        for i in 1..n - 1 {
            let (prev, pv) = original[i - 1];
            let (cur, cv) = original[i];
            let (next, nv) = original[i + 1];
            if pv && cv && nv {
                frame.samples[i].distance = median3(prev, cur, next);
            }
        }
    }
}

#[inline]
fn median3(a: f32, b: f32, c: f32) -> f32 {
    a.max(b.min(c)).min(b.max(c))
}
