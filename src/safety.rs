//! Safety monitoring.
//!
//! Evaluates one verdict per control tick from sensor staleness, forward
//! clearance, and wall-estimate validity. The priority order encodes a
//! safety-first policy: staleness (possible total sensor loss) overrides
//! everything, a nearby obstacle overrides wall-following deviations, and
//! an occasional missing wall estimate is tolerated before escalating.

use std::time::Duration;

use crate::estimator::WallEstimate;
use crate::scan::ScanFrame;

/// Per-tick safety verdict, in descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
    /// Sensor data older than the staleness timeout: full stop.
    StaleSensor,
    /// Obstacle inside the forward sector: avoidance turn.
    Obstructed,
    /// Wall estimate invalid beyond the hysteresis window: search.
    LostWall,
    /// Nothing wrong.
    Normal,
}

/// Configuration for safety monitoring.
#[derive(Debug, Clone, Copy)]
pub struct SafetyConfig {
    /// Forward sector half-width (radians), centered on the heading.
    pub front_half_width: f32,

    /// Obstruction distance threshold (meters).
    pub obstruction_distance: f32,

    /// Maximum tolerated sensor age before STALE_SENSOR.
    pub stale_timeout: Duration,

    /// Consecutive invalid-estimate ticks tolerated before LOST_WALL.
    ///
    /// Hysteresis against single-frame dropouts: the verdict escalates on
    /// tick `lost_wall_ticks + 1`, not earlier.
    pub lost_wall_ticks: u32,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            front_half_width: 0.26, // ~15 degrees
            obstruction_distance: 0.30,
            stale_timeout: Duration::from_millis(500),
            lost_wall_ticks: 5,
        }
    }
}

/// Safety monitor with lost-wall hysteresis state.
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    config: SafetyConfig,
    /// Consecutive ticks with an invalid wall estimate.
    invalid_ticks: u32,
}

impl SafetyMonitor {
    pub fn new(config: SafetyConfig) -> Self {
        Self {
            config,
            invalid_ticks: 0,
        }
    }

    /// Clear the hysteresis counter.
    pub fn reset(&mut self) {
        self.invalid_ticks = 0;
    }

    /// Evaluate the verdict for one tick.
    ///
    /// `frame` is the latest cleaned frame, if any has ever been received;
    /// `sensor_age` is the elapsed time since the last processed frame
    /// (or since the loop started, when none has arrived yet).
    pub fn assess(
        &mut self,
        frame: Option<&ScanFrame>,
        estimate: &WallEstimate,
        sensor_age: Duration,
    ) -> SafetyVerdict {
        // The counter tracks consecutive invalid estimates regardless of
        // which verdict wins below.
        if estimate.valid {
            self.invalid_ticks = 0;
        } else {
            self.invalid_ticks = self.invalid_ticks.saturating_add(1);
        }

        if sensor_age > self.config.stale_timeout {
            return SafetyVerdict::StaleSensor;
        }

        if let Some(frame) = frame {
            if let Some(closest) = frame.sector_min(0.0, self.config.front_half_width) {
                if closest < self.config.obstruction_distance {
                    return SafetyVerdict::Obstructed;
                }
            }
        }

        if self.invalid_ticks > self.config.lost_wall_ticks {
            return SafetyVerdict::LostWall;
        }

        SafetyVerdict::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::RangeSample;
    use std::time::Instant;

    fn front_frame(distance: f32) -> ScanFrame {
        let samples = vec![
            RangeSample::new(-0.1, distance),
            RangeSample::new(0.0, distance),
            RangeSample::new(0.1, distance),
        ];
        ScanFrame::new(samples, Instant::now())
    }

    fn valid_estimate() -> WallEstimate {
        WallEstimate {
            distance: 0.5,
            bearing_error: 0.0,
            valid: true,
        }
    }

    fn fresh() -> Duration {
        Duration::from_millis(50)
    }

    #[test]
    fn test_normal_when_clear_and_fresh() {
        let mut monitor = SafetyMonitor::new(SafetyConfig::default());
        let frame = front_frame(2.0);
        let verdict = monitor.assess(Some(&frame), &valid_estimate(), fresh());
        assert_eq!(verdict, SafetyVerdict::Normal);
    }

    #[test]
    fn test_obstructed_below_threshold() {
        let mut monitor = SafetyMonitor::new(SafetyConfig::default());
        let frame = front_frame(0.2);
        let verdict = monitor.assess(Some(&frame), &valid_estimate(), fresh());
        assert_eq!(verdict, SafetyVerdict::Obstructed);
    }

    #[test]
    fn test_stale_beats_obstructed() {
        // Priority ordering: a frame that is both stale and obstructed must
        // yield STALE_SENSOR, never OBSTRUCTED.
        let mut monitor = SafetyMonitor::new(SafetyConfig::default());
        let frame = front_frame(0.2);
        let verdict = monitor.assess(Some(&frame), &valid_estimate(), Duration::from_secs(2));
        assert_eq!(verdict, SafetyVerdict::StaleSensor);
    }

    #[test]
    fn test_lost_wall_hysteresis_exact_tick() {
        let config = SafetyConfig {
            lost_wall_ticks: 3,
            ..Default::default()
        };
        let mut monitor = SafetyMonitor::new(config);
        let frame = front_frame(2.0);
        let invalid = WallEstimate::invalid();

        // Ticks 1..=N stay NORMAL
        for tick in 1..=3 {
            let verdict = monitor.assess(Some(&frame), &invalid, fresh());
            assert_eq!(verdict, SafetyVerdict::Normal, "tick {}", tick);
        }
        // Tick N+1 escalates
        let verdict = monitor.assess(Some(&frame), &invalid, fresh());
        assert_eq!(verdict, SafetyVerdict::LostWall);
    }

    #[test]
    fn test_valid_estimate_resets_hysteresis() {
        let config = SafetyConfig {
            lost_wall_ticks: 2,
            ..Default::default()
        };
        let mut monitor = SafetyMonitor::new(config);
        let frame = front_frame(2.0);
        let invalid = WallEstimate::invalid();

        monitor.assess(Some(&frame), &invalid, fresh());
        monitor.assess(Some(&frame), &invalid, fresh());
        // A single good estimate clears the streak
        monitor.assess(Some(&frame), &valid_estimate(), fresh());

        for _ in 0..2 {
            let verdict = monitor.assess(Some(&frame), &invalid, fresh());
            assert_eq!(verdict, SafetyVerdict::Normal);
        }
        let verdict = monitor.assess(Some(&frame), &invalid, fresh());
        assert_eq!(verdict, SafetyVerdict::LostWall);
    }

    #[test]
    fn test_obstructed_beats_lost_wall() {
        let config = SafetyConfig {
            lost_wall_ticks: 0,
            ..Default::default()
        };
        let mut monitor = SafetyMonitor::new(config);
        let frame = front_frame(0.2);
        let verdict = monitor.assess(Some(&frame), &WallEstimate::invalid(), fresh());
        assert_eq!(verdict, SafetyVerdict::Obstructed);
    }

    #[test]
    fn test_no_frame_counts_toward_lost_wall() {
        let config = SafetyConfig {
            lost_wall_ticks: 1,
            ..Default::default()
        };
        let mut monitor = SafetyMonitor::new(config);
        let invalid = WallEstimate::invalid();

        assert_eq!(monitor.assess(None, &invalid, fresh()), SafetyVerdict::Normal);
        assert_eq!(monitor.assess(None, &invalid, fresh()), SafetyVerdict::LostWall);
    }

    #[test]
    fn test_empty_front_sector_is_not_obstruction() {
        // All front readings invalid: nothing measurable ahead, no verdict
        // escalation from the obstruction rule.
        let mut monitor = SafetyMonitor::new(SafetyConfig::default());
        let samples = vec![RangeSample::invalid(0.0), RangeSample::invalid(0.1)];
        let frame = ScanFrame::new(samples, Instant::now());
        let verdict = monitor.assess(Some(&frame), &valid_estimate(), fresh());
        assert_eq!(verdict, SafetyVerdict::Normal);
    }
}
