//! Configuration loading for BhittiNav
//!
//! Static configuration, loaded once from a TOML file (`bhitti.toml`) and
//! validated before the control loop starts. Nothing here is touched on
//! the hot path: the sections are assembled into the per-component config
//! structs at startup.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::command::{SynthesizerConfig, VelocityEnvelope};
use crate::error::{BhittiError, Result};
use crate::estimator::{EstimatorConfig, WallSide};
use crate::follow::WallFollowConfig;
use crate::preprocess::PreprocessConfig;
use crate::safety::SafetyConfig;
use crate::sim::SimConfig;
use crate::steering::SteeringConfig;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct BhittiConfig {
    #[serde(default)]
    pub wall: WallSection,
    #[serde(default)]
    pub sensor: SensorSection,
    #[serde(default)]
    pub control: ControlSection,
    #[serde(default)]
    pub safety: SafetySection,
    #[serde(default)]
    pub behavior: BehaviorSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub sim: SimSection,
}

/// Wall-following geometry
#[derive(Clone, Debug, Deserialize)]
pub struct WallSection {
    /// Which side the followed wall is on
    #[serde(default = "default_side")]
    pub side: WallSide,

    /// Target standoff distance (meters)
    #[serde(default = "default_target_distance")]
    pub target_distance: f32,

    /// Angular offset between the perpendicular and forward beams (radians)
    #[serde(default = "default_beam_offset")]
    pub beam_offset_rad: f32,

    /// Half-width of each beam sector (radians)
    #[serde(default = "default_beam_half_width")]
    pub beam_half_width_rad: f32,

    /// Forward projection distance for the estimate (meters)
    #[serde(default = "default_lookahead")]
    pub lookahead_distance: f32,
}

/// Range sensor limits
#[derive(Clone, Debug, Deserialize)]
pub struct SensorSection {
    /// Minimum usable range (meters)
    #[serde(default = "default_min_range")]
    pub min_range: f32,

    /// Maximum usable range (meters)
    #[serde(default = "default_max_range")]
    pub max_range: f32,

    /// Median-filter single-sample spikes
    #[serde(default = "default_median_filter")]
    pub median_filter: bool,
}

/// Control law parameters
#[derive(Clone, Debug, Deserialize)]
pub struct ControlSection {
    /// Control tick rate (Hz)
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f32,

    #[serde(default = "default_kp")]
    pub kp: f32,

    #[serde(default = "default_ki")]
    pub ki: f32,

    #[serde(default = "default_kd")]
    pub kd: f32,

    /// Weight of the distance deviation in the composite error
    #[serde(default = "default_k_distance")]
    pub k_distance: f32,

    /// Weight of the bearing deviation in the composite error
    #[serde(default = "default_k_bearing")]
    pub k_bearing: f32,

    /// Anti-windup clamp for the integral term
    #[serde(default = "default_integral_max")]
    pub integral_max: f32,

    /// Steering output clamp (rad/s)
    #[serde(default = "default_angular_max")]
    pub angular_max: f32,

    /// Minimum dt for integration/differentiation (seconds)
    #[serde(default = "default_dt_floor")]
    pub dt_floor: f32,
}

/// Safety thresholds
#[derive(Clone, Debug, Deserialize)]
pub struct SafetySection {
    /// Forward sector half-width (radians)
    #[serde(default = "default_front_half_width")]
    pub front_half_width_rad: f32,

    /// Obstruction distance threshold (meters)
    #[serde(default = "default_obstruction_distance")]
    pub obstruction_distance: f32,

    /// Sensor staleness timeout (seconds)
    #[serde(default = "default_stale_timeout")]
    pub stale_timeout_s: f32,

    /// Staleness beyond this terminates the loop (seconds)
    #[serde(default = "default_stale_hard_limit")]
    pub stale_hard_limit_s: f32,

    /// Consecutive invalid-estimate ticks tolerated before LOST_WALL
    #[serde(default = "default_lost_wall_ticks")]
    pub lost_wall_ticks: u32,
}

/// Speed policy and override biases
#[derive(Clone, Debug, Deserialize)]
pub struct BehaviorSection {
    /// Cruise speed while following (m/s)
    #[serde(default = "default_cruise_speed")]
    pub cruise_speed: f32,

    /// Fraction of cruise speed shed at full steering deflection, [0, 1]
    #[serde(default = "default_turn_slowdown")]
    pub turn_slowdown: f32,

    /// Linear velocity while obstructed (m/s)
    #[serde(default = "default_avoid_linear")]
    pub avoid_linear: f32,

    /// Turn-in-place rate while obstructed (rad/s, magnitude)
    #[serde(default = "default_avoid_angular")]
    pub avoid_angular: f32,

    /// Crawl speed while searching for a lost wall (m/s)
    #[serde(default = "default_search_linear")]
    pub search_linear: f32,

    /// Search turn bias (rad/s, magnitude)
    #[serde(default = "default_search_angular")]
    pub search_angular: f32,
}

/// Hard velocity envelope
#[derive(Clone, Debug, Deserialize)]
pub struct LimitsSection {
    /// Most negative allowed linear velocity (m/s)
    #[serde(default = "default_linear_min")]
    pub linear_min: f32,

    /// Most positive allowed linear velocity (m/s)
    #[serde(default = "default_linear_max")]
    pub linear_max: f32,

    /// Angular velocity magnitude bound (rad/s)
    #[serde(default = "default_envelope_angular_max")]
    pub angular_max: f32,
}

/// Corridor simulator parameters (used by the binary)
#[derive(Clone, Debug, Deserialize)]
pub struct SimSection {
    /// Corridor half-width (meters)
    #[serde(default = "default_corridor_half_width")]
    pub corridor_half_width: f32,

    /// Optional end wall across the corridor (meters along x)
    #[serde(default)]
    pub end_wall_x: Option<f32>,

    /// Rays per sweep
    #[serde(default = "default_num_rays")]
    pub num_rays: usize,

    /// Gaussian range noise stddev (meters)
    #[serde(default = "default_range_noise")]
    pub range_noise_stddev: f32,

    /// Probability a ray drops out as invalid
    #[serde(default = "default_dropout_rate")]
    pub dropout_rate: f32,

    /// RNG seed; 0 = entropy
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Scan emission rate (Hz)
    #[serde(default = "default_scan_rate")]
    pub scan_rate_hz: f32,

    /// Initial lateral offset from the centerline (meters)
    #[serde(default = "default_start_offset")]
    pub start_offset: f32,

    /// Initial heading relative to the corridor axis (radians)
    #[serde(default)]
    pub start_heading: f32,
}

// Default value functions
fn default_side() -> WallSide {
    WallSide::Right
}
fn default_target_distance() -> f32 {
    0.5
}
fn default_beam_offset() -> f32 {
    std::f32::consts::FRAC_PI_4
}
fn default_beam_half_width() -> f32 {
    0.05
}
fn default_lookahead() -> f32 {
    0.25
}
fn default_min_range() -> f32 {
    0.1
}
fn default_max_range() -> f32 {
    12.0
}
fn default_median_filter() -> bool {
    true
}
fn default_rate_hz() -> f32 {
    20.0
}
fn default_kp() -> f32 {
    0.8
}
fn default_ki() -> f32 {
    0.1
}
fn default_kd() -> f32 {
    0.05
}
fn default_k_distance() -> f32 {
    1.0
}
fn default_k_bearing() -> f32 {
    1.0
}
fn default_integral_max() -> f32 {
    1.0
}
fn default_angular_max() -> f32 {
    0.5
}
fn default_dt_floor() -> f32 {
    0.005
}
fn default_front_half_width() -> f32 {
    0.26
}
fn default_obstruction_distance() -> f32 {
    0.30
}
fn default_stale_timeout() -> f32 {
    0.5
}
fn default_stale_hard_limit() -> f32 {
    5.0
}
fn default_lost_wall_ticks() -> u32 {
    5
}
fn default_cruise_speed() -> f32 {
    0.2
}
fn default_turn_slowdown() -> f32 {
    0.6
}
fn default_avoid_linear() -> f32 {
    0.0
}
fn default_avoid_angular() -> f32 {
    0.4
}
fn default_search_linear() -> f32 {
    0.08
}
fn default_search_angular() -> f32 {
    0.15
}
fn default_linear_min() -> f32 {
    -0.05
}
fn default_linear_max() -> f32 {
    0.25
}
fn default_envelope_angular_max() -> f32 {
    0.6
}
fn default_corridor_half_width() -> f32 {
    1.0
}
fn default_num_rays() -> usize {
    360
}
fn default_range_noise() -> f32 {
    0.005
}
fn default_dropout_rate() -> f32 {
    0.02
}
fn default_seed() -> u64 {
    42
}
fn default_scan_rate() -> f32 {
    10.0
}
fn default_start_offset() -> f32 {
    -0.4
}

impl Default for WallSection {
    fn default() -> Self {
        Self {
            side: default_side(),
            target_distance: default_target_distance(),
            beam_offset_rad: default_beam_offset(),
            beam_half_width_rad: default_beam_half_width(),
            lookahead_distance: default_lookahead(),
        }
    }
}

impl Default for SensorSection {
    fn default() -> Self {
        Self {
            min_range: default_min_range(),
            max_range: default_max_range(),
            median_filter: default_median_filter(),
        }
    }
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            kp: default_kp(),
            ki: default_ki(),
            kd: default_kd(),
            k_distance: default_k_distance(),
            k_bearing: default_k_bearing(),
            integral_max: default_integral_max(),
            angular_max: default_angular_max(),
            dt_floor: default_dt_floor(),
        }
    }
}

impl Default for SafetySection {
    fn default() -> Self {
        Self {
            front_half_width_rad: default_front_half_width(),
            obstruction_distance: default_obstruction_distance(),
            stale_timeout_s: default_stale_timeout(),
            stale_hard_limit_s: default_stale_hard_limit(),
            lost_wall_ticks: default_lost_wall_ticks(),
        }
    }
}

impl Default for BehaviorSection {
    fn default() -> Self {
        Self {
            cruise_speed: default_cruise_speed(),
            turn_slowdown: default_turn_slowdown(),
            avoid_linear: default_avoid_linear(),
            avoid_angular: default_avoid_angular(),
            search_linear: default_search_linear(),
            search_angular: default_search_angular(),
        }
    }
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            linear_min: default_linear_min(),
            linear_max: default_linear_max(),
            angular_max: default_envelope_angular_max(),
        }
    }
}

impl Default for SimSection {
    fn default() -> Self {
        Self {
            corridor_half_width: default_corridor_half_width(),
            end_wall_x: None,
            num_rays: default_num_rays(),
            range_noise_stddev: default_range_noise(),
            dropout_rate: default_dropout_rate(),
            seed: default_seed(),
            scan_rate_hz: default_scan_rate(),
            start_offset: default_start_offset(),
            start_heading: 0.0,
        }
    }
}

impl Default for BhittiConfig {
    fn default() -> Self {
        Self {
            wall: WallSection::default(),
            sensor: SensorSection::default(),
            control: ControlSection::default(),
            safety: SafetySection::default(),
            behavior: BehaviorSection::default(),
            limits: LimitsSection::default(),
            sim: SimSection::default(),
        }
    }
}

impl BhittiConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BhittiError::Config(format!("Failed to read config file: {}", e)))?;
        let config: BhittiConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject unrecoverable configuration before the loop starts.
    ///
    /// This is the only fatal error path in the system; nothing inside the
    /// control loop is allowed to fail.
    pub fn validate(&self) -> Result<()> {
        fn bail(msg: String) -> Result<()> {
            Err(BhittiError::Config(msg))
        }

        if !(self.wall.target_distance.is_finite() && self.wall.target_distance > 0.0) {
            return bail(format!(
                "target_distance must be positive, got {}",
                self.wall.target_distance
            ));
        }
        if !(self.wall.beam_offset_rad > 0.0
            && self.wall.beam_offset_rad < std::f32::consts::FRAC_PI_2)
        {
            return bail(format!(
                "beam_offset_rad must lie in (0, π/2), got {}",
                self.wall.beam_offset_rad
            ));
        }
        if self.wall.beam_half_width_rad <= 0.0 {
            return bail("beam_half_width_rad must be positive".into());
        }
        if !(self.sensor.min_range >= 0.0 && self.sensor.min_range < self.sensor.max_range) {
            return bail(format!(
                "sensor range bounds invalid: [{}, {}]",
                self.sensor.min_range, self.sensor.max_range
            ));
        }
        if !(self.control.rate_hz.is_finite() && self.control.rate_hz > 0.0) {
            return bail("control rate_hz must be positive".into());
        }
        for (name, gain) in [
            ("kp", self.control.kp),
            ("ki", self.control.ki),
            ("kd", self.control.kd),
            ("k_distance", self.control.k_distance),
            ("k_bearing", self.control.k_bearing),
        ] {
            if !gain.is_finite() {
                return bail(format!("gain {} must be finite, got {}", name, gain));
            }
        }
        if self.control.integral_max <= 0.0 {
            return bail("integral_max must be positive".into());
        }
        if self.control.angular_max <= 0.0 {
            return bail("angular_max must be positive".into());
        }
        if self.control.dt_floor <= 0.0 {
            return bail("dt_floor must be positive".into());
        }
        if self.safety.stale_timeout_s <= 0.0 {
            return bail("stale_timeout_s must be positive".into());
        }
        if self.safety.stale_hard_limit_s < self.safety.stale_timeout_s {
            return bail("stale_hard_limit_s must not be below stale_timeout_s".into());
        }
        if !(0.0..=1.0).contains(&self.behavior.turn_slowdown) {
            return bail("turn_slowdown must lie in [0, 1]".into());
        }
        if self.limits.linear_min > 0.0 || self.limits.linear_max <= 0.0 {
            return bail(format!(
                "linear envelope invalid: [{}, {}]",
                self.limits.linear_min, self.limits.linear_max
            ));
        }
        if self.limits.angular_max <= 0.0 {
            return bail("envelope angular_max must be positive".into());
        }
        if self.sim.num_rays < 16 {
            return bail("sim num_rays must be at least 16".into());
        }
        Ok(())
    }

    /// Control tick period.
    pub fn control_period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.control.rate_hz)
    }

    /// Assemble the control loop configuration.
    pub fn follow_config(&self) -> WallFollowConfig {
        WallFollowConfig {
            preprocess: PreprocessConfig {
                min_range: self.sensor.min_range,
                max_range: self.sensor.max_range,
                median_filter: self.sensor.median_filter,
            },
            estimator: EstimatorConfig {
                side: self.wall.side,
                beam_offset: self.wall.beam_offset_rad,
                beam_half_width: self.wall.beam_half_width_rad,
                lookahead: self.wall.lookahead_distance,
            },
            safety: SafetyConfig {
                front_half_width: self.safety.front_half_width_rad,
                obstruction_distance: self.safety.obstruction_distance,
                stale_timeout: Duration::from_secs_f32(self.safety.stale_timeout_s),
                lost_wall_ticks: self.safety.lost_wall_ticks,
            },
            steering: SteeringConfig {
                side: self.wall.side,
                target_distance: self.wall.target_distance,
                k_distance: self.control.k_distance,
                k_bearing: self.control.k_bearing,
                kp: self.control.kp,
                ki: self.control.ki,
                kd: self.control.kd,
                integral_max: self.control.integral_max,
                angular_max: self.control.angular_max,
                dt_floor: self.control.dt_floor,
            },
            synthesizer: SynthesizerConfig {
                side: self.wall.side,
                cruise_speed: self.behavior.cruise_speed,
                turn_slowdown: self.behavior.turn_slowdown,
                angular_max: self.control.angular_max,
                avoid_linear: self.behavior.avoid_linear,
                avoid_angular: self.behavior.avoid_angular,
                search_linear: self.behavior.search_linear,
                search_angular: self.behavior.search_angular,
                envelope: VelocityEnvelope {
                    linear_min: self.limits.linear_min,
                    linear_max: self.limits.linear_max,
                    angular_max: self.limits.angular_max,
                },
            },
            stale_hard_limit: Duration::from_secs_f32(self.safety.stale_hard_limit_s),
        }
    }

    /// Assemble the simulator configuration.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            corridor_half_width: self.sim.corridor_half_width,
            end_wall_x: self.sim.end_wall_x,
            num_rays: self.sim.num_rays,
            max_range: self.sensor.max_range,
            range_stddev: self.sim.range_noise_stddev,
            dropout_rate: self.sim.dropout_rate,
            seed: self.sim.seed,
            scan_interval: Duration::from_secs_f32(1.0 / self.sim.scan_rate_hz.max(0.1)),
            start_offset: self.sim.start_offset,
            start_heading: self.sim.start_heading,
        }
    }
}
