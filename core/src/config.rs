//! Tunable parameters for every analysis stage.
//!
//! All structs accept partial documents so a profile only needs to spell out
//! the values it changes; everything else keeps the defaults listed here.

use serde::{Deserialize, Serialize};

use crate::prelude::{FlightError, FlightResult};
use crate::processing::smoother::{SmootherOverrides, SmootherParams};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub timeline: TimelineConfig,
    pub altitude: AltitudeConfig,
    pub kinematics: KinematicsConfig,
    pub flying: FlyingConfig,
    pub circling: CirclingConfig,
    pub segments: SegmentConfig,
    pub validation: ValidationConfig,
}

impl AnalysisConfig {
    pub fn validate(&self) -> FlightResult<()> {
        self.flying
            .smoother
            .validate()
            .map_err(|msg| FlightError::InvalidConfig(format!("flying smoother: {msg}")))?;
        self.circling
            .smoother
            .validate()
            .map_err(|msg| FlightError::InvalidConfig(format!("circling smoother: {msg}")))?;
        if self.timeline.day_length_s <= self.timeline.rollover_tolerance_s {
            return Err(FlightError::InvalidConfig(
                "day length must exceed the rollover tolerance".into(),
            ));
        }
        if self.altitude.min_alt >= self.altitude.max_alt {
            return Err(FlightError::InvalidConfig(
                "altitude limits are inverted".into(),
            ));
        }
        for (name, fraction) in [
            ("pressure", self.altitude.max_missing_pressure_fraction),
            ("gnss", self.altitude.max_missing_gnss_fraction),
        ] {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(FlightError::InvalidConfig(format!(
                    "{name} missing fraction {fraction} outside [0, 1]"
                )));
            }
        }
        if self.kinematics.min_time_for_bearing_change_s < 0.0
            || self.flying.min_landing_time_s < 0.0
            || self.segments.min_time_for_thermal_s < 0.0
        {
            return Err(FlightError::InvalidConfig(
                "durations must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Day-boundary policy for the recorder clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Treat large backwards clock jumps as a UTC midnight crossing.
    pub unwrap_midnight: bool,
    pub day_length_s: f64,
    /// A backwards jump counts as rollover when it exceeds
    /// `day_length_s - rollover_tolerance_s`.
    pub rollover_tolerance_s: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            unwrap_midnight: true,
            day_length_s: 24.0 * 60.0 * 60.0,
            rollover_tolerance_s: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AltitudeConfig {
    /// Maximum climb or sink rate between fixes, m/s.
    pub max_alt_change_rate: f64,
    /// Discontinuities a channel may show before it is considered unusable.
    pub max_alt_change_violations: usize,
    pub max_alt: f64,
    pub min_alt: f64,
    /// Meters per fix; below this the sensor is considered stuck.
    pub min_avg_abs_alt_change: f64,
    pub max_missing_pressure_fraction: f64,
    pub max_missing_gnss_fraction: f64,
}

impl Default for AltitudeConfig {
    fn default() -> Self {
        Self {
            max_alt_change_rate: 50.0,
            max_alt_change_violations: 0,
            max_alt: 10_000.0,
            min_alt: -600.0,
            min_avg_abs_alt_change: 0.01,
            max_missing_pressure_fraction: 0.1,
            max_missing_gnss_fraction: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsConfig {
    /// Bearing rates are measured against a fix at least this much older.
    pub min_time_for_bearing_change_s: f64,
    /// Legs shorter than this keep the previous bearing.
    pub min_distance_for_bearing_m: f64,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self {
            min_time_for_bearing_change_s: 5.0,
            min_distance_for_bearing_m: 0.5,
        }
    }
}

/// Which airborne section to keep when the log contains several.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlightPick {
    /// Stop at the first landing.
    First,
    /// Span from the first takeoff to the last landing.
    Concat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "FlyingDocument")]
pub struct FlyingConfig {
    /// Observations are ground speeds in km/h.
    pub smoother: SmootherParams,
    /// Ground time shorter than this between two airborne runs is not a landing.
    pub min_landing_time_s: f64,
    pub pick: FlightPick,
}

impl Default for FlyingConfig {
    fn default() -> Self {
        Self {
            smoother: SmootherParams {
                threshold: 15.0,
                band: 1.5,
                confidence: 0.8,
                initial_on: 0.2,
                on_to_off: 0.0005,
                off_to_on: 0.0005,
            },
            min_landing_time_s: 5.0 * 60.0,
            pick: FlightPick::Concat,
        }
    }
}

/// Parsed form of [`FlyingConfig`]; missing values come from its defaults.
#[derive(Deserialize, Default)]
#[serde(default)]
struct FlyingDocument {
    smoother: SmootherOverrides,
    min_landing_time_s: Option<f64>,
    pick: Option<FlightPick>,
}

impl From<FlyingDocument> for FlyingConfig {
    fn from(doc: FlyingDocument) -> Self {
        let base = Self::default();
        Self {
            smoother: doc.smoother.apply(base.smoother),
            min_landing_time_s: doc.min_landing_time_s.unwrap_or(base.min_landing_time_s),
            pick: doc.pick.unwrap_or(base.pick),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "CirclingDocument")]
pub struct CirclingConfig {
    /// Observations are absolute bearing change rates in deg/s.
    pub smoother: SmootherParams,
}

impl Default for CirclingConfig {
    fn default() -> Self {
        Self {
            smoother: SmootherParams {
                threshold: 6.0,
                band: 0.5,
                confidence: 0.92,
                initial_on: 0.2,
                on_to_off: 0.030,
                off_to_on: 0.018,
            },
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CirclingDocument {
    smoother: SmootherOverrides,
}

impl From<CirclingDocument> for CirclingConfig {
    fn from(doc: CirclingDocument) -> Self {
        Self {
            smoother: doc.smoother.apply(Self::default().smoother),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Circling shorter than this is folded into the surrounding glide.
    pub min_time_for_thermal_s: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_time_for_thermal_s: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_fixes: usize,
    pub min_seconds_between_fixes: f64,
    pub max_seconds_between_fixes: f64,
    pub max_time_violations: usize,
    pub max_day_rollovers: usize,
    pub max_backward_steps: usize,
    pub max_duplicate_timestamps: usize,
    /// Longest tolerated airborne run of identical coordinates, seconds.
    pub max_stationary_run_s: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_fixes: 50,
            min_seconds_between_fixes: 1.0,
            max_seconds_between_fixes: 50.0,
            max_time_violations: 10,
            max_day_rollovers: 2,
            max_backward_steps: 0,
            max_duplicate_timestamps: 60,
            max_stationary_run_s: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let json = r#"{"flying": {"min_landing_time_s": 120.0}, "segments": {}}"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.flying.min_landing_time_s, 120.0);
        assert_eq!(config.flying.smoother.threshold, 15.0);
        assert_eq!(config.segments.min_time_for_thermal_s, 60.0);
        assert_eq!(config.flying.pick, FlightPick::Concat);
    }

    #[test]
    fn smoother_blocks_merge_over_their_own_defaults() {
        let json = r#"{"flying": {"smoother": {"threshold": 20.0}}, "circling": {"smoother": {"band": 1.0}}}"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.flying.smoother.threshold, 20.0);
        assert_eq!(config.flying.smoother.band, 1.5);
        assert_eq!(config.flying.min_landing_time_s, 300.0);
        assert_eq!(config.circling.smoother.band, 1.0);
        assert_eq!(config.circling.smoother.threshold, 6.0);
        config.validate().unwrap();
    }

    #[test]
    fn full_document_round_trips() {
        let config = AnalysisConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.flying.smoother, config.flying.smoother);
        assert_eq!(parsed.circling.smoother, config.circling.smoother);
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let mut config = AnalysisConfig::default();
        config.circling.smoother.off_to_on = 1.5;
        match config.validate() {
            Err(FlightError::InvalidConfig(msg)) => assert!(msg.starts_with("circling")),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
