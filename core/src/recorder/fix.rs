use serde::{Deserialize, Serialize};

/// One fix as handed over by the external recorder-format parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    /// Recorder clock in seconds. Wraps back to zero at UTC midnight.
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub gnss_altitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_altitude: Option<f64>,
    /// Recorder validity flag (`A` in the log is `true`, `V` is `false`).
    #[serde(default = "default_valid")]
    pub valid: bool,
}

fn default_valid() -> bool {
    true
}

impl RawFix {
    pub fn new(
        timestamp: f64,
        latitude: f64,
        longitude: f64,
        gnss_altitude: f64,
        pressure_altitude: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            gnss_altitude,
            pressure_altitude,
            valid: true,
        }
    }
}

/// Altitude channel used for every derived altitude metric of a flight.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeSource {
    #[default]
    Pressure,
    Gnss,
}

impl std::fmt::Display for AltitudeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AltitudeSource::Pressure => write!(f, "pressure"),
            AltitudeSource::Gnss => write!(f, "gnss"),
        }
    }
}

/// Reason a fix was excluded from kinematic computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FixDefect {
    InvalidTimestamp,
    CoordinatesOutOfRange,
    DuplicateTimestamp,
    NonMonotonicTimestamp,
}

/// A recorder fix enriched with the derived kinematic and state fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fix {
    /// Position in the original input sequence.
    pub index: usize,
    /// Raw recorder clock as received.
    pub raw_time: f64,
    /// Recorder clock with midnight rollovers unwrapped.
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub gnss_altitude: f64,
    pub pressure_altitude: Option<f64>,
    pub recorder_valid: bool,
    /// Altitude from the flight's chosen source, meters.
    pub altitude: f64,
    pub ground_speed_kmh: f64,
    pub bearing_deg: f64,
    /// Degrees per second, positive when turning right.
    pub bearing_change_rate: f64,
    pub flying: bool,
    pub circling: bool,
    pub defect: Option<FixDefect>,
}

impl Fix {
    pub fn from_raw(index: usize, raw: &RawFix) -> Self {
        Self {
            index,
            raw_time: raw.timestamp,
            timestamp: raw.timestamp,
            latitude: raw.latitude,
            longitude: raw.longitude,
            gnss_altitude: raw.gnss_altitude,
            pressure_altitude: raw.pressure_altitude,
            recorder_valid: raw.valid,
            altitude: raw.gnss_altitude,
            ground_speed_kmh: 0.0,
            bearing_deg: 0.0,
            bearing_change_rate: 0.0,
            flying: false,
            circling: false,
            defect: None,
        }
    }

    /// Whether the fix takes part in kinematics, smoothing and segmentation.
    pub fn is_usable(&self) -> bool {
        self.defect.is_none()
    }

    pub fn distance_to(&self, other: &Fix) -> f64 {
        crate::math::geo::distance_m(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    pub fn bearing_to(&self, other: &Fix) -> f64 {
        crate::math::geo::bearing_deg(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Sample of the requested altitude channel, if the recorder supplied one.
    pub fn channel_altitude(&self, source: AltitudeSource) -> Option<f64> {
        match source {
            AltitudeSource::Pressure => self.pressure_altitude.filter(|alt| alt.is_finite()),
            AltitudeSource::Gnss => {
                if self.recorder_valid && self.gnss_altitude.is_finite() {
                    Some(self.gnss_altitude)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_fix_deserializes_without_optional_fields() {
        let json = r#"{"timestamp": 36000.0, "latitude": 46.2, "longitude": 12.8,
                      "gnss_altitude": 493.0}"#;
        let raw: RawFix = serde_json::from_str(json).unwrap();
        assert!(raw.valid);
        assert_eq!(raw.pressure_altitude, None);
    }

    #[test]
    fn gnss_channel_is_missing_on_invalid_recorder_flag() {
        let mut raw = RawFix::new(0.0, 46.0, 12.0, 500.0, Some(437.0));
        raw.valid = false;
        let fix = Fix::from_raw(0, &raw);
        assert_eq!(fix.channel_altitude(AltitudeSource::Gnss), None);
        assert_eq!(fix.channel_altitude(AltitudeSource::Pressure), Some(437.0));
    }
}
