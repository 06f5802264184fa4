use serde::{Deserialize, Serialize};

use crate::math::geo;
use crate::recorder::Fix;

/// How a turnpoint is scored. Start kinds need an actual crossing of the
/// cylinder boundary; the others only need a fix inside it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnpointKind {
    /// Inside after the start time, then outside.
    StartExit,
    /// Outside after the start time, then inside.
    StartEnter,
    Cylinder,
    EndOfSpeedSection,
    GoalCylinder,
}

impl TurnpointKind {
    pub fn is_start(&self) -> bool {
        matches!(self, TurnpointKind::StartExit | TurnpointKind::StartEnter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turnpoint {
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    pub kind: TurnpointKind,
}

impl Turnpoint {
    pub fn new(name: &str, latitude: f64, longitude: f64, radius_m: f64, kind: TurnpointKind) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
            radius_m,
            kind,
        }
    }

    pub fn distance_to(&self, fix: &Fix) -> f64 {
        geo::distance_m(self.latitude, self.longitude, fix.latitude, fix.longitude)
    }

    pub fn contains(&self, fix: &Fix) -> bool {
        self.distance_to(fix) <= self.radius_m
    }
}

impl std::fmt::Display for Turnpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:?}, {:.5}, {:.5}, r={:.0} m)",
            self.name, self.kind, self.latitude, self.longitude, self.radius_m
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RawFix;

    #[test]
    fn containment_includes_the_boundary() {
        let tp = Turnpoint::new("A", 46.0, 12.0, 1_000.0, TurnpointKind::Cylinder);
        let (lat, lon) = geo::destination(46.0, 12.0, 90.0, 999.0);
        let inside = Fix::from_raw(0, &RawFix::new(0.0, lat, lon, 500.0, None));
        let (lat, lon) = geo::destination(46.0, 12.0, 90.0, 1_001.0);
        let outside = Fix::from_raw(1, &RawFix::new(1.0, lat, lon, 500.0, None));
        assert!(tp.contains(&inside));
        assert!(!tp.contains(&outside));
    }

    #[test]
    fn kinds_use_snake_case_names() {
        let tp: Turnpoint = serde_json::from_str(
            r#"{"latitude": 46.0, "longitude": 12.0, "radius_m": 400.0, "kind": "end_of_speed_section"}"#,
        )
        .unwrap();
        assert_eq!(tp.kind, TurnpointKind::EndOfSpeedSection);
        assert!(tp.name.is_empty());
        assert!(TurnpointKind::StartEnter.is_start());
        assert!(!TurnpointKind::GoalCylinder.is_start());
    }
}
