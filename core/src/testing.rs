//! Synthetic tracks for unit tests.

use crate::math::geo;
use crate::recorder::RawFix;

/// Offset between the GNSS and pressure channels of generated fixes.
const GNSS_OFFSET_M: f64 = 30.0;

/// Builds one fix per second by dead reckoning from a start point.
pub struct TrackBuilder {
    latitude: f64,
    longitude: f64,
    heading: f64,
    altitude: f64,
    time: f64,
    fixes: Vec<RawFix>,
}

impl TrackBuilder {
    pub fn new(latitude: f64, longitude: f64, heading: f64) -> Self {
        Self::starting_at(36_000.0, latitude, longitude, heading)
    }

    pub fn starting_at(time: f64, latitude: f64, longitude: f64, heading: f64) -> Self {
        let mut builder = Self {
            latitude,
            longitude,
            heading,
            altitude: 500.0,
            time,
            fixes: Vec::new(),
        };
        builder.push();
        builder
    }

    fn push(&mut self) {
        self.fixes.push(RawFix::new(
            self.time,
            self.latitude,
            self.longitude,
            self.altitude + GNSS_OFFSET_M,
            Some(self.altitude),
        ));
    }

    fn step(&mut self, speed_kmh: f64, turn_rate: f64, climb_ms: f64) {
        self.time += 1.0;
        self.heading = geo::normalize_bearing(self.heading + turn_rate);
        if speed_kmh > 0.0 {
            let (lat, lon) = geo::destination(self.latitude, self.longitude, self.heading, speed_kmh / 3.6);
            self.latitude = lat;
            self.longitude = lon;
        }
        self.altitude += climb_ms;
        self.push();
    }

    pub fn stationary(mut self, seconds: usize) -> Self {
        for _ in 0..seconds {
            self.step(0.0, 0.0, 0.0);
        }
        self
    }

    pub fn straight(mut self, seconds: usize, speed_kmh: f64, climb_ms: f64) -> Self {
        for _ in 0..seconds {
            self.step(speed_kmh, 0.0, climb_ms);
        }
        self
    }

    pub fn turn(mut self, seconds: usize, speed_kmh: f64, rate_deg_s: f64, climb_ms: f64) -> Self {
        for _ in 0..seconds {
            self.step(speed_kmh, rate_deg_s, climb_ms);
        }
        self
    }

    pub fn build(self) -> Vec<RawFix> {
        self.fixes
    }
}
