//! Per-fix ground speed, bearing and bearing rate, plus the choice of the
//! altitude channel that every later metric uses.

use crate::config::{AltitudeConfig, KinematicsConfig};
use crate::math::{geo, StatsHelper};
use crate::prelude::{AnalysisConfig, FlightDraft, FlightError, FlightResult, ProcessingStage};
use crate::recorder::{AltitudeSource, Fix};
use crate::telemetry::log::LogManager;

/// Quality figures of one altitude channel over the usable fixes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelHealth {
    pub samples: usize,
    pub missing: usize,
    /// Consecutive samples changing faster than the configured climb/sink rate.
    pub discontinuities: usize,
    pub out_of_range: usize,
    pub mean_abs_change: f64,
    pub usable: bool,
}

impl ChannelHealth {
    pub fn missing_fraction(&self) -> f64 {
        StatsHelper::fraction(self.missing, self.samples)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AltitudeReport {
    pub pressure: ChannelHealth,
    pub gnss: ChannelHealth,
    pub chosen: AltitudeSource,
}

impl AltitudeReport {
    pub fn chosen_health(&self) -> &ChannelHealth {
        match self.chosen {
            AltitudeSource::Pressure => &self.pressure,
            AltitudeSource::Gnss => &self.gnss,
        }
    }

    /// True when pressure altitude had to be abandoned for GNSS.
    pub fn fell_back(&self) -> bool {
        self.chosen == AltitudeSource::Gnss && !self.pressure.usable && self.gnss.usable
    }
}

pub fn assess_channel(fixes: &[&Fix], source: AltitudeSource, config: &AltitudeConfig) -> ChannelHealth {
    let mut health = ChannelHealth {
        samples: fixes.len(),
        ..Default::default()
    };
    let mut present: Vec<f64> = Vec::with_capacity(fixes.len());
    let mut last: Option<(f64, f64)> = None;

    for fix in fixes {
        let Some(alt) = fix.channel_altitude(source) else {
            health.missing += 1;
            continue;
        };
        if alt > config.max_alt || alt < config.min_alt {
            health.out_of_range += 1;
        }
        if let Some((prev_time, prev_alt)) = last {
            let dt = fix.timestamp - prev_time;
            if dt > 0.0 && (alt - prev_alt).abs() / dt > config.max_alt_change_rate {
                health.discontinuities += 1;
            }
        }
        last = Some((fix.timestamp, alt));
        present.push(alt);
    }

    let max_missing = match source {
        AltitudeSource::Pressure => config.max_missing_pressure_fraction,
        AltitudeSource::Gnss => config.max_missing_gnss_fraction,
    };
    health.mean_abs_change = StatsHelper::mean_abs_change(&present);
    health.usable = !present.is_empty()
        && health.missing_fraction() <= max_missing
        && health.out_of_range == 0
        && health.discontinuities <= config.max_alt_change_violations
        && health.mean_abs_change >= config.min_avg_abs_alt_change;
    health
}

/// Pressure if healthy, GNSS if healthy, otherwise whichever channel exists.
pub fn choose_source(pressure: &ChannelHealth, gnss: &ChannelHealth) -> AltitudeSource {
    if pressure.usable {
        AltitudeSource::Pressure
    } else if gnss.usable {
        AltitudeSource::Gnss
    } else if pressure.missing < pressure.samples {
        AltitudeSource::Pressure
    } else {
        AltitudeSource::Gnss
    }
}

pub struct KinematicsStage {
    kinematics: Option<KinematicsConfig>,
    altitude: Option<AltitudeConfig>,
    logger: LogManager,
}

impl KinematicsStage {
    pub fn new() -> Self {
        Self {
            kinematics: None,
            altitude: None,
            logger: LogManager::new("kinematics"),
        }
    }

    fn resolve_altitudes(draft: &mut FlightDraft, source: AltitudeSource) {
        let first_known = draft
            .usable
            .iter()
            .find_map(|&idx| draft.fixes[idx].channel_altitude(source));
        let mut carried = first_known;
        for &idx in &draft.usable {
            let fix = &mut draft.fixes[idx];
            if let Some(alt) = fix.channel_altitude(source) {
                carried = Some(alt);
            }
            fix.altitude = carried.unwrap_or(fix.gnss_altitude);
        }
    }

    fn compute_ground_speeds(draft: &mut FlightDraft) {
        let usable = &draft.usable;
        let fixes = &mut draft.fixes;
        if let Some(&first) = usable.first() {
            fixes[first].ground_speed_kmh = 0.0;
        }
        for pair in usable.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let dt = fixes[curr].timestamp - fixes[prev].timestamp;
            let dist = fixes[prev].distance_to(&fixes[curr]);
            fixes[curr].ground_speed_kmh = if dt > 0.0 { dist / dt * 3.6 } else { 0.0 };
        }
    }

    fn compute_bearings(draft: &mut FlightDraft, config: &KinematicsConfig) {
        let usable = &draft.usable;
        let fixes = &mut draft.fixes;
        let mut bearings: Vec<Option<f64>> = Vec::with_capacity(usable.len());
        let mut last = None;
        for pair in usable.windows(2) {
            let (a, b) = (&fixes[pair[0]], &fixes[pair[1]]);
            if a.distance_to(b) > config.min_distance_for_bearing_m {
                last = Some(a.bearing_to(b));
            }
            bearings.push(last);
        }
        // The final fix continues the last leg.
        if !usable.is_empty() {
            bearings.push(last);
        }
        let first_defined = bearings.iter().flatten().next().copied().unwrap_or(0.0);
        for (&idx, bearing) in usable.iter().zip(bearings) {
            fixes[idx].bearing_deg = bearing.unwrap_or(first_defined);
        }
    }

    fn compute_bearing_change_rates(draft: &mut FlightDraft, config: &KinematicsConfig) {
        let usable = &draft.usable;
        let fixes = &mut draft.fixes;
        // Lagging cursor: the latest fix at least `min_time` older than the current one.
        let mut lag: Option<usize> = None;
        for pos in 0..usable.len() {
            let curr = usable[pos];
            let now = fixes[curr].timestamp;
            let mut candidate = lag.map_or(0, |l| l + 1);
            while candidate < pos
                && now - fixes[usable[candidate]].timestamp
                    >= config.min_time_for_bearing_change_s - 1e-7
            {
                lag = Some(candidate);
                candidate += 1;
            }

            fixes[curr].bearing_change_rate = match lag {
                Some(l) if l < pos => {
                    let prev = usable[l];
                    let dt = now - fixes[prev].timestamp;
                    if dt.abs() < 1e-7 {
                        0.0
                    } else {
                        geo::wrap_180(fixes[curr].bearing_deg - fixes[prev].bearing_deg) / dt
                    }
                }
                _ => 0.0,
            };
        }
    }
}

impl Default for KinematicsStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for KinematicsStage {
    fn name(&self) -> &'static str {
        "kinematics"
    }

    fn initialize(&mut self, config: &AnalysisConfig) -> FlightResult<()> {
        self.kinematics = Some(config.kinematics.clone());
        self.altitude = Some(config.altitude.clone());
        Ok(())
    }

    fn execute(&mut self, draft: &mut FlightDraft) -> FlightResult<()> {
        let kinematics = self
            .kinematics
            .clone()
            .ok_or(FlightError::Uninitialized("kinematics"))?;
        let altitude = self
            .altitude
            .as_ref()
            .ok_or(FlightError::Uninitialized("kinematics"))?;

        let usable_fixes: Vec<&Fix> = draft.usable_fixes().collect();
        let pressure = assess_channel(&usable_fixes, AltitudeSource::Pressure, altitude);
        let gnss = assess_channel(&usable_fixes, AltitudeSource::Gnss, altitude);
        let chosen = choose_source(&pressure, &gnss);
        if !pressure.usable {
            self.logger.caution(&format!(
                "pressure altitude unusable (missing {:.1}%, jumps {}, out of range {}), using {}",
                pressure.missing_fraction() * 100.0,
                pressure.discontinuities,
                pressure.out_of_range,
                chosen
            ));
        }
        draft.altitude = AltitudeReport {
            pressure,
            gnss,
            chosen,
        };

        Self::resolve_altitudes(draft, chosen);
        Self::compute_ground_speeds(draft);
        Self::compute_bearings(draft, &kinematics);
        Self::compute_bearing_change_rates(draft, &kinematics);

        self.logger
            .record(&format!("altitude source {}, {} fixes resolved", chosen, draft.usable.len()));
        Ok(())
    }
}
