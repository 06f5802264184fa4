//! Independent plausibility checks over a constructed fix sequence.
//!
//! Every check is a plain function returning at most one note; the
//! [`Validator`] runs the whole catalogue and folds the results, so one
//! failing check never hides another.

use crate::config::{AltitudeConfig, ValidationConfig};
use crate::math::geo;
use crate::prelude::{AnalysisConfig, FlightDraft, FlightError, FlightResult, Note, ProcessingStage};
use crate::processing::kinematics::AltitudeReport;
use crate::processing::timeline::TimelineReport;
use crate::recorder::Fix;
use crate::telemetry::log::LogManager;

/// Read-only view handed to every check.
pub struct CheckInput<'a> {
    pub fixes: &'a [Fix],
    pub usable: &'a [usize],
    pub timeline: &'a TimelineReport,
    pub altitude: &'a AltitudeReport,
    /// Limits the altitude report was measured against.
    pub altitude_limits: &'a AltitudeConfig,
}

impl<'a> CheckInput<'a> {
    pub fn from_draft(draft: &'a FlightDraft, altitude_limits: &'a AltitudeConfig) -> Self {
        Self {
            fixes: &draft.fixes,
            usable: &draft.usable,
            timeline: &draft.timeline,
            altitude: &draft.altitude,
            altitude_limits,
        }
    }

    pub fn usable_fixes(&self) -> impl Iterator<Item = &'a Fix> + '_ {
        let fixes = self.fixes;
        self.usable.iter().map(move |&idx| &fixes[idx])
    }
}

pub type Check = fn(&CheckInput<'_>, &ValidationConfig) -> Option<Note>;

pub fn check_fix_count(input: &CheckInput<'_>, config: &ValidationConfig) -> Option<Note> {
    (input.usable.len() < config.min_fixes).then(|| {
        Note::error(
            "fix_count",
            format!(
                "This file has {} usable fixes, less than the minimum {}.",
                input.usable.len(),
                config.min_fixes
            ),
        )
    })
}

pub fn check_coordinates(input: &CheckInput<'_>, _config: &ValidationConfig) -> Option<Note> {
    let bad = input
        .fixes
        .iter()
        .filter(|f| !geo::valid_coordinates(f.latitude, f.longitude))
        .count();
    (bad > 0).then(|| {
        Note::error(
            "coordinates",
            format!("{} fixes have latitude/longitude out of range.", bad),
        )
    })
}

pub fn check_timestamp_order(input: &CheckInput<'_>, config: &ValidationConfig) -> Option<Note> {
    let backward = input.timeline.backward_steps;
    (backward > config.max_backward_steps).then(|| {
        Note::error(
            "timestamp_order",
            format!(
                "timestamps go backwards {} times. Allowed {} times.",
                backward, config.max_backward_steps
            ),
        )
    })
}

pub fn check_duplicate_timestamps(input: &CheckInput<'_>, config: &ValidationConfig) -> Option<Note> {
    let duplicates = input.timeline.duplicates;
    (duplicates > config.max_duplicate_timestamps).then(|| {
        Note::error(
            "duplicate_timestamps",
            format!(
                "{} fixes repeat the previous timestamp. Allowed {}.",
                duplicates, config.max_duplicate_timestamps
            ),
        )
    })
}

pub fn check_fix_intervals(input: &CheckInput<'_>, config: &ValidationConfig) -> Option<Note> {
    let violations = input
        .usable
        .windows(2)
        .map(|pair| input.fixes[pair[1]].timestamp - input.fixes[pair[0]].timestamp)
        .filter(|&dt| {
            dt < config.min_seconds_between_fixes - 1e-5
                || dt > config.max_seconds_between_fixes + 1e-5
        })
        .count();
    (violations > config.max_time_violations).then(|| {
        Note::error(
            "fix_intervals",
            format!(
                "too many fixes intervals exceed time between fixes constraints. \
                 Allowed {} fixes, found {} fixes.",
                config.max_time_violations, violations
            ),
        )
    })
}

pub fn check_day_rollovers(input: &CheckInput<'_>, config: &ValidationConfig) -> Option<Note> {
    let rollovers = input.timeline.rollovers;
    (rollovers > config.max_day_rollovers).then(|| {
        Note::error(
            "day_rollovers",
            format!(
                "too many times did the flight cross the UTC 0:00 barrier. \
                 Allowed {} times, found {} times.",
                config.max_day_rollovers, rollovers
            ),
        )
    })
}

pub fn check_altitude_source(input: &CheckInput<'_>, _config: &ValidationConfig) -> Option<Note> {
    let report = input.altitude;
    if !report.pressure.usable && !report.gnss.usable {
        return Some(Note::error(
            "altitude_source",
            "neither pressure nor gnss altitude is valid.",
        ));
    }
    report.fell_back().then(|| {
        Note::warning(
            "altitude_source",
            format!(
                "pressure altitude unusable (missing {:.1}%, {} jumps, {} out of range, \
                 average change {:.3} m/fix), using gnss altitude.",
                report.pressure.missing_fraction() * 100.0,
                report.pressure.discontinuities,
                report.pressure.out_of_range,
                report.pressure.mean_abs_change
            ),
        )
    })
}

pub fn check_altitude_rate(input: &CheckInput<'_>, _config: &ValidationConfig) -> Option<Note> {
    let health = input.altitude.chosen_health();
    (health.discontinuities > input.altitude_limits.max_alt_change_violations).then(|| {
        Note::error(
            "altitude_rate",
            format!(
                "implausible altitude change between fixes: {} {} altitude jumps exceed the maximum climb/sink rate.",
                health.discontinuities,
                input.altitude.chosen
            ),
        )
    })
}

pub fn check_altitude_limits(input: &CheckInput<'_>, _config: &ValidationConfig) -> Option<Note> {
    let health = input.altitude.chosen_health();
    (health.out_of_range > 0).then(|| {
        Note::error(
            "altitude_limits",
            format!(
                "{} altitude limits exceeded in {} fixes.",
                input.altitude.chosen, health.out_of_range
            ),
        )
    })
}

pub fn check_stuck_recorder(input: &CheckInput<'_>, config: &ValidationConfig) -> Option<Note> {
    let mut longest = 0.0f64;
    let mut run_start: Option<&Fix> = None;
    let mut previous: Option<&Fix> = None;
    for fix in input.usable_fixes() {
        match previous {
            Some(prev)
                if fix.flying
                    && prev.flying
                    && prev.latitude == fix.latitude
                    && prev.longitude == fix.longitude =>
            {
                let start = *run_start.get_or_insert(prev);
                longest = longest.max(fix.timestamp - start.timestamp);
            }
            _ => run_start = None,
        }
        previous = Some(fix);
    }
    (longest >= config.max_stationary_run_s).then(|| {
        Note::error(
            "stuck_recorder",
            format!(
                "position did not change for {:.0} s while airborne, the recorder looks stuck.",
                longest
            ),
        )
    })
}

/// Ordered catalogue of checks; custom checks can be appended.
#[derive(Clone)]
pub struct Validator {
    checks: Vec<(&'static str, Check)>,
}

impl Validator {
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn with_check(mut self, name: &'static str, check: Check) -> Self {
        self.checks.push((name, check));
        self
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|(name, _)| *name).collect()
    }

    pub fn run(&self, input: &CheckInput<'_>, config: &ValidationConfig) -> Vec<Note> {
        self.checks
            .iter()
            .filter_map(|(_, check)| check(input, config))
            .collect()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::empty()
            .with_check("fix_count", check_fix_count)
            .with_check("coordinates", check_coordinates)
            .with_check("timestamp_order", check_timestamp_order)
            .with_check("duplicate_timestamps", check_duplicate_timestamps)
            .with_check("fix_intervals", check_fix_intervals)
            .with_check("day_rollovers", check_day_rollovers)
            .with_check("altitude_source", check_altitude_source)
            .with_check("altitude_rate", check_altitude_rate)
            .with_check("altitude_limits", check_altitude_limits)
            .with_check("stuck_recorder", check_stuck_recorder)
    }
}

pub struct ValidationStage {
    validator: Validator,
    config: Option<(ValidationConfig, AltitudeConfig)>,
    logger: LogManager,
}

impl ValidationStage {
    pub fn new(validator: Validator) -> Self {
        Self {
            validator,
            config: None,
            logger: LogManager::new("validator"),
        }
    }
}

impl Default for ValidationStage {
    fn default() -> Self {
        Self::new(Validator::default())
    }
}

impl ProcessingStage for ValidationStage {
    fn name(&self) -> &'static str {
        "validator"
    }

    fn initialize(&mut self, config: &AnalysisConfig) -> FlightResult<()> {
        self.config = Some((config.validation.clone(), config.altitude.clone()));
        Ok(())
    }

    fn execute(&mut self, draft: &mut FlightDraft) -> FlightResult<()> {
        let (config, altitude) = self
            .config
            .as_ref()
            .ok_or(FlightError::Uninitialized("validator"))?;
        let notes = self
            .validator
            .run(&CheckInput::from_draft(draft, altitude), config);
        for note in &notes {
            self.logger.detail(&note.to_string());
        }
        self.logger
            .record(&format!("{} checks, {} notes", self.validator.checks.len(), notes.len()));
        draft.notes.extend(notes);
        Ok(())
    }
}
