use crate::config::TimelineConfig;
use crate::math::geo;
use crate::prelude::{AnalysisConfig, FlightDraft, FlightError, FlightResult, ProcessingStage};
use crate::recorder::FixDefect;
use crate::telemetry::log::LogManager;

const SAME_TIME_EPS: f64 = 1e-5;

/// Clock anomalies found while ordering the fixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineReport {
    pub rollovers: usize,
    pub duplicates: usize,
    pub backward_steps: usize,
    pub invalid_timestamps: usize,
    pub out_of_range: usize,
}

/// Flags unusable fixes and unwraps midnight crossings of the recorder clock.
pub struct TimelineStage {
    config: Option<TimelineConfig>,
    logger: LogManager,
}

impl TimelineStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("timeline"),
        }
    }
}

impl Default for TimelineStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for TimelineStage {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn initialize(&mut self, config: &AnalysisConfig) -> FlightResult<()> {
        self.config = Some(config.timeline.clone());
        Ok(())
    }

    fn execute(&mut self, draft: &mut FlightDraft) -> FlightResult<()> {
        let config = self
            .config
            .as_ref()
            .ok_or(FlightError::Uninitialized("timeline"))?;

        if draft.fixes.is_empty() {
            return Err(FlightError::MalformedInput("no fixes supplied".into()));
        }

        let mut report = TimelineReport::default();
        let mut usable = Vec::with_capacity(draft.fixes.len());
        let mut day_offset = 0.0;
        let mut previous: Option<(f64, f64)> = None;

        for (idx, fix) in draft.fixes.iter_mut().enumerate() {
            if !fix.raw_time.is_finite() {
                fix.defect = Some(FixDefect::InvalidTimestamp);
                report.invalid_timestamps += 1;
                continue;
            }
            if !geo::valid_coordinates(fix.latitude, fix.longitude) {
                fix.defect = Some(FixDefect::CoordinatesOutOfRange);
                report.out_of_range += 1;
                continue;
            }

            let mut timestamp = fix.raw_time + day_offset;
            if let Some((prev_raw, prev_timestamp)) = previous {
                let rolled = config.unwrap_midnight
                    && prev_raw - fix.raw_time > config.day_length_s - config.rollover_tolerance_s;
                if rolled {
                    day_offset += config.day_length_s;
                    timestamp += config.day_length_s;
                    report.rollovers += 1;
                }
                let delta = timestamp - prev_timestamp;
                if delta.abs() < SAME_TIME_EPS {
                    fix.timestamp = timestamp;
                    fix.defect = Some(FixDefect::DuplicateTimestamp);
                    report.duplicates += 1;
                    continue;
                }
                if delta < 0.0 {
                    fix.timestamp = timestamp;
                    fix.defect = Some(FixDefect::NonMonotonicTimestamp);
                    report.backward_steps += 1;
                    continue;
                }
            }

            fix.timestamp = timestamp;
            previous = Some((fix.raw_time, timestamp));
            usable.push(idx);
        }

        if usable.is_empty() {
            return Err(FlightError::MalformedInput(format!(
                "none of the {} fixes has a usable timestamp and position",
                draft.fixes.len()
            )));
        }

        self.logger.record(&format!(
            "usable {} of {} fixes, rollovers {}, duplicates {}, backward {}",
            usable.len(),
            draft.fixes.len(),
            report.rollovers,
            report.duplicates,
            report.backward_steps
        ));

        draft.usable = usable;
        draft.timeline = report;
        Ok(())
    }
}
