//! Takeoff/landing detection and the thermal/glide partition.

use crate::config::{FlightPick, SegmentConfig};
use crate::flight::segment::{SegmentKind, SegmentSpan};
use crate::prelude::{AnalysisConfig, FlightDraft, FlightError, FlightResult, Note, ProcessingStage};
use crate::telemetry::log::LogManager;

/// Positions in `usable` of the takeoff and landing fixes.
pub fn find_takeoff_landing(flying: &[bool], pick: FlightPick) -> (Option<usize>, Option<usize>) {
    let Some(takeoff) = (1..flying.len()).find(|&p| !flying[p - 1] && flying[p]) else {
        return (None, None);
    };
    let mut landings = (takeoff + 1..flying.len()).filter(|&p| flying[p - 1] && !flying[p]);
    let landing = match pick {
        FlightPick::First => landings.next(),
        FlightPick::Concat => landings.last(),
    };
    (Some(takeoff), landing)
}

/// Splits `[takeoff, landing]` into alternating runs of `circling`.
///
/// Works on positions into the usable sequence; consecutive runs share a
/// boundary position.
pub fn partition_runs(circling: &[bool], takeoff: usize, landing: usize) -> Vec<(bool, usize, usize)> {
    let mut runs = Vec::new();
    if landing <= takeoff {
        return runs;
    }
    let mut start = takeoff;
    let mut current = circling[takeoff];
    for pos in takeoff + 1..=landing {
        if circling[pos] != current {
            runs.push((current, start, pos));
            start = pos;
            current = circling[pos];
        }
    }
    if start < landing {
        runs.push((current, start, landing));
    }
    runs
}

/// Turns short circling runs into glide and merges neighbours of the same kind.
pub fn fold_short_thermals(
    runs: Vec<(bool, usize, usize)>,
    duration: impl Fn(usize, usize) -> f64,
    min_time_for_thermal_s: f64,
) -> Vec<(bool, usize, usize)> {
    let mut folded: Vec<(bool, usize, usize)> = Vec::with_capacity(runs.len());
    for (circling, start, end) in runs {
        let circling = circling && duration(start, end) >= min_time_for_thermal_s - 1e-5;
        match folded.last_mut() {
            Some(last) if last.0 == circling => last.2 = end,
            _ => folded.push((circling, start, end)),
        }
    }
    folded
}

pub struct SegmentStage {
    pick: Option<FlightPick>,
    config: Option<SegmentConfig>,
    logger: LogManager,
}

impl SegmentStage {
    pub fn new() -> Self {
        Self {
            pick: None,
            config: None,
            logger: LogManager::new("segments"),
        }
    }
}

impl Default for SegmentStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for SegmentStage {
    fn name(&self) -> &'static str {
        "segments"
    }

    fn initialize(&mut self, config: &AnalysisConfig) -> FlightResult<()> {
        self.pick = Some(config.flying.pick);
        self.config = Some(config.segments.clone());
        Ok(())
    }

    fn execute(&mut self, draft: &mut FlightDraft) -> FlightResult<()> {
        let (pick, config) = self
            .pick
            .zip(self.config.as_ref())
            .ok_or(FlightError::Uninitialized("segments"))?;

        let flying: Vec<bool> = draft.usable_fixes().map(|f| f.flying).collect();
        let circling: Vec<bool> = draft.usable_fixes().map(|f| f.circling).collect();
        let times: Vec<f64> = draft.usable_fixes().map(|f| f.timestamp).collect();

        let (takeoff, landing) = find_takeoff_landing(&flying, pick);
        let Some(takeoff) = takeoff else {
            self.logger.caution("no takeoff detected");
            draft
                .notes
                .push(Note::error("takeoff", "did not detect takeoff."));
            return Ok(());
        };
        draft.takeoff = Some(draft.usable[takeoff]);
        let Some(landing) = landing else {
            self.logger.caution("no landing detected");
            draft
                .notes
                .push(Note::error("landing", "did not detect landing."));
            return Ok(());
        };
        draft.landing = Some(draft.usable[landing]);

        let runs = partition_runs(&circling, takeoff, landing);
        let folded = fold_short_thermals(
            runs,
            |start, end| times[end] - times[start],
            config.min_time_for_thermal_s,
        );

        draft.segments = folded
            .into_iter()
            .map(|(circling, start, end)| {
                let kind = if circling {
                    SegmentKind::Thermal
                } else {
                    SegmentKind::Glide
                };
                SegmentSpan::new(kind, draft.usable[start], draft.usable[end])
            })
            .collect();

        let thermals = draft
            .segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Thermal)
            .count();
        self.logger.record(&format!(
            "takeoff fix {}, landing fix {}, {} thermals, {} glides",
            draft.usable[takeoff],
            draft.usable[landing],
            thermals,
            draft.segments.len() - thermals
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takeoff_requires_initial_ground_run() {
        assert_eq!(find_takeoff_landing(&[true, true, false], FlightPick::Concat), (None, None));
        assert_eq!(find_takeoff_landing(&[false, false], FlightPick::Concat), (None, None));
        assert_eq!(find_takeoff_landing(&[], FlightPick::Concat), (None, None));
    }

    #[test]
    fn missing_landing_is_reported_as_none() {
        assert_eq!(
            find_takeoff_landing(&[false, true, true], FlightPick::Concat),
            (Some(1), None)
        );
    }

    #[test]
    fn pick_selects_first_or_last_landing() {
        let flying = [false, true, true, false, false, true, false];
        assert_eq!(find_takeoff_landing(&flying, FlightPick::First), (Some(1), Some(3)));
        assert_eq!(find_takeoff_landing(&flying, FlightPick::Concat), (Some(1), Some(6)));
    }

    #[test]
    fn runs_alternate_and_share_boundaries() {
        let circling = [false, false, true, true, false, false, true, false];
        let runs = partition_runs(&circling, 1, 7);
        assert_eq!(runs, vec![(false, 1, 2), (true, 2, 4), (false, 4, 6), (true, 6, 7)]);
    }

    #[test]
    fn trailing_change_at_landing_adds_no_empty_run() {
        let circling = [false, true, true, false];
        assert_eq!(partition_runs(&circling, 1, 3), vec![(true, 1, 3)]);
    }

    #[test]
    fn short_thermals_merge_into_glides() {
        let runs = vec![(false, 0, 10), (true, 10, 20), (false, 20, 100), (true, 100, 200), (false, 200, 210)];
        let folded = fold_short_thermals(runs, |s, e| (e - s) as f64, 60.0);
        assert_eq!(folded, vec![(false, 0, 100), (true, 100, 200), (false, 200, 210)]);
    }
}
