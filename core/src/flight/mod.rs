//! The finished, read-only result of analysing one recorder log.

pub mod segment;

pub use segment::{Glide, SegmentKind, SegmentSpan, Thermal};

use crate::prelude::{AnalysisConfig, FlightDraft, FlightResult, Note, ProcessingStage};
use crate::processing::{
    AltitudeReport, CirclingStage, FlyingStage, KinematicsStage, SegmentStage, TimelineReport,
    TimelineStage, ValidationStage, Validator,
};
use crate::recorder::{AltitudeSource, Fix, RawFix};
use crate::telemetry::log::LogManager;

/// A flight owns its fixes; every derived entity refers back into them by index.
#[derive(Debug, Clone)]
pub struct Flight {
    fixes: Vec<Fix>,
    usable: Vec<usize>,
    segments: Vec<SegmentSpan>,
    takeoff: Option<usize>,
    landing: Option<usize>,
    altitude: AltitudeReport,
    timeline: TimelineReport,
    notes: Vec<Note>,
}

impl Flight {
    /// Runs the whole construction pipeline with the default check catalogue.
    pub fn analyze(raw: &[RawFix], config: &AnalysisConfig) -> FlightResult<Self> {
        Self::analyze_with_validator(raw, config, Validator::default())
    }

    pub fn analyze_with_validator(
        raw: &[RawFix],
        config: &AnalysisConfig,
        validator: Validator,
    ) -> FlightResult<Self> {
        config.validate()?;
        let logger = LogManager::new("flight");

        let mut stages: Vec<Box<dyn ProcessingStage>> = vec![
            Box::new(TimelineStage::new()),
            Box::new(KinematicsStage::new()),
            Box::new(FlyingStage::new()),
            Box::new(CirclingStage::new()),
            Box::new(SegmentStage::new()),
            Box::new(ValidationStage::new(validator)),
        ];

        let fixes = raw
            .iter()
            .enumerate()
            .map(|(idx, record)| Fix::from_raw(idx, record))
            .collect();
        let mut draft = FlightDraft::new(fixes);
        for stage in stages.iter_mut() {
            stage.initialize(config)?;
            stage.execute(&mut draft)?;
            logger.detail(&format!("stage {} done", stage.name()));
        }

        let flight = Self::from_draft(draft);
        logger.record(&format!(
            "{} fixes, {} thermals, valid {}",
            flight.fixes.len(),
            flight.thermals().count(),
            flight.is_valid()
        ));
        Ok(flight)
    }

    fn from_draft(draft: FlightDraft) -> Self {
        Self {
            fixes: draft.fixes,
            usable: draft.usable,
            segments: draft.segments,
            takeoff: draft.takeoff,
            landing: draft.landing,
            altitude: draft.altitude,
            timeline: draft.timeline,
            notes: draft.notes,
        }
    }

    /// Every input record, defective ones included.
    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    pub fn usable_fixes(&self) -> impl Iterator<Item = &Fix> + '_ {
        self.usable.iter().map(move |&idx| &self.fixes[idx])
    }

    pub fn segments(&self) -> &[SegmentSpan] {
        &self.segments
    }

    pub fn thermals(&self) -> impl Iterator<Item = Thermal<'_>> + '_ {
        self.segments
            .iter()
            .filter(|span| span.kind == SegmentKind::Thermal)
            .map(move |&span| Thermal::new(&self.fixes, span))
    }

    pub fn glides(&self) -> impl Iterator<Item = Glide<'_>> + '_ {
        self.segments
            .iter()
            .filter(|span| span.kind == SegmentKind::Glide)
            .map(move |&span| Glide::new(&self.fixes, span))
    }

    pub fn takeoff_fix(&self) -> Option<&Fix> {
        self.takeoff.map(|idx| &self.fixes[idx])
    }

    pub fn landing_fix(&self) -> Option<&Fix> {
        self.landing.map(|idx| &self.fixes[idx])
    }

    pub fn altitude_source(&self) -> AltitudeSource {
        self.altitude.chosen
    }

    pub fn altitude_report(&self) -> &AltitudeReport {
        &self.altitude
    }

    pub fn timeline_report(&self) -> &TimelineReport {
        &self.timeline
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// False as soon as any check or stage reported an error.
    pub fn is_valid(&self) -> bool {
        !self.notes.iter().any(Note::is_error)
    }
}

impl std::fmt::Display for Flight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Flight(valid={}, fixes={}, thermals={}, glides={}, altitude={})",
            self.is_valid(),
            self.fixes.len(),
            self.thermals().count(),
            self.glides().count(),
            self.altitude.chosen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlightPick;
    use crate::prelude::FlightError;
    use crate::testing::TrackBuilder;

    fn scenario_a() -> Vec<RawFix> {
        TrackBuilder::new(46.0, 12.0, 90.0)
            .stationary(60)
            .straight(300, 40.0, -1.0)
            .stationary(60)
            .build()
    }

    fn scenario_b() -> Vec<RawFix> {
        TrackBuilder::new(46.0, 12.0, 90.0)
            .stationary(60)
            .straight(90, 40.0, -1.0)
            .turn(120, 40.0, 10.0, 1.5)
            .straight(90, 40.0, -1.0)
            .stationary(60)
            .build()
    }

    fn analyze(raw: &[RawFix]) -> Flight {
        Flight::analyze(raw, &AnalysisConfig::default()).unwrap()
    }

    fn assert_tiles(flight: &Flight) {
        let segments = flight.segments();
        let takeoff = flight.takeoff.unwrap();
        let landing = flight.landing.unwrap();
        assert_eq!(segments.first().unwrap().enter, takeoff);
        assert_eq!(segments.last().unwrap().exit, landing);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].exit, pair[1].enter);
            assert_ne!(pair[0].kind, pair[1].kind);
        }
        let covered: f64 = segments.iter().map(|s| s.duration(flight.fixes())).sum();
        let span = flight.landing_fix().unwrap().timestamp - flight.takeoff_fix().unwrap().timestamp;
        assert!((covered - span).abs() < 1e-6);
    }

    #[test]
    fn straight_flight_is_one_glide() {
        let flight = analyze(&scenario_a());
        assert!(flight.is_valid(), "{:?}", flight.notes());
        assert_eq!(flight.takeoff, Some(61));
        assert_eq!(flight.landing, Some(361));
        assert_eq!(flight.thermals().count(), 0);
        let glides: Vec<_> = flight.glides().collect();
        assert_eq!(glides.len(), 1);
        assert!((glides[0].duration() - 300.0).abs() < 5.0);
        assert!(glides[0].glide_ratio().is_some());
        assert_eq!(flight.altitude_source(), AltitudeSource::Pressure);
        assert_tiles(&flight);
    }

    #[test]
    fn circling_window_splits_the_glide() {
        let flight = analyze(&scenario_b());
        assert!(flight.is_valid(), "{:?}", flight.notes());
        let thermals: Vec<_> = flight.thermals().collect();
        assert_eq!(thermals.len(), 1);
        let thermal = thermals[0];
        assert!((thermal.duration() - 120.0).abs() < 10.0, "{}", thermal.duration());
        // Circling starts 150 s after the log begins.
        assert!((thermal.enter_fix().timestamp - 36_150.0).abs() < 10.0);
        assert!(thermal.vertical_velocity() > 1.0);
        assert_eq!(flight.glides().count(), 2);
        assert_eq!(flight.segments()[1].kind, SegmentKind::Thermal);
        assert_tiles(&flight);
    }

    #[test]
    fn glide_track_never_shorter_than_chord() {
        let flight = analyze(&scenario_b());
        for glide in flight.glides() {
            assert!(glide.track_length() + 1e-6 >= glide.chord_length());
        }
    }

    #[test]
    fn duplicates_stay_in_the_audit_sequence() {
        let mut raw = scenario_a();
        let copy = raw[100].clone();
        raw.insert(101, copy);
        let flight = analyze(&raw);
        assert_eq!(flight.fixes().len(), raw.len());
        assert_eq!(flight.usable_fixes().count(), raw.len() - 1);
        assert_eq!(flight.timeline_report().duplicates, 1);
        assert!(flight.is_valid());
    }

    #[test]
    fn missing_landing_is_a_soft_failure() {
        let raw = TrackBuilder::new(46.0, 12.0, 90.0)
            .stationary(60)
            .straight(300, 40.0, -1.0)
            .build();
        let flight = analyze(&raw);
        assert!(!flight.is_valid());
        assert!(flight.takeoff_fix().is_some());
        assert!(flight.landing_fix().is_none());
        assert!(flight.segments().is_empty());
        assert!(flight.notes().iter().any(|n| n.check == "landing"));
    }

    #[test]
    fn never_flying_has_no_takeoff() {
        let raw = TrackBuilder::new(46.0, 12.0, 90.0).stationary(120).build();
        let flight = analyze(&raw);
        assert!(!flight.is_valid());
        assert!(flight.takeoff_fix().is_none());
        assert_eq!(flight.thermals().count(), 0);
    }

    #[test]
    fn huge_altitude_step_invalidates_flight() {
        let mut raw = scenario_a();
        for fix in raw.iter_mut().skip(200) {
            fix.gnss_altitude += 5_000.0;
            fix.pressure_altitude = fix.pressure_altitude.map(|alt| alt + 5_000.0);
        }
        let flight = analyze(&raw);
        assert!(!flight.is_valid());
        assert!(flight
            .notes()
            .iter()
            .any(|n| n.message.contains("implausible altitude change")));
    }

    #[test]
    fn pick_controls_which_landing_is_used() {
        let raw = TrackBuilder::new(46.0, 12.0, 90.0)
            .stationary(60)
            .straight(300, 40.0, -1.0)
            .stationary(400)
            .straight(300, 40.0, -1.0)
            .stationary(60)
            .build();

        let concat = analyze(&raw);
        assert_eq!(concat.landing, Some(1061));

        let mut config = AnalysisConfig::default();
        config.flying.pick = FlightPick::First;
        let first = Flight::analyze(&raw, &config).unwrap();
        assert_eq!(first.landing, Some(361));
        assert!(first.landing < concat.landing);
    }

    #[test]
    fn short_stop_is_not_a_landing() {
        let raw = TrackBuilder::new(46.0, 12.0, 90.0)
            .stationary(60)
            .straight(300, 40.0, -1.0)
            .stationary(100)
            .straight(300, 40.0, -1.0)
            .stationary(60)
            .build();
        let mut config = AnalysisConfig::default();
        config.flying.pick = FlightPick::First;
        let flight = Flight::analyze(&raw, &config).unwrap();
        assert_eq!(flight.landing, Some(761));
    }

    #[test]
    fn flight_across_midnight_is_unwrapped() {
        let mut raw = TrackBuilder::starting_at(86_200.0, 46.0, 12.0, 90.0)
            .stationary(60)
            .straight(300, 40.0, -1.0)
            .stationary(60)
            .build();
        for fix in raw.iter_mut() {
            fix.timestamp = fix.timestamp.rem_euclid(86_400.0);
        }
        let flight = analyze(&raw);
        assert!(flight.is_valid(), "{:?}", flight.notes());
        assert_eq!(flight.timeline_report().rollovers, 1);
        let landing = flight.landing_fix().unwrap();
        assert_eq!(landing.timestamp, 86_200.0 + 361.0);
        assert!((flight.glides().next().unwrap().duration() - 300.0).abs() < 5.0);
    }

    #[test]
    fn empty_input_is_a_hard_failure() {
        let err = Flight::analyze(&[], &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, FlightError::MalformedInput(_)));
    }

    #[test]
    fn invalid_config_is_rejected_before_analysis() {
        let mut config = AnalysisConfig::default();
        config.circling.smoother.confidence = 1.5;
        let err = Flight::analyze(&scenario_a(), &config).unwrap_err();
        assert!(matches!(err, FlightError::InvalidConfig(_)));
    }

    #[test]
    fn flight_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Flight>();

        let flight = std::sync::Arc::new(analyze(&scenario_b()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let flight = flight.clone();
                std::thread::spawn(move || flight.thermals().count())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
    }
}
