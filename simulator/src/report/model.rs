use crate::workflow::runner::{FlightRun, RejectedInput};
use serde::Serialize;
use soarcore::telemetry::Metrics;
use soarcore::{AltitudeSource, Glide, Note, TaskProgress, Thermal};

#[derive(Debug, Clone, Serialize)]
pub struct ThermalSummary {
    pub enter_time: f64,
    pub exit_time: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub duration_s: f64,
    pub altitude_change_m: f64,
    pub vertical_velocity_ms: f64,
}

impl From<Thermal<'_>> for ThermalSummary {
    fn from(thermal: Thermal<'_>) -> Self {
        let enter = thermal.enter_fix();
        Self {
            enter_time: enter.timestamp,
            exit_time: thermal.exit_fix().timestamp,
            latitude: enter.latitude,
            longitude: enter.longitude,
            duration_s: thermal.duration(),
            altitude_change_m: thermal.altitude_change(),
            vertical_velocity_ms: thermal.vertical_velocity(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GlideSummary {
    pub enter_time: f64,
    pub exit_time: f64,
    pub duration_s: f64,
    pub track_length_m: f64,
    pub average_speed_kmh: f64,
    pub altitude_change_m: f64,
    pub glide_ratio: Option<f64>,
}

impl From<Glide<'_>> for GlideSummary {
    fn from(glide: Glide<'_>) -> Self {
        Self {
            enter_time: glide.enter_fix().timestamp,
            exit_time: glide.exit_fix().timestamp,
            duration_s: glide.duration(),
            track_length_m: glide.track_length(),
            average_speed_kmh: glide.average_speed(),
            altitude_change_m: glide.altitude_change(),
            glide_ratio: glide.glide_ratio(),
        }
    }
}

/// Everything the driver prints or writes about one flight.
#[derive(Debug, Clone, Serialize)]
pub struct FlightReport {
    pub name: String,
    pub valid: bool,
    pub altitude_source: AltitudeSource,
    pub fix_count: usize,
    pub usable_fix_count: usize,
    pub day_rollovers: usize,
    pub takeoff_time: Option<f64>,
    pub landing_time: Option<f64>,
    pub notes: Vec<Note>,
    pub thermals: Vec<ThermalSummary>,
    pub glides: Vec<GlideSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskProgress>,
}

impl FlightReport {
    pub fn from_run(run: &FlightRun) -> Self {
        let flight = &run.flight;
        Self {
            name: run.name.clone(),
            valid: flight.is_valid(),
            altitude_source: flight.altitude_source(),
            fix_count: flight.fixes().len(),
            usable_fix_count: flight.usable_fixes().count(),
            day_rollovers: flight.timeline_report().rollovers,
            takeoff_time: flight.takeoff_fix().map(|fix| fix.timestamp),
            landing_time: flight.landing_fix().map(|fix| fix.timestamp),
            notes: flight.notes().to_vec(),
            thermals: flight.thermals().map(ThermalSummary::from).collect(),
            glides: flight.glides().map(GlideSummary::from).collect(),
            task: run.progress.clone(),
        }
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{}: valid={} fixes={} (usable {}) altitude={} thermals={} glides={}",
            self.name,
            self.valid,
            self.fix_count,
            self.usable_fix_count,
            self.altitude_source,
            self.thermals.len(),
            self.glides.len()
        )];
        if let (Some(takeoff), Some(landing)) = (self.takeoff_time, self.landing_time) {
            lines.push(format!(
                "  takeoff {} landing {} ({:.0} min)",
                clock(takeoff),
                clock(landing),
                (landing - takeoff) / 60.0
            ));
        }
        lines.extend(self.notes.iter().map(|note| format!("  {}", note)));
        lines.extend(self.thermals.iter().map(|t| {
            format!(
                "  thermal {} {:.0} s, {:+.0} m, {:.2} m/s",
                clock(t.enter_time),
                t.duration_s,
                t.altitude_change_m,
                t.vertical_velocity_ms
            )
        }));
        if let Some(task) = &self.task {
            lines.push(format!(
                "  task: {} of {} turnpoints{}",
                task.reached_count(),
                task.turnpoint_count,
                if task.is_complete() { ", complete" } else { "" }
            ));
        }
        lines
    }
}

/// Unwrapped timestamp as HH:MM:SS, with a day suffix past midnight.
fn clock(timestamp: f64) -> String {
    let secs = timestamp.round() as i64;
    let (days, secs) = (secs.div_euclid(86_400), secs.rem_euclid(86_400));
    let base = format!("{:02}:{:02}:{:02}", secs / 3_600, secs / 60 % 60, secs % 60);
    if days > 0 {
        format!("{}+{}d", base, days)
    } else {
        base
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub flights: Vec<FlightReport>,
    pub rejected: Vec<RejectedInput>,
    pub metrics: Metrics,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<Result<FlightRun, RejectedInput>>, metrics: Metrics) -> Self {
        let mut flights = Vec::new();
        let mut rejected = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(run) => flights.push(FlightReport::from_run(&run)),
                Err(input) => rejected.push(input),
            }
        }
        Self {
            flights,
            rejected,
            metrics,
        }
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.flights.iter().flat_map(FlightReport::summary_lines).collect();
        lines.extend(
            self.rejected
                .iter()
                .map(|input| format!("{}: rejected, {}", input.name, input.reason)),
        );
        lines.push(format!(
            "Batch -> analysed {}, invalid {}, rejected {}, thermals {}",
            self.metrics.analyzed, self.metrics.invalid, self.metrics.rejected, self.metrics.thermals
        ));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::build_fixes;
    use crate::generator::template::preset;
    use crate::workflow::config::WorkflowConfig;
    use crate::workflow::runner::Runner;

    fn report_for(name: &str) -> FlightReport {
        let fixes = build_fixes(&preset(name).unwrap()).unwrap();
        let run = Runner::new(WorkflowConfig::default())
            .execute(name, &fixes)
            .unwrap();
        FlightReport::from_run(&run)
    }

    #[test]
    fn report_mirrors_flight() {
        let report = report_for("single_thermal");
        assert!(report.valid);
        assert_eq!(report.thermals.len(), 1);
        assert_eq!(report.glides.len(), 2);
        assert_eq!(report.takeoff_time, Some(36_061.0));
        assert!(report.summary_lines()[0].starts_with("single_thermal: valid=true"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["altitude_source"], "pressure");
        assert!(json.get("task").is_none());
    }

    #[test]
    fn fallback_warning_is_reported() {
        let report = report_for("no_barograph");
        assert_eq!(report.altitude_source, AltitudeSource::Gnss);
        assert!(report.valid);
        assert!(report
            .summary_lines()
            .iter()
            .any(|line| line.starts_with("  Warning:")));
    }

    #[test]
    fn batch_report_lists_rejected_inputs() {
        let runner = Runner::new(WorkflowConfig::default());
        let fixes = build_fixes(&preset("straight_glide").unwrap()).unwrap();
        let outcomes = vec![
            Ok(runner.execute("glide", &fixes).unwrap()),
            Err(RejectedInput {
                name: "broken.json".to_string(),
                reason: "analysing broken.json: malformed input".to_string(),
            }),
        ];
        let report = BatchReport::from_outcomes(outcomes, runner.metrics());
        assert_eq!(report.flights.len(), 1);
        assert_eq!(report.rejected[0].name, "broken.json");
        let lines = report.summary_lines();
        assert!(lines.iter().any(|line| line.starts_with("broken.json: rejected")));
        assert!(lines.last().unwrap().starts_with("Batch -> analysed 1"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rejected"][0]["name"], "broken.json");
    }

    #[test]
    fn clock_formats_unwrapped_times() {
        assert_eq!(clock(3_723.0), "01:02:03");
        assert_eq!(clock(86_400.0 + 60.0), "00:01:00+1d");
    }
}
