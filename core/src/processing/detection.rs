use crate::config::FlyingConfig;
use crate::prelude::{AnalysisConfig, FlightDraft, FlightError, FlightResult, ProcessingStage};
use crate::processing::smoother::{BinaryStateSmoother, SmootherParams};
use crate::telemetry::log::LogManager;

fn build_smoother(params: &SmootherParams, stage: &str) -> FlightResult<BinaryStateSmoother> {
    BinaryStateSmoother::new(params.clone())
        .map_err(|msg| FlightError::InvalidConfig(format!("{stage} smoother: {msg}")))
}

/// Relabels ground runs between two airborne runs that are too short to be landings.
///
/// `states` and `times` are aligned; leading and trailing ground runs are kept.
pub fn bridge_short_stops(states: &mut [bool], times: &[f64], min_landing_time_s: f64) {
    let mut pos = 0;
    let mut seen_flying = false;
    while pos < states.len() {
        if states[pos] {
            seen_flying = true;
            pos += 1;
            continue;
        }
        let start = pos;
        while pos < states.len() && !states[pos] {
            pos += 1;
        }
        if seen_flying && pos < states.len() && times[pos] - times[start] < min_landing_time_s {
            states[start..pos].iter_mut().for_each(|s| *s = true);
        }
    }
}

/// Decodes the airborne state from ground speed.
pub struct FlyingStage {
    config: Option<FlyingConfig>,
    smoother: Option<BinaryStateSmoother>,
    logger: LogManager,
}

impl FlyingStage {
    pub fn new() -> Self {
        Self {
            config: None,
            smoother: None,
            logger: LogManager::new("flying"),
        }
    }
}

impl Default for FlyingStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for FlyingStage {
    fn name(&self) -> &'static str {
        "flying"
    }

    fn initialize(&mut self, config: &AnalysisConfig) -> FlightResult<()> {
        self.smoother = Some(build_smoother(&config.flying.smoother, "flying")?);
        self.config = Some(config.flying.clone());
        Ok(())
    }

    fn execute(&mut self, draft: &mut FlightDraft) -> FlightResult<()> {
        let (config, smoother) = self
            .config
            .as_ref()
            .zip(self.smoother.as_ref())
            .ok_or(FlightError::Uninitialized("flying"))?;

        let speeds: Vec<f64> = draft.usable_fixes().map(|f| f.ground_speed_kmh).collect();
        let times: Vec<f64> = draft.usable_fixes().map(|f| f.timestamp).collect();
        let mut states = smoother.decode(&speeds);
        bridge_short_stops(&mut states, &times, config.min_landing_time_s);

        for (&idx, &flying) in draft.usable.iter().zip(&states) {
            draft.fixes[idx].flying = flying;
        }
        let airborne = states.iter().filter(|&&s| s).count();
        self.logger
            .record(&format!("{} of {} fixes airborne", airborne, states.len()));
        Ok(())
    }
}

/// Decodes circling from the bearing change rate of airborne fixes.
pub struct CirclingStage {
    smoother: Option<BinaryStateSmoother>,
    logger: LogManager,
}

impl CirclingStage {
    pub fn new() -> Self {
        Self {
            smoother: None,
            logger: LogManager::new("circling"),
        }
    }
}

impl Default for CirclingStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for CirclingStage {
    fn name(&self) -> &'static str {
        "circling"
    }

    fn initialize(&mut self, config: &AnalysisConfig) -> FlightResult<()> {
        self.smoother = Some(build_smoother(&config.circling.smoother, "circling")?);
        Ok(())
    }

    fn execute(&mut self, draft: &mut FlightDraft) -> FlightResult<()> {
        let smoother = self
            .smoother
            .as_ref()
            .ok_or(FlightError::Uninitialized("circling"))?;

        let rates: Vec<f64> = draft
            .usable_fixes()
            .map(|f| if f.flying { f.bearing_change_rate.abs() } else { 0.0 })
            .collect();
        let states = smoother.decode(&rates);
        for (&idx, &circling) in draft.usable.iter().zip(&states) {
            draft.fixes[idx].circling = circling;
        }
        let circling = states.iter().filter(|&&s| s).count();
        self.logger
            .record(&format!("{} of {} fixes circling", circling, states.len()));
        Ok(())
    }
}
