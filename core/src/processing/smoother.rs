//! Two-state maximum-likelihood sequence decoder.
//!
//! Each observation is scored against an `on` and an `off` state through a
//! soft threshold, and switching state between consecutive samples costs a
//! fixed penalty. The decoder keeps, per sample and per state, the cheapest
//! path ending there plus a backpointer, then traces the globally optimal
//! path back from the cheaper final state. Scores are negative
//! log-probabilities, so the optimum is a minimum.

use serde::{Deserialize, Serialize};

/// Emission and transition model of the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmootherParams {
    /// Observation value at which both states are equally likely.
    pub threshold: f64,
    /// Logistic softness around the threshold; zero gives a hard step.
    pub band: f64,
    /// Emission probability of the state that agrees with the observation.
    pub confidence: f64,
    /// Prior probability of starting in the `on` state.
    pub initial_on: f64,
    pub on_to_off: f64,
    pub off_to_on: f64,
}

impl SmootherParams {
    pub fn validate(&self) -> Result<(), String> {
        if !self.threshold.is_finite() {
            return Err("threshold must be finite".into());
        }
        if !(self.band.is_finite() && self.band >= 0.0) {
            return Err(format!("band {} must be a non-negative number", self.band));
        }
        if !(self.confidence > 0.5 && self.confidence < 1.0) {
            return Err(format!("confidence {} outside (0.5, 1)", self.confidence));
        }
        for (name, p) in [
            ("initial_on", self.initial_on),
            ("on_to_off", self.on_to_off),
            ("off_to_on", self.off_to_on),
        ] {
            if !(p > 0.0 && p < 1.0) {
                return Err(format!("{name} {p} outside (0, 1)"));
            }
        }
        Ok(())
    }

    /// Probability that `value` was emitted by the `on` state.
    fn on_likelihood(&self, value: f64) -> f64 {
        let step = if self.band > 0.0 {
            1.0 / (1.0 + (-(value - self.threshold) / self.band).exp())
        } else if value > self.threshold {
            1.0
        } else {
            0.0
        };
        (1.0 - self.confidence) + (2.0 * self.confidence - 1.0) * step
    }

    /// Emission costs indexed by state (`[off, on]`).
    fn emission_costs(&self, value: f64) -> [f64; 2] {
        // NaN observations carry no evidence either way.
        let q = if value.is_nan() {
            0.5
        } else {
            self.on_likelihood(value)
        };
        [-(1.0 - q).ln(), -q.ln()]
    }

    /// Transition costs indexed by `[from][to]`.
    fn transition_costs(&self) -> [[f64; 2]; 2] {
        [
            [-(1.0 - self.off_to_on).ln(), -self.off_to_on.ln()],
            [-self.on_to_off.ln(), -(1.0 - self.on_to_off).ln()],
        ]
    }
}

/// A partial [`SmootherParams`] document; unset fields keep a base value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmootherOverrides {
    pub threshold: Option<f64>,
    pub band: Option<f64>,
    pub confidence: Option<f64>,
    pub initial_on: Option<f64>,
    pub on_to_off: Option<f64>,
    pub off_to_on: Option<f64>,
}

impl SmootherOverrides {
    pub fn apply(self, base: SmootherParams) -> SmootherParams {
        SmootherParams {
            threshold: self.threshold.unwrap_or(base.threshold),
            band: self.band.unwrap_or(base.band),
            confidence: self.confidence.unwrap_or(base.confidence),
            initial_on: self.initial_on.unwrap_or(base.initial_on),
            on_to_off: self.on_to_off.unwrap_or(base.on_to_off),
            off_to_on: self.off_to_on.unwrap_or(base.off_to_on),
        }
    }
}

const OFF: usize = 0;
const ON: usize = 1;

pub struct BinaryStateSmoother {
    params: SmootherParams,
}

impl BinaryStateSmoother {
    pub fn new(params: SmootherParams) -> Result<Self, String> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SmootherParams {
        &self.params
    }

    /// Returns the most likely state per observation; same length as the input.
    pub fn decode(&self, observations: &[f64]) -> Vec<bool> {
        let Some((&first, rest)) = observations.split_first() else {
            return Vec::new();
        };

        let transition = self.params.transition_costs();
        let first_emission = self.params.emission_costs(first);
        let mut cost = [
            -(1.0 - self.params.initial_on).ln() + first_emission[OFF],
            -self.params.initial_on.ln() + first_emission[ON],
        ];
        let mut backpointers: Vec<[u8; 2]> = Vec::with_capacity(rest.len());

        for &value in rest {
            let emission = self.params.emission_costs(value);
            let mut next = [0.0; 2];
            let mut pointer = [0u8; 2];
            for state in [OFF, ON] {
                let other = 1 - state;
                let stay = cost[state] + transition[state][state];
                let switch = cost[other] + transition[other][state];
                // Ties keep the current state.
                let (best, from) = if switch < stay {
                    (switch, other)
                } else {
                    (stay, state)
                };
                next[state] = best + emission[state];
                pointer[state] = from as u8;
            }
            cost = next;
            backpointers.push(pointer);
        }

        let mut state = if cost[ON] < cost[OFF] { ON } else { OFF };
        let mut path = vec![false; observations.len()];
        path[observations.len() - 1] = state == ON;
        for (step, pointer) in backpointers.iter().enumerate().rev() {
            state = pointer[state] as usize;
            path[step] = state == ON;
        }
        path
    }
}
