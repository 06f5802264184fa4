use serde::{Deserialize, Serialize};

pub use crate::config::AnalysisConfig;
use crate::flight::segment::SegmentSpan;
use crate::processing::kinematics::AltitudeReport;
use crate::processing::timeline::TimelineReport;
use crate::recorder::Fix;

/// Hard failures. Everything else is reported through [`Note`]s.
#[derive(thiserror::Error, Debug)]
pub enum FlightError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("stage not initialized: {0}")]
    Uninitialized(&'static str),
}

pub type FlightResult<T> = Result<T, FlightError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Explanation attached to a flight by a check or stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub severity: Severity,
    pub check: String,
    pub message: String,
}

impl Note {
    pub fn warning(check: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            check: check.to_string(),
            message: message.into(),
        }
    }

    pub fn error(check: &str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            check: check.to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        write!(f, "{}: {}", label, self.message)
    }
}

/// Mutable state threaded through the construction pipeline.
///
/// Only the stages touch a draft; once the pipeline finishes it is frozen
/// into a [`crate::flight::Flight`].
#[derive(Debug, Clone, Default)]
pub struct FlightDraft {
    pub fixes: Vec<Fix>,
    /// Indices of fixes without a defect, in time order.
    pub usable: Vec<usize>,
    pub timeline: TimelineReport,
    pub altitude: AltitudeReport,
    pub takeoff: Option<usize>,
    pub landing: Option<usize>,
    pub segments: Vec<SegmentSpan>,
    pub notes: Vec<Note>,
}

impl FlightDraft {
    pub fn new(fixes: Vec<Fix>) -> Self {
        Self {
            fixes,
            ..Default::default()
        }
    }

    pub fn usable_fixes(&self) -> impl Iterator<Item = &Fix> + '_ {
        self.usable.iter().map(move |&idx| &self.fixes[idx])
    }
}

/// A single step of the flight construction pipeline.
pub trait ProcessingStage {
    fn name(&self) -> &'static str;
    fn initialize(&mut self, config: &AnalysisConfig) -> FlightResult<()>;
    fn execute(&mut self, draft: &mut FlightDraft) -> FlightResult<()>;
}
