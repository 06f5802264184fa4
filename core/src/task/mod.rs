//! Scoring a finished flight against an ordered list of turnpoints.

pub mod evaluator;
pub mod turnpoint;

pub use evaluator::{Reach, TaskCursor};
pub use turnpoint::{Turnpoint, TurnpointKind};

use serde::{Deserialize, Serialize};

use crate::flight::Flight;
use crate::telemetry::log::LogManager;

/// Maps recorder timestamps onto the task day.
///
/// `midnight_offset_s` is the recorder-clock timestamp of the task day's
/// local midnight, so a UTC recorder flying at UTC+2 uses -7200.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TaskClock {
    pub midnight_offset_s: f64,
}

impl TaskClock {
    pub fn task_time(&self, timestamp: f64) -> f64 {
        timestamp - self.midnight_offset_s
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub turnpoints: Vec<Turnpoint>,
    /// Seconds past midnight; starts only count at or after this time.
    pub start_time: f64,
    /// Seconds past midnight; nothing after this time is credited.
    pub end_time: f64,
}

impl Task {
    pub fn new(turnpoints: Vec<Turnpoint>, start_time: f64, end_time: f64) -> Self {
        Self {
            turnpoints,
            start_time,
            end_time,
        }
    }

    /// Scans the usable fixes once. Never fails; an impossible task just
    /// yields a short prefix.
    pub fn evaluate(&self, flight: &Flight, clock: TaskClock) -> TaskProgress {
        let mut cursor = TaskCursor::new(self, clock);
        for fix in flight.usable_fixes() {
            if !cursor.advance(fix) {
                break;
            }
        }
        let progress = TaskProgress {
            reached: cursor.into_reached(),
            turnpoint_count: self.turnpoints.len(),
        };
        LogManager::new("task").record(&format!(
            "reached {} of {} turnpoints",
            progress.reached.len(),
            progress.turnpoint_count
        ));
        progress
    }
}

/// Ordered prefix of the task's turnpoints that the flight achieved.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskProgress {
    pub reached: Vec<Reach>,
    pub turnpoint_count: usize,
}

impl TaskProgress {
    pub fn reached_count(&self) -> usize {
        self.reached.len()
    }

    pub fn is_complete(&self) -> bool {
        self.reached.len() == self.turnpoint_count
    }

    /// Seconds from the start to the end of the speed section, or to goal
    /// when the task has no explicit end of speed section.
    pub fn speed_section_time(&self) -> Option<f64> {
        let start = self.reached.iter().find(|r| r.kind.is_start())?;
        let end = self
            .reached
            .iter()
            .find(|r| r.kind == TurnpointKind::EndOfSpeedSection)
            .or_else(|| self.reached.iter().find(|r| r.kind == TurnpointKind::GoalCylinder))?;
        Some(end.timestamp - start.timestamp)
    }
}
