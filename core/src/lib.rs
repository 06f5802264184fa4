//! Analysis core for glider flight-recorder logs.
//!
//! Raw fixes go through a fixed pipeline of processing stages (timeline,
//! kinematics, flying and circling detection, segmentation, validation) and
//! come out as an immutable [`Flight`]. A [`task::Task`] can then be scored
//! against any finished flight.

pub mod config;
pub mod flight;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod recorder;
pub mod task;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use config::AnalysisConfig;
pub use flight::{Flight, Glide, Thermal};
pub use prelude::{FlightError, FlightResult, Note, ProcessingStage, Severity};
pub use recorder::{AltitudeSource, Fix, RawFix};
pub use task::{Task, TaskClock, TaskProgress, Turnpoint, TurnpointKind};
