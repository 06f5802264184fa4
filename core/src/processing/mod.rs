pub mod detection;
pub mod kinematics;
pub mod segments;
pub mod smoother;
pub mod timeline;
pub mod validator;

pub use detection::{CirclingStage, FlyingStage};
pub use kinematics::{AltitudeReport, ChannelHealth, KinematicsStage};
pub use segments::SegmentStage;
pub use smoother::{BinaryStateSmoother, SmootherOverrides, SmootherParams};
pub use timeline::{TimelineReport, TimelineStage};
pub use validator::{Check, CheckInput, ValidationStage, Validator};
