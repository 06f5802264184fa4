pub mod fix;

pub use fix::{AltitudeSource, Fix, FixDefect, RawFix};
