use serde::{Deserialize, Serialize};

use crate::recorder::Fix;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Thermal,
    Glide,
}

/// Index range into the owning flight's fixes. `exit` is shared with the
/// next segment's `enter`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentSpan {
    pub kind: SegmentKind,
    pub enter: usize,
    pub exit: usize,
}

impl SegmentSpan {
    pub fn new(kind: SegmentKind, enter: usize, exit: usize) -> Self {
        Self { kind, enter, exit }
    }

    pub fn duration(&self, fixes: &[Fix]) -> f64 {
        fixes[self.exit].timestamp - fixes[self.enter].timestamp
    }
}

fn usable_between<'a>(fixes: &'a [Fix], span: SegmentSpan) -> impl Iterator<Item = &'a Fix> + 'a {
    fixes[span.enter..=span.exit].iter().filter(|f| f.is_usable())
}

/// A circling segment, borrowed from its flight.
#[derive(Debug, Clone, Copy)]
pub struct Thermal<'a> {
    fixes: &'a [Fix],
    span: SegmentSpan,
}

impl<'a> Thermal<'a> {
    pub(crate) fn new(fixes: &'a [Fix], span: SegmentSpan) -> Self {
        Self { fixes, span }
    }

    pub fn span(&self) -> SegmentSpan {
        self.span
    }

    pub fn enter_fix(&self) -> &'a Fix {
        &self.fixes[self.span.enter]
    }

    pub fn exit_fix(&self) -> &'a Fix {
        &self.fixes[self.span.exit]
    }

    /// Seconds spent circling.
    pub fn duration(&self) -> f64 {
        self.span.duration(self.fixes)
    }

    /// Meters gained (negative when sinking).
    pub fn altitude_change(&self) -> f64 {
        self.exit_fix().altitude - self.enter_fix().altitude
    }

    /// Average climb rate in m/s; zero for a zero-length thermal.
    pub fn vertical_velocity(&self) -> f64 {
        let duration = self.duration();
        if duration.abs() < 1e-7 {
            0.0
        } else {
            self.altitude_change() / duration
        }
    }
}

impl std::fmt::Display for Thermal<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.duration().round() as i64;
        write!(
            f,
            "Thermal(vertical_velocity={:.2} m/s, duration={}m {}s)",
            self.vertical_velocity(),
            secs / 60,
            secs % 60
        )
    }
}

/// A straight-flight segment between thermals, borrowed from its flight.
#[derive(Debug, Clone, Copy)]
pub struct Glide<'a> {
    fixes: &'a [Fix],
    span: SegmentSpan,
}

impl<'a> Glide<'a> {
    pub(crate) fn new(fixes: &'a [Fix], span: SegmentSpan) -> Self {
        Self { fixes, span }
    }

    pub fn span(&self) -> SegmentSpan {
        self.span
    }

    pub fn enter_fix(&self) -> &'a Fix {
        &self.fixes[self.span.enter]
    }

    pub fn exit_fix(&self) -> &'a Fix {
        &self.fixes[self.span.exit]
    }

    pub fn duration(&self) -> f64 {
        self.span.duration(self.fixes)
    }

    /// Length of the flown path in meters, summed over every leg.
    pub fn track_length(&self) -> f64 {
        let mut fixes = usable_between(self.fixes, self.span);
        let Some(mut previous) = fixes.next() else {
            return 0.0;
        };
        let mut total = 0.0;
        for fix in fixes {
            total += previous.distance_to(fix);
            previous = fix;
        }
        total
    }

    /// Straight-line distance between the entry and exit fixes, meters.
    pub fn chord_length(&self) -> f64 {
        self.enter_fix().distance_to(self.exit_fix())
    }

    /// Average speed along the track, km/h.
    pub fn average_speed(&self) -> f64 {
        let duration = self.duration();
        if duration <= 0.0 {
            0.0
        } else {
            self.track_length() / duration * 3.6
        }
    }

    pub fn altitude_change(&self) -> f64 {
        self.exit_fix().altitude - self.enter_fix().altitude
    }

    /// Distance flown per meter of altitude lost. `None` unless the glide lost altitude.
    pub fn glide_ratio(&self) -> Option<f64> {
        let change = self.altitude_change();
        if change < 0.0 && change.abs() > 1e-7 {
            Some(self.track_length() / change.abs())
        } else {
            None
        }
    }
}

impl std::fmt::Display for Glide<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.duration().round() as i64;
        let ratio = match self.glide_ratio() {
            Some(ratio) => format!("{:.1}", ratio),
            None => "n/a".to_string(),
        };
        write!(
            f,
            "Glide(dist={:.2} km, avg_speed={:.2} kph, avg L/D={} duration={}m {}s)",
            self.track_length() / 1000.0,
            self.average_speed(),
            ratio,
            secs / 60,
            secs % 60
        )
    }
}
