/// Time primitives
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct Time(pub f64); // seconds

impl Time {
    pub fn from_millis(ms: f64) -> Self {
        Time(ms / 1000.0)
    }

    pub fn as_millis(self) -> f64 {
        self.0 * 1000.0
    }

    pub fn after_millis(self, ms: f64) -> Self {
        Time(self.0 + ms / 1000.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeSpan {
    pub start: Time,
    pub end: Time,
}

impl TimeSpan {
    pub fn starting_at(start: Time, duration_ms: f64) -> Self {
        Self {
            start,
            end: start.after_millis(duration_ms.max(0.0)),
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end.0 - self.start.0).max(0.0)
    }

    /// Normalized position of `t` within the span, clamped to `[0, 1]`.
    /// Zero-length spans are complete as soon as they start.
    pub fn progress(&self, t: Time) -> f64 {
        let d = self.duration();
        if d <= 0.0 {
            return if t.0 >= self.start.0 { 1.0 } else { 0.0 };
        }
        ((t.0 - self.start.0) / d).clamp(0.0, 1.0)
    }
}
