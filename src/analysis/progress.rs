// ProgressMapper - primary angle to completion percentage and bar extent
//
// The mapping is linear and clamped at both ends. It is computed for every
// frame and never throttled.

use serde::{Deserialize, Serialize};

use crate::profile::ProgressRange;

/// Pixel span of the progress bar; `start` is shown at 0%, `end` at 100%
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarRange {
    pub start: f64,
    pub end: f64,
}

impl Default for BarRange {
    fn default() -> Self {
        Self {
            start: 650.0,
            end: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub percent: f64,
    pub bar_extent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressMapper {
    range: ProgressRange,
    bar: BarRange,
}

impl ProgressMapper {
    pub fn new(range: ProgressRange, bar: BarRange) -> Self {
        Self { range, bar }
    }

    pub fn map(&self, angle: f64) -> Progress {
        let fraction = self.fraction(angle);
        Progress {
            percent: fraction * 100.0,
            bar_extent: self.bar.start + fraction * (self.bar.end - self.bar.start),
        }
    }

    /// Position of `angle` in the operating range, clamped to [0, 1]
    fn fraction(&self, angle: f64) -> f64 {
        let span = self.range.to - self.range.from;
        if span == 0.0 || !angle.is_finite() {
            return 0.0;
        }
        ((angle - self.range.from) / span).clamp(0.0, 1.0)
    }
}
