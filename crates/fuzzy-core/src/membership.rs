//! Trapezoidal fuzzification of a single coordinate.
//!
//! Each axis of the frame is split into five regions by four breakpoints
//! `a <= b <= c <= d`, all fractions of the frame extent:
//!
//! ```text
//!  1 ─────╮           ╭──────────╮           ╭───── 1
//!         │ ╲       ╱ │          │ ╲       ╱ │
//!  0      a   ╲   ╱   b          c   ╲   ╱   d      0
//!  exiting_negative   centered ...      exiting_positive
//! ```
//!
//! Inside a band the two adjacent memberships are `f` and `1 - f`, so they
//! always sum to one; outside the bands exactly one membership is 1.

use gimbal_control_model::{BandFractions, FrameGeometry, Orientation};
use serde::{Deserialize, Serialize};

/// Degrees of truth for "exiting toward negative", "centered", and
/// "exiting toward positive" (left/top, middle, right/bottom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MembershipVector {
    pub exiting_negative: f64,
    pub centered: f64,
    pub exiting_positive: f64,
}

impl MembershipVector {
    pub fn new(exiting_negative: f64, centered: f64, exiting_positive: f64) -> Self {
        Self {
            exiting_negative,
            centered,
            exiting_positive,
        }
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.exiting_negative, self.centered, self.exiting_positive]
    }

    pub fn sum(&self) -> f64 {
        self.exiting_negative + self.centered + self.exiting_positive
    }
}

/// Fuzzifies centroid components using per-orientation band placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembershipEvaluator {
    horizontal: BandFractions,
    vertical: BandFractions,
}

impl MembershipEvaluator {
    pub fn new(horizontal: BandFractions, vertical: BandFractions) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn band(&self, orientation: Orientation) -> BandFractions {
        match orientation {
            Orientation::Horizontal => self.horizontal,
            Orientation::Vertical => self.vertical,
        }
    }

    /// Membership of `coordinate` along `orientation` of `geometry`.
    pub fn evaluate(
        &self,
        coordinate: f64,
        geometry: &FrameGeometry,
        orientation: Orientation,
    ) -> MembershipVector {
        fuzzify(
            coordinate,
            geometry.extent(orientation),
            self.band(orientation),
        )
    }
}

impl Default for MembershipEvaluator {
    fn default() -> Self {
        Self::new(BandFractions::HORIZONTAL, BandFractions::VERTICAL)
    }
}

/// Fuzzify a coordinate over `[0, extent]`.
///
/// A NaN coordinate is treated as the center of the extent.
pub fn fuzzify(coordinate: f64, extent: f64, band: BandFractions) -> MembershipVector {
    let x = if coordinate.is_nan() {
        extent / 2.0
    } else {
        coordinate
    };

    let a = band.outer * extent;
    let b = band.inner * extent;
    let c = (1.0 - band.inner) * extent;
    let d = (1.0 - band.outer) * extent;

    let near = falling(x, a, b);
    let far = rising(x, c, d);

    MembershipVector {
        exiting_negative: near,
        centered: (1.0 - near).min(1.0 - far),
        exiting_positive: far,
    }
}

/// 1 up to `start`, 0 from `end`, linear in between.
fn falling(x: f64, start: f64, end: f64) -> f64 {
    if x <= start {
        1.0
    } else if x >= end {
        0.0
    } else {
        (end - x) / (end - start)
    }
}

/// 0 up to `start`, 1 from `end`, linear in between.
fn rising(x: f64, start: f64, end: f64) -> f64 {
    if x <= start {
        0.0
    } else if x >= end {
        1.0
    } else {
        (x - start) / (end - start)
    }
}
