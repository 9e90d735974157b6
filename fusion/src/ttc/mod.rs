//! Time-to-collision estimators
//!
//! Both estimators assume a constant closing velocity between two frames and
//! return a tagged `Ttc` rather than a NaN or infinity.

mod camera;
mod range;

pub use camera::{camera_ttc, distance_ratios, median_ratio};
pub use range::{lane_range, range_ttc, RangeStatistic};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this, a denominator is treated as zero
pub(crate) const DEGENERATE_EPS: f64 = 1e-9;

/// Why no time-to-collision could be derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// The box holds no filtered correspondences
    NoMatches,
    /// No keypoint pair passed the distance checks
    NoValidPairs,
    /// One of the frames has no range points inside the lane corridor
    NoLanePoints,
    /// Median distance ratio is 1: apparent size did not change
    NoScaleChange,
    /// Range did not change between frames
    NoClosing,
    InvalidFrameRate,
    /// The box was linked to a previous box no correspondence supports
    NoSupport,
}

/// Seconds until collision, or the reason it is unavailable.
///
/// A defined value may be negative when the object is moving away.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ttc {
    Seconds(f64),
    Undefined(UndefinedReason),
}

impl Ttc {
    /// Wrap a computed value, demoting non-finite results
    pub(crate) fn from_value(value: f64, reason: UndefinedReason) -> Self {
        if value.is_finite() {
            Ttc::Seconds(value)
        } else {
            Ttc::Undefined(reason)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Ttc::Seconds(s) => Some(*s),
            Ttc::Undefined(_) => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Ttc::Seconds(_))
    }

    pub fn undefined_reason(&self) -> Option<UndefinedReason> {
        match self {
            Ttc::Seconds(_) => None,
            Ttc::Undefined(reason) => Some(*reason),
        }
    }
}

impl fmt::Display for Ttc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttc::Seconds(s) => write!(f, "{:.2} s", s),
            Ttc::Undefined(reason) => write!(f, "undefined ({:?})", reason),
        }
    }
}

pub(crate) fn valid_frame_rate(frame_rate: f64) -> bool {
    frame_rate.is_finite() && frame_rate > 0.0
}
