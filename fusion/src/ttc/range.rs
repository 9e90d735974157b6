//! Lidar TTC from the closing rate of in-lane forward range

use super::{valid_frame_rate, Ttc, UndefinedReason, DEGENERATE_EPS};
use crate::types::RangePoint;
use serde::{Deserialize, Serialize};

/// How the forward ranges of in-lane points are reduced to one distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatistic {
    /// Mean forward range; less sensitive to single stray returns
    #[default]
    Mean,
    /// Closest forward range
    Minimum,
}

/// Reduced forward range over points with |y| <= `lane_half_width`
pub fn lane_range(
    points: &[RangePoint],
    lane_half_width: f64,
    statistic: RangeStatistic,
) -> Option<f64> {
    let mut lane = points
        .iter()
        .filter(|p| p.y.abs() <= lane_half_width)
        .map(|p| p.x);

    match statistic {
        RangeStatistic::Mean => {
            let (sum, count) = lane.fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
            (count > 0).then(|| sum / count as f64)
        }
        RangeStatistic::Minimum => {
            let first = lane.next()?;
            Some(lane.fold(first, f64::min))
        }
    }
}

/// TTC = d_curr * dt / (d_prev - d_curr)
pub fn range_ttc(
    prev_points: &[RangePoint],
    curr_points: &[RangePoint],
    frame_rate: f64,
    lane_half_width: f64,
    statistic: RangeStatistic,
) -> Ttc {
    if !valid_frame_rate(frame_rate) {
        return Ttc::Undefined(UndefinedReason::InvalidFrameRate);
    }

    let (Some(d_prev), Some(d_curr)) = (
        lane_range(prev_points, lane_half_width, statistic),
        lane_range(curr_points, lane_half_width, statistic),
    ) else {
        log::debug!(
            "Lidar TTC undefined: {} previous / {} current points, none in lane for one frame",
            prev_points.len(),
            curr_points.len()
        );
        return Ttc::Undefined(UndefinedReason::NoLanePoints);
    };

    let closing = d_prev - d_curr;
    if closing.abs() <= DEGENERATE_EPS {
        return Ttc::Undefined(UndefinedReason::NoClosing);
    }

    let dt = 1.0 / frame_rate;
    Ttc::from_value(d_curr * dt / closing, UndefinedReason::NoClosing)
}
