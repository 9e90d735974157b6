//! Camera TTC from the relative scale change of keypoint pairs

use super::{valid_frame_rate, Ttc, UndefinedReason, DEGENERATE_EPS};
use crate::error::{FrameSide, Result};
use crate::types::{keypoint_at, Correspondence, Keypoint};
use rayon::prelude::*;

/// Ratio of current to previous pixel distance for every unordered pair of
/// correspondences.
///
/// Pairs are skipped when the previous distance is zero or the current
/// distance is below `min_pair_distance`. The result is unsorted.
pub fn distance_ratios(
    prev_keypoints: &[Keypoint],
    curr_keypoints: &[Keypoint],
    matches: &[Correspondence],
    min_pair_distance: f64,
) -> Result<Vec<f64>> {
    let endpoints: Vec<(&Keypoint, &Keypoint)> = matches
        .iter()
        .map(|m| {
            Ok((
                keypoint_at(prev_keypoints, m.prev_idx, FrameSide::Previous)?,
                keypoint_at(curr_keypoints, m.curr_idx, FrameSide::Current)?,
            ))
        })
        .collect::<Result<_>>()?;

    let ratios = (0..endpoints.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let (outer_prev, outer_curr) = endpoints[i];
            endpoints[i + 1..]
                .iter()
                .filter_map(move |(inner_prev, inner_curr)| {
                    let dist_curr = outer_curr.distance_to(inner_curr);
                    let dist_prev = outer_prev.distance_to(inner_prev);

                    (dist_prev > f64::EPSILON && dist_curr >= min_pair_distance)
                        .then(|| dist_curr / dist_prev)
                })
        })
        .collect();

    Ok(ratios)
}

/// Median of the ratios; for an even count the lower of the two central values
pub fn median_ratio(ratios: &mut [f64]) -> Option<f64> {
    if ratios.is_empty() {
        return None;
    }
    ratios.sort_by(|a, b| a.total_cmp(b));
    Some(ratios[(ratios.len() - 1) / 2])
}

/// TTC = -dt / (1 - median ratio)
pub fn camera_ttc(
    prev_keypoints: &[Keypoint],
    curr_keypoints: &[Keypoint],
    matches: &[Correspondence],
    frame_rate: f64,
    min_pair_distance: f64,
) -> Result<Ttc> {
    if !valid_frame_rate(frame_rate) {
        return Ok(Ttc::Undefined(UndefinedReason::InvalidFrameRate));
    }
    if matches.is_empty() {
        return Ok(Ttc::Undefined(UndefinedReason::NoMatches));
    }

    let mut ratios = distance_ratios(prev_keypoints, curr_keypoints, matches, min_pair_distance)?;
    let Some(median) = median_ratio(&mut ratios) else {
        log::debug!(
            "Camera TTC undefined: none of {} matches formed a usable pair",
            matches.len()
        );
        return Ok(Ttc::Undefined(UndefinedReason::NoValidPairs));
    };

    let denominator = 1.0 - median;
    if denominator.abs() <= DEGENERATE_EPS {
        return Ok(Ttc::Undefined(UndefinedReason::NoScaleChange));
    }

    let dt = 1.0 / frame_rate;
    Ok(Ttc::from_value(-dt / denominator, UndefinedReason::NoScaleChange))
}
