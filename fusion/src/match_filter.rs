//! Keypoint correspondence filtering per bounding box

use crate::error::{FrameSide, Result};
use crate::types::{keypoint_at, BoundingBox, Correspondence, Keypoint};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchFilterStats {
    /// Correspondences whose current endpoint lies in the box
    pub inside: usize,
    /// Kept after distance outlier rejection
    pub kept: usize,
    /// Mean descriptor distance of the inside set, if any
    pub mean_distance: Option<f64>,
}

/// Replace the box's matches with those ending inside its rectangle whose
/// descriptor distance is strictly below `ratio` times their mean distance.
///
/// A box containing no current endpoint ends with an empty match set.
pub fn cluster_matches_with_roi(
    bbox: &mut BoundingBox,
    prev_keypoints: &[Keypoint],
    curr_keypoints: &[Keypoint],
    matches: &[Correspondence],
    ratio: f64,
) -> Result<MatchFilterStats> {
    let mut inside = Vec::new();
    for m in matches {
        // Only the current endpoint decides membership, but a dangling
        // previous index would break the estimators later
        keypoint_at(prev_keypoints, m.prev_idx, FrameSide::Previous)?;
        let kpt = keypoint_at(curr_keypoints, m.curr_idx, FrameSide::Current)?;
        if bbox.roi.contains(kpt.x, kpt.y) {
            inside.push(*m);
        }
    }

    bbox.matches.clear();
    if inside.is_empty() {
        return Ok(MatchFilterStats::default());
    }

    let mean = inside.iter().map(|m| m.distance).sum::<f64>() / inside.len() as f64;
    let threshold = ratio * mean;
    let kept = inside.iter().filter(|m| m.distance < threshold).copied();
    bbox.matches.extend(kept);

    Ok(MatchFilterStats {
        inside: inside.len(),
        kept: bbox.matches.len(),
        mean_distance: Some(mean),
    })
}

/// Run the filter over every box of a frame, one box per task
pub fn filter_all_boxes(
    boxes: &mut [BoundingBox],
    prev_keypoints: &[Keypoint],
    curr_keypoints: &[Keypoint],
    matches: &[Correspondence],
    ratio: f64,
) -> Result<Vec<MatchFilterStats>> {
    boxes
        .par_iter_mut()
        .map(|bbox| cluster_matches_with_roi(bbox, prev_keypoints, curr_keypoints, matches, ratio))
        .collect()
}
