//! Lidar point clustering by projected bounding box
//!
//! Each point is projected into the image and kept only when exactly one
//! shrunk box rectangle contains it. Points in no box, in several boxes,
//! behind the camera or with non-finite coordinates are dropped without
//! error. Boxes with a degenerate rectangle take no part.

use crate::calibration::{Calibration, Projection};
use crate::types::{BoundingBox, RangePoint};
use rayon::prelude::*;
use roitrack::{enclosing_indices, Roi};
use serde::{Deserialize, Serialize};

/// Where the points of one projection pass ended up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionStats {
    pub total: usize,
    pub assigned: usize,
    /// Inside two or more shrunk boxes
    pub ambiguous: usize,
    /// Projected into the image plane but inside no shrunk box
    pub outside: usize,
    /// On or behind the image plane
    pub behind: usize,
    /// Non-finite point or pixel coordinates
    pub non_finite: usize,
}

enum Placement {
    Box(usize),
    Ambiguous,
    Outside,
    Behind,
    NonFinite,
}

/// `Placement::Box` indexes into `rois`
fn place(projection: Projection, rois: &[Roi]) -> Placement {
    let (u, v) = match projection {
        Projection::Pixel(u, v) => (u, v),
        Projection::Behind => return Placement::Behind,
        Projection::NonFinite => return Placement::NonFinite,
    };

    match enclosing_indices(rois, u, v).as_slice() {
        [i] => Placement::Box(*i),
        [] => Placement::Outside,
        _ => Placement::Ambiguous,
    }
}

/// Append every unambiguously enclosed point to its box.
///
/// Points are appended in input order, so repeated runs give identical box
/// contents.
pub fn cluster_points_with_rois(
    boxes: &mut [BoundingBox],
    points: &[RangePoint],
    shrink_factor: f64,
    calibration: &Calibration,
) -> ProjectionStats {
    // Shrunk rectangles of the usable boxes, and where each one came from
    let mut rois = Vec::with_capacity(boxes.len());
    let mut owners = Vec::with_capacity(boxes.len());
    for (i, b) in boxes.iter().enumerate() {
        if b.roi.is_valid() {
            rois.push(b.roi.shrunk(shrink_factor));
            owners.push(i);
        } else {
            log::warn!("Skipping box {} with degenerate rectangle {}", b.id, b.roi);
        }
    }

    let placements: Vec<Placement> = points
        .par_iter()
        .map(|p| place(calibration.project_point(p), &rois))
        .collect();

    let mut stats = ProjectionStats {
        total: points.len(),
        ..Default::default()
    };

    for (point, placement) in points.iter().zip(placements) {
        match placement {
            Placement::Box(i) => {
                boxes[owners[i]].points.push(*point);
                stats.assigned += 1;
            }
            Placement::Ambiguous => stats.ambiguous += 1,
            Placement::Outside => stats.outside += 1,
            Placement::Behind => stats.behind += 1,
            Placement::NonFinite => stats.non_finite += 1,
        }
    }

    log::debug!(
        "Projected {} points: {} assigned, {} ambiguous, {} outside, {} behind, {} non-finite",
        stats.total,
        stats.assigned,
        stats.ambiguous,
        stats.outside,
        stats.behind,
        stats.non_finite
    );

    stats
}
