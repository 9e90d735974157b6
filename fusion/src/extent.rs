//! Top-view extent of the lidar points attributed to a box.
//!
//! These are the numbers a bird's-eye debug view labels each object with;
//! drawing is left to the consumer.

use crate::types::BoundingBox;
use roitrack::BoxId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectExtent {
    pub box_id: BoxId,
    pub num_points: usize,
    /// Closest forward distance (m)
    pub min_forward: f64,
    /// Lateral spread max(y) - min(y) (m)
    pub lateral_width: f64,
    /// Forward spread max(x) - min(x) (m)
    pub forward_depth: f64,
}

pub fn object_extent(bbox: &BoundingBox) -> Option<ObjectExtent> {
    let first = bbox.points.first()?;
    let init = (first.x, first.x, first.y, first.y);

    let (xmin, xmax, ymin, ymax) = bbox
        .points
        .iter()
        .fold(init, |(xmin, xmax, ymin, ymax), p| {
            (xmin.min(p.x), xmax.max(p.x), ymin.min(p.y), ymax.max(p.y))
        });

    Some(ObjectExtent {
        box_id: bbox.id,
        num_points: bbox.points.len(),
        min_forward: xmin,
        lateral_width: ymax - ymin,
        forward_depth: xmax - xmin,
    })
}
