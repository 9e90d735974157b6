//! Region-of-interest rectangles and containment tests

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a bounding box, unique within one frame
pub type BoxId = u32;

/// Axis-aligned image rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Roi {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create from corner format [xmin, ymin, xmax, ymax]
    pub fn from_corners(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self::new(xmin, ymin, xmax - xmin, ymax - ymin)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open containment: left/top edges are inside, right/bottom edges are not
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Inset the rectangle symmetrically by `factor` of its width and height.
    ///
    /// A factor of 0.1 removes 5% of the width from each side. The factor is
    /// clamped to [0, 1]; a factor of 1 collapses the rectangle to its center.
    pub fn shrunk(&self, factor: f64) -> Self {
        let f = factor.clamp(0.0, 1.0);
        Self {
            x: self.x + f * self.width / 2.0,
            y: self.y + f * self.height / 2.0,
            width: self.width * (1.0 - f),
            height: self.height * (1.0 - f),
        }
    }

    /// True when all fields are finite and the extent is non-empty
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Roi({:.1}, {:.1}, {:.1}x{:.1})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// A rectangle tagged with the identifier of the box it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledRoi {
    pub id: BoxId,
    pub roi: Roi,
}

impl LabeledRoi {
    pub fn new(id: BoxId, roi: Roi) -> Self {
        Self { id, roi }
    }
}

/// Rule for attributing a pixel to one box when several overlapping
/// rectangles contain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapTieBreak {
    /// Smallest enclosing area wins; equal areas fall back to frame order
    #[default]
    SmallestArea,
    /// First enclosing rectangle in frame order wins
    FirstInOrder,
}

impl OverlapTieBreak {
    /// Index into `rois` of the rectangle the pixel is attributed to
    pub fn resolve(&self, rois: &[LabeledRoi], px: f64, py: f64) -> Option<usize> {
        let mut enclosing = rois
            .iter()
            .enumerate()
            .filter(|(_, r)| r.roi.contains(px, py));

        match self {
            OverlapTieBreak::FirstInOrder => enclosing.next().map(|(i, _)| i),
            OverlapTieBreak::SmallestArea => enclosing
                .fold(None, |best: Option<(usize, f64)>, (i, r)| {
                    let area = r.roi.area();
                    match best {
                        Some((_, best_area)) if best_area <= area => best,
                        _ => Some((i, area)),
                    }
                })
                .map(|(i, _)| i),
        }
    }
}

/// Indices of every rectangle containing the pixel, in frame order
pub fn enclosing_indices(rois: &[Roi], px: f64, py: f64) -> Vec<usize> {
    rois.iter()
        .enumerate()
        .filter(|(_, r)| r.contains(px, py))
        .map(|(i, _)| i)
        .collect()
}
