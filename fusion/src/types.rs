//! Per-frame data model: range points, keypoints, correspondences, boxes

use crate::error::{FrameSide, FusionError, Result};
use roitrack::{BoxId, EndpointPair, LabeledRoi, Roi};
use serde::{Deserialize, Serialize};

/// Lidar return in the sensor frame (x forward, y left, z up, metres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub reflectivity: Option<f64>,
}

impl RangePoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            reflectivity: None,
        }
    }

    pub fn with_reflectivity(mut self, r: f64) -> Self {
        self.reflectivity = Some(r);
        self
    }
}

/// Image feature position; the remaining fields are carried through untouched
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub size: f32,
    #[serde(default)]
    pub response: f32,
    #[serde(default)]
    pub octave: i32,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            size: 0.0,
            response: 0.0,
            octave: 0,
        }
    }

    pub fn position(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    pub fn distance_to(&self, other: &Keypoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Keypoint match between the previous and the current frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Index into the previous frame's keypoints
    pub prev_idx: usize,
    /// Index into the current frame's keypoints
    pub curr_idx: usize,
    /// Descriptor distance, lower is better
    pub distance: f64,
}

impl Correspondence {
    pub fn new(prev_idx: usize, curr_idx: usize, distance: f64) -> Self {
        Self {
            prev_idx,
            curr_idx,
            distance,
        }
    }
}

/// Detected object region plus everything assigned to it during one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub id: BoxId,
    pub roi: Roi,
    #[serde(default)]
    pub class_id: u32,
    #[serde(default)]
    pub confidence: f32,
    /// Range points attributed to this box by the projector
    #[serde(default)]
    pub points: Vec<RangePoint>,
    /// Correspondences kept by the match filter
    #[serde(default)]
    pub matches: Vec<Correspondence>,
}

impl BoundingBox {
    pub fn new(id: BoxId, roi: Roi) -> Self {
        Self {
            id,
            roi,
            class_id: 0,
            confidence: 0.0,
            points: Vec::new(),
            matches: Vec::new(),
        }
    }

    pub fn with_class(mut self, class_id: u32, confidence: f32) -> Self {
        self.class_id = class_id;
        self.confidence = confidence;
        self
    }

    pub fn labeled_roi(&self) -> LabeledRoi {
        LabeledRoi::new(self.id, self.roi)
    }
}

/// One time step: keypoints, matches against the previous step, and boxes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub keypoints: Vec<Keypoint>,
    /// Correspondences from the previous frame into this one
    pub matches: Vec<Correspondence>,
    pub boxes: Vec<BoundingBox>,
}

impl Frame {
    pub fn new(keypoints: Vec<Keypoint>, boxes: Vec<BoundingBox>) -> Self {
        Self {
            keypoints,
            matches: Vec::new(),
            boxes,
        }
    }

    pub fn with_matches(mut self, matches: Vec<Correspondence>) -> Self {
        self.matches = matches;
        self
    }

    pub fn box_by_id(&self, id: BoxId) -> Option<&BoundingBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn rois(&self) -> Vec<LabeledRoi> {
        self.boxes.iter().map(BoundingBox::labeled_roi).collect()
    }

    /// Drop all per-frame assignments, keeping boxes and keypoints
    pub fn clear_assignments(&mut self) {
        for bbox in &mut self.boxes {
            bbox.points.clear();
            bbox.matches.clear();
        }
    }
}

/// Keypoint lookup with an error naming the offending side
pub fn keypoint_at(keypoints: &[Keypoint], index: usize, side: FrameSide) -> Result<&Keypoint> {
    let len = keypoints.len();
    keypoints
        .get(index)
        .ok_or(FusionError::KeypointIndex { index, len, side })
}

/// Pixel endpoints of every correspondence, for box association
pub fn match_endpoints(
    prev_keypoints: &[Keypoint],
    curr_keypoints: &[Keypoint],
    matches: &[Correspondence],
) -> Result<Vec<EndpointPair>> {
    matches
        .iter()
        .map(|m| {
            let prev = keypoint_at(prev_keypoints, m.prev_idx, FrameSide::Previous)?;
            let curr = keypoint_at(curr_keypoints, m.curr_idx, FrameSide::Current)?;
            Ok((prev.position(), curr.position()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_lookup() {
        let kpts = vec![Keypoint::new(1.0, 2.0)];
        assert!(keypoint_at(&kpts, 0, FrameSide::Current).is_ok());
        let err = keypoint_at(&kpts, 3, FrameSide::Previous).unwrap_err();
        assert!(matches!(
            err,
            FusionError::KeypointIndex {
                index: 3,
                len: 1,
                side: FrameSide::Previous
            }
        ));
    }

    #[test]
    fn test_match_endpoints() {
        let prev = vec![Keypoint::new(1.0, 2.0), Keypoint::new(3.0, 4.0)];
        let curr = vec![Keypoint::new(5.0, 6.0)];
        let matches = vec![Correspondence::new(1, 0, 10.0)];
        let endpoints = match_endpoints(&prev, &curr, &matches).unwrap();
        assert_eq!(endpoints, vec![([3.0, 4.0], [5.0, 6.0])]);

        let bad = vec![Correspondence::new(0, 1, 10.0)];
        assert!(match_endpoints(&prev, &curr, &bad).is_err());
    }

    #[test]
    fn test_frame_lookup_and_clear() {
        let mut bbox = BoundingBox::new(4, Roi::new(0.0, 0.0, 10.0, 10.0)).with_class(2, 0.8);
        bbox.points.push(RangePoint::new(5.0, 0.0, 0.0));
        let mut frame = Frame::new(Vec::new(), vec![bbox]);

        assert_eq!(frame.box_by_id(4).map(|b| b.class_id), Some(2));
        assert!(frame.box_by_id(1).is_none());
        assert_eq!(frame.rois()[0].id, 4);

        frame.clear_assignments();
        assert!(frame.boxes[0].points.is_empty());
    }

    #[test]
    fn test_range_point_deserialize_without_reflectivity() {
        let p: RangePoint = serde_json::from_str(r#"{"x":1.0,"y":2.0,"z":3.0}"#).unwrap();
        assert_eq!(p, RangePoint::new(1.0, 2.0, 3.0));
        assert_eq!(p.with_reflectivity(0.5).reflectivity, Some(0.5));
    }
}
