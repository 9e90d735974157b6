/// Per-frame-pair fusion: match filtering, box association and both TTC estimates
use crate::calibration::Calibration;
use crate::config::FusionConfig;
use crate::error::{FusionError, Result};
use crate::extent::{object_extent, ObjectExtent};
use crate::match_filter::{filter_all_boxes, MatchFilterStats};
use crate::projector::{cluster_points_with_rois, ProjectionStats};
use crate::ttc::{camera_ttc, range_ttc, Ttc, UndefinedReason};
use crate::types::{match_endpoints, Frame, RangePoint};
use roitrack::{AssociationMap, BoxId};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Timing information for each stage of `process`
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub filter_ms: f32,
    pub associate_ms: f32,
    pub estimate_ms: f32,
    pub total_ms: f32,
}

/// Both estimates for one current box and the previous box it was linked to
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectTtc {
    pub current_id: BoxId,
    pub previous_id: BoxId,
    /// Correspondences voting for this association
    pub support: u32,
    pub camera: Ttc,
    pub lidar: Ttc,
    pub extent: Option<ObjectExtent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub associations: AssociationMap,
    /// One entry per association, in ascending current id
    pub objects: Vec<ObjectTtc>,
    /// Current boxes without an association
    pub unassociated: Vec<BoxId>,
    /// Match filter outcome per current box, in frame order
    pub match_stats: Vec<(BoxId, MatchFilterStats)>,
    pub timing: StageTiming,
}

impl FrameReport {
    pub fn object(&self, current_id: BoxId) -> Option<&ObjectTtc> {
        self.objects.iter().find(|o| o.current_id == current_id)
    }
}

pub struct FusionPipeline {
    config: FusionConfig,
    calibration: Calibration,
}

impl FusionPipeline {
    pub fn new(config: FusionConfig, calibration: Calibration) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            calibration,
        })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Attribute the frame's lidar points to its boxes
    pub fn prepare_frame(&self, frame: &mut Frame, points: &[RangePoint]) -> ProjectionStats {
        cluster_points_with_rois(
            &mut frame.boxes,
            points,
            self.config.shrink_factor,
            &self.calibration,
        )
    }

    /// Filter `curr`'s matches into its boxes, link its boxes to `prev`'s,
    /// and estimate both TTCs for every link.
    ///
    /// `prev` must already hold its lidar points; `curr.matches` map
    /// `prev.keypoints` to `curr.keypoints`.
    pub fn process(&self, prev: &Frame, curr: &mut Frame) -> Result<FrameReport> {
        let start = Instant::now();
        let mut timing = StageTiming::default();

        // Step 1: match filtering, parallel across boxes
        let stage = Instant::now();
        let filter_stats = filter_all_boxes(
            &mut curr.boxes,
            &prev.keypoints,
            &curr.keypoints,
            &curr.matches,
            self.config.distance_ratio,
        )?;
        let match_stats = curr.boxes.iter().map(|b| b.id).zip(filter_stats).collect();
        timing.filter_ms = stage.elapsed().as_secs_f32() * 1000.0;

        // Step 2: association over all correspondences
        let stage = Instant::now();
        let endpoints = match_endpoints(&prev.keypoints, &curr.keypoints, &curr.matches)?;
        let association = &self.config.association;
        let (_, associations) = association.associate(&curr.rois(), &prev.rois(), &endpoints);
        timing.associate_ms = stage.elapsed().as_secs_f32() * 1000.0;

        // Step 3: both estimators per association
        let stage = Instant::now();
        let mut objects = Vec::with_capacity(associations.len());
        for link in associations.iter() {
            let curr_box = curr
                .box_by_id(link.current_id)
                .ok_or(FusionError::UnknownBox(link.current_id))?;
            let prev_box = prev
                .box_by_id(link.previous_id)
                .ok_or(FusionError::UnknownBox(link.previous_id))?;

            // A zero-vote link pairs two unrelated objects
            let (camera, lidar) = if link.support == 0 {
                let unsupported = Ttc::Undefined(UndefinedReason::NoSupport);
                (unsupported, unsupported)
            } else {
                let camera = camera_ttc(
                    &prev.keypoints,
                    &curr.keypoints,
                    &curr_box.matches,
                    self.config.frame_rate,
                    self.config.min_pair_distance,
                )?;
                let lidar = range_ttc(
                    &prev_box.points,
                    &curr_box.points,
                    self.config.frame_rate,
                    self.config.lane_half_width,
                    self.config.range_statistic,
                );
                (camera, lidar)
            };

            log::debug!(
                "Box {} <- {} (support {}): camera {}, lidar {}",
                link.current_id,
                link.previous_id,
                link.support,
                camera,
                lidar
            );

            objects.push(ObjectTtc {
                current_id: link.current_id,
                previous_id: link.previous_id,
                support: link.support,
                camera,
                lidar,
                extent: object_extent(curr_box),
            });
        }
        timing.estimate_ms = stage.elapsed().as_secs_f32() * 1000.0;

        let unassociated: Vec<BoxId> = curr
            .boxes
            .iter()
            .map(|b| b.id)
            .filter(|&id| associations.get(id).is_none())
            .collect();

        let shared = associations.previous_claims();
        if !shared.is_empty() {
            log::debug!("Previous boxes claimed more than once: {:?}", shared);
        }

        timing.total_ms = start.elapsed().as_secs_f32() * 1000.0;
        log::debug!(
            "Frame processed: {} boxes, {} associated, {} unassociated in {:.2} ms",
            curr.boxes.len(),
            objects.len(),
            unassociated.len(),
            timing.total_ms
        );

        Ok(FrameReport {
            associations,
            objects,
            unassociated,
            match_stats,
            timing,
        })
    }
}
