//! Camera / lidar time-to-collision fusion
//!
//! Per frame, lidar points are attributed to detected bounding boxes through
//! the camera calibration, keypoint correspondences are filtered into the
//! same boxes, and boxes are linked to the previous frame by keypoint votes.
//! Every linked pair then yields two independent TTC estimates: one from the
//! scale change of keypoint pairs, one from the closing rate of in-lane
//! lidar range.
//!
//! ```rust,ignore
//! use ttc_fusion::{Calibration, FusionConfig, FusionPipeline};
//!
//! let pipeline = FusionPipeline::new(FusionConfig::default(), calibration)?;
//! pipeline.prepare_frame(&mut curr, &lidar_points);
//! let report = pipeline.process(&prev, &mut curr)?;
//! for object in &report.objects {
//!     println!(
//!         "box {}: camera {} lidar {}",
//!         object.current_id, object.camera, object.lidar
//!     );
//! }
//! ```

pub mod calibration;
pub mod config;
pub mod error;
pub mod extent;
pub mod match_filter;
pub mod pipeline;
pub mod projector;
pub mod ttc;
pub mod types;

pub use calibration::{Calibration, Projection};
pub use config::FusionConfig;
pub use error::{FrameSide, FusionError, Result};
pub use extent::{object_extent, ObjectExtent};
pub use match_filter::{cluster_matches_with_roi, filter_all_boxes, MatchFilterStats};
pub use pipeline::{FrameReport, FusionPipeline, ObjectTtc, StageTiming};
pub use projector::{cluster_points_with_rois, ProjectionStats};
pub use ttc::{camera_ttc, range_ttc, RangeStatistic, Ttc, UndefinedReason};
pub use types::{BoundingBox, Correspondence, Frame, Keypoint, RangePoint};

pub use roitrack::{
    AssociationConfig, AssociationMap, AssociationStrategy, BoxId, OverlapTieBreak, Roi,
};

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
