//! Region-of-interest geometry and cross-frame box association
//!
//! Bounding boxes from two consecutive frames are linked by counting keypoint
//! correspondences whose endpoints fall inside them. Two strategies turn the
//! vote counts into an association map:
//!
//! ```rust,ignore
//! use roitrack::{AssociationConfig, AssociationStrategy, LabeledRoi, Roi};
//!
//! let previous = vec![LabeledRoi::new(0, Roi::new(0.0, 0.0, 100.0, 80.0))];
//! let current = vec![LabeledRoi::new(0, Roi::new(4.0, 2.0, 104.0, 82.0))];
//! let endpoints = vec![([50.0, 40.0], [54.0, 42.0])];
//!
//! let config = AssociationConfig {
//!     strategy: AssociationStrategy::Bipartite,
//!     ..Default::default()
//! };
//! let (_tally, map) = config.associate(&current, &previous, &endpoints);
//! assert_eq!(map.previous_of(0), Some(0));
//! ```

pub mod association;
pub mod hungarian; // Kuhn-Munkres for one-to-one association
pub mod roi;

pub use association::{
    AssociationConfig, AssociationMap, AssociationStrategy, BipartiteAssociator, BoxAssociation,
    BoxAssociator, EndpointPair, GreedyAssociator, TallyMatrix,
};
pub use hungarian::{AssignmentResult, HungarianSolver};
pub use roi::{enclosing_indices, BoxId, LabeledRoi, OverlapTieBreak, Roi};
