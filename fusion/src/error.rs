//! Error types for the fusion core
//!
//! Ambiguous assignments, empty inputs and degenerate geometry are not errors
//! here: they surface as dropped points or as `Ttc::Undefined`. Only malformed
//! inputs from collaborators (bad matrices, bad config, dangling indices)
//! produce a `FusionError`.

use roitrack::BoxId;
use thiserror::Error;

/// Result type alias for the fusion library
pub type Result<T> = std::result::Result<T, FusionError>;

/// Which side of a frame pair a keypoint index refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSide {
    Previous,
    Current,
}

impl std::fmt::Display for FrameSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameSide::Previous => write!(f, "previous"),
            FrameSide::Current => write!(f, "current"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Keypoint index {index} out of range for {side} frame with {len} keypoints")]
    KeypointIndex {
        index: usize,
        len: usize,
        side: FrameSide,
    },

    #[error("Unknown bounding box id {0}")]
    UnknownBox(BoxId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FusionError {
    pub fn calibration<S: Into<String>>(msg: S) -> Self {
        Self::InvalidCalibration(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
