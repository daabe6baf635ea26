//! Error types for region replacement operations

use thiserror::Error;

/// Result type alias for region replacement operations
pub type Result<T> = std::result::Result<T, RepaintError>;

/// Comprehensive error types for the region replacement pipeline
#[derive(Error, Debug)]
pub enum RepaintError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format or processing errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Source or reference image is unusable (non-positive dimensions, undecodable)
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Dimension normalization collapsed the free side to zero
    #[error("Degenerate dimensions: {width}x{height} normalizes to {normalized_width}x{normalized_height}")]
    DegenerateDimensions {
        /// Original image width
        width: u32,
        /// Original image height
        height: u32,
        /// Computed normalized width
        normalized_width: u32,
        /// Computed normalized height
        normalized_height: u32,
    },

    /// Segmentation or completion capability failure
    #[error("Inference error: {0}")]
    Inference(String),

    /// Mask and normalized image dimensions disagree at the completion boundary.
    ///
    /// This indicates an orchestration bug: the pipeline guarantees the mask is
    /// resized to the normalized dimensions before completion is invoked.
    #[error("Dimension mismatch: image is {image_width}x{image_height} but mask is {mask_width}x{mask_height}")]
    DimensionMismatch {
        /// Normalized image width
        image_width: u32,
        /// Normalized image height
        image_height: u32,
        /// Mask width
        mask_width: u32,
        /// Mask height
        mask_height: u32,
    },

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepaintError {
    /// Create a new invalid image error
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an inference error carrying the failing stage name
    pub fn inference_stage_error(stage: &str, error: &dyn std::fmt::Display) -> Self {
        Self::Inference(format!("{} stage failed: {}", stage, error))
    }
}
