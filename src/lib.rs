#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Repaint
//!
//! Text-guided region replacement for photographs: describe a region of a
//! source image in natural language, supply a reference image, and receive
//! a composite in which the described region is replaced by content
//! visually consistent with the reference.
//!
//! The crate implements the prediction pipeline — a two-stage sequence of
//! text-conditioned segmentation and example-guided completion — together
//! with the geometry and determinism contracts that bind the stages:
//!
//! - **Dimension normalization**: the short side of the source maps to
//!   exactly 512 pixels and the long side to a multiple of 8, satisfying
//!   the completion model's latent tiling constraint.
//! - **Mask derivation**: raw segmentation logits pass through a sigmoid,
//!   are thresholded at 0.5, and are rendered as a strict black/white mask
//!   (the region named by the query is white and gets replaced).
//! - **Seeding**: seed `0` requests ambient randomness; any other seed
//!   selects a deterministic generator, making repeated runs with identical
//!   inputs byte-identical.
//!
//! Model execution is not part of this crate. Collaborators load weights
//! and hand the pipeline ready-to-use capabilities behind the
//! [`SegmentationBackend`] and [`CompletionBackend`] traits, bundled into an
//! [`InferenceContext`] constructed once at startup.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use repaint::{
//!     GenerationParams, InferenceContext, RegionRepaintProcessor, RepaintConfig,
//! };
//!
//! # fn capabilities() -> repaint::InferenceContext { unreachable!() }
//! # fn example() -> anyhow::Result<()> {
//! // Capabilities come from the collaborator that loaded the models
//! let context: InferenceContext = capabilities();
//! let mut processor = RegionRepaintProcessor::new(RepaintConfig::default(), context)?;
//!
//! let source = image::open("photo.jpg")?;
//! let reference = image::open("reference.jpg")?;
//! let params = GenerationParams::new(5.0, 42, 50)?;
//!
//! let result = processor.predict(&source, "the striped shirt", &reference, &params)?;
//! result.save_png("output.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! `predict` is a single synchronous unit of work; the stages are strictly
//! sequential and may block for the duration of inference. When both
//! capabilities share one accelerator, callers must serialize calls around
//! it — the pipeline provides no admission queue of its own.

pub mod backends;
pub mod completion;
pub mod config;
pub mod dimensions;
pub mod error;
pub mod inference;
pub mod mask;
pub mod processor;
pub mod types;

// Public API exports
pub use completion::CompletionInvoker;
pub use config::{
    GenerationParams, RepaintConfig, RepaintConfigBuilder, GUIDANCE_SCALE_RANGE,
    RANDOM_SEED_SENTINEL, STEPS_RANGE,
};
pub use dimensions::{NormalizedDimensions, TARGET_SHORT_SIDE, TILE_MULTIPLE};
pub use error::{RepaintError, Result};
pub use inference::{
    CompletionBackend, CompletionRequest, InferenceContext, SegmentationBackend,
};
pub use mask::{MaskGenerator, RegionMask, BINARIZATION_THRESHOLD};
pub use processor::RegionRepaintProcessor;
pub use types::{ProcessingMetadata, ProcessingTimings, RepaintResult};

use tokio::io::AsyncRead;

/// Replace a region using source and reference images provided as bytes.
///
/// Suitable for web servers and memory-based processing where files aren't
/// available. Decoding happens here; the pipeline itself is synchronous and
/// runs on the calling task.
///
/// # Arguments
///
/// * `source_bytes` - Encoded source photograph (JPEG, PNG, TIFF)
/// * `query` - Natural-language description of the region to replace
/// * `reference_bytes` - Encoded reference image guiding the fill
/// * `params` - Guidance scale, seed, and step count
/// * `processor` - The processor holding the inference context
///
/// # Errors
///
/// Returns [`RepaintError::InvalidImage`] when either byte buffer fails to
/// decode, plus any pipeline error from [`RegionRepaintProcessor::predict`].
pub async fn repaint_from_bytes(
    source_bytes: &[u8],
    query: &str,
    reference_bytes: &[u8],
    params: &GenerationParams,
    processor: &mut RegionRepaintProcessor,
) -> Result<RepaintResult> {
    let source = image::load_from_memory(source_bytes).map_err(|e| {
        RepaintError::invalid_image(format!("failed to decode source image from bytes: {}", e))
    })?;
    let reference = image::load_from_memory(reference_bytes).map_err(|e| {
        RepaintError::invalid_image(format!(
            "failed to decode reference image from bytes: {}",
            e
        ))
    })?;

    processor.predict(&source, query, &reference, params)
}

/// Replace a region using source and reference images from async readers.
///
/// Accepts any async readable stream for both images, making it suitable
/// for network streams and large files. Both streams are read fully into
/// memory before decoding.
///
/// # Errors
///
/// Returns [`RepaintError::Io`]-class errors for stream failures and
/// everything [`repaint_from_bytes`] can return.
pub async fn repaint_from_readers<R: AsyncRead + Unpin>(
    mut source: R,
    query: &str,
    mut reference: R,
    params: &GenerationParams,
    processor: &mut RegionRepaintProcessor,
) -> Result<RepaintResult> {
    use tokio::io::AsyncReadExt;

    let mut source_bytes = Vec::new();
    source
        .read_to_end(&mut source_bytes)
        .await
        .map_err(|e| RepaintError::invalid_image(format!("failed to read source stream: {}", e)))?;

    let mut reference_bytes = Vec::new();
    reference.read_to_end(&mut reference_bytes).await.map_err(|e| {
        RepaintError::invalid_image(format!("failed to read reference stream: {}", e))
    })?;

    repaint_from_bytes(&source_bytes, query, &reference_bytes, params, processor).await
}
