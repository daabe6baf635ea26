//! Prediction orchestration
//!
//! `RegionRepaintProcessor` owns the end-to-end `predict` operation: it
//! normalizes dimensions, derives the region mask, enforces the shared
//! mask/image geometry, invokes completion, and assembles the result. Each
//! call is an independent run (Received -> Normalized -> Masked ->
//! Completed -> Returned) with no state retained between calls; any stage
//! failure aborts the run with no partial output.

use crate::{
    completion::CompletionInvoker,
    config::{GenerationParams, RepaintConfig},
    dimensions::NormalizedDimensions,
    error::{RepaintError, Result},
    inference::InferenceContext,
    mask::MaskGenerator,
    types::{ProcessingMetadata, ProcessingTimings, RepaintResult},
};
use image::{DynamicImage, RgbImage};
use instant::Instant;
use log::{debug, info};
use tracing::{instrument, span, Level};

/// Sequences the two model stages into the externally visible `predict`.
///
/// Holds the process-wide [`InferenceContext`], constructed once at startup
/// and read-only from the pipeline's perspective. `predict` takes
/// `&mut self` and the stages are strictly sequential; when both
/// capabilities share one accelerator context the caller must ensure at
/// most one in-flight call per accelerator (external mutex or admission
/// queue — the processor implements no queuing).
pub struct RegionRepaintProcessor {
    config: RepaintConfig,
    context: InferenceContext,
}

impl RegionRepaintProcessor {
    /// Create a processor from a validated configuration and a ready
    /// inference context.
    ///
    /// # Errors
    /// Returns [`RepaintError::InvalidConfig`] when the configuration fails
    /// validation.
    pub fn new(config: RepaintConfig, context: InferenceContext) -> Result<Self> {
        config.validate()?;
        info!(
            "region repaint processor ready (segmentation: {}, completion: {})",
            config.segmentation_model, config.completion_model
        );
        Ok(Self { config, context })
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &RepaintConfig {
        &self.config
    }

    /// True when both capabilities report ready
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.context.is_ready()
    }

    /// Replace the region of `source` named by `query` with content guided
    /// by `reference`.
    ///
    /// The output image is at normalized resolution (short side 512, long
    /// side a multiple of 8) unless the processor was configured with
    /// `resize_output_to_source`. On success all three reveal flags in the
    /// result are raised; on failure no result is produced at all.
    ///
    /// # Errors
    ///
    /// - [`RepaintError::InvalidImage`] for empty source or reference images
    /// - [`RepaintError::InvalidConfig`] for an empty text query
    /// - [`RepaintError::DegenerateDimensions`] when normalization collapses
    /// - [`RepaintError::Inference`] propagated from either capability
    /// - [`RepaintError::DimensionMismatch`] on a mask/image geometry
    ///   violation (orchestration bug; should never surface)
    #[instrument(
        skip(self, source, reference),
        fields(
            query = %query,
            source_dimensions = %format!("{}x{}", source.width(), source.height()),
            deterministic = %params.is_deterministic()
        )
    )]
    pub fn predict(
        &mut self,
        source: &DynamicImage,
        query: &str,
        reference: &DynamicImage,
        params: &GenerationParams,
    ) -> Result<RepaintResult> {
        Self::validate_inputs(source, query, reference)?;
        params.validate()?;

        let mut timings = ProcessingTimings::default();
        let total_start = Instant::now();
        let original_dimensions = (source.width(), source.height());

        // Stage 1: dimension normalization and source resize
        let (dims, normalized_source) = {
            let _span = span!(
                Level::DEBUG,
                "normalization",
                width = %original_dimensions.0,
                height = %original_dimensions.1
            )
            .entered();
            let stage_start = Instant::now();
            let dims = NormalizedDimensions::compute(original_dimensions.0, original_dimensions.1)
                .validate(original_dimensions.0, original_dimensions.1)?;
            let normalized_source = resize_to_rgb(source, dims);
            timings.normalization_ms = stage_start.elapsed().as_millis() as u64;
            (dims, normalized_source)
        };

        if self.config.debug {
            debug!("normalized {}x{} -> {}", original_dimensions.0, original_dimensions.1, dims);
        }

        // Stage 2: mask derivation from the ORIGINAL source at normalized geometry
        let mask = {
            let _span = span!(Level::INFO, "mask_generation", target = %dims).entered();
            let stage_start = Instant::now();
            let mask = MaskGenerator::generate(self.context.segmentation(), source, query, dims)?;
            timings.mask_generation_ms = stage_start.elapsed().as_millis() as u64;
            mask
        };

        // Invariant: the mask generator returns a mask at the normalized
        // dimensions; completion must never see anything else.
        if mask.dimensions() != dims.as_tuple() {
            return Err(RepaintError::DimensionMismatch {
                image_width: dims.width,
                image_height: dims.height,
                mask_width: mask.dimensions().0,
                mask_height: mask.dimensions().1,
            });
        }

        if self.config.debug {
            debug!("mask coverage {:.1}%", mask.coverage() * 100.0);
        }

        // Stage 3: example-guided completion
        let output = {
            let _span = span!(
                Level::INFO,
                "completion",
                scale = %params.guidance_scale,
                steps = %params.steps
            )
            .entered();
            let stage_start = Instant::now();
            let mask_image = mask.to_rgb_image();
            let output = CompletionInvoker::invoke(
                self.context.completion(),
                &normalized_source,
                &mask_image,
                reference,
                params,
            )?;
            timings.completion_ms = stage_start.elapsed().as_millis() as u64;
            output
        };

        // Observed pipeline behavior keeps the normalized resolution; the
        // restore to source resolution is an explicit opt-in.
        let output = if self.config.resize_output_to_source {
            DynamicImage::ImageRgb8(image::imageops::resize(
                &output.to_rgb8(),
                original_dimensions.0,
                original_dimensions.1,
                image::imageops::FilterType::Triangle,
            ))
        } else {
            output
        };

        timings.total_ms = total_start.elapsed().as_millis() as u64;
        info!(
            "predict complete in {}ms (normalization {}ms, mask {}ms, completion {}ms)",
            timings.total_ms,
            timings.normalization_ms,
            timings.mask_generation_ms,
            timings.completion_ms
        );

        let mut metadata = ProcessingMetadata::new(
            self.config.segmentation_model.clone(),
            self.config.completion_model.clone(),
            query.to_string(),
        );
        metadata.deterministic = params.is_deterministic();
        metadata.set_timings(timings);

        Ok(RepaintResult::new(
            output,
            mask,
            original_dimensions,
            dims,
            metadata,
        ))
    }

    fn validate_inputs(
        source: &DynamicImage,
        query: &str,
        reference: &DynamicImage,
    ) -> Result<()> {
        if source.width() == 0 || source.height() == 0 {
            return Err(RepaintError::invalid_image(format!(
                "source image has degenerate dimensions {}x{}",
                source.width(),
                source.height()
            )));
        }
        if reference.width() == 0 || reference.height() == 0 {
            return Err(RepaintError::invalid_image(format!(
                "reference image has degenerate dimensions {}x{}",
                reference.width(),
                reference.height()
            )));
        }
        if query.trim().is_empty() {
            return Err(RepaintError::invalid_config(
                "text query must name the region to replace",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for RegionRepaintProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionRepaintProcessor")
            .field("config", &self.config)
            .field("context", &self.context)
            .finish()
    }
}

/// Resize to normalized dimensions in a standard 3-channel representation
fn resize_to_rgb(image: &DynamicImage, dims: NormalizedDimensions) -> RgbImage {
    image::imageops::resize(
        &image.to_rgb8(),
        dims.width,
        dims.height,
        image::imageops::FilterType::Triangle,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::{MockCompletionBackend, MockSegmentationBackend};

    fn processor() -> RegionRepaintProcessor {
        RegionRepaintProcessor::new(
            RepaintConfig::default(),
            InferenceContext::new(
                Box::new(MockSegmentationBackend::new()),
                Box::new(MockCompletionBackend::new()),
            ),
        )
        .unwrap()
    }

    fn sample_images() -> (DynamicImage, DynamicImage) {
        (
            DynamicImage::new_rgb8(400, 800),
            DynamicImage::new_rgb8(64, 64),
        )
    }

    #[test]
    fn test_predict_output_at_normalized_resolution() {
        let mut processor = processor();
        let (source, reference) = sample_images();
        let result = processor
            .predict(&source, "shirt", &reference, &GenerationParams::default())
            .unwrap();

        assert_eq!(result.normalized_dimensions.as_tuple(), (512, 1024));
        assert_eq!(result.image.width(), 512);
        assert_eq!(result.image.height(), 1024);
        assert_eq!(result.original_dimensions, (400, 800));
    }

    #[test]
    fn test_predict_mask_matches_normalized_image() {
        let mut processor = processor();
        let (source, reference) = sample_images();
        let result = processor
            .predict(&source, "shirt", &reference, &GenerationParams::default())
            .unwrap();
        assert_eq!(
            result.mask.dimensions(),
            result.normalized_dimensions.as_tuple()
        );
    }

    #[test]
    fn test_predict_rejects_empty_query() {
        let mut processor = processor();
        let (source, reference) = sample_images();
        let err = processor
            .predict(&source, "   ", &reference, &GenerationParams::default())
            .unwrap_err();
        assert!(matches!(err, RepaintError::InvalidConfig(_)));
    }

    #[test]
    fn test_predict_rejects_empty_reference() {
        let mut processor = processor();
        let source = DynamicImage::new_rgb8(400, 800);
        let reference = DynamicImage::new_rgb8(0, 0);
        let err = processor
            .predict(&source, "shirt", &reference, &GenerationParams::default())
            .unwrap_err();
        assert!(matches!(err, RepaintError::InvalidImage(_)));
    }

    #[test]
    fn test_resize_output_to_source_option() {
        let config = RepaintConfig::builder()
            .resize_output_to_source(true)
            .build()
            .unwrap();
        let mut processor = RegionRepaintProcessor::new(
            config,
            InferenceContext::new(
                Box::new(MockSegmentationBackend::new()),
                Box::new(MockCompletionBackend::new()),
            ),
        )
        .unwrap();

        let (source, reference) = sample_images();
        let result = processor
            .predict(&source, "shirt", &reference, &GenerationParams::default())
            .unwrap();
        assert_eq!(result.image.width(), 400);
        assert_eq!(result.image.height(), 800);
        // The mask still reflects the normalized geometry the pipeline ran at
        assert_eq!(result.mask.dimensions(), (512, 1024));
    }

    #[test]
    fn test_segmentation_failure_aborts_run() {
        let mut processor = RegionRepaintProcessor::new(
            RepaintConfig::default(),
            InferenceContext::new(
                Box::new(MockSegmentationBackend::new_failing()),
                Box::new(MockCompletionBackend::new()),
            ),
        )
        .unwrap();
        let (source, reference) = sample_images();
        let err = processor
            .predict(&source, "shirt", &reference, &GenerationParams::default())
            .unwrap_err();
        assert!(matches!(err, RepaintError::Inference(_)));
    }
}
