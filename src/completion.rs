//! Example-guided completion invocation
//!
//! Thin seam in front of the completion capability. The invoker owns two
//! contracts the capability must be able to rely on: the mask and image it
//! forwards always share dimensions, and the seed sentinel has already been
//! mapped onto the optional-generator convention.

use crate::{
    config::GenerationParams,
    error::{RepaintError, Result},
    inference::{CompletionBackend, CompletionRequest},
};
use image::{DynamicImage, RgbImage};
use log::debug;

/// Invokes the completion capability under the pipeline's invariants.
pub struct CompletionInvoker;

impl CompletionInvoker {
    /// Fill the masked region of `image` guided by `reference`.
    ///
    /// `image` and `mask` must share dimensions; `reference` is forwarded
    /// untouched (never resized or normalized). `params.guidance_scale` and
    /// `params.steps` are forwarded verbatim; the capability owns range
    /// enforcement. The output stays at the input's (normalized) resolution.
    ///
    /// # Errors
    ///
    /// - [`RepaintError::DimensionMismatch`] when image and mask disagree —
    ///   an orchestration bug, unreachable through the public predict path.
    /// - [`RepaintError::Inference`] propagated from the capability.
    pub fn invoke(
        backend: &mut dyn CompletionBackend,
        image: &RgbImage,
        mask: &RgbImage,
        reference: &DynamicImage,
        params: &GenerationParams,
    ) -> Result<DynamicImage> {
        if image.dimensions() != mask.dimensions() {
            return Err(RepaintError::DimensionMismatch {
                image_width: image.width(),
                image_height: image.height(),
                mask_width: mask.width(),
                mask_height: mask.height(),
            });
        }

        let seed = params.generator_seed();
        debug!(
            "invoking completion at {}x{}, scale {}, {} steps, seed {:?}",
            image.width(),
            image.height(),
            params.guidance_scale,
            params.steps,
            seed
        );

        backend.complete(&CompletionRequest {
            image,
            mask,
            reference,
            seed,
            guidance_scale: params.guidance_scale,
            steps: params.steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::MockCompletionBackend;

    fn params_with_seed(seed: u64) -> GenerationParams {
        GenerationParams::new(5.0, seed, 10).unwrap()
    }

    #[test]
    fn test_dimension_mismatch_rejected_before_backend_call() {
        let mut backend = MockCompletionBackend::new();
        let image = RgbImage::new(512, 1024);
        let mask = RgbImage::new(512, 512);
        let reference = DynamicImage::new_rgb8(64, 64);

        let err = CompletionInvoker::invoke(
            &mut backend,
            &image,
            &mask,
            &reference,
            &params_with_seed(0),
        )
        .unwrap_err();

        assert!(matches!(err, RepaintError::DimensionMismatch { .. }));
        assert!(backend.call_history().is_empty(), "backend must not be invoked");
    }

    #[test]
    fn test_seed_sentinel_becomes_no_generator() {
        let mut backend = MockCompletionBackend::new();
        let image = RgbImage::new(16, 16);
        let mask = RgbImage::new(16, 16);
        let reference = DynamicImage::new_rgb8(8, 8);

        CompletionInvoker::invoke(&mut backend, &image, &mask, &reference, &params_with_seed(0))
            .unwrap();
        assert_eq!(backend.last_seed(), Some(None));

        CompletionInvoker::invoke(&mut backend, &image, &mask, &reference, &params_with_seed(42))
            .unwrap();
        assert_eq!(backend.last_seed(), Some(Some(42)));
    }

    #[test]
    fn test_scale_and_steps_forwarded_verbatim() {
        let mut backend = MockCompletionBackend::new();
        let image = RgbImage::new(16, 16);
        let mask = RgbImage::new(16, 16);
        let reference = DynamicImage::new_rgb8(8, 8);
        // Outside the documented typical ranges on purpose: no clamping here
        let params = GenerationParams::new(99.5, 7, 500).unwrap();

        CompletionInvoker::invoke(&mut backend, &image, &mask, &reference, &params).unwrap();
        let (scale, steps) = backend.last_scale_and_steps().unwrap();
        assert!((scale - 99.5).abs() < f32::EPSILON);
        assert_eq!(steps, 500);
    }

    #[test]
    fn test_backend_failure_propagates() {
        let mut backend = MockCompletionBackend::new_failing();
        let image = RgbImage::new(16, 16);
        let mask = RgbImage::new(16, 16);
        let reference = DynamicImage::new_rgb8(8, 8);

        let err = CompletionInvoker::invoke(
            &mut backend,
            &image,
            &mask,
            &reference,
            &params_with_seed(1),
        )
        .unwrap_err();
        assert!(matches!(err, RepaintError::Inference(_)));
    }
}
