//! Binary region masks derived from text-conditioned segmentation
//!
//! The segmentation capability returns raw logits at its own working
//! resolution. This module turns them into the strict black/white mask the
//! completion capability expects: sigmoid, threshold at 0.5, explicit
//! replication of the binary channel into RGB (never a plotting palette),
//! and a nearest-neighbor resize to the request's normalized dimensions.

use crate::{
    dimensions::NormalizedDimensions,
    error::{RepaintError, Result},
    inference::SegmentationBackend,
};
use image::{DynamicImage, ImageBuffer, Luma, Rgb, RgbImage};
use log::debug;
use ndarray::Array2;
use std::path::Path;

/// Score at or above which a pixel belongs to the region
pub const BINARIZATION_THRESHOLD: f32 = 0.5;

/// Per-pixel binary indicator over an image grid.
///
/// Values are strictly 0 or 1. Polarity: the region named by the text query
/// is 1, renders white, and is the region the completion stage replaces
/// (white-means-inpaint convention).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMask {
    /// Mask data as 0/1 indicators, row-major
    data: Vec<u8>,
    /// Mask dimensions (width, height)
    dimensions: (u32, u32),
}

impl RegionMask {
    /// Create a mask from pre-binarized data.
    ///
    /// # Errors
    ///
    /// Returns [`RepaintError::Internal`] when the data length does not
    /// match the dimensions or any value is outside {0, 1}.
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Result<Self> {
        let expected = dimensions.0 as usize * dimensions.1 as usize;
        if data.len() != expected {
            return Err(RepaintError::internal(format!(
                "mask data length {} does not match dimensions {}x{}",
                data.len(),
                dimensions.0,
                dimensions.1
            )));
        }
        if data.iter().any(|&v| v > 1) {
            return Err(RepaintError::internal("mask data must be binary (0 or 1)"));
        }
        Ok(Self { data, dimensions })
    }

    /// Binarize a raw logit map: sigmoid into [0, 1], then threshold at 0.5.
    ///
    /// Scores exactly at the threshold become 1. Thresholding already-binary
    /// values is idempotent (sigmoid is not re-applied here; this constructor
    /// owns the full logit-to-binary transform).
    #[must_use]
    pub fn from_logits(logits: &Array2<f32>) -> Self {
        let (rows, cols) = logits.dim();
        let data = logits
            .iter()
            .map(|&logit| {
                let score = sigmoid(logit);
                u8::from(score >= BINARIZATION_THRESHOLD)
            })
            .collect();
        Self {
            data,
            dimensions: (cols as u32, rows as u32),
        }
    }

    /// Threshold a map of already-probabilistic scores at 0.5.
    ///
    /// Idempotent over binary input: a map of exact 0.0/1.0 values round-trips
    /// unchanged.
    #[must_use]
    pub fn from_scores(scores: &Array2<f32>) -> Self {
        let (rows, cols) = scores.dim();
        let data = scores
            .iter()
            .map(|&score| u8::from(score >= BINARIZATION_THRESHOLD))
            .collect();
        Self {
            data,
            dimensions: (cols as u32, rows as u32),
        }
    }

    /// Mask dimensions (width, height)
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Binary indicator data, row-major
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Render the mask as a strict black/white RGB image.
    ///
    /// The binary channel is replicated into all three color channels
    /// explicitly; every pixel is exactly (0,0,0) or (255,255,255). This is
    /// the completion capability's expected mask format and deliberately
    /// bypasses any default palette an image writer might apply to
    /// single-channel data.
    #[must_use]
    pub fn to_rgb_image(&self) -> RgbImage {
        let (width, height) = self.dimensions;
        RgbImage::from_fn(width, height, |x, y| {
            let idx = y as usize * width as usize + x as usize;
            let value = self.data.get(idx).copied().unwrap_or(0) * 255;
            Rgb([value, value, value])
        })
    }

    /// Render the mask as a single-channel grayscale image (0 or 255)
    #[must_use]
    pub fn to_luma_image(&self) -> ImageBuffer<Luma<u8>, Vec<u8>> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_fn(width, height, |x, y| {
            let idx = y as usize * width as usize + x as usize;
            Luma([self.data.get(idx).copied().unwrap_or(0) * 255])
        })
    }

    /// Resize to new dimensions with nearest-neighbor resampling.
    ///
    /// Nearest-neighbor keeps the mask strictly binary; interpolating
    /// filters would introduce gray transition pixels.
    #[must_use]
    pub fn resize(&self, target: NormalizedDimensions) -> Self {
        if target.as_tuple() == self.dimensions {
            return self.clone();
        }
        let resized = image::imageops::resize(
            &self.to_luma_image(),
            target.width,
            target.height,
            image::imageops::FilterType::Nearest,
        );
        let data = resized.into_raw().iter().map(|&v| u8::from(v >= 128)).collect();
        Self {
            data,
            dimensions: target.as_tuple(),
        }
    }

    /// Fraction of pixels inside the region
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // pixel counts comfortably fit f64
    pub fn coverage(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let active = self.data.iter().filter(|&&v| v == 1).count();
        active as f64 / self.data.len() as f64
    }

    /// Save the rendered black/white mask as PNG
    ///
    /// # Errors
    /// Returns [`RepaintError::Image`] on encoding failures and
    /// [`RepaintError::Io`] on write failures.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_rgb_image()
            .save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Logistic sigmoid mapping raw logits into [0, 1]
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Derives a [`RegionMask`] from a source image and a text query.
///
/// Thin wrapper over the segmentation capability: runs inference on the
/// original (un-normalized) source image, binarizes the logits, and resizes
/// the result to the request's normalized dimensions.
pub struct MaskGenerator;

impl MaskGenerator {
    /// Generate the binary mask for the region named by `query`.
    ///
    /// # Errors
    ///
    /// Propagates segmentation capability failures as
    /// [`RepaintError::Inference`]; no retry is attempted.
    pub fn generate(
        backend: &mut dyn SegmentationBackend,
        image: &DynamicImage,
        query: &str,
        target: NormalizedDimensions,
    ) -> Result<RegionMask> {
        let logits = backend.segment(image, query)?;
        let mask = RegionMask::from_logits(&logits);
        debug!(
            "segmentation produced {}x{} mask, coverage {:.1}%",
            mask.dimensions().0,
            mask.dimensions().1,
            mask.coverage() * 100.0
        );
        Ok(mask.resize(target))
    }
}
