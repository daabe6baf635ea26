//! Core result types for region replacement operations

use crate::{
    dimensions::NormalizedDimensions,
    error::{RepaintError, Result},
    mask::RegionMask,
};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-stage timing breakdown in milliseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Dimension normalization and source resize
    pub normalization_ms: u64,

    /// Segmentation inference plus binarization and mask resize
    pub mask_generation_ms: u64,

    /// Completion inference
    pub completion_ms: u64,

    /// Total end-to-end predict time
    pub total_ms: u64,
}

/// Metadata describing one completed predict run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Detailed timing breakdown
    pub timings: ProcessingTimings,

    /// Display name of the segmentation model
    pub segmentation_model: String,

    /// Display name of the completion model
    pub completion_model: String,

    /// Text query naming the replaced region
    pub query: String,

    /// Whether the run used a deterministic generator
    pub deterministic: bool,

    /// When the run completed
    pub completed_at: DateTime<Utc>,
}

impl ProcessingMetadata {
    /// Create new metadata for a run of the named models
    #[must_use]
    pub fn new(segmentation_model: String, completion_model: String, query: String) -> Self {
        Self {
            timings: ProcessingTimings::default(),
            segmentation_model,
            completion_model,
            query,
            deterministic: false,
            completed_at: Utc::now(),
        }
    }

    /// Record the timing breakdown and stamp the completion time
    pub fn set_timings(&mut self, timings: ProcessingTimings) {
        self.timings = timings;
        self.completed_at = Utc::now();
    }
}

/// Result of one region replacement run.
///
/// The output image stays at normalized resolution unless the processor was
/// configured with `resize_output_to_source`. The reveal triple is a
/// pass-through UI signal: all three flags are raised on success and the
/// caller owns their meaning (the pipeline never raises them on failure
/// because no result is produced at all).
#[derive(Debug, Clone)]
pub struct RepaintResult {
    /// The completed image
    pub image: DynamicImage,

    /// The binary mask that selected the replaced region
    pub mask: RegionMask,

    /// Original source dimensions (width, height)
    pub original_dimensions: (u32, u32),

    /// Normalized dimensions the pipeline operated at
    pub normalized_dimensions: NormalizedDimensions,

    /// Processing metadata
    pub metadata: ProcessingMetadata,

    /// Auxiliary-control reveal flags, all `true` on success
    pub reveal: [bool; 3],
}

impl RepaintResult {
    /// Create a new result with all reveal flags raised
    #[must_use]
    pub fn new(
        image: DynamicImage,
        mask: RegionMask,
        original_dimensions: (u32, u32),
        normalized_dimensions: NormalizedDimensions,
        metadata: ProcessingMetadata,
    ) -> Self {
        Self {
            image,
            mask,
            original_dimensions,
            normalized_dimensions,
            metadata,
            reveal: [true; 3],
        }
    }

    /// Save the output image as PNG
    ///
    /// # Errors
    /// Returns [`RepaintError::Image`] on encoding or write failures.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Save the output image as JPEG at the given quality
    ///
    /// # Errors
    /// Returns [`RepaintError::Image`] on encoding failures and
    /// [`RepaintError::Io`] when the file cannot be created.
    pub fn save_jpeg<P: AsRef<Path>>(&self, path: P, quality: u8) -> Result<()> {
        let rgb_image = self.image.to_rgb8();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            std::fs::File::create(path)?,
            quality,
        );
        encoder.encode_image(&rgb_image)?;
        Ok(())
    }

    /// Encode the output image as PNG bytes
    ///
    /// # Errors
    /// Returns [`RepaintError::Image`] on encoding failures.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.image.write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )?;
        Ok(buffer)
    }

    /// Get the output image as raw RGB bytes
    #[must_use]
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.image.to_rgb8().into_raw()
    }

    /// Serialize the run metadata as pretty JSON
    ///
    /// # Errors
    /// Returns [`RepaintError::Internal`] on serialization failures.
    pub fn metadata_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.metadata)
            .map_err(|e| RepaintError::internal(format!("failed to serialize metadata: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> RepaintResult {
        let image = DynamicImage::new_rgb8(16, 8);
        let mask = RegionMask::new(vec![0; 16 * 8], (16, 8)).unwrap();
        let metadata = ProcessingMetadata::new(
            "seg-model".to_string(),
            "fill-model".to_string(),
            "shirt".to_string(),
        );
        RepaintResult::new(
            image,
            mask,
            (640, 320),
            NormalizedDimensions {
                width: 16,
                height: 8,
            },
            metadata,
        )
    }

    #[test]
    fn test_result_raises_all_reveal_flags() {
        let result = sample_result();
        assert_eq!(result.reveal, [true, true, true]);
    }

    #[test]
    fn test_png_bytes_round_trip() {
        let result = sample_result();
        let bytes = result.to_png_bytes().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 8);
    }

    #[test]
    fn test_save_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result();

        let png_path = dir.path().join("out.png");
        result.save_png(&png_path).unwrap();
        assert!(png_path.exists());

        let jpeg_path = dir.path().join("out.jpg");
        result.save_jpeg(&jpeg_path, 90).unwrap();
        assert!(jpeg_path.exists());
    }

    #[test]
    fn test_metadata_json_contains_models_and_query() {
        let result = sample_result();
        let json = result.metadata_json().unwrap();
        assert!(json.contains("seg-model"));
        assert!(json.contains("fill-model"));
        assert!(json.contains("shirt"));
    }

    #[test]
    fn test_metadata_set_timings() {
        let mut metadata = ProcessingMetadata::new(
            "seg".to_string(),
            "fill".to_string(),
            "hat".to_string(),
        );
        metadata.set_timings(ProcessingTimings {
            normalization_ms: 1,
            mask_generation_ms: 2,
            completion_ms: 3,
            total_ms: 6,
        });
        assert_eq!(metadata.timings.total_ms, 6);
    }
}
