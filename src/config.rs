//! Configuration types for region replacement operations

use crate::error::{RepaintError, Result};
use serde::{Deserialize, Serialize};

/// Seed value selecting non-deterministic sampling
pub const RANDOM_SEED_SENTINEL: u64 = 0;

/// Documented guidance-scale range (forwarded verbatim, never clamped)
pub const GUIDANCE_SCALE_RANGE: (f32, f32) = (1.0, 15.0);

/// Documented refinement-step range (forwarded verbatim, never clamped)
pub const STEPS_RANGE: (u32, u32) = (2, 75);

/// Sampling parameters for one completion invocation.
///
/// `seed == 0` is the sentinel for "use ambient randomness"; any other value
/// selects a deterministic generator seeded with exactly that value, making
/// repeated runs with identical inputs byte-identical. `guidance_scale` and
/// `steps` are forwarded to the completion capability without clamping;
/// values outside the capability's supported ranges surface as inference
/// errors from the capability itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Guidance strength: how strongly the fill conforms to the reference
    pub guidance_scale: f32,
    /// Deterministic generator seed; 0 means non-deterministic
    pub seed: u64,
    /// Number of refinement iterations
    pub steps: u32,
}

impl GenerationParams {
    /// Create parameters, validating the structural constraints.
    ///
    /// # Errors
    ///
    /// Returns [`RepaintError::InvalidConfig`] for a non-positive guidance
    /// scale or zero steps. Values inside the structural bounds but outside
    /// the documented typical ranges are accepted (the capability owns range
    /// enforcement).
    pub fn new(guidance_scale: f32, seed: u64, steps: u32) -> Result<Self> {
        let params = Self {
            guidance_scale,
            seed,
            steps,
        };
        params.validate()?;
        Ok(params)
    }

    /// Validate structural constraints without constructing
    ///
    /// # Errors
    /// Returns [`RepaintError::InvalidConfig`] with the offending value.
    pub fn validate(&self) -> Result<()> {
        if !self.guidance_scale.is_finite() || self.guidance_scale <= 0.0 {
            return Err(RepaintError::invalid_config(format!(
                "guidance scale must be a positive finite number, got {}",
                self.guidance_scale
            )));
        }
        if self.steps == 0 {
            return Err(RepaintError::invalid_config(
                "steps must be at least 1, got 0",
            ));
        }
        Ok(())
    }

    /// True when this request asked for deterministic sampling
    #[must_use]
    pub const fn is_deterministic(&self) -> bool {
        self.seed != RANDOM_SEED_SENTINEL
    }

    /// Map the seed sentinel onto the capability contract:
    /// `0 -> None` (ambient randomness), anything else -> `Some(seed)`.
    #[must_use]
    pub const fn generator_seed(&self) -> Option<u64> {
        match self.seed {
            RANDOM_SEED_SENTINEL => None,
            seed => Some(seed),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        // Defaults mirror the reference front-end: scale 5, 50 steps, random seed
        Self {
            guidance_scale: 5.0,
            seed: RANDOM_SEED_SENTINEL,
            steps: 50,
        }
    }
}

/// Configuration for the region replacement processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaintConfig {
    /// Display name of the segmentation model (metadata only)
    pub segmentation_model: String,
    /// Display name of the completion model (metadata only)
    pub completion_model: String,
    /// Resize the completed image back to the source resolution.
    ///
    /// Off by default: the pipeline's observed behavior returns the output
    /// at normalized resolution. This is the explicit opt-in for callers
    /// that want source-resolution output.
    pub resize_output_to_source: bool,
    /// Enable debug logging of intermediate dimensions and coverage
    pub debug: bool,
}

impl RepaintConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> RepaintConfigBuilder {
        RepaintConfigBuilder::new()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`RepaintError::InvalidConfig`] for empty model display names.
    pub fn validate(&self) -> Result<()> {
        if self.segmentation_model.trim().is_empty() {
            return Err(RepaintError::invalid_config(
                "segmentation model display name must not be empty",
            ));
        }
        if self.completion_model.trim().is_empty() {
            return Err(RepaintError::invalid_config(
                "completion model display name must not be empty",
            ));
        }
        Ok(())
    }
}

impl Default for RepaintConfig {
    fn default() -> Self {
        Self {
            segmentation_model: "clipseg-rd64-refined".to_string(),
            completion_model: "paint-by-example".to_string(),
            resize_output_to_source: false,
            debug: false,
        }
    }
}

/// Builder for [`RepaintConfig`]
pub struct RepaintConfigBuilder {
    config: RepaintConfig,
}

impl RepaintConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RepaintConfig::default(),
        }
    }

    #[must_use]
    pub fn segmentation_model<S: Into<String>>(mut self, name: S) -> Self {
        self.config.segmentation_model = name.into();
        self
    }

    #[must_use]
    pub fn completion_model<S: Into<String>>(mut self, name: S) -> Self {
        self.config.completion_model = name.into();
        self
    }

    #[must_use]
    pub fn resize_output_to_source(mut self, resize: bool) -> Self {
        self.config.resize_output_to_source = resize;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// Returns [`RepaintError::InvalidConfig`] when validation fails.
    pub fn build(self) -> Result<RepaintConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for RepaintConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
