//! Dimension normalization for the completion model's geometry constraints
//!
//! The completion model operates in a latent space with an 8-pixel tiling
//! granularity and is calibrated for a 512-pixel short side. Normalization
//! maps arbitrary input dimensions onto that grid: the shorter side becomes
//! exactly 512 and the longer side is scaled proportionally, then truncated
//! down to a multiple of 8.

use crate::error::{RepaintError, Result};

/// Short side of every normalized image, in pixels.
pub const TARGET_SHORT_SIDE: u32 = 512;

/// Tiling granularity of the completion model's latent space, in pixels.
pub const TILE_MULTIPLE: u32 = 8;

/// Output dimensions satisfying the completion model's constraints.
///
/// Produced by [`NormalizedDimensions::compute`]; the shorter of the two
/// original sides maps to exactly [`TARGET_SHORT_SIDE`] and the longer side
/// to a multiple of [`TILE_MULTIPLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDimensions {
    /// Normalized width in pixels
    pub width: u32,
    /// Normalized height in pixels
    pub height: u32,
}

impl NormalizedDimensions {
    /// Compute normalized dimensions from original image dimensions.
    ///
    /// For `width < height` the scale factor is `width / 512.0` and the
    /// height maps to `floor((height / factor) / 8) * 8`; otherwise
    /// (including the square case) the roles are swapped. The factor is an
    /// IEEE double-precision quotient and the multiple-of-8 rounding
    /// truncates toward zero rather than rounding to nearest.
    ///
    /// This is a pure computation and deliberately does not guard against
    /// degenerate results. Callers that feed the result into the pipeline
    /// run [`NormalizedDimensions::validate`] first.
    #[must_use]
    pub fn compute(width: u32, height: u32) -> Self {
        if width < height {
            let factor = f64::from(width) / f64::from(TARGET_SHORT_SIDE);
            Self {
                width: TARGET_SHORT_SIDE,
                height: free_side(f64::from(height) / factor),
            }
        } else {
            let factor = f64::from(height) / f64::from(TARGET_SHORT_SIDE);
            Self {
                width: free_side(f64::from(width) / factor),
                height: TARGET_SHORT_SIDE,
            }
        }
    }

    /// Check that both sides are usable by the completion model.
    ///
    /// # Errors
    ///
    /// Returns [`RepaintError::DegenerateDimensions`] when either side is
    /// zero. Unreachable for values produced by [`Self::compute`] from
    /// positive inputs (the free side is the longer one and scales to at
    /// least 512), but the guard keeps the invariant explicit for
    /// dimensions constructed any other way.
    pub fn validate(self, original_width: u32, original_height: u32) -> Result<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(RepaintError::DegenerateDimensions {
                width: original_width,
                height: original_height,
                normalized_width: self.width,
                normalized_height: self.height,
            });
        }
        Ok(self)
    }

    /// Dimensions as a `(width, height)` tuple
    #[must_use]
    pub const fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Truncate the scaled free side down to a tile multiple.
///
/// The intermediate runs in u64: the scaled length is bounded by
/// `u32::MAX * 512`, which overflows u32 for extreme aspect ratios. A value
/// beyond `u32` saturates to the largest tile multiple that fits, keeping
/// the divisibility invariant without a panic path.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
// f64 -> u64 truncation is the specified rounding mode here
fn free_side(scaled: f64) -> u32 {
    const MAX_TILED: u32 = u32::MAX - (u32::MAX % TILE_MULTIPLE);
    let tiled = (scaled / f64::from(TILE_MULTIPLE)) as u64 * u64::from(TILE_MULTIPLE);
    u32::try_from(tiled).unwrap_or(MAX_TILED)
}

impl std::fmt::Display for NormalizedDimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portrait_short_side_maps_to_512() {
        for (w, h) in [(1, 2), (100, 101), (400, 800), (511, 512), (1000, 4000)] {
            let dims = NormalizedDimensions::compute(w, h);
            assert_eq!(dims.width, 512, "width for {}x{}", w, h);
            assert_eq!(dims.height % 8, 0, "height multiple of 8 for {}x{}", w, h);
        }
    }

    #[test]
    fn test_landscape_and_square_short_side_maps_to_512() {
        for (w, h) in [(2, 1), (512, 512), (800, 400), (4000, 1000), (513, 512)] {
            let dims = NormalizedDimensions::compute(w, h);
            assert_eq!(dims.height, 512, "height for {}x{}", w, h);
            assert_eq!(dims.width % 8, 0, "width multiple of 8 for {}x{}", w, h);
        }
    }

    #[test]
    fn test_exact_formula_400x800() {
        // factor = 400/512 = 0.78125, 800/factor = 1024.0, floor(1024/8)*8 = 1024
        let dims = NormalizedDimensions::compute(400, 800);
        assert_eq!(dims, NormalizedDimensions { width: 512, height: 1024 });
    }

    #[test]
    fn test_square_input_keeps_height_at_512() {
        // width >= height branch owns the equal case
        let dims = NormalizedDimensions::compute(768, 768);
        assert_eq!(dims.height, 512);
        assert_eq!(dims.width, 512);
    }

    #[test]
    fn test_truncation_not_rounding() {
        // 640x480: factor = 480/512 = 0.9375, 640/0.9375 = 682.666..,
        // 682.666../8 = 85.333.. which truncates to 85, giving 680 (nearest
        // rounding would give 688).
        let dims = NormalizedDimensions::compute(640, 480);
        assert_eq!(dims.as_tuple(), (680, 512));
    }

    #[test]
    fn test_free_side_never_below_512_for_positive_inputs() {
        // The free side is always the longer original side, so post-scale it
        // is at least 512 and floor-to-8 cannot collapse it. validate() still
        // guards the invariant for dimensions constructed outside compute().
        for (w, h) in [(1, 100_000), (100_000, 1), (3, 7)] {
            let dims = NormalizedDimensions::compute(w, h);
            assert!(dims.width >= 512 && dims.height >= 512, "{}x{}", w, h);
        }
    }

    #[test]
    fn test_extreme_aspect_ratio_saturates_instead_of_panicking() {
        // The scaled free side for 1xN is N * 512, which leaves u32 range
        // long before N does; the result caps at the largest tile multiple.
        let cap = u32::MAX - (u32::MAX % 8);
        let dims = NormalizedDimensions::compute(1, u32::MAX);
        assert_eq!(dims.width, 512);
        assert_eq!(dims.height, cap);

        let dims = NormalizedDimensions::compute(u32::MAX, 1);
        assert_eq!(dims.height, 512);
        assert_eq!(dims.width, cap);
        assert_eq!(dims.width % 8, 0);
    }

    #[test]
    fn test_validate_rejects_collapsed_side() {
        let dims = NormalizedDimensions {
            width: 0,
            height: 512,
        };
        let err = dims.validate(20000, 2).unwrap_err();
        assert!(matches!(err, RepaintError::DegenerateDimensions { .. }));
    }

    #[test]
    fn test_validate_passes_positive_dimensions() {
        let dims = NormalizedDimensions::compute(400, 800);
        assert_eq!(dims.validate(400, 800).unwrap(), dims);
    }

    #[test]
    fn test_display_format() {
        let dims = NormalizedDimensions::compute(400, 800);
        assert_eq!(dims.to_string(), "512x1024");
    }
}
