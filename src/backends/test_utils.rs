//! Mock capabilities for testing the prediction pipeline
//!
//! These mocks implement the `SegmentationBackend` and `CompletionBackend`
//! traits without model files or accelerator dependencies. Both record call
//! history for verification and can be constructed in a failing mode to
//! exercise error propagation.

use crate::{
    error::{RepaintError, Result},
    inference::{CompletionBackend, CompletionRequest, SegmentationBackend},
};
use image::{DynamicImage, Rgb, RgbImage};
use ndarray::Array2;
use std::collections::hash_map::DefaultHasher;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Arc, Mutex};

/// Working resolution of the mock segmentation capability.
///
/// Matches the fixed internal resolution real text-conditioned segmentation
/// models resample to, so pipeline tests exercise the resize path.
pub const MOCK_SEGMENTATION_RESOLUTION: usize = 352;

/// Mock segmentation capability producing a deterministic, query-dependent
/// logit map.
#[derive(Debug, Clone)]
pub struct MockSegmentationBackend {
    /// Whether the backend reports ready
    initialized: bool,
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
    /// Whether to simulate inference failure
    should_fail: bool,
}

impl MockSegmentationBackend {
    /// Create a new ready mock backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: true,
            call_history: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    /// Create a mock backend whose `segment` calls fail
    #[must_use]
    pub fn new_failing() -> Self {
        let mut backend = Self::new();
        backend.should_fail = true;
        backend
    }

    /// Get the call history for verification in tests
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        self.call_history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    fn record_call(&self, entry: String) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(entry);
        }
    }

    /// Deterministic logit map: a rectangle whose placement depends on the
    /// query, strongly positive inside and strongly negative outside so the
    /// sigmoid-and-threshold step produces a clean binary region.
    fn generate_logits(query: &str) -> Array2<f32> {
        let size = MOCK_SEGMENTATION_RESOLUTION;
        let mut hasher = DefaultHasher::new();
        query.hash(&mut hasher);
        let digest = hasher.finish();

        let quarter = size / 4;
        let x0 = (digest as usize) % quarter + quarter;
        let y0 = ((digest >> 16) as usize) % quarter + quarter;
        let x1 = x0 + quarter;
        let y1 = y0 + quarter;

        Array2::from_shape_fn((size, size), |(y, x)| {
            if x >= x0 && x < x1 && y >= y0 && y < y1 {
                6.0
            } else {
                -6.0
            }
        })
    }
}

impl Default for MockSegmentationBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationBackend for MockSegmentationBackend {
    fn segment(&mut self, image: &DynamicImage, query: &str) -> Result<Array2<f32>> {
        self.record_call(format!(
            "segment({}x{}, {:?})",
            image.width(),
            image.height(),
            query
        ));
        if self.should_fail {
            return Err(RepaintError::inference(
                "mock segmentation failure: simulated device error",
            ));
        }
        Ok(Self::generate_logits(query))
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Mock completion capability with a faithful determinism contract.
///
/// With a seed the fill is a pure function of (inputs, seed): identical
/// calls produce byte-identical output. Without a seed each call draws a
/// fresh ambient nonce, so outputs are expected to differ across calls.
#[derive(Debug, Clone)]
pub struct MockCompletionBackend {
    /// Whether the backend reports ready
    initialized: bool,
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
    /// Seed observed on the most recent call
    last_seed: Arc<Mutex<Option<Option<u64>>>>,
    /// Scale and steps observed on the most recent call
    last_scale_and_steps: Arc<Mutex<Option<(f32, u32)>>>,
    /// Whether to simulate inference failure
    should_fail: bool,
}

impl MockCompletionBackend {
    /// Create a new ready mock backend
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: true,
            call_history: Arc::new(Mutex::new(Vec::new())),
            last_seed: Arc::new(Mutex::new(None)),
            last_scale_and_steps: Arc::new(Mutex::new(None)),
            should_fail: false,
        }
    }

    /// Create a mock backend whose `complete` calls fail
    #[must_use]
    pub fn new_failing() -> Self {
        let mut backend = Self::new();
        backend.should_fail = true;
        backend
    }

    /// Get the call history for verification in tests
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        self.call_history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    /// Seed observed on the most recent call (`None` = never called)
    #[must_use]
    pub fn last_seed(&self) -> Option<Option<u64>> {
        self.last_seed.lock().ok().and_then(|s| *s)
    }

    /// Scale and steps observed on the most recent call
    #[must_use]
    pub fn last_scale_and_steps(&self) -> Option<(f32, u32)> {
        self.last_scale_and_steps.lock().ok().and_then(|s| *s)
    }

    fn record_call(&self, entry: String) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(entry);
        }
    }

    /// Per-call nonce for unseeded sampling. `RandomState` carries
    /// process-level entropy and a per-instantiation counter, so two nonces
    /// from consecutive calls differ.
    fn ambient_nonce() -> u64 {
        let state = std::collections::hash_map::RandomState::new();
        let mut hasher = state.build_hasher();
        0_u64.hash(&mut hasher);
        hasher.finish()
    }

    /// Average color of the reference image, the mock's stand-in for
    /// "visually consistent with the reference".
    fn reference_mean(reference: &DynamicImage) -> [u8; 3] {
        let rgb = reference.to_rgb8();
        let count = u64::from(rgb.width()) * u64::from(rgb.height());
        if count == 0 {
            return [0, 0, 0];
        }
        let mut sums = [0_u64; 3];
        for pixel in rgb.pixels() {
            sums[0] += u64::from(pixel[0]);
            sums[1] += u64::from(pixel[1]);
            sums[2] += u64::from(pixel[2]);
        }
        [
            (sums[0] / count) as u8,
            (sums[1] / count) as u8,
            (sums[2] / count) as u8,
        ]
    }
}

impl Default for MockCompletionBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// xorshift64* step, enough PRNG for a mock fill
fn xorshift(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x.wrapping_mul(0x2545_F491_4F6C_DD1D)
}

impl CompletionBackend for MockCompletionBackend {
    fn complete(&mut self, request: &CompletionRequest<'_>) -> Result<DynamicImage> {
        self.record_call(format!(
            "complete({}x{}, seed={:?}, scale={}, steps={})",
            request.image.width(),
            request.image.height(),
            request.seed,
            request.guidance_scale,
            request.steps
        ));
        if let Ok(mut last) = self.last_seed.lock() {
            *last = Some(request.seed);
        }
        if let Ok(mut last) = self.last_scale_and_steps.lock() {
            *last = Some((request.guidance_scale, request.steps));
        }

        if self.should_fail {
            return Err(RepaintError::inference(
                "mock completion failure: simulated device error",
            ));
        }
        if request.image.dimensions() != request.mask.dimensions() {
            return Err(RepaintError::inference(
                "mock completion: image and mask dimensions disagree",
            ));
        }

        // Distinct seeds must map to distinct generator states; zero is not
        // a valid xorshift state.
        let mut state = request
            .seed
            .unwrap_or_else(Self::ambient_nonce)
            .wrapping_add(0x9E37_79B9_7F4A_7C15);
        if state == 0 {
            state = 1;
        }
        let mean = Self::reference_mean(request.reference);
        let (width, height) = request.image.dimensions();

        let mut output = RgbImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let masked = request.mask.get_pixel(x, y)[0] >= 128;
                let pixel = if masked {
                    // Fill: reference mean perturbed by the generator stream
                    let noise = xorshift(&mut state);
                    Rgb([
                        mean[0].wrapping_add((noise & 0x0F) as u8),
                        mean[1].wrapping_add(((noise >> 8) & 0x0F) as u8),
                        mean[2].wrapping_add(((noise >> 16) & 0x0F) as u8),
                    ])
                } else {
                    *request.image.get_pixel(x, y)
                };
                output.put_pixel(x, y, pixel);
            }
        }

        Ok(DynamicImage::ImageRgb8(output))
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
