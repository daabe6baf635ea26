//! Capability implementations
//!
//! The pipeline consumes segmentation and completion capabilities behind
//! the traits in [`crate::inference`]; production implementations (model
//! runtimes, accelerator bindings) live with the collaborator that loads
//! the weights and are injected through [`crate::inference::InferenceContext`].
//!
//! This crate ships only mock capabilities, used by its own test suite and
//! available to downstream crates for testing pipeline integration without
//! model files.

pub mod test_utils;

pub use self::test_utils::{MockCompletionBackend, MockSegmentationBackend};
