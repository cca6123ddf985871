//! Generation request.

use crate::{ArtifactRef, BackendId};
use serde::{Deserialize, Serialize};

/// Everything the pipeline needs to start a run.
///
/// # Examples
///
/// ```
/// use montage_core::GenerationRequestBuilder;
///
/// let request = GenerationRequestBuilder::default()
///     .prompt("A 30 second spot for Acme trail shoes")
///     .target_duration(Some(30u32))
///     .build()
///     .unwrap();
///
/// assert_eq!(*request.target_duration(), Some(30));
/// assert!(request.seed_image().is_none());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct GenerationRequest {
    /// Free-text advertising prompt
    prompt: String,
    /// User-supplied image of the subject
    #[builder(default)]
    #[serde(default)]
    seed_image: Option<ArtifactRef>,
    /// Target video length in seconds
    #[builder(default)]
    #[serde(default)]
    target_duration: Option<u32>,
    /// Explicit backend preference, overriding configuration
    #[builder(default)]
    #[serde(default)]
    preferred_backend: Option<BackendId>,
    /// Seed shared by every scene, overriding configuration
    #[builder(default)]
    #[serde(default)]
    shared_seed: Option<u64>,
    /// Audio track for the audio layer stage
    #[builder(default)]
    #[serde(default)]
    audio_track: Option<ArtifactRef>,
    /// Logo for the brand overlay stage
    #[builder(default)]
    #[serde(default)]
    brand_logo: Option<ArtifactRef>,
}
