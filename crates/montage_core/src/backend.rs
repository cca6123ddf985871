//! Video backend identity and capability descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of an interchangeable video generation backend.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    /// Create a backend id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BackendId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Optional image inputs a video backend may accept.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VideoInput {
    /// A single generic reference image
    ReferenceImage,
    /// Frame the clip opens on
    StartImage,
    /// Frame the clip ends on
    EndImage,
    /// A list of reference images
    MultiReferenceImages,
}

/// Output aspect ratio.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
pub enum AspectRatio {
    /// 16:9 landscape
    #[default]
    #[serde(rename = "16:9")]
    #[strum(serialize = "16:9")]
    Landscape,
    /// 9:16 portrait
    #[serde(rename = "9:16")]
    #[strum(serialize = "9:16")]
    Portrait,
    /// 1:1 square
    #[serde(rename = "1:1")]
    #[strum(serialize = "1:1")]
    Square,
    /// 4:3 classic
    #[serde(rename = "4:3")]
    #[strum(serialize = "4:3")]
    Classic,
}

/// What a backend accepts and which constraints it imposes.
///
/// Captured once per backend at registration; the dispatcher shapes every
/// request from this descriptor rather than assuming all inputs are accepted.
///
/// # Examples
///
/// ```
/// use montage_core::{BackendCapabilitiesBuilder, VideoInput};
///
/// let caps = BackendCapabilitiesBuilder::default()
///     .accepted_inputs([VideoInput::StartImage, VideoInput::EndImage].into_iter().collect::<std::collections::BTreeSet<_>>())
///     .fixed_durations(vec![5, 10])
///     .build()
///     .unwrap();
///
/// assert!(caps.accepts(VideoInput::EndImage));
/// assert!(!caps.accepts(VideoInput::ReferenceImage));
/// assert_eq!(caps.shape_duration(7), 10);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct BackendCapabilities {
    /// Optional inputs the backend accepts
    #[builder(default)]
    accepted_inputs: BTreeSet<VideoInput>,
    /// Fixed durations in seconds (empty means any duration)
    #[builder(default)]
    fixed_durations: Vec<u32>,
    /// Supported aspect ratios (empty means any ratio)
    #[builder(default)]
    aspect_ratios: Vec<AspectRatio>,
    /// Longest clip the backend produces in seconds
    #[builder(default = "10")]
    max_clip_seconds: u32,
}

impl BackendCapabilities {
    /// Whether the backend accepts an input kind.
    pub fn accepts(&self, input: VideoInput) -> bool {
        self.accepted_inputs.contains(&input)
    }

    /// Whether the backend can anchor a clip on a reference image in any form.
    pub fn accepts_reference(&self) -> bool {
        self.accepts(VideoInput::ReferenceImage) || self.accepts(VideoInput::MultiReferenceImages)
    }

    /// Snap a requested duration to what the backend produces.
    ///
    /// With fixed durations, picks the smallest allowed value not below the
    /// request, else the largest allowed value. The result never exceeds
    /// `max_clip_seconds`.
    pub fn shape_duration(&self, requested: u32) -> u32 {
        let requested = requested.max(1);
        let snapped = if self.fixed_durations.is_empty() {
            requested
        } else {
            let mut allowed = self.fixed_durations.clone();
            allowed.sort_unstable();
            allowed
                .iter()
                .copied()
                .find(|duration| *duration >= requested)
                .or_else(|| allowed.last().copied())
                .unwrap_or(requested)
        };
        snapped.min(self.max_clip_seconds.max(1))
    }

    /// Pick the requested aspect ratio if supported, else the first supported one.
    pub fn shape_aspect_ratio(&self, requested: AspectRatio) -> AspectRatio {
        if self.aspect_ratios.is_empty() || self.aspect_ratios.contains(&requested) {
            requested
        } else {
            self.aspect_ratios[0]
        }
    }
}
