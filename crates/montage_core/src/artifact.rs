//! Artifact references produced and consumed by collaborators.

use serde::{Deserialize, Serialize};

/// Type of media an artifact holds.
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
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Still image (reference, start or end frame)
    #[display("image")]
    Image,
    /// Video clip or assembled video
    #[display("video")]
    Video,
    /// Audio track
    #[display("audio")]
    Audio,
}

/// Opaque reference to an artifact held by an external store.
///
/// The pipeline never inspects artifact bytes; it only passes references
/// between collaborators and compares them for chain seeding and caching.
///
/// # Examples
///
/// ```
/// use montage_core::{ArtifactRef, MediaType};
///
/// let image = ArtifactRef::image("s3://bucket/scene-1.png");
/// assert_eq!(*image.media_type(), MediaType::Image);
/// assert_eq!(image.uri(), "s3://bucket/scene-1.png");
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct ArtifactRef {
    /// Location of the artifact
    uri: String,
    /// Type of media
    media_type: MediaType,
}

impl ArtifactRef {
    /// Create a reference to an artifact.
    pub fn new(uri: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            uri: uri.into(),
            media_type,
        }
    }

    /// Create a reference to an image artifact.
    pub fn image(uri: impl Into<String>) -> Self {
        Self::new(uri, MediaType::Image)
    }

    /// Create a reference to a video artifact.
    pub fn video(uri: impl Into<String>) -> Self {
        Self::new(uri, MediaType::Video)
    }

    /// Create a reference to an audio artifact.
    pub fn audio(uri: impl Into<String>) -> Self {
        Self::new(uri, MediaType::Audio)
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.media_type, self.uri)
    }
}
