//! Image chain types.

use crate::ArtifactRef;
use montage_error::{ChainError, ChainErrorKind};
use serde::{Deserialize, Serialize};

/// Which image a chain produces for each scene.
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
pub enum ChainKind {
    /// Reference image anchoring the subject
    Reference,
    /// First frame of the clip
    StartFrame,
    /// Last frame of the clip
    EndFrame,
}

/// How a chain link's artifact came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSource {
    /// User-supplied seed image copied in verbatim
    UserSeed,
    /// Produced by the image-generation collaborator
    Generated,
}

/// One position in an image chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ChainLink {
    /// 1-based chain position
    position: usize,
    /// Scene this image belongs to
    scene_number: u32,
    /// Produced image
    artifact: ArtifactRef,
    /// Seed image passed to the generator, if any
    seed: Option<ArtifactRef>,
    /// Origin of the artifact
    source: LinkSource,
    /// Cost of producing this link in USD
    cost_usd: f64,
}

impl ChainLink {
    /// Create a link.
    pub fn new(
        position: usize,
        scene_number: u32,
        artifact: ArtifactRef,
        seed: Option<ArtifactRef>,
        source: LinkSource,
        cost_usd: f64,
    ) -> Self {
        Self {
            position,
            scene_number,
            artifact,
            seed,
            source,
            cost_usd,
        }
    }
}

/// Ordered images for one chain kind.
///
/// Every link after the first was generated with its predecessor's artifact as
/// the visual seed. The first link is either generated or a user seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ImageChain {
    /// Chain kind
    kind: ChainKind,
    /// Links in position order
    links: Vec<ChainLink>,
}

impl ImageChain {
    /// Create an empty chain.
    pub fn new(kind: ChainKind) -> Self {
        Self {
            kind,
            links: Vec::new(),
        }
    }

    /// Append a link.
    pub fn push(&mut self, link: ChainLink) {
        self.links.push(link);
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain has no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Artifact of the first link.
    pub fn first_artifact(&self) -> Option<&ArtifactRef> {
        self.links.first().map(ChainLink::artifact)
    }

    /// Artifact of the last link; the seed for the next position.
    pub fn last_artifact(&self) -> Option<&ArtifactRef> {
        self.links.last().map(ChainLink::artifact)
    }

    /// Artifact generated for a scene.
    pub fn artifact_for_scene(&self, scene_number: u32) -> Option<&ArtifactRef> {
        self.links
            .iter()
            .find(|link| link.scene_number == scene_number)
            .map(ChainLink::artifact)
    }

    /// Total cost of the chain in USD.
    pub fn total_cost_usd(&self) -> f64 {
        self.links.iter().map(|link| link.cost_usd).sum()
    }

    /// Check that every link after the first was seeded with its predecessor.
    ///
    /// # Errors
    ///
    /// Returns `ChainErrorKind::SeedMismatch` for the first offending position.
    pub fn verify_seeding(&self) -> Result<(), ChainError> {
        for pair in self.links.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.seed.as_ref() != Some(&previous.artifact) {
                return Err(ChainError::new(ChainErrorKind::SeedMismatch {
                    chain: self.kind.to_string(),
                    position: current.position,
                }));
            }
        }
        Ok(())
    }
}
