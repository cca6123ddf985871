//! Completed per-scene clips.

use crate::{ArtifactRef, BackendId};
use serde::{Deserialize, Serialize};

/// A generated (or cache-reused) clip for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Clip {
    /// Scene this clip renders
    scene_number: u32,
    /// Clip artifact
    artifact: ArtifactRef,
    /// Backend that produced it
    backend: BackendId,
    /// Clip length in seconds
    duration_seconds: u32,
    /// Cost incurred by this run (zero on cache hits)
    cost_usd: f64,
    /// Whether the clip came from the clip cache
    from_cache: bool,
}

impl Clip {
    /// Create a clip.
    pub fn new(
        scene_number: u32,
        artifact: ArtifactRef,
        backend: BackendId,
        duration_seconds: u32,
        cost_usd: f64,
        from_cache: bool,
    ) -> Self {
        Self {
            scene_number,
            artifact,
            backend,
            duration_seconds,
            cost_usd,
            from_cache,
        }
    }
}
