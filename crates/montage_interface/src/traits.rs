//! Trait definitions for external collaborators.

use crate::{
    EditResult, GeneratedClip, GeneratedImage, ImageRequest, PlannerResponse, PlanningRequest,
    StitchSegment, TextOverlaySpec, VideoRequest,
};
use async_trait::async_trait;
use montage_core::{ArtifactRef, BackendCapabilities, BackendId};
use montage_error::MontageResult;

/// Narrative-planning collaborator.
///
/// Receives the prompt, optional seed image and required scene count, and
/// answers with raw text containing a ScenePlan-shaped JSON payload. The
/// storyboard orchestrator extracts and validates the payload; the planner is
/// never trusted to uphold the subject-identity invariant.
#[async_trait]
pub trait NarrativePlanner: Send + Sync {
    /// Produce a storyboard payload.
    async fn plan(&self, request: &PlanningRequest) -> MontageResult<PlannerResponse>;

    /// Planner name for logging.
    fn name(&self) -> &str;
}

/// Image-generation collaborator.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image, optionally seeded by a previous image.
    async fn generate(&self, request: &ImageRequest) -> MontageResult<GeneratedImage>;
}

/// One interchangeable video-generation backend.
///
/// Each backend declares the optional inputs it accepts and its constraints
/// through [`BackendCapabilities`]; the dispatcher shapes requests from that
/// descriptor.
#[async_trait]
pub trait VideoBackend: Send + Sync {
    /// Backend identifier used in the capability table and fingerprints.
    fn id(&self) -> &BackendId;

    /// Accepted inputs and constraints.
    fn capabilities(&self) -> BackendCapabilities;

    /// Generate one clip.
    async fn generate(&self, request: &VideoRequest) -> MontageResult<GeneratedClip>;
}

/// Video-editing collaborator used by the assembly pipeline.
#[async_trait]
pub trait VideoEditor: Send + Sync {
    /// Concatenate clips in the given order with the given transitions.
    async fn stitch(&self, segments: &[StitchSegment]) -> MontageResult<EditResult>;

    /// Burn text overlays into a video.
    async fn overlay_text(
        &self,
        video: &ArtifactRef,
        overlays: &[TextOverlaySpec],
    ) -> MontageResult<EditResult>;

    /// Lay an audio track under a video.
    async fn add_audio(&self, video: &ArtifactRef, audio: &ArtifactRef) -> MontageResult<EditResult>;

    /// Overlay a brand token (and optional logo) on a video.
    async fn brand_overlay(
        &self,
        video: &ArtifactRef,
        brand: &str,
        logo: Option<&ArtifactRef>,
    ) -> MontageResult<EditResult>;

    /// Produce the final deliverable.
    async fn export(&self, video: &ArtifactRef) -> MontageResult<EditResult>;
}
