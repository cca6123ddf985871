//! Assembly result types.

use crate::ArtifactRef;
use serde::{Deserialize, Serialize};

/// Outcome of one optional assembly stage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StageOutcome {
    /// Stage ran and replaced the current artifact
    Applied,
    /// Stage had nothing to apply
    SkippedNoInput,
    /// Stage failed; the pre-stage artifact was kept
    FailedFallback,
}

/// Result of the assembly pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct AssemblyResult {
    /// Final exported artifact
    artifact: ArtifactRef,
    /// Stitching always succeeds when a result exists
    stitched: bool,
    /// Text overlay stage outcome
    text_overlay: StageOutcome,
    /// Audio layer stage outcome
    audio: StageOutcome,
    /// Brand overlay stage outcome
    brand: StageOutcome,
    /// Final export outcome
    export: StageOutcome,
    /// Editing cost in USD
    cost_usd: f64,
}

impl AssemblyResult {
    /// Create an assembly result for a stitched artifact.
    pub fn new(
        artifact: ArtifactRef,
        text_overlay: StageOutcome,
        audio: StageOutcome,
        brand: StageOutcome,
        export: StageOutcome,
        cost_usd: f64,
    ) -> Self {
        Self {
            artifact,
            stitched: true,
            text_overlay,
            audio,
            brand,
            export,
            cost_usd,
        }
    }
}
