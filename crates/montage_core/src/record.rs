//! Generation record and lifecycle status.

use crate::{ArtifactRef, AssemblyResult, ScenePlan};
use chrono::{DateTime, Utc};
use montage_error::{PipelineError, PipelineErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one generation run.
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
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct GenerationId(Uuid);

impl GenerationId {
    /// Create a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle status of a generation.
///
/// `pending → planning → generating_images → generating_video → assembling →
/// {completed | failed | cancelled}`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GenerationStatus {
    /// Created, not yet picked up by a driver
    #[default]
    Pending,
    /// Storyboard planning
    Planning,
    /// Image chains
    GeneratingImages,
    /// Per-scene video dispatch
    GeneratingVideo,
    /// Stitching and enrichment
    Assembling,
    /// Finished (possibly with partial success)
    Completed,
    /// Finished with a fatal failure
    Failed,
    /// Cancelled by the user
    Cancelled,
}

impl GenerationStatus {
    /// Position in the forward pipeline order.
    fn stage_index(&self) -> u8 {
        match self {
            GenerationStatus::Pending => 0,
            GenerationStatus::Planning => 1,
            GenerationStatus::GeneratingImages => 2,
            GenerationStatus::GeneratingVideo => 3,
            GenerationStatus::Assembling => 4,
            GenerationStatus::Completed
            | GenerationStatus::Failed
            | GenerationStatus::Cancelled => 5,
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Completed | GenerationStatus::Failed | GenerationStatus::Cancelled
        )
    }

    /// Whether a cancel request still has an effect.
    pub fn is_cancellable(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether the state machine allows moving to `next`.
    ///
    /// Forward moves may skip stages; `failed` and `cancelled` are reachable
    /// from any non-terminal state; `completed` only from `assembling`.
    ///
    /// # Examples
    ///
    /// ```
    /// use montage_core::GenerationStatus;
    ///
    /// assert!(GenerationStatus::Pending.can_transition_to(GenerationStatus::Planning));
    /// assert!(GenerationStatus::GeneratingVideo.can_transition_to(GenerationStatus::Cancelled));
    /// assert!(!GenerationStatus::Assembling.can_transition_to(GenerationStatus::Planning));
    /// assert!(!GenerationStatus::Completed.can_transition_to(GenerationStatus::Failed));
    /// assert!(!GenerationStatus::Planning.can_transition_to(GenerationStatus::Completed));
    /// ```
    pub fn can_transition_to(&self, next: GenerationStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            GenerationStatus::Failed | GenerationStatus::Cancelled => true,
            GenerationStatus::Completed => *self == GenerationStatus::Assembling,
            _ => next.stage_index() > self.stage_index(),
        }
    }
}

/// State of one generation run.
///
/// Mutated by exactly one driver; everyone else reads cloned snapshots.
/// Progress never decreases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerationRecord {
    /// Generation id
    id: GenerationId,
    /// Original prompt
    prompt: String,
    /// Lifecycle status
    status: GenerationStatus,
    /// Overall progress 0..=100
    progress: u8,
    /// Human-readable label of the current step
    current_step: String,
    /// Accumulated cost in USD
    cost_usd: f64,
    /// Creation time
    created_at: DateTime<Utc>,
    /// Last update time
    updated_at: DateTime<Utc>,
    /// Time the run reached a terminal state
    completed_at: Option<DateTime<Utc>>,
    /// Error summary for failed runs
    error: Option<String>,
    /// Final artifact
    output: Option<ArtifactRef>,
    /// Scene plan with resolved image references
    scene_plan: Option<ScenePlan>,
    /// Assembly stage outcomes
    assembly: Option<AssemblyResult>,
    /// Whether some, but not all, scenes produced a clip
    partial_success: bool,
    /// Scenes that permanently failed video generation
    failed_scenes: Vec<u32>,
}

impl GenerationRecord {
    /// Create a pending record.
    pub fn new(id: GenerationId, prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            prompt: prompt.into(),
            status: GenerationStatus::Pending,
            progress: 0,
            current_step: "Queued".to_string(),
            cost_usd: 0.0,
            created_at: now,
            updated_at: now,
            completed_at: None,
            error: None,
            output: None,
            scene_plan: None,
            assembly: None,
            partial_success: false,
            failed_scenes: Vec::new(),
        }
    }

    /// Move to a new status.
    ///
    /// # Errors
    ///
    /// Returns `PipelineErrorKind::InvalidTransition` when the state machine
    /// does not allow the move.
    #[track_caller]
    pub fn transition(
        &mut self,
        next: GenerationStatus,
        step: impl Into<String>,
    ) -> Result<(), PipelineError> {
        if !self.status.can_transition_to(next) {
            return Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            }));
        }
        self.status = next;
        self.current_step = step.into();
        self.touch();
        if next.is_terminal() {
            self.completed_at = Some(self.updated_at);
        }
        Ok(())
    }

    /// Raise progress; lower values are ignored.
    pub fn advance_progress(&mut self, progress: u8, step: impl Into<String>) {
        self.progress = self.progress.max(progress.min(100));
        self.current_step = step.into();
        self.touch();
    }

    /// Add to the accumulated cost.
    pub fn add_cost(&mut self, cost_usd: f64) {
        if cost_usd > 0.0 {
            self.cost_usd += cost_usd;
            self.touch();
        }
    }

    /// Store the scene plan.
    pub fn set_scene_plan(&mut self, plan: ScenePlan) {
        self.scene_plan = Some(plan);
        self.touch();
    }

    /// Record scenes that permanently failed.
    pub fn set_failed_scenes(&mut self, failed_scenes: Vec<u32>) {
        self.failed_scenes = failed_scenes;
        self.touch();
    }

    /// Finish successfully.
    ///
    /// # Errors
    ///
    /// Fails unless the record is currently assembling.
    #[track_caller]
    pub fn complete(
        &mut self,
        assembly: AssemblyResult,
        partial_success: bool,
    ) -> Result<(), PipelineError> {
        let step = if partial_success {
            "Completed with partial success"
        } else {
            "Completed"
        };
        self.transition(GenerationStatus::Completed, step)?;
        self.output = Some(assembly.artifact().clone());
        self.assembly = Some(assembly);
        self.partial_success = partial_success;
        self.progress = 100;
        Ok(())
    }

    /// Finish with a fatal failure.
    #[track_caller]
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), PipelineError> {
        self.transition(GenerationStatus::Failed, "Failed")?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Finish as cancelled.
    #[track_caller]
    pub fn cancel(&mut self) -> Result<(), PipelineError> {
        self.transition(GenerationStatus::Cancelled, "Cancelled")
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
