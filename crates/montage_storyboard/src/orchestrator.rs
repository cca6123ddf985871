//! Storyboard orchestrator.

use crate::{StoryboardPayload, fallback_plan, required_scenes, valid_target_duration};
use derive_getters::Getters;
use montage_core::{ArtifactRef, CostMeter, ScenePlan, StoryboardConfig};
use montage_error::{MontageResult, PlanningError, PlanningErrorKind};
use montage_interface::{NarrativePlanner, PlanningRequest};
use montage_retry::RetryPolicy;
use std::sync::Arc;
use tracing::{info, warn};

/// What the orchestrator produced and how.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct StoryboardOutcome {
    /// The accepted plan
    plan: ScenePlan,
    /// Scene count the planner was asked for
    required_scenes: usize,
    /// Whether the deterministic fallback template was used
    used_fallback: bool,
    /// Scenes whose prompts were repaired to carry the subject description
    repaired_scenes: Vec<u32>,
    /// Planner cost across all attempts
    cost_usd: f64,
}

impl StoryboardOutcome {
    /// Take the plan.
    pub fn into_plan(self) -> ScenePlan {
        self.plan
    }
}

/// Turns a prompt into a validated [`ScenePlan`].
pub struct StoryboardOrchestrator {
    planner: Arc<dyn NarrativePlanner>,
    config: StoryboardConfig,
    retry: RetryPolicy,
}

impl StoryboardOrchestrator {
    /// Create an orchestrator around a planner.
    pub fn new(planner: Arc<dyn NarrativePlanner>, config: StoryboardConfig, retry: RetryPolicy) -> Self {
        Self {
            planner,
            config,
            retry,
        }
    }

    /// Storyboard configuration.
    pub fn config(&self) -> &StoryboardConfig {
        &self.config
    }

    /// Plan the storyboard.
    ///
    /// Planner errors and schema-invalid payloads are retried through the
    /// retry policy. Once the budget is spent the deterministic fallback
    /// template is returned instead of an error. Only an empty prompt fails.
    #[tracing::instrument(
        skip(self, prompt, seed_image),
        fields(planner = self.planner.name(), has_seed = seed_image.is_some())
    )]
    pub async fn plan(
        &self,
        prompt: &str,
        seed_image: Option<&ArtifactRef>,
        target_duration: Option<u32>,
    ) -> MontageResult<StoryboardOutcome> {
        if prompt.trim().is_empty() {
            return Err(PlanningError::new(PlanningErrorKind::EmptyPrompt).into());
        }

        let target = valid_target_duration(&self.config, target_duration);
        if target_duration.is_some() && target.is_none() {
            info!(
                requested = ?target_duration,
                min = self.config.min_target_duration(),
                max = self.config.max_target_duration(),
                "Target duration outside valid range, using default scene count"
            );
        }
        let required = required_scenes(&self.config, target);
        let request = PlanningRequest::new(
            prompt,
            seed_image.cloned(),
            required,
            *self.config.max_clip_seconds(),
            target,
        );

        let cost = CostMeter::default();
        let planner = &self.planner;
        let config = &self.config;
        let request = &request;
        let meter = &cost;

        let attempt = self
            .retry
            .execute("plan_storyboard", move || async move {
                let response = planner.plan(request).await?;
                meter.add(*response.cost_usd());
                let payload = StoryboardPayload::parse(response.text())?;
                Ok(payload.into_plan(config, required, target)?)
            })
            .await;

        match attempt {
            Ok((plan, repaired_scenes)) => {
                info!(
                    scenes = plan.len(),
                    repaired = repaired_scenes.len(),
                    has_subject = plan.has_subject(),
                    "Storyboard planned"
                );
                Ok(StoryboardOutcome {
                    plan,
                    required_scenes: required,
                    used_fallback: false,
                    repaired_scenes,
                    cost_usd: cost.total(),
                })
            }
            Err(e) => {
                warn!(error = %e, "Planner failed after retries, using fallback storyboard");
                Ok(StoryboardOutcome {
                    plan: fallback_plan(prompt, &self.config, target),
                    required_scenes: required,
                    used_fallback: true,
                    repaired_scenes: Vec::new(),
                    cost_usd: cost.total(),
                })
            }
        }
    }
}
