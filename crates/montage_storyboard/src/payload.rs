//! Planner payload schema, normalization and subject-identity repair.

use crate::{default_scene_duration, extract_json};
use montage_core::{ConsistencyMarkers, Scene, SceneBuilder, ScenePlan, StoryboardConfig, SubjectPresence};
use montage_error::{PlanningError, PlanningErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// Shared visual descriptors as the planner writes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkersPayload {
    /// Visual style
    #[serde(default)]
    pub style: Option<String>,
    /// Color palette
    #[serde(default)]
    pub color_palette: Option<String>,
    /// Lighting
    #[serde(default)]
    pub lighting: Option<String>,
    /// Mood
    #[serde(default)]
    pub mood: Option<String>,
}

/// One scene as the planner writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenePayload {
    /// Planner's numbering, replaced during normalization
    #[serde(default)]
    pub scene_number: Option<u32>,
    /// Narrative stage label
    #[serde(default)]
    pub narrative_stage: Option<String>,
    /// Scene prompt
    #[serde(default)]
    pub detailed_prompt: String,
    /// Subject presence label
    #[serde(default)]
    pub subject_presence: Option<String>,
    /// Requested duration
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    /// Advisory transition descriptor
    #[serde(default)]
    pub transition_to_next: Option<String>,
    /// On-screen text
    #[serde(default)]
    pub text_overlay: Option<String>,
}

/// Storyboard payload returned by the narrative planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryboardPayload {
    /// Shared visual descriptors
    #[serde(default)]
    pub consistency_markers: MarkersPayload,
    /// Master template for the recurring subject
    #[serde(default)]
    pub subject_description: Option<String>,
    /// Scenes in narrative order
    pub scenes: Vec<ScenePayload>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_presence(scene_number: u32, label: Option<&str>) -> Result<SubjectPresence, PlanningError> {
    let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
        return Ok(SubjectPresence::None);
    };
    let normalized = label.to_lowercase().replace([' ', '-'], "_");
    SubjectPresence::from_str(&normalized).map_err(|_| {
        PlanningError::new(PlanningErrorKind::SchemaInvalid(format!(
            "scene {} has unknown subject_presence '{}'",
            scene_number, label
        )))
    })
}

impl StoryboardPayload {
    /// Extract and deserialize the payload from raw planner text.
    ///
    /// # Examples
    ///
    /// ```
    /// use montage_storyboard::StoryboardPayload;
    ///
    /// let text = "Storyboard:\n```json\n{\"scenes\": [{\"detailed_prompt\": \"steam rises\"}]}\n```";
    /// let payload = StoryboardPayload::parse(text).unwrap();
    /// assert_eq!(payload.scenes.len(), 1);
    /// ```
    pub fn parse(text: &str) -> Result<Self, PlanningError> {
        let json = extract_json(text)?;
        serde_json::from_str(&json)
            .map_err(|e| PlanningError::new(PlanningErrorKind::SchemaInvalid(e.to_string())))
    }

    /// Validate and normalize into a scene plan.
    ///
    /// Scenes are renumbered `1..=N` in planner order and excess scenes are
    /// dropped. Missing or out-of-range durations are filled from the target
    /// duration. Prompts that drop the subject description are repaired; the
    /// repaired scene numbers are returned alongside the plan.
    pub fn into_plan(
        self,
        config: &StoryboardConfig,
        required: usize,
        target_duration: Option<u32>,
    ) -> Result<(ScenePlan, Vec<u32>), PlanningError> {
        let mut scenes = self.scenes;
        if scenes.len() < required {
            return Err(PlanningError::new(PlanningErrorKind::TooFewScenes {
                required,
                actual: scenes.len(),
            }));
        }
        if scenes.len() > required {
            warn!(
                returned = scenes.len(),
                required, "Planner returned extra scenes, truncating"
            );
            scenes.truncate(required);
        }

        let max_clip = *config.max_clip_seconds();
        let fill_duration = default_scene_duration(config, target_duration, required);

        let scenes = scenes
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let scene_number = index as u32 + 1;
                let prompt = raw.detailed_prompt.trim().to_string();
                if prompt.is_empty() {
                    return Err(PlanningError::new(PlanningErrorKind::SchemaInvalid(format!(
                        "scene {} has an empty detailed_prompt",
                        scene_number
                    ))));
                }
                let presence = parse_presence(scene_number, raw.subject_presence.as_deref())?;
                let duration = match raw.duration_seconds {
                    Some(d) if d.is_finite() && d >= 1.0 && d <= max_clip as f64 => d.round() as u32,
                    _ => fill_duration,
                };

                SceneBuilder::default()
                    .scene_number(scene_number)
                    .narrative_stage(non_empty(raw.narrative_stage).unwrap_or_default())
                    .detailed_prompt(prompt)
                    .subject_presence(presence)
                    .duration_seconds(duration)
                    .transition_to_next(non_empty(raw.transition_to_next))
                    .text_overlay(non_empty(raw.text_overlay))
                    .build()
                    .map_err(|e| {
                        PlanningError::new(PlanningErrorKind::SchemaInvalid(e.to_string()))
                    })
            })
            .collect::<Result<Vec<Scene>, PlanningError>>()?;

        let markers = self.consistency_markers;
        let markers = ConsistencyMarkers::new(
            non_empty(markers.style).unwrap_or_default(),
            non_empty(markers.color_palette).unwrap_or_default(),
            non_empty(markers.lighting).unwrap_or_default(),
            non_empty(markers.mood).unwrap_or_default(),
        );
        let subject = non_empty(self.subject_description).unwrap_or_default();

        let mut plan = ScenePlan::new(markers, subject, scenes);
        if plan.has_subject() && plan.subject_description().is_empty() {
            return Err(PlanningError::new(
                PlanningErrorKind::MissingSubjectDescription(plan.subject_identity_violations()),
            ));
        }

        let repaired = enforce_subject_identity(&mut plan);
        debug!(scenes = plan.len(), repaired = repaired.len(), "Storyboard payload accepted");
        Ok((plan, repaired))
    }
}

/// Prefix the subject description onto every subject scene that lacks it.
///
/// Returns the repaired scene numbers. A blank description repairs nothing.
///
/// # Examples
///
/// ```
/// use montage_core::{ConsistencyMarkers, SceneBuilder, ScenePlan, SubjectPresence};
/// use montage_storyboard::enforce_subject_identity;
///
/// let scene = SceneBuilder::default()
///     .scene_number(1u32)
///     .detailed_prompt("The kettle whistles on the stove")
///     .subject_presence(SubjectPresence::Full)
///     .duration_seconds(5u32)
///     .build()
///     .unwrap();
/// let mut plan = ScenePlan::new(ConsistencyMarkers::default(), "A matte red enamel kettle", vec![scene]);
///
/// assert_eq!(enforce_subject_identity(&mut plan), vec![1]);
/// assert!(plan.subject_identity_violations().is_empty());
/// ```
pub fn enforce_subject_identity(plan: &mut ScenePlan) -> Vec<u32> {
    let description = plan.subject_description().clone();
    if description.trim().is_empty() {
        return Vec::new();
    }
    let violations = plan.subject_identity_violations();
    if violations.is_empty() {
        return violations;
    }

    let separator = if description.trim_end().ends_with(['.', '!', '?']) {
        " "
    } else {
        ". "
    };
    for scene in plan.scenes_mut() {
        if violations.contains(scene.scene_number()) {
            let repaired = format!("{}{}{}", description, separator, scene.detailed_prompt());
            scene.set_detailed_prompt(repaired);
        }
    }
    warn!(scenes = ?violations, "Repaired prompts missing the subject description");
    violations
}
