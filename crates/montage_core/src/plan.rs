//! Scene plan types.

use crate::Scene;
use serde::{Deserialize, Serialize};

/// Free-text visual descriptors applied to every scene prompt.
///
/// These keep non-subject attributes (style, palette, lighting, mood) aligned
/// across scenes independently of image seeding.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_", into)]
pub struct ConsistencyMarkers {
    /// Visual style (e.g. "cinematic, shallow depth of field")
    #[serde(default)]
    style: String,
    /// Color palette
    #[serde(default)]
    color_palette: String,
    /// Lighting description
    #[serde(default)]
    lighting: String,
    /// Overall mood
    #[serde(default)]
    mood: String,
}

impl ConsistencyMarkers {
    /// Create markers from the four descriptors.
    pub fn new(
        style: impl Into<String>,
        color_palette: impl Into<String>,
        lighting: impl Into<String>,
        mood: impl Into<String>,
    ) -> Self {
        Self {
            style: style.into(),
            color_palette: color_palette.into(),
            lighting: lighting.into(),
            mood: mood.into(),
        }
    }

    /// Render the markers as a prompt suffix.
    ///
    /// Empty descriptors are skipped; returns an empty string when all are empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use montage_core::ConsistencyMarkers;
    ///
    /// let markers = ConsistencyMarkers::new("film grain", "teal and orange", "", "hopeful");
    /// assert_eq!(
    ///     markers.as_prompt_suffix(),
    ///     "Style: film grain. Color palette: teal and orange. Mood: hopeful."
    /// );
    /// ```
    pub fn as_prompt_suffix(&self) -> String {
        [
            ("Style", &self.style),
            ("Color palette", &self.color_palette),
            ("Lighting", &self.lighting),
            ("Mood", &self.mood),
        ]
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| format!("{}: {}.", label, value.trim()))
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Append the markers to a prompt.
    pub fn augment(&self, prompt: &str) -> String {
        let suffix = self.as_prompt_suffix();
        if suffix.is_empty() {
            prompt.to_string()
        } else {
            format!("{} {}", prompt.trim_end(), suffix)
        }
    }
}

/// The ordered scenes of one generation plus their shared descriptors.
///
/// Created once by the storyboard orchestrator and never replaced; later stages
/// only attach images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ScenePlan {
    /// Shared visual descriptors
    consistency_markers: ConsistencyMarkers,
    /// Master template describing the recurring subject (empty when none)
    subject_description: String,
    /// Scenes ordered by scene number
    scenes: Vec<Scene>,
}

impl ScenePlan {
    /// Create a plan. Scenes are sorted by scene number.
    pub fn new(
        consistency_markers: ConsistencyMarkers,
        subject_description: impl Into<String>,
        mut scenes: Vec<Scene>,
    ) -> Self {
        scenes.sort_by_key(|scene| *scene.scene_number());
        Self {
            consistency_markers,
            subject_description: subject_description.into(),
            scenes,
        }
    }

    /// Mutable access to scenes for the planning and image stages.
    pub fn scenes_mut(&mut self) -> &mut [Scene] {
        &mut self.scenes
    }

    /// Look up a scene by number.
    pub fn scene(&self, scene_number: u32) -> Option<&Scene> {
        self.scenes
            .iter()
            .find(|scene| *scene.scene_number() == scene_number)
    }

    /// Whether any scene features the recurring subject.
    pub fn has_subject(&self) -> bool {
        self.scenes.iter().any(Scene::features_subject)
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Whether the plan has no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Sum of the scenes' requested durations.
    pub fn total_duration_seconds(&self) -> u32 {
        self.scenes.iter().map(|scene| *scene.duration_seconds()).sum()
    }

    /// Scene numbers whose prompt lacks the subject description verbatim.
    ///
    /// Empty when the subject-identity invariant holds.
    pub fn subject_identity_violations(&self) -> Vec<u32> {
        self.scenes
            .iter()
            .filter(|scene| scene.features_subject())
            .filter(|scene| {
                self.subject_description.trim().is_empty()
                    || !scene.detailed_prompt().contains(&self.subject_description)
            })
            .map(|scene| *scene.scene_number())
            .collect()
    }
}
