//! Deterministic storyboard used when the planner cannot deliver.

use crate::default_scene_duration;
use montage_core::{ConsistencyMarkers, SceneBuilder, ScenePlan, StoryboardConfig, SubjectPresence};

const FALLBACK_STAGES: [(&str, &str); 3] = [
    ("hook", "Opening shot that grabs attention"),
    ("showcase", "Showcase of the offering in use"),
    ("call to action", "Closing shot with a clear call to action"),
];

/// Three-scene hook / showcase / call-to-action plan derived from the prompt.
///
/// No recurring subject, so image chains run unseeded by a subject photo and
/// the subject-identity invariant holds trivially.
///
/// # Examples
///
/// ```
/// use montage_core::StoryboardConfig;
/// use montage_storyboard::fallback_plan;
///
/// let plan = fallback_plan("Cold brew for night owls", &StoryboardConfig::default(), Some(30));
/// assert_eq!(plan.len(), 3);
/// assert!(!plan.has_subject());
/// assert_eq!(plan.total_duration_seconds(), 24);
/// ```
pub fn fallback_plan(prompt: &str, config: &StoryboardConfig, target_duration: Option<u32>) -> ScenePlan {
    let duration = default_scene_duration(config, target_duration, FALLBACK_STAGES.len());
    let prompt = prompt.trim();

    let scenes = FALLBACK_STAGES
        .iter()
        .zip(1u32..)
        .filter_map(|((stage, lead), scene_number)| {
            SceneBuilder::default()
                .scene_number(scene_number)
                .narrative_stage(*stage)
                .detailed_prompt(format!("{}: {}", lead, prompt))
                .subject_presence(SubjectPresence::None)
                .duration_seconds(duration)
                .transition_to_next(
                    (scene_number < FALLBACK_STAGES.len() as u32).then(|| "cross dissolve".to_string()),
                )
                .build()
                .ok()
        })
        .collect();

    ScenePlan::new(
        ConsistencyMarkers::new(
            "clean commercial cinematography",
            "natural, brand-neutral",
            "soft key light",
            "upbeat",
        ),
        "",
        scenes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_deterministic() {
        let config = StoryboardConfig::default();
        let a = fallback_plan("Trail shoes", &config, None);
        let b = fallback_plan("Trail shoes", &config, None);
        assert_eq!(a, b);
    }

    #[test]
    fn fallback_scenes_carry_the_prompt() {
        let plan = fallback_plan("  Trail shoes  ", &StoryboardConfig::default(), None);
        assert!(plan.scenes().iter().all(|s| s.detailed_prompt().ends_with(": Trail shoes")));
        assert!(plan.scenes()[2].transition_to_next().is_none());
        assert_eq!(*plan.scenes()[0].duration_seconds(), 5);
    }
}
