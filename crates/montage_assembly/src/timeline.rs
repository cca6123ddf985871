//! Stitch order and overlay timing.

use montage_core::{AssemblyConfig, Clip, ScenePlan, Transition};
use montage_interface::{StitchSegment, TextOverlaySpec};

/// Stitch segments in scene-number order.
///
/// Each segment carries the transition into the next one, read from its
/// scene's descriptor or the configured default when the descriptor is unset
/// or unsupported. The last segment has no transition.
pub fn stitch_segments<'a>(
    plan: &ScenePlan,
    clips: impl IntoIterator<Item = &'a Clip>,
    config: &AssemblyConfig,
) -> Vec<StitchSegment> {
    let mut ordered: Vec<&Clip> = clips.into_iter().collect();
    ordered.sort_by_key(|clip| *clip.scene_number());
    let last = ordered.len().saturating_sub(1);

    ordered
        .iter()
        .enumerate()
        .map(|(index, clip)| {
            let transition = (index < last).then(|| {
                plan.scene(*clip.scene_number())
                    .and_then(|scene| scene.transition_to_next().as_deref())
                    .and_then(Transition::from_descriptor)
                    .unwrap_or(*config.default_transition())
            });
            StitchSegment::new(
                *clip.scene_number(),
                clip.artifact().clone(),
                *clip.duration_seconds(),
                transition,
                *config.transition_seconds(),
            )
        })
        .collect()
}

/// Text overlays placed at each scene's start offset in the stitched video.
///
/// A scene starts where the previous one's transition begins, so each
/// blending transition pulls every later scene earlier by its overlap.
pub fn text_overlays(plan: &ScenePlan, segments: &[StitchSegment]) -> Vec<TextOverlaySpec> {
    let mut offset = 0.0;
    let mut overlays = Vec::new();
    for segment in segments {
        let duration = *segment.duration_seconds() as f64;
        if let Some(text) = plan
            .scene(*segment.scene_number())
            .and_then(|scene| scene.text_overlay().as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
        {
            overlays.push(TextOverlaySpec::new(
                *segment.scene_number(),
                text,
                offset,
                duration,
            ));
        }
        offset += duration - segment.overlap_seconds();
    }
    overlays
}
