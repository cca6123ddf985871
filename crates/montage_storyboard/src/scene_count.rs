//! Scene-count and duration policy.

use montage_core::StoryboardConfig;

/// The target duration if it lies in the configured valid range.
///
/// Out-of-range values are treated as "no duration specified".
pub fn valid_target_duration(config: &StoryboardConfig, target: Option<u32>) -> Option<u32> {
    target.filter(|seconds| config.accepts_duration(*seconds))
}

/// Number of scenes the planner must produce.
///
/// With a valid target duration `D` this is
/// `max(minimum_scenes, ceil(D / max_clip_seconds))`; otherwise the configured
/// default scene count.
///
/// # Examples
///
/// ```
/// use montage_core::StoryboardConfig;
/// use montage_storyboard::required_scenes;
///
/// let config = StoryboardConfig::default(); // minimum 3, max clip 8s
/// assert_eq!(required_scenes(&config, Some(60)), 8);
/// assert_eq!(required_scenes(&config, Some(15)), 3);
/// assert_eq!(required_scenes(&config, Some(500)), *config.default_scene_count());
/// ```
pub fn required_scenes(config: &StoryboardConfig, target: Option<u32>) -> usize {
    match valid_target_duration(config, target) {
        Some(seconds) => {
            let max_clip = (*config.max_clip_seconds()).max(1);
            let by_duration = seconds.div_ceil(max_clip) as usize;
            by_duration.max(*config.minimum_scenes())
        }
        None => *config.default_scene_count(),
    }
}

/// Duration assigned to scenes the planner left without a usable one.
///
/// The target split evenly across scenes (rounded up), else the default clip
/// length; either way clamped to `1..=max_clip_seconds`.
pub fn default_scene_duration(
    config: &StoryboardConfig,
    target: Option<u32>,
    scene_count: usize,
) -> u32 {
    let max_clip = (*config.max_clip_seconds()).max(1);
    let seconds = match valid_target_duration(config, target) {
        Some(total) if scene_count > 0 => total.div_ceil(scene_count as u32),
        _ => *config.default_clip_seconds(),
    };
    seconds.clamp(1, max_clip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_of_valid_range_are_accepted() {
        let config = StoryboardConfig::default();
        assert_eq!(valid_target_duration(&config, Some(12)), Some(12));
        assert_eq!(valid_target_duration(&config, Some(60)), Some(60));
        assert_eq!(valid_target_duration(&config, Some(11)), None);
        assert_eq!(valid_target_duration(&config, Some(61)), None);
        assert_eq!(valid_target_duration(&config, None), None);
    }

    #[test]
    fn scene_count_matches_formula_across_range() {
        let config = StoryboardConfig::default();
        for d in 12..=60u32 {
            let expected = (d.div_ceil(8) as usize).max(3);
            assert_eq!(required_scenes(&config, Some(d)), expected, "D = {d}");
        }
    }

    #[test]
    fn missing_duration_uses_default_count() {
        let config = StoryboardConfig::default().with_default_scene_count(6usize);
        assert_eq!(required_scenes(&config, None), 6);
        assert_eq!(required_scenes(&config, Some(5)), 6);
    }

    #[test]
    fn scene_duration_splits_target() {
        let config = StoryboardConfig::default();
        assert_eq!(default_scene_duration(&config, Some(60), 8), 8);
        assert_eq!(default_scene_duration(&config, Some(15), 3), 5);
        assert_eq!(default_scene_duration(&config, Some(12), 1), 8);
        assert_eq!(default_scene_duration(&config, None, 5), 5);
    }
}
