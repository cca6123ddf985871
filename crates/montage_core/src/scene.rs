//! Scene types.

use crate::{ArtifactRef, ChainKind};
use serde::{Deserialize, Serialize};

/// Whether and when the recurring subject appears in a scene's clip.
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
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubjectPresence {
    /// Subject does not appear
    #[default]
    None,
    /// Subject is visible for the whole scene
    Full,
    /// Subject is partially visible (cropped, silhouette, hands only)
    Partial,
    /// Subject is visible at the start, then leaves
    AppearsAtStart,
    /// Subject enters at the end
    AppearsAtEnd,
    /// Subject enters mid-scene
    AppearsMidScene,
    /// Subject leaves mid-scene
    DisappearsMidScene,
}

impl SubjectPresence {
    /// Whether the subject is on screen at any point of the scene.
    pub fn is_present(&self) -> bool {
        !matches!(self, SubjectPresence::None)
    }
}

/// Transition between consecutive clips in the stitched video.
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
pub enum Transition {
    /// Standard cross-dissolve
    #[default]
    CrossDissolve,
    /// Hard cut
    Cut,
    /// Fade through black
    FadeToBlack,
    /// Fade through white
    FadeToWhite,
    /// Directional wipe
    Wipe,
    /// Slide / push
    Slide,
    /// Zoom transition
    Zoom,
}

impl Transition {
    /// Interpret a free-text transition descriptor.
    ///
    /// Returns `None` when the descriptor names nothing the editor supports,
    /// in which case callers use their default transition.
    ///
    /// # Examples
    ///
    /// ```
    /// use montage_core::Transition;
    ///
    /// assert_eq!(Transition::from_descriptor("slow fade to black"), Some(Transition::FadeToBlack));
    /// assert_eq!(Transition::from_descriptor("Hard cut on the beat"), Some(Transition::Cut));
    /// assert_eq!(Transition::from_descriptor("morph into a butterfly"), None);
    /// ```
    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        let text = descriptor.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        // Order matters: "fade to black" must win over a bare "fade"
        const KEYWORDS: &[(&str, Transition)] = &[
            ("fade to black", Transition::FadeToBlack),
            ("fade out", Transition::FadeToBlack),
            ("fade_to_black", Transition::FadeToBlack),
            ("fade to white", Transition::FadeToWhite),
            ("fade_to_white", Transition::FadeToWhite),
            ("flash", Transition::FadeToWhite),
            ("dissolve", Transition::CrossDissolve),
            ("crossfade", Transition::CrossDissolve),
            ("cross fade", Transition::CrossDissolve),
            ("fade", Transition::CrossDissolve),
            ("wipe", Transition::Wipe),
            ("slide", Transition::Slide),
            ("push", Transition::Slide),
            ("zoom", Transition::Zoom),
            ("cut", Transition::Cut),
        ];

        KEYWORDS
            .iter()
            .find(|(keyword, _)| text.contains(keyword))
            .map(|(_, transition)| *transition)
    }
}

/// One narrative unit of the final video.
///
/// Scenes are owned by their [`ScenePlan`](crate::ScenePlan). They are filled in
/// during planning and image resolution and treated as immutable once video
/// dispatch begins.
///
/// # Examples
///
/// ```
/// use montage_core::{SceneBuilder, SubjectPresence};
///
/// let scene = SceneBuilder::default()
///     .scene_number(1u32)
///     .narrative_stage("hook")
///     .detailed_prompt("A runner laces up at dawn")
///     .subject_presence(SubjectPresence::Full)
///     .duration_seconds(6u32)
///     .build()
///     .unwrap();
///
/// assert_eq!(*scene.scene_number(), 1);
/// assert!(scene.reference_image().is_none());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct Scene {
    /// Position in the final video (1..N)
    scene_number: u32,
    /// Narrative stage label (hook, build-up, reveal, call to action...)
    #[builder(default)]
    narrative_stage: String,
    /// Full generation prompt for this scene
    detailed_prompt: String,
    /// Whether and when the recurring subject appears
    #[builder(default)]
    subject_presence: SubjectPresence,
    /// Reference image anchoring subject and style
    #[builder(default)]
    #[serde(default)]
    reference_image: Option<ArtifactRef>,
    /// Image the clip must open on
    #[builder(default)]
    #[serde(default)]
    start_image: Option<ArtifactRef>,
    /// Image the clip must end on
    #[builder(default)]
    #[serde(default)]
    end_image: Option<ArtifactRef>,
    /// Requested clip length in seconds
    duration_seconds: u32,
    /// Advisory transition descriptor into the next scene
    #[builder(default)]
    #[serde(default)]
    transition_to_next: Option<String>,
    /// Optional on-screen text
    #[builder(default)]
    #[serde(default)]
    text_overlay: Option<String>,
}

impl Scene {
    /// Replace the detailed prompt.
    pub fn set_detailed_prompt(&mut self, prompt: impl Into<String>) {
        self.detailed_prompt = prompt.into();
    }

    /// Replace the clip duration.
    pub fn set_duration_seconds(&mut self, seconds: u32) {
        self.duration_seconds = seconds;
    }

    /// Renumber the scene.
    pub fn set_scene_number(&mut self, scene_number: u32) {
        self.scene_number = scene_number;
    }

    /// Attach an image artifact produced by the given chain.
    pub fn attach_image(&mut self, kind: ChainKind, artifact: ArtifactRef) {
        match kind {
            ChainKind::Reference => self.reference_image = Some(artifact),
            ChainKind::StartFrame => self.start_image = Some(artifact),
            ChainKind::EndFrame => self.end_image = Some(artifact),
        }
    }

    /// Remove the image attached by the given chain.
    pub fn detach_image(&mut self, kind: ChainKind) {
        match kind {
            ChainKind::Reference => self.reference_image = None,
            ChainKind::StartFrame => self.start_image = None,
            ChainKind::EndFrame => self.end_image = None,
        }
    }

    /// Image attached by the given chain, if any.
    pub fn image(&self, kind: ChainKind) -> Option<&ArtifactRef> {
        match kind {
            ChainKind::Reference => self.reference_image.as_ref(),
            ChainKind::StartFrame => self.start_image.as_ref(),
            ChainKind::EndFrame => self.end_image.as_ref(),
        }
    }

    /// Whether the recurring subject appears in this scene.
    pub fn features_subject(&self) -> bool {
        self.subject_presence.is_present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_prefers_specific_fades() {
        assert_eq!(
            Transition::from_descriptor("Fade to white flash"),
            Some(Transition::FadeToWhite)
        );
        assert_eq!(
            Transition::from_descriptor("gentle crossfade"),
            Some(Transition::CrossDissolve)
        );
        assert_eq!(Transition::from_descriptor("   "), None);
    }

    #[test]
    fn presence_round_trips_snake_case() {
        let json = serde_json::to_string(&SubjectPresence::AppearsMidScene).unwrap();
        assert_eq!(json, "\"appears_mid_scene\"");
        assert!(!SubjectPresence::None.is_present());
        assert!(SubjectPresence::DisappearsMidScene.is_present());
    }
}
