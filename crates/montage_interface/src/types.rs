//! Request and response types exchanged with collaborators.

use montage_core::{ArtifactRef, AspectRatio, ChainKind, Transition};
use serde::{Deserialize, Serialize};

/// Request sent to the narrative planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PlanningRequest {
    /// User prompt
    prompt: String,
    /// User-supplied image of the subject
    seed_image: Option<ArtifactRef>,
    /// Exact number of scenes required
    scene_count: usize,
    /// Longest clip a scene may request
    max_clip_seconds: u32,
    /// Target video length, when valid
    target_duration: Option<u32>,
}

impl PlanningRequest {
    /// Create a planning request.
    pub fn new(
        prompt: impl Into<String>,
        seed_image: Option<ArtifactRef>,
        scene_count: usize,
        max_clip_seconds: u32,
        target_duration: Option<u32>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            seed_image,
            scene_count,
            max_clip_seconds,
            target_duration,
        }
    }

    /// Render the instruction text for text-generation planners.
    ///
    /// Spells out the scene count, the master-template rule for the recurring
    /// subject and the JSON schema the orchestrator validates against.
    ///
    /// # Examples
    ///
    /// ```
    /// use montage_interface::PlanningRequest;
    ///
    /// let request = PlanningRequest::new("Trail shoes that grip anything", None, 4, 8, Some(30));
    /// let brief = request.brief();
    /// assert!(brief.contains("exactly 4 scenes"));
    /// assert!(brief.contains("\"subject_presence\""));
    /// ```
    pub fn brief(&self) -> String {
        let mut brief = String::new();
        brief.push_str("You are storyboarding a short video advertisement.\n\n");
        brief.push_str(&format!("Advertising prompt: {}\n\n", self.prompt.trim()));
        brief.push_str(&format!(
            "Write exactly {} scenes. Each scene lasts at most {} seconds.",
            self.scene_count, self.max_clip_seconds
        ));
        if let Some(duration) = self.target_duration {
            brief.push_str(&format!(" The whole video lasts about {} seconds.", duration));
        }
        brief.push_str("\n\n");
        if self.seed_image.is_some() {
            brief.push_str(
                "A reference photo of the subject is attached. Describe that exact subject.\n\n",
            );
        }
        brief.push_str(
            "If a recurring subject (character or product) appears, write ONE forensic \
             description of it in subject_description: shape, materials, colors, markings, \
             proportions. Every scene whose subject_presence is not \"none\" MUST contain that \
             description word for word in its detailed_prompt.\n\n",
        );
        brief.push_str(
            "subject_presence is one of: none, full, partial, appears_at_start, \
             appears_at_end, appears_mid_scene, disappears_mid_scene.\n\n",
        );
        brief.push_str("Output ONLY valid JSON matching this shape:\n");
        brief.push_str(
            r#"{
  "consistency_markers": {"style": "", "color_palette": "", "lighting": "", "mood": ""},
  "subject_description": "",
  "scenes": [
    {
      "scene_number": 1,
      "narrative_stage": "",
      "detailed_prompt": "",
      "subject_presence": "none",
      "duration_seconds": 5,
      "transition_to_next": "cross dissolve",
      "text_overlay": null
    }
  ]
}"#,
        );
        brief
    }
}

/// Raw planner answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PlannerResponse {
    /// Response text containing the storyboard JSON
    text: String,
    /// Cost of the call in USD
    cost_usd: f64,
}

impl PlannerResponse {
    /// Create a planner response.
    pub fn new(text: impl Into<String>, cost_usd: f64) -> Self {
        Self {
            text: text.into(),
            cost_usd,
        }
    }
}

/// Request sent to the image generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ImageRequest {
    /// Prompt already augmented with consistency markers
    prompt: String,
    /// Visual seed (previous chain image)
    seed_image: Option<ArtifactRef>,
    /// Chain the image belongs to
    chain: ChainKind,
    /// Scene the image belongs to
    scene_number: u32,
}

impl ImageRequest {
    /// Create an image request.
    pub fn new(
        prompt: impl Into<String>,
        seed_image: Option<ArtifactRef>,
        chain: ChainKind,
        scene_number: u32,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            seed_image,
            chain,
            scene_number,
        }
    }
}

/// Generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GeneratedImage {
    /// Image artifact
    artifact: ArtifactRef,
    /// Cost of the call in USD
    cost_usd: f64,
}

impl GeneratedImage {
    /// Create a generated image.
    pub fn new(artifact: ArtifactRef, cost_usd: f64) -> Self {
        Self { artifact, cost_usd }
    }
}

/// Request sent to a video backend, already shaped to its capabilities.
///
/// # Examples
///
/// ```
/// use montage_core::ArtifactRef;
/// use montage_interface::VideoRequestBuilder;
///
/// let request = VideoRequestBuilder::default()
///     .prompt("A runner crests a ridge")
///     .start_image(Some(ArtifactRef::image("start.png")))
///     .end_image(Some(ArtifactRef::image("end.png")))
///     .duration_seconds(5u32)
///     .seed(42u64)
///     .build()
///     .unwrap();
///
/// assert!(request.reference_image().is_none());
/// assert!(request.reference_images().is_empty());
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
pub struct VideoRequest {
    /// Scene prompt
    prompt: String,
    /// Generic reference image
    #[builder(default)]
    reference_image: Option<ArtifactRef>,
    /// Reference images for multi-reference backends
    #[builder(default)]
    reference_images: Vec<ArtifactRef>,
    /// Opening frame
    #[builder(default)]
    start_image: Option<ArtifactRef>,
    /// Closing frame
    #[builder(default)]
    end_image: Option<ArtifactRef>,
    /// Clip length in seconds
    duration_seconds: u32,
    /// Aspect ratio
    #[builder(default)]
    aspect_ratio: AspectRatio,
    /// Resolution label
    #[builder(default = "\"720p\".to_string()")]
    resolution: String,
    /// Generation seed
    seed: u64,
}

impl VideoRequest {
    /// Whether the request carries a generic reference in any form.
    pub fn has_reference(&self) -> bool {
        self.reference_image.is_some() || !self.reference_images.is_empty()
    }
}

/// Generated clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GeneratedClip {
    /// Clip artifact
    artifact: ArtifactRef,
    /// Cost of the call in USD
    cost_usd: f64,
}

impl GeneratedClip {
    /// Create a generated clip.
    pub fn new(artifact: ArtifactRef, cost_usd: f64) -> Self {
        Self { artifact, cost_usd }
    }
}

/// One clip in the stitch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct StitchSegment {
    /// Scene number
    scene_number: u32,
    /// Clip artifact
    clip: ArtifactRef,
    /// Clip length in seconds
    duration_seconds: u32,
    /// Transition into the next segment (`None` for the last one)
    transition: Option<Transition>,
    /// Transition length in seconds
    transition_seconds: f64,
}

impl StitchSegment {
    /// Create a stitch segment.
    pub fn new(
        scene_number: u32,
        clip: ArtifactRef,
        duration_seconds: u32,
        transition: Option<Transition>,
        transition_seconds: f64,
    ) -> Self {
        Self {
            scene_number,
            clip,
            duration_seconds,
            transition,
            transition_seconds,
        }
    }

    /// Seconds this segment shares with the next one.
    ///
    /// Blending transitions overlap the tail of this clip with the head of
    /// the next; a hard cut and the last segment overlap nothing.
    pub fn overlap_seconds(&self) -> f64 {
        match self.transition {
            None | Some(Transition::Cut) => 0.0,
            Some(_) => self
                .transition_seconds
                .clamp(0.0, self.duration_seconds as f64),
        }
    }
}

/// Timed text overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct TextOverlaySpec {
    /// Scene the text belongs to
    scene_number: u32,
    /// Text to render
    text: String,
    /// Offset from the start of the stitched video
    start_seconds: f64,
    /// How long the text stays on screen
    duration_seconds: f64,
}

impl TextOverlaySpec {
    /// Create a text overlay.
    pub fn new(scene_number: u32, text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            scene_number,
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// Result of an editing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct EditResult {
    /// Produced artifact
    artifact: ArtifactRef,
    /// Cost of the call in USD
    cost_usd: f64,
}

impl EditResult {
    /// Create an edit result.
    pub fn new(artifact: ArtifactRef, cost_usd: f64) -> Self {
        Self { artifact, cost_usd }
    }
}
