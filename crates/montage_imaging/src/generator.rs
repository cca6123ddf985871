//! Sequential reference-chain image generator.

use derive_getters::Getters;
use montage_core::{
    ArtifactRef, CancellationFlag, ChainKind, ChainLink, ConsistencyMarkers, CostMeter, ImageChain,
    LinkSource, ProgressSink, Scene, SubjectPresence,
};
use montage_error::{ChainError, ChainErrorKind, MontageResult};
use montage_interface::{ImageGenerator, ImageRequest};
use montage_retry::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, info};

/// One position's prompt.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct ChainPrompt {
    /// Scene the image belongs to
    scene_number: u32,
    /// Scene prompt, before consistency markers are appended
    prompt: String,
    /// Whether the subject is in the scene
    subject_presence: SubjectPresence,
}

impl ChainPrompt {
    /// Create a chain prompt.
    pub fn new(scene_number: u32, prompt: impl Into<String>, subject_presence: SubjectPresence) -> Self {
        Self {
            scene_number,
            prompt: prompt.into(),
            subject_presence,
        }
    }

    /// Prompt for a scene, framed for the given chain.
    pub fn for_scene(kind: ChainKind, scene: &Scene) -> Self {
        let prompt = match kind {
            ChainKind::Reference => scene.detailed_prompt().clone(),
            ChainKind::StartFrame => format!("Opening frame. {}", scene.detailed_prompt()),
            ChainKind::EndFrame => format!("Closing frame. {}", scene.detailed_prompt()),
        };
        Self::new(*scene.scene_number(), prompt, *scene.subject_presence())
    }
}

/// Where the first position's image comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ChainSeed {
    /// Generate position 1 unseeded.
    #[default]
    Unseeded,
    /// User photo of the subject. Copied in verbatim as position 1 when the
    /// first scene features the subject; otherwise position 1 is generated
    /// unseeded.
    UserImage(ArtifactRef),
    /// Generate position 1 seeded by this image (the first reference artifact).
    Anchor(ArtifactRef),
}

/// Generates image chains one position at a time.
pub struct SequentialChainGenerator {
    generator: Arc<dyn ImageGenerator>,
    retry: RetryPolicy,
}

impl SequentialChainGenerator {
    /// Create a chain generator.
    pub fn new(generator: Arc<dyn ImageGenerator>, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }

    /// Generate a chain of the same length as `prompts`.
    ///
    /// The cancellation flag is checked before every position and raced
    /// against the call in flight. Position `k > 1`
    /// is always generated with position `k - 1` as its seed. A failure at any
    /// position is returned as [`ChainErrorKind::Broken`]; cancellation is
    /// returned as the pipeline's cancellation error.
    #[tracing::instrument(skip_all, fields(chain = %kind, positions = prompts.len()))]
    pub async fn generate(
        &self,
        kind: ChainKind,
        prompts: &[ChainPrompt],
        markers: &ConsistencyMarkers,
        seed: &ChainSeed,
        cancel: &CancellationFlag,
        cost: &CostMeter,
        progress: &dyn ProgressSink,
    ) -> MontageResult<ImageChain> {
        if prompts.is_empty() {
            return Err(ChainError::new(ChainErrorKind::Empty(kind.to_string())).into());
        }
        let total = prompts.len();

        let mut chain = ImageChain::new(kind);
        for (index, prompt) in prompts.iter().enumerate() {
            cancel.check()?;
            let position = index + 1;
            let step = self.step(kind, position, prompt, chain.last_artifact(), seed, markers);
            let link = match cancel.guard(step).await {
                Ok(link) => link,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    return Err(ChainError::new(ChainErrorKind::Broken {
                        chain: kind.to_string(),
                        position,
                        message: e.to_string(),
                    })
                    .into());
                }
            };
            cost.add(*link.cost_usd());
            chain.push(link);
            progress.unit_completed(position, total, &format!("{} image {}/{}", kind, position, total));
        }

        chain.verify_seeding()?;
        info!(cost_usd = chain.total_cost_usd(), "Image chain complete");
        Ok(chain)
    }

    /// Produce the link for one position.
    async fn step(
        &self,
        kind: ChainKind,
        position: usize,
        prompt: &ChainPrompt,
        previous: Option<&ArtifactRef>,
        seed: &ChainSeed,
        markers: &ConsistencyMarkers,
    ) -> MontageResult<ChainLink> {
        let seed_image = match (position, previous, seed) {
            (1, _, ChainSeed::UserImage(image)) if prompt.subject_presence.is_present() => {
                debug!(scene = prompt.scene_number, "Using user seed image as first link");
                return Ok(ChainLink::new(
                    position,
                    prompt.scene_number,
                    image.clone(),
                    None,
                    LinkSource::UserSeed,
                    0.0,
                ));
            }
            (1, _, ChainSeed::Anchor(anchor)) => Some(anchor.clone()),
            (1, _, _) => None,
            (_, Some(previous), _) => Some(previous.clone()),
            (_, None, _) => {
                return Err(ChainError::new(ChainErrorKind::SeedMismatch {
                    chain: kind.to_string(),
                    position,
                })
                .into());
            }
        };

        let request = ImageRequest::new(
            markers.augment(&prompt.prompt),
            seed_image.clone(),
            kind,
            prompt.scene_number,
        );
        let generator = &self.generator;
        let request = &request;
        let image = self
            .retry
            .execute("generate_image", move || async move { generator.generate(request).await })
            .await?;

        debug!(
            scene = prompt.scene_number,
            position,
            seeded = seed_image.is_some(),
            "Generated chain image"
        );
        Ok(ChainLink::new(
            position,
            prompt.scene_number,
            image.artifact().clone(),
            seed_image,
            LinkSource::Generated,
            *image.cost_usd(),
        ))
    }
}
