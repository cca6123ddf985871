//! Image stage: builds the configured chains and attaches them to scenes.

use crate::{ChainPrompt, ChainSeed, SequentialChainGenerator};
use derive_getters::Getters;
use montage_core::{
    ArtifactRef, CancellationFlag, ChainFailureMode, ChainKind, CostMeter, ImageChain,
    ImagingConfig, ProgressSink, ScenePlan,
};
use montage_error::{MontageError, MontageResult};
use tracing::{info, warn};

/// Result of the image stage.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct ImageStageOutcome {
    /// Chains that completed and were attached
    chains: Vec<ImageChain>,
    /// Chains that broke and were dropped
    dropped: Vec<ChainKind>,
    /// Image cost of this stage in USD, including links of dropped chains
    cost_usd: f64,
}

impl ImageStageOutcome {
    /// Whether any chain broke.
    pub fn is_degraded(&self) -> bool {
        !self.dropped.is_empty()
    }

    /// Completed chain of the given kind.
    pub fn chain(&self, kind: ChainKind) -> Option<&ImageChain> {
        self.chains.iter().find(|chain| *chain.kind() == kind)
    }
}

/// Maps overall progress across all chains onto one sink.
struct StageProgress<'a> {
    inner: &'a dyn ProgressSink,
    offset: usize,
    total: usize,
}

impl ProgressSink for StageProgress<'_> {
    fn unit_completed(&self, completed: usize, _total: usize, label: &str) {
        self.inner
            .unit_completed(self.offset + completed, self.total, label);
    }
}

/// Builds image chains for a scene plan.
pub struct ImageStage {
    generator: SequentialChainGenerator,
    config: ImagingConfig,
}

impl ImageStage {
    /// Create an image stage.
    pub fn new(generator: SequentialChainGenerator, config: ImagingConfig) -> Self {
        Self { generator, config }
    }

    /// Imaging configuration.
    pub fn config(&self) -> &ImagingConfig {
        &self.config
    }

    fn enabled_chains(&self) -> Vec<ChainKind> {
        [
            (ChainKind::Reference, *self.config.reference_chain()),
            (ChainKind::StartFrame, *self.config.start_frames()),
            (ChainKind::EndFrame, *self.config.end_frames()),
        ]
        .into_iter()
        .filter_map(|(kind, enabled)| enabled.then_some(kind))
        .collect()
    }

    /// Generate the enabled chains and attach their images to the plan.
    ///
    /// The reference chain runs first and may start from the user's seed
    /// image. Start and end chains each begin their own seed progression from
    /// the first reference artifact (or the user's seed image when there is no
    /// reference chain).
    ///
    /// When a chain breaks, `abort` mode returns the chain error. In
    /// `subjectless` mode a broken reference chain drops every chain (the
    /// others depend on it) and a broken start or end chain drops only itself.
    /// Cancellation always propagates.
    ///
    /// Every generated image is billed to `cost` as soon as it exists, so the
    /// caller's meter covers images of a run that later aborts or is
    /// cancelled.
    #[tracing::instrument(skip_all, fields(scenes = plan.len()))]
    pub async fn resolve(
        &self,
        plan: &mut ScenePlan,
        seed_image: Option<&ArtifactRef>,
        cancel: &CancellationFlag,
        cost: &CostMeter,
        progress: &dyn ProgressSink,
    ) -> MontageResult<ImageStageOutcome> {
        let kinds = self.enabled_chains();
        let scenes = plan.len();
        let total = kinds.len() * scenes;
        let billed_before = cost.total();
        let mut chains = Vec::new();
        let mut dropped = Vec::new();
        let mut anchor = seed_image.cloned();

        for (index, kind) in kinds.iter().copied().enumerate() {
            let prompts: Vec<ChainPrompt> = plan
                .scenes()
                .iter()
                .map(|scene| ChainPrompt::for_scene(kind, scene))
                .collect();
            let seed = match (kind, anchor.clone()) {
                (ChainKind::Reference, Some(image)) => ChainSeed::UserImage(image),
                (_, Some(image)) => ChainSeed::Anchor(image),
                (_, None) => ChainSeed::Unseeded,
            };
            let chain_progress = StageProgress {
                inner: progress,
                offset: index * scenes,
                total,
            };

            let result = self
                .generator
                .generate(
                    kind,
                    &prompts,
                    plan.consistency_markers(),
                    &seed,
                    cancel,
                    cost,
                    &chain_progress,
                )
                .await;

            match result {
                Ok(chain) => {
                    if kind == ChainKind::Reference {
                        anchor = chain.first_artifact().cloned();
                    }
                    for scene in plan.scenes_mut() {
                        if let Some(image) = chain.artifact_for_scene(*scene.scene_number()) {
                            scene.attach_image(kind, image.clone());
                        }
                    }
                    chains.push(chain);
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    self.absorb_break(kind, e)?;
                    dropped.push(kind);
                    if kind == ChainKind::Reference {
                        // Start and end chains are seeded from the reference chain
                        dropped.extend(kinds.iter().copied().filter(|k| *k != kind));
                        break;
                    }
                }
            }
        }

        let cost_usd = cost.total() - billed_before;
        info!(
            chains = chains.len(),
            dropped = dropped.len(),
            cost_usd,
            "Image stage complete"
        );
        Ok(ImageStageOutcome {
            chains,
            dropped,
            cost_usd,
        })
    }

    fn absorb_break(&self, kind: ChainKind, error: MontageError) -> MontageResult<()> {
        match self.config.on_chain_failure() {
            ChainFailureMode::Abort => {
                tracing::error!(chain = %kind, error = %error, "Image chain broke, aborting");
                Err(error)
            }
            ChainFailureMode::Subjectless => {
                warn!(
                    chain = %kind,
                    error = %error,
                    "Image chain broke, continuing without its images"
                );
                Ok(())
            }
        }
    }
}
