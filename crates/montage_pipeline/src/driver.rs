//! Drives one generation through every stage.

use crate::{GenerationRegistry, GenerationWriter};
use montage_assembly::{AssemblyAssets, AssemblyPipeline};
use futures::FutureExt;
use montage_core::{
    CancellationFlag, Clip, CostMeter, GenerationId, GenerationRecord, GenerationRequest,
    GenerationStatus, ProgressSink,
};
use montage_dispatch::VideoDispatcher;
use montage_error::{MontageError, MontageResult, PipelineError, PipelineErrorKind};
use montage_imaging::ImageStage;
use montage_storyboard::StoryboardOrchestrator;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};

/// Share of overall progress reserved for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRange {
    /// Progress when the stage starts
    pub start: u8,
    /// Progress when the stage ends
    pub end: u8,
}

impl StageRange {
    /// Storyboard planning.
    pub const PLANNING: StageRange = StageRange { start: 0, end: 10 };
    /// Image chains.
    pub const IMAGES: StageRange = StageRange { start: 10, end: 40 };
    /// Video dispatch.
    pub const VIDEO: StageRange = StageRange { start: 40, end: 85 };
    /// Stitching and enrichment.
    pub const ASSEMBLY: StageRange = StageRange { start: 85, end: 100 };

    /// Overall progress after `completed` of `total` units.
    ///
    /// # Examples
    ///
    /// ```
    /// use montage_pipeline::StageRange;
    ///
    /// assert_eq!(StageRange::VIDEO.at(0, 4), 40);
    /// assert_eq!(StageRange::VIDEO.at(2, 4), 62);
    /// assert_eq!(StageRange::VIDEO.at(4, 4), 85);
    /// assert_eq!(StageRange::IMAGES.at(0, 0), 40);
    /// ```
    pub fn at(&self, completed: usize, total: usize) -> u8 {
        let span = self.end.saturating_sub(self.start) as usize;
        let done = if total == 0 {
            span
        } else {
            span * completed.min(total) / total
        };
        self.start + done as u8
    }
}

/// Maps a stage's unit completions onto the record's progress.
struct StageProgress<'a> {
    writer: &'a GenerationWriter,
    range: StageRange,
}

impl ProgressSink for StageProgress<'_> {
    fn unit_completed(&self, completed: usize, total: usize, label: &str) {
        self.writer
            .advance(self.range.at(completed, total), label.to_string());
    }
}

struct Stages {
    registry: GenerationRegistry,
    storyboard: StoryboardOrchestrator,
    images: ImageStage,
    dispatcher: VideoDispatcher,
    assembly: AssemblyPipeline,
}

/// End-to-end generation pipeline.
///
/// Cloning shares the stages and the registry.
#[derive(Clone)]
pub struct GenerationPipeline {
    stages: Arc<Stages>,
}

impl std::fmt::Debug for GenerationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationPipeline")
            .field("registry", &self.stages.registry)
            .field("dispatcher", &self.stages.dispatcher)
            .finish_non_exhaustive()
    }
}

impl GenerationPipeline {
    /// Assemble a pipeline from its stages.
    pub fn new(
        registry: GenerationRegistry,
        storyboard: StoryboardOrchestrator,
        images: ImageStage,
        dispatcher: VideoDispatcher,
        assembly: AssemblyPipeline,
    ) -> Self {
        Self {
            stages: Arc::new(Stages {
                registry,
                storyboard,
                images,
                dispatcher,
                assembly,
            }),
        }
    }

    /// Registry holding this pipeline's generation records.
    pub fn registry(&self) -> &GenerationRegistry {
        &self.stages.registry
    }

    /// Video dispatcher, including the shared clip cache.
    pub fn dispatcher(&self) -> &VideoDispatcher {
        &self.stages.dispatcher
    }

    /// Run a generation to completion and return its final record.
    ///
    /// Stage failures end the run as `failed` rather than returning an error;
    /// only registry errors are returned.
    pub async fn run(&self, request: GenerationRequest) -> MontageResult<GenerationRecord> {
        let id = self.stages.registry.create(request.prompt().clone()).await;
        let writer = self.stages.registry.claim(id).await?;
        Ok(self.drive(writer, request).await)
    }

    /// Start a generation in the background and return its id.
    ///
    /// Must be called within a tokio runtime. Poll the registry for progress.
    /// The background task always leaves the record terminal, even if a
    /// stage panics.
    pub async fn spawn(&self, request: GenerationRequest) -> MontageResult<GenerationId> {
        let id = self.stages.registry.create(request.prompt().clone()).await;
        let writer = self.stages.registry.claim(id).await?;
        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.drive(writer, request).await;
        });
        Ok(id)
    }

    /// Drive a claimed generation through every stage.
    ///
    /// The returned record is terminal: `completed` (possibly with partial
    /// success), `failed` with an error summary, or `cancelled`. A panicking
    /// stage is recorded as a failure.
    pub async fn drive(
        &self,
        writer: GenerationWriter,
        request: GenerationRequest,
    ) -> GenerationRecord {
        let span = info_span!("generation", id = %writer.id());
        async move {
            let cancel = writer.cancel_flag().clone();
            let outcome = AssertUnwindSafe(self.run_stages(&writer, &request, &cancel))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(panic_error(panic)));
            match outcome {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {
                    info!("Generation cancelled");
                    if let Err(e) = writer.cancelled() {
                        warn!(error = %e, "Could not record cancellation");
                    }
                }
                Err(e) => {
                    error!(error = %e, "Generation failed");
                    if let Err(e) = writer.fail(e.to_string()) {
                        warn!(error = %e, "Could not record failure");
                    }
                }
            }
            let record = writer.record();
            info!(
                status = %record.status(),
                partial_success = record.partial_success(),
                cost_usd = record.cost_usd(),
                "Generation finished"
            );
            record
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        writer: &GenerationWriter,
        request: &GenerationRequest,
        cancel: &CancellationFlag,
    ) -> MontageResult<()> {
        let stages = &self.stages;

        cancel.check()?;
        writer.transition(GenerationStatus::Planning, "Planning storyboard")?;
        let storyboard = cancel
            .guard(stages.storyboard.plan(
                request.prompt(),
                request.seed_image().as_ref(),
                *request.target_duration(),
            ))
            .await?;
        writer.add_cost(*storyboard.cost_usd());
        if *storyboard.used_fallback() {
            warn!("Planner unavailable, continuing with the fallback storyboard");
        }
        let mut plan = storyboard.into_plan();
        writer.update(|record| record.set_scene_plan(plan.clone()));
        writer.advance(
            StageRange::PLANNING.end,
            format!("Storyboard ready: {} scenes", plan.len()),
        );

        cancel.check()?;
        writer.transition(GenerationStatus::GeneratingImages, "Generating images")?;
        let image_cost = CostMeter::default();
        let images = stages
            .images
            .resolve(
                &mut plan,
                request.seed_image().as_ref(),
                cancel,
                &image_cost,
                &StageProgress {
                    writer,
                    range: StageRange::IMAGES,
                },
            )
            .await;
        // Images generated before an abort or cancel are still billed
        writer.add_cost(image_cost.total());
        let images = images?;
        if images.is_degraded() {
            warn!(dropped = ?images.dropped(), "Continuing without some image chains");
        }
        writer.update(|record| record.set_scene_plan(plan.clone()));
        writer.advance(StageRange::IMAGES.end, "Images ready");

        cancel.check()?;
        writer.transition(GenerationStatus::GeneratingVideo, "Generating video")?;
        let dispatch = stages
            .dispatcher
            .dispatch(
                &plan,
                request.preferred_backend().as_ref(),
                *request.shared_seed(),
                cancel,
                &StageProgress {
                    writer,
                    range: StageRange::VIDEO,
                },
            )
            .await?;
        writer.add_cost(*dispatch.cost_usd());
        writer.update(|record| record.set_failed_scenes(dispatch.failed_scenes()));
        if *dispatch.cancelled() {
            return Err(PipelineError::new(PipelineErrorKind::Cancelled).into());
        }
        dispatch.ensure_any_clip()?;
        writer.advance(
            StageRange::VIDEO.end,
            format!("{} of {} clips ready", dispatch.clips().len(), plan.len()),
        );

        cancel.check()?;
        writer.transition(GenerationStatus::Assembling, "Assembling video")?;
        let clips: Vec<Clip> = dispatch.clips().values().cloned().collect();
        let mut assets = AssemblyAssets::default();
        if let Some(track) = request.audio_track() {
            assets = assets.with_audio_track(track.clone());
        }
        if let Some(logo) = request.brand_logo() {
            assets = assets.with_brand_logo(logo.clone());
        }
        let assembly = stages
            .assembly
            .assemble(
                &plan,
                &clips,
                request.prompt(),
                &assets,
                &StageProgress {
                    writer,
                    range: StageRange::ASSEMBLY,
                },
            )
            .await?;
        writer.add_cost(*assembly.cost_usd());
        cancel.check()?;
        writer.complete(assembly, dispatch.is_partial())?;
        Ok(())
    }
}

/// Failure for a stage that panicked instead of returning.
fn panic_error(panic: Box<dyn Any + Send>) -> MontageError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    PipelineError::new(PipelineErrorKind::StagePanicked(message)).into()
}
