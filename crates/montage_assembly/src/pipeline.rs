//! Fixed-order assembly: stitch, text, audio, brand, export.

use crate::{BrandExtractor, stitch_segments, text_overlays};
use derive_getters::Getters;
use montage_core::{
    ArtifactRef, AssemblyConfig, AssemblyResult, Clip, CostMeter, ProgressSink, ScenePlan,
    StageOutcome,
};
use montage_error::{
    EnrichmentError, EnrichmentErrorKind, MontageResult, StitchError, StitchErrorKind,
};
use montage_interface::{EditResult, VideoEditor};
use montage_retry::RetryPolicy;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

const STAGES: usize = 5;

/// Optional inputs for the enrichment stages.
#[derive(Debug, Clone, Default, PartialEq, Getters, derive_setters::Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct AssemblyAssets {
    /// Audio track laid under the video
    audio_track: Option<ArtifactRef>,
    /// Logo shown with the brand overlay
    brand_logo: Option<ArtifactRef>,
}

/// Stitches clips and applies enrichment stages through a video editor.
pub struct AssemblyPipeline {
    editor: Arc<dyn VideoEditor>,
    retry: RetryPolicy,
    config: AssemblyConfig,
    brands: BrandExtractor,
}

impl AssemblyPipeline {
    /// Create an assembly pipeline.
    ///
    /// # Errors
    ///
    /// Returns error if the configured brand list cannot be compiled.
    pub fn new(
        editor: Arc<dyn VideoEditor>,
        retry: RetryPolicy,
        config: AssemblyConfig,
    ) -> MontageResult<Self> {
        let brands = BrandExtractor::new(config.known_brands())?;
        Ok(Self {
            editor,
            retry,
            config,
            brands,
        })
    }

    /// Assembly configuration.
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Assemble the clips into the final video.
    ///
    /// Clips are stitched strictly by scene number. A stitch failure is
    /// returned as [`StitchErrorKind::Editor`]. Every later stage that fails
    /// is logged and recorded as [`StageOutcome::FailedFallback`], and the
    /// artifact from before that stage carries on to the next one.
    #[tracing::instrument(skip_all, fields(clips = clips.len()))]
    pub async fn assemble(
        &self,
        plan: &ScenePlan,
        clips: &[Clip],
        prompt: &str,
        assets: &AssemblyAssets,
        progress: &dyn ProgressSink,
    ) -> MontageResult<AssemblyResult> {
        if clips.is_empty() {
            return Err(StitchError::new(StitchErrorKind::NoClips).into());
        }
        let cost = CostMeter::default();
        let editor = self.editor.as_ref();

        let segments = stitch_segments(plan, clips, &self.config);
        let stitched = {
            let segments = &segments;
            self.retry
                .execute("stitch", move || editor.stitch(segments))
                .await
                .map_err(|e| {
                    tracing::error!(clips = segments.len(), error = %e, "Stitching failed");
                    StitchError::new(StitchErrorKind::Editor {
                        clip_count: segments.len(),
                        message: e.to_string(),
                    })
                })?
        };
        cost.add(*stitched.cost_usd());
        let mut current = stitched.artifact().clone();
        progress.unit_completed(1, STAGES, "Stitched clips");
        info!(artifact = %current, "Stitched clips");

        let overlays = text_overlays(plan, &segments);
        let text_overlay = if overlays.is_empty() {
            StageOutcome::SkippedNoInput
        } else {
            let video = &current.clone();
            let overlays = &overlays;
            self.enrich("text_overlay", &mut current, &cost, move || {
                editor.overlay_text(video, overlays)
            })
            .await
        };
        progress.unit_completed(2, STAGES, "Text overlays");

        let audio = match assets.audio_track() {
            None => StageOutcome::SkippedNoInput,
            Some(track) => {
                let video = &current.clone();
                self.enrich("audio", &mut current, &cost, move || editor.add_audio(video, track))
                    .await
            }
        };
        progress.unit_completed(3, STAGES, "Audio");

        let brand = match self.brands.extract(prompt) {
            None => {
                debug!("No brand token in prompt, skipping brand overlay");
                StageOutcome::SkippedNoInput
            }
            Some(token) => {
                let video = &current.clone();
                let token = token.as_str();
                let logo = assets.brand_logo().as_ref();
                self.enrich("brand_overlay", &mut current, &cost, move || {
                    editor.brand_overlay(video, token, logo)
                })
                .await
            }
        };
        progress.unit_completed(4, STAGES, "Brand overlay");

        let export = {
            let video = &current.clone();
            self.enrich("export", &mut current, &cost, move || editor.export(video))
                .await
        };
        progress.unit_completed(5, STAGES, "Exported");

        info!(
            artifact = %current,
            %text_overlay,
            %audio,
            %brand,
            %export,
            cost_usd = cost.total(),
            "Assembly complete"
        );
        Ok(AssemblyResult::new(
            current,
            text_overlay,
            audio,
            brand,
            export,
            cost.total(),
        ))
    }

    /// Run one optional stage, replacing `current` only on success.
    async fn enrich<F, Fut>(
        &self,
        stage: &str,
        current: &mut ArtifactRef,
        cost: &CostMeter,
        call: F,
    ) -> StageOutcome
    where
        F: Fn() -> Fut,
        Fut: Future<Output = MontageResult<EditResult>>,
    {
        match self.retry.execute(stage, call).await {
            Ok(result) => {
                cost.add(*result.cost_usd());
                debug!(stage, artifact = %result.artifact(), "Stage applied");
                *current = result.artifact().clone();
                StageOutcome::Applied
            }
            Err(e) => {
                let error = EnrichmentError::new(EnrichmentErrorKind::StageFailed {
                    stage: stage.to_string(),
                    message: e.to_string(),
                });
                warn!(stage, error = %error, "Stage failed, keeping previous artifact");
                StageOutcome::FailedFallback
            }
        }
    }
}
