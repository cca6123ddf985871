//! Tests for the assembly pipeline.

use async_trait::async_trait;
use montage_assembly::{AssemblyAssets, AssemblyPipeline};
use montage_core::{
    ArtifactRef, AssemblyConfig, BackendId, Clip, ConsistencyMarkers, NoopProgress, RetryConfig,
    SceneBuilder, ScenePlan, StageOutcome, Transition,
};
use montage_error::{
    CollaboratorError, CollaboratorErrorKind, MontageErrorKind, MontageResult, StitchErrorKind,
};
use montage_interface::{EditResult, StitchSegment, TextOverlaySpec, VideoEditor};
use montage_retry::RetryPolicy;
use std::sync::{Arc, Mutex};

/// Editor that derives each output name from its input and can fail stages.
#[derive(Default)]
struct MockEditor {
    failing: Vec<&'static str>,
    stitched: Mutex<Vec<StitchSegment>>,
    brands: Mutex<Vec<String>>,
}

impl MockEditor {
    fn failing(stages: &[&'static str]) -> Self {
        Self {
            failing: stages.to_vec(),
            ..Self::default()
        }
    }

    fn apply(&self, stage: &str, video: &ArtifactRef, suffix: &str) -> MontageResult<EditResult> {
        if self.failing.contains(&stage) {
            return Err(CollaboratorError::new(CollaboratorErrorKind::Status {
                status_code: 500,
                message: format!("{stage} crashed"),
            })
            .into());
        }
        Ok(EditResult::new(
            ArtifactRef::video(format!("{}+{}", video.uri(), suffix)),
            0.01,
        ))
    }
}

#[async_trait]
impl VideoEditor for MockEditor {
    async fn stitch(&self, segments: &[StitchSegment]) -> MontageResult<EditResult> {
        self.stitched.lock().unwrap().extend_from_slice(segments);
        let names: Vec<&str> = segments.iter().map(|s| s.clip().uri().as_str()).collect();
        self.apply("stitch", &ArtifactRef::video("stitched"), &names.join(","))
    }

    async fn overlay_text(
        &self,
        video: &ArtifactRef,
        overlays: &[TextOverlaySpec],
    ) -> MontageResult<EditResult> {
        self.apply("text", video, &format!("text{}", overlays.len()))
    }

    async fn add_audio(&self, video: &ArtifactRef, _audio: &ArtifactRef) -> MontageResult<EditResult> {
        self.apply("audio", video, "audio")
    }

    async fn brand_overlay(
        &self,
        video: &ArtifactRef,
        brand: &str,
        _logo: Option<&ArtifactRef>,
    ) -> MontageResult<EditResult> {
        self.brands.lock().unwrap().push(brand.to_string());
        self.apply("brand", video, "brand")
    }

    async fn export(&self, video: &ArtifactRef) -> MontageResult<EditResult> {
        self.apply("export", video, "export")
    }
}

fn plan() -> ScenePlan {
    let scenes = (1..=3u32)
        .map(|n| {
            SceneBuilder::default()
                .scene_number(n)
                .detailed_prompt(format!("scene {n}"))
                .duration_seconds(5u32)
                .transition_to_next(Some("fade to white".to_string()))
                .text_overlay((n == 3).then(|| "Shop now".to_string()))
                .build()
                .unwrap()
        })
        .collect();
    ScenePlan::new(ConsistencyMarkers::default(), "", scenes)
}

fn clips(order: &[u32]) -> Vec<Clip> {
    order
        .iter()
        .map(|n| {
            Clip::new(
                *n,
                ArtifactRef::video(format!("c{n}")),
                BackendId::new("veo"),
                5,
                0.0,
                false,
            )
        })
        .collect()
}

fn pipeline(editor: Arc<MockEditor>) -> AssemblyPipeline {
    let retry = RetryPolicy::new(RetryConfig::default().with_max_attempts(1u32));
    AssemblyPipeline::new(editor, retry, AssemblyConfig::default()).unwrap()
}

fn with_audio() -> AssemblyAssets {
    AssemblyAssets::default().with_audio_track(ArtifactRef::audio("track.mp3"))
}

#[tokio::test]
async fn test_all_stages_apply_in_order() {
    let editor = Arc::new(MockEditor::default());
    let result = pipeline(editor.clone())
        .assemble(
            &plan(),
            &clips(&[3, 1, 2]),
            "Trail shoes from Nike",
            &with_audio(),
            &NoopProgress,
        )
        .await
        .unwrap();

    assert_eq!(
        result.artifact().uri(),
        "stitched+c1,c2,c3+text1+audio+brand+export"
    );
    assert_eq!(*result.text_overlay(), StageOutcome::Applied);
    assert_eq!(*result.audio(), StageOutcome::Applied);
    assert_eq!(*result.brand(), StageOutcome::Applied);
    assert_eq!(*result.export(), StageOutcome::Applied);
    assert!((result.cost_usd() - 0.05).abs() < 1e-9);
    assert_eq!(editor.brands.lock().unwrap().as_slice(), ["Nike".to_string()]);

    let stitched = editor.stitched.lock().unwrap();
    assert_eq!(*stitched[0].transition(), Some(Transition::FadeToWhite));
    assert_eq!(*stitched[2].transition(), None);
}

#[tokio::test]
async fn test_audio_failure_keeps_text_overlay_artifact() {
    let failing = pipeline(Arc::new(MockEditor::failing(&["audio"])))
        .assemble(
            &plan(),
            &clips(&[1, 2, 3]),
            "morning coffee",
            &with_audio(),
            &NoopProgress,
        )
        .await
        .unwrap();

    let without_audio = pipeline(Arc::new(MockEditor::default()))
        .assemble(
            &plan(),
            &clips(&[1, 2, 3]),
            "morning coffee",
            &AssemblyAssets::default(),
            &NoopProgress,
        )
        .await
        .unwrap();

    assert_eq!(*failing.audio(), StageOutcome::FailedFallback);
    assert_eq!(*without_audio.audio(), StageOutcome::SkippedNoInput);
    assert_eq!(failing.artifact(), without_audio.artifact());
    assert_eq!(failing.artifact().uri(), "stitched+c1,c2,c3+text1+export");
}

#[tokio::test]
async fn test_every_enrichment_failure_is_absorbed() {
    let result = pipeline(Arc::new(MockEditor::failing(&["text", "audio", "brand", "export"])))
        .assemble(
            &plan(),
            &clips(&[1, 2]),
            "An ad for Acme Rockets",
            &with_audio(),
            &NoopProgress,
        )
        .await
        .unwrap();

    assert_eq!(result.artifact().uri(), "stitched+c1,c2");
    assert_eq!(*result.brand(), StageOutcome::FailedFallback);
    assert_eq!(*result.export(), StageOutcome::FailedFallback);
    assert!(*result.stitched());
}

#[tokio::test]
async fn test_stitch_failure_is_fatal() {
    let err = pipeline(Arc::new(MockEditor::failing(&["stitch"])))
        .assemble(
            &plan(),
            &clips(&[1, 2, 3]),
            "anything",
            &AssemblyAssets::default(),
            &NoopProgress,
        )
        .await
        .unwrap_err();

    match err.kind() {
        MontageErrorKind::Stitch(e) => {
            assert!(matches!(e.kind, StitchErrorKind::Editor { clip_count: 3, .. }))
        }
        other => panic!("Expected stitch error, got {other}"),
    }
}

#[tokio::test]
async fn test_no_clips_cannot_be_stitched() {
    let err = pipeline(Arc::new(MockEditor::default()))
        .assemble(&plan(), &[], "anything", &AssemblyAssets::default(), &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), MontageErrorKind::Stitch(_)));
}

#[tokio::test]
async fn test_missing_brand_skips_overlay() {
    let editor = Arc::new(MockEditor::default());
    let result = pipeline(editor.clone())
        .assemble(
            &plan(),
            &clips(&[1]),
            "a calm walk on the beach",
            &AssemblyAssets::default(),
            &NoopProgress,
        )
        .await
        .unwrap();

    assert_eq!(*result.brand(), StageOutcome::SkippedNoInput);
    assert!(editor.brands.lock().unwrap().is_empty());
}
