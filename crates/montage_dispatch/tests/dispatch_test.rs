//! Tests for parallel video dispatch.

use async_trait::async_trait;
use montage_cache::ClipCache;
use montage_core::{
    ArtifactRef, BackendCapabilities, BackendCapabilitiesBuilder, BackendId, CancellationFlag,
    ChainKind, ClipCacheConfig, ConsistencyMarkers, DispatchConfig, NoopProgress, RetryConfig,
    SceneBuilder, ScenePlan, VideoInput,
};
use montage_dispatch::{BackendRegistry, VideoDispatcher};
use montage_error::{
    CollaboratorError, CollaboratorErrorKind, MontageErrorKind, MontageResult,
    VideoBackendErrorKind,
};
use montage_interface::{GeneratedClip, VideoBackend, VideoRequest};
use montage_retry::RetryPolicy;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Video backend that records requests and fails prompts containing a marker.
struct MockBackend {
    id: BackendId,
    inputs: Vec<VideoInput>,
    fail_marker: Option<&'static str>,
    requests: Mutex<Vec<VideoRequest>>,
    cancel_after: Option<(usize, CancellationFlag)>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockBackend {
    fn new(id: &str) -> Self {
        Self {
            id: BackendId::new(id),
            inputs: vec![
                VideoInput::ReferenceImage,
                VideoInput::StartImage,
                VideoInput::EndImage,
            ],
            fail_marker: None,
            requests: Mutex::new(Vec::new()),
            cancel_after: None,
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn failing_on(mut self, marker: &'static str) -> Self {
        self.fail_marker = Some(marker);
        self
    }

    fn cancelling_after(mut self, calls: usize, flag: CancellationFlag) -> Self {
        self.cancel_after = Some((calls, flag));
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn requests(&self) -> Vec<VideoRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoBackend for MockBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilitiesBuilder::default()
            .accepted_inputs(self.inputs.iter().copied().collect::<BTreeSet<_>>())
            .build()
            .unwrap()
    }

    async fn generate(&self, request: &VideoRequest) -> MontageResult<GeneratedClip> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if let Some((after, flag)) = &self.cancel_after
            && call >= *after
        {
            flag.cancel();
        }
        if let Some(marker) = self.fail_marker
            && request.prompt().contains(marker)
        {
            return Err(CollaboratorError::new(CollaboratorErrorKind::Rejected(
                "unsupported content".to_string(),
            ))
            .into());
        }
        Ok(GeneratedClip::new(
            ArtifactRef::video(format!("{}-{}.mp4", self.id, call)),
            0.5,
        ))
    }
}

fn plan(prompts: &[&str]) -> ScenePlan {
    let scenes = prompts
        .iter()
        .zip(1u32..)
        .map(|(prompt, n)| {
            SceneBuilder::default()
                .scene_number(n)
                .detailed_prompt(*prompt)
                .duration_seconds(5u32)
                .build()
                .unwrap()
        })
        .collect();
    ScenePlan::new(ConsistencyMarkers::default(), "", scenes)
}

fn dispatcher(backends: Vec<Arc<MockBackend>>, config: DispatchConfig, cache: ClipCache) -> VideoDispatcher {
    let mut registry = BackendRegistry::new();
    for backend in backends {
        registry.register(backend);
    }
    let retry = RetryPolicy::new(
        RetryConfig::default()
            .with_max_attempts(1u32)
            .with_jitter(false),
    );
    VideoDispatcher::new(registry, cache, retry, config)
}

fn no_cache() -> ClipCache {
    ClipCache::new(ClipCacheConfig::default().with_enabled(false))
}

#[tokio::test]
async fn test_both_frames_never_send_reference() {
    let backend = Arc::new(MockBackend::new("veo"));
    let mut plan = plan(&["Kettle boils", "Steam curls"]);
    for scene in plan.scenes_mut() {
        scene.attach_image(ChainKind::Reference, ArtifactRef::image("ref.png"));
        scene.attach_image(ChainKind::StartFrame, ArtifactRef::image("start.png"));
    }
    plan.scenes_mut()[0].attach_image(ChainKind::EndFrame, ArtifactRef::image("end.png"));

    let outcome = dispatcher(vec![backend.clone()], DispatchConfig::default(), no_cache())
        .dispatch(&plan, None, None, &CancellationFlag::new(), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(outcome.clips().len(), 2);
    for request in backend.requests() {
        if request.end_image().is_some() && request.start_image().is_some() {
            assert!(!request.has_reference());
        } else {
            assert!(request.reference_image().is_some());
        }
    }
}

#[tokio::test]
async fn test_identical_scenes_generate_once() {
    let backend = Arc::new(MockBackend::new("veo").with_delay(Duration::from_millis(30)));
    let config = DispatchConfig::default().with_shared_seed(Some(11u64));
    // Same prompt plus a shared seed gives both scenes one fingerprint
    let plan = plan(&["Lighthouse at dusk", "Lighthouse at dusk"]);
    let dispatcher = dispatcher(vec![backend.clone()], config, ClipCache::default());

    let outcome = dispatcher
        .dispatch(&plan, None, None, &CancellationFlag::new(), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(backend.calls(), 1);
    let clips = outcome.ordered_clips();
    assert_eq!(clips[0].artifact(), clips[1].artifact());
    assert_eq!(clips.iter().filter(|c| *c.from_cache()).count(), 1);
    assert!((outcome.cost_usd() - 0.5).abs() < 1e-9);

    let again = dispatcher
        .dispatch(&plan, None, None, &CancellationFlag::new(), &NoopProgress)
        .await
        .unwrap();
    assert_eq!(backend.calls(), 1);
    assert_eq!(*again.cost_usd(), 0.0);
    assert!(again.clips().values().all(|c| *c.from_cache()));
}

#[tokio::test]
async fn test_failed_scene_falls_back_to_next_backend() {
    let primary = Arc::new(MockBackend::new("primary").failing_on("neon"));
    let secondary = Arc::new(MockBackend::new("secondary"));
    let config = DispatchConfig::default().with_fallback_backends(vec!["secondary".to_string()]);

    let outcome = dispatcher(vec![primary.clone(), secondary.clone()], config, no_cache())
        .dispatch(
            &plan(&["Desert road", "neon city", "Mountain lake"]),
            None,
            None,
            &CancellationFlag::new(),
            &NoopProgress,
        )
        .await
        .unwrap();

    assert!(outcome.failures().is_empty());
    assert_eq!(outcome.clips()[&2].backend(), &BackendId::new("secondary"));
    assert_eq!(outcome.clips()[&1].backend(), &BackendId::new("primary"));
    assert_eq!(primary.calls(), 3);
    assert_eq!(secondary.calls(), 1);
}

#[tokio::test]
async fn test_scene_failing_everywhere_is_partial_success() {
    let primary = Arc::new(MockBackend::new("primary").failing_on("glitch"));
    let secondary = Arc::new(MockBackend::new("secondary").failing_on("glitch"));
    let config = DispatchConfig::default()
        .with_preferred_backend(Some("primary".to_string()))
        .with_fallback_backends(vec!["secondary".to_string()]);

    let outcome = dispatcher(vec![primary, secondary.clone()], config, no_cache())
        .dispatch(
            &plan(&["Dawn", "Noon", "glitch art", "Dusk"]),
            None,
            None,
            &CancellationFlag::new(),
            &NoopProgress,
        )
        .await
        .unwrap();

    assert_eq!(outcome.clips().len(), 3);
    assert_eq!(outcome.failed_scenes(), vec![3]);
    assert!(outcome.is_partial());
    assert!(!*outcome.cancelled());
    assert!(outcome.failures()[&3].contains("2 backends"));
    assert_eq!(secondary.calls(), 1);
    assert!(outcome.ensure_any_clip().is_ok());
}

#[tokio::test]
async fn test_all_scenes_failing_is_reported() {
    let backend = Arc::new(MockBackend::new("veo").failing_on("scene"));
    let outcome = dispatcher(vec![backend], DispatchConfig::default(), no_cache())
        .dispatch(
            &plan(&["scene one", "scene two"]),
            None,
            None,
            &CancellationFlag::new(),
            &NoopProgress,
        )
        .await
        .unwrap();

    let err = outcome.ensure_any_clip().unwrap_err();
    assert_eq!(err.kind, VideoBackendErrorKind::AllScenesFailed(2));
}

#[tokio::test]
async fn test_cancel_after_two_jobs_starts_no_more() {
    let cancel = CancellationFlag::new();
    let backend = Arc::new(MockBackend::new("veo").cancelling_after(2, cancel.clone()));
    let cache = ClipCache::default();
    let config = DispatchConfig::default().with_max_concurrency(1usize);

    let outcome = dispatcher(vec![backend.clone()], config, cache.clone())
        .dispatch(
            &plan(&["One", "Two", "Three", "Four"]),
            None,
            None,
            &cancel,
            &NoopProgress,
        )
        .await
        .unwrap();

    assert!(*outcome.cancelled());
    assert_eq!(backend.calls(), 2);
    assert_eq!(outcome.clips().len(), 2);
    assert!(outcome.failures().is_empty());
    // Completed clips stay reusable
    assert_eq!(cache.len().unwrap(), 2);
}

#[tokio::test]
async fn test_cancel_interrupts_in_flight_generation() {
    let cancel = CancellationFlag::new();
    let slow = Arc::new(MockBackend::new("veo").with_delay(Duration::from_secs(30)));
    let cache = ClipCache::default();
    let scenes = plan(&["Kettle whistles"]);

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let outcome = dispatcher(vec![slow.clone()], DispatchConfig::default(), cache.clone())
        .dispatch(&scenes, None, None, &cancel, &NoopProgress)
        .await
        .unwrap();

    assert!(*outcome.cancelled());
    assert!(outcome.clips().is_empty());
    assert!(outcome.failures().is_empty());
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(slow.calls(), 0);

    // The abandoned job released its cache claim, so a new run can generate
    let fast = Arc::new(MockBackend::new("veo"));
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        dispatcher(vec![fast.clone()], DispatchConfig::default(), cache.clone()).dispatch(
            &scenes,
            None,
            None,
            &CancellationFlag::new(),
            &NoopProgress,
        ),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(outcome.clips().len(), 1);
    assert_eq!(fast.calls(), 1);
}

#[tokio::test]
async fn test_dispatch_runs_on_a_spawned_task() {
    let backend = Arc::new(MockBackend::new("veo"));
    let dispatcher = dispatcher(vec![backend.clone()], DispatchConfig::default(), no_cache());
    let scenes = plan(&["Kettle boils", "Steam curls", "Tea pours"]);

    let outcome = tokio::spawn(async move {
        let cancel = CancellationFlag::new();
        dispatcher
            .dispatch(&scenes, None, None, &cancel, &NoopProgress)
            .await
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(outcome.clips().len(), 3);
    assert_eq!(backend.calls(), 3);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let backend = Arc::new(MockBackend::new("veo").with_delay(Duration::from_millis(20)));
    let config = DispatchConfig::default().with_max_concurrency(2usize);

    let outcome = dispatcher(vec![backend.clone()], config, no_cache())
        .dispatch(
            &plan(&["a", "b", "c", "d", "e", "f"]),
            None,
            None,
            &CancellationFlag::new(),
            &NoopProgress,
        )
        .await
        .unwrap();

    assert_eq!(outcome.clips().len(), 6);
    assert!(backend.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_run_preference_overrides_configuration() {
    let veo = Arc::new(MockBackend::new("veo"));
    let kling = Arc::new(MockBackend::new("kling"));
    let config = DispatchConfig::default().with_preferred_backend(Some("veo".to_string()));

    let outcome = dispatcher(vec![veo.clone(), kling.clone()], config, no_cache())
        .dispatch(
            &plan(&["a"]),
            Some(&BackendId::new("kling")),
            None,
            &CancellationFlag::new(),
            &NoopProgress,
        )
        .await
        .unwrap();

    assert_eq!(outcome.clips()[&1].backend(), &BackendId::new("kling"));
    assert_eq!(veo.calls(), 0);
}

#[tokio::test]
async fn test_unknown_backend_is_a_configuration_error() {
    let config = DispatchConfig::default().with_fallback_backends(vec!["sora".to_string()]);
    let err = dispatcher(vec![Arc::new(MockBackend::new("veo"))], config, no_cache())
        .dispatch(&plan(&["a"]), None, None, &CancellationFlag::new(), &NoopProgress)
        .await
        .unwrap_err();

    match err.kind() {
        MontageErrorKind::Video(e) => {
            assert_eq!(e.kind, VideoBackendErrorKind::UnknownBackend("sora".to_string()))
        }
        other => panic!("Expected video backend error, got {other}"),
    }
}

#[tokio::test]
async fn test_no_backends_is_an_error() {
    let err = dispatcher(Vec::new(), DispatchConfig::default(), no_cache())
        .dispatch(&plan(&["a"]), None, None, &CancellationFlag::new(), &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), MontageErrorKind::Video(_)));
}
