//! Per-scene job fan-out with caching and backend fallback.

use crate::{BackendRegistry, scene_seed, shape_request};
use derive_getters::Getters;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use montage_cache::{ClipCache, Fingerprint, Lookup};
use montage_core::{
    BackendId, CancellationFlag, Clip, ConsistencyMarkers, CostMeter, DispatchConfig,
    ProgressSink, Scene, ScenePlan,
};
use montage_error::{MontageResult, VideoBackendError, VideoBackendErrorKind};
use montage_retry::{Fallback, RetryPolicy};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Result of dispatching every scene of a plan.
#[derive(Debug, Clone, Default, PartialEq, Getters)]
pub struct DispatchOutcome {
    /// Completed clips keyed by scene number
    clips: BTreeMap<u32, Clip>,
    /// Permanently failed scenes with their last error
    failures: BTreeMap<u32, String>,
    /// Video cost in USD; cache hits add nothing
    cost_usd: f64,
    /// Whether cancellation stopped the dispatch
    cancelled: bool,
}

impl DispatchOutcome {
    /// Scene numbers that failed, ascending.
    pub fn failed_scenes(&self) -> Vec<u32> {
        self.failures.keys().copied().collect()
    }

    /// Clips in scene order.
    pub fn ordered_clips(&self) -> Vec<&Clip> {
        self.clips.values().collect()
    }

    /// Whether some but not all scenes produced a clip.
    pub fn is_partial(&self) -> bool {
        !self.clips.is_empty() && !self.failures.is_empty()
    }

    /// Error when no scene produced a clip.
    #[track_caller]
    pub fn ensure_any_clip(&self) -> Result<(), VideoBackendError> {
        if self.clips.is_empty() {
            return Err(VideoBackendError::new(VideoBackendErrorKind::AllScenesFailed(
                self.failures.len(),
            )));
        }
        Ok(())
    }
}

/// Dispatches scene jobs across registered backends.
///
/// # Examples
///
/// ```
/// use montage_cache::ClipCache;
/// use montage_core::DispatchConfig;
/// use montage_dispatch::{BackendRegistry, VideoDispatcher};
/// use montage_retry::RetryPolicy;
///
/// let dispatcher = VideoDispatcher::new(
///     BackendRegistry::new(),
///     ClipCache::default(),
///     RetryPolicy::default(),
///     DispatchConfig::default(),
/// );
/// assert!(dispatcher.registry().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct VideoDispatcher {
    registry: BackendRegistry,
    cache: ClipCache,
    retry: RetryPolicy,
    config: DispatchConfig,
}

/// Per-run inputs shared by every scene job.
struct RunContext {
    order: Vec<BackendId>,
    markers: ConsistencyMarkers,
    shared_seed: Option<u64>,
    cancel: CancellationFlag,
    cost: CostMeter,
    finished: AtomicUsize,
}

type SceneJob<'a> = BoxFuture<'a, (u32, MontageResult<Clip>)>;

impl VideoDispatcher {
    /// Create a dispatcher.
    pub fn new(
        registry: BackendRegistry,
        cache: ClipCache,
        retry: RetryPolicy,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            retry,
            config,
        }
    }

    /// Registered backends.
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Clip cache shared with other runs.
    pub fn cache(&self) -> &ClipCache {
        &self.cache
    }

    /// Dispatch configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Backend attempt order for a run.
    ///
    /// A per-run preference overrides the configured preferred backend.
    pub fn attempt_order(
        &self,
        preferred: Option<&BackendId>,
    ) -> Result<Vec<BackendId>, VideoBackendError> {
        let configured = self.config.preferred_backend().clone().map(BackendId::new);
        let fallbacks: Vec<BackendId> = self
            .config
            .fallback_backends()
            .iter()
            .map(|id| BackendId::new(id.as_str()))
            .collect();
        self.registry
            .attempt_order(preferred.or(configured.as_ref()), &fallbacks)
    }

    /// Generate one clip per scene.
    ///
    /// Jobs run concurrently up to `max_concurrency`. Each job owns its scene,
    /// checks the cancellation flag when it starts and before every fallback
    /// backend, and races every backend call against the flag. Per-scene
    /// failures are recorded in the outcome rather than returned; only an
    /// invalid backend configuration is an error. Once cancellation is
    /// observed no further job starts, in-flight calls are dropped and their
    /// cache claims released, and clips already built stay in the cache.
    #[tracing::instrument(skip_all, fields(scenes = plan.len()))]
    pub async fn dispatch(
        &self,
        plan: &ScenePlan,
        preferred: Option<&BackendId>,
        shared_seed: Option<u64>,
        cancel: &CancellationFlag,
        progress: &dyn ProgressSink,
    ) -> MontageResult<DispatchOutcome> {
        let run = Arc::new(RunContext {
            order: self.attempt_order(preferred)?,
            markers: plan.consistency_markers().clone(),
            shared_seed: shared_seed.or(*self.config.shared_seed()),
            cancel: cancel.clone(),
            cost: CostMeter::default(),
            finished: AtomicUsize::new(0),
        });
        let total = plan.len();
        info!(
            backends = ?run.order,
            max_concurrency = self.config.max_concurrency(),
            "Dispatching scene jobs"
        );

        let mut jobs: Vec<SceneJob<'_>> = Vec::with_capacity(total);
        for scene in plan.scenes().iter().cloned() {
            let run = Arc::clone(&run);
            jobs.push(
                async move {
                    let scene_number = *scene.scene_number();
                    let result = self.run_scene(&scene, &run).await;
                    if !matches!(&result, Err(e) if e.is_cancelled()) {
                        let done = run.finished.fetch_add(1, Ordering::SeqCst) + 1;
                        progress.unit_completed(done, total, &format!("Scene {} video", scene_number));
                    }
                    (scene_number, result)
                }
                .boxed(),
            );
        }
        let results: Vec<(u32, MontageResult<Clip>)> = stream::iter(jobs)
            .buffer_unordered((*self.config.max_concurrency()).max(1))
            .collect()
            .await;

        let mut outcome = DispatchOutcome::default();
        for (scene_number, result) in results {
            match result {
                Ok(clip) => {
                    outcome.clips.insert(scene_number, clip);
                }
                Err(e) if e.is_cancelled() => outcome.cancelled = true,
                Err(e) => {
                    warn!(scene = scene_number, error = %e, "Scene permanently failed");
                    outcome.failures.insert(scene_number, e.to_string());
                }
            }
        }
        outcome.cancelled |= cancel.is_cancelled();
        outcome.cost_usd = run.cost.total();

        info!(
            clips = outcome.clips.len(),
            failed = outcome.failures.len(),
            cancelled = outcome.cancelled,
            cost_usd = outcome.cost_usd,
            "Dispatch finished"
        );
        Ok(outcome)
    }

    /// One scene job: every backend in order, each with the full retry budget.
    #[tracing::instrument(skip_all, fields(scene = scene.scene_number()))]
    async fn run_scene(&self, scene: &Scene, run: &RunContext) -> MontageResult<Clip> {
        run.cancel.check()?;
        let seed = scene_seed(run.shared_seed, scene);

        let fallback = self
            .retry
            .execute_with_fallback("generate_clip", &run.order, &run.cancel, move |backend| {
                self.generate_on(scene, backend, seed, run)
            })
            .await?;

        match fallback {
            Fallback::Succeeded {
                target,
                value,
                attempted,
            } => {
                if attempted > 1 {
                    info!(backend = %target, attempted, "Scene succeeded on fallback backend");
                }
                Ok(value)
            }
            Fallback::Exhausted {
                attempted,
                last_error,
            } => Err(VideoBackendError::new(VideoBackendErrorKind::FallbacksExhausted {
                scene_number: *scene.scene_number(),
                attempted,
                last_error: last_error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no backend attempted".to_string()),
            })
            .into()),
        }
    }

    /// Serve a scene from the cache or generate it on one backend.
    async fn generate_on(
        &self,
        scene: &Scene,
        backend: BackendId,
        seed: u64,
        run: &RunContext,
    ) -> MontageResult<Clip> {
        let entry = self.registry.get(&backend)?;
        let request = shape_request(scene, &run.markers, entry.capabilities(), &self.config, seed)?;
        let fingerprint = Fingerprint::for_request(&backend, &request)?;
        let scene_number = *scene.scene_number();

        let claim = match self.cache.lookup_or_claim(&fingerprint).await? {
            Lookup::Hit(cached) | Lookup::Joined(cached) => {
                debug!(
                    scene = scene_number,
                    %backend,
                    fingerprint = fingerprint.short(),
                    "Reusing cached clip"
                );
                return Ok(Clip::new(
                    scene_number,
                    cached.clip().clone(),
                    backend,
                    *cached.duration_seconds(),
                    0.0,
                    true,
                ));
            }
            Lookup::Claimed(claim) => claim,
        };

        // Dropping the claim on any error below releases the fingerprint
        let generated = {
            let _slot = entry.limiter().acquire().await?;
            entry.backend().generate(&request).await?
        };
        run.cost.add(*generated.cost_usd());
        let stored = claim.complete(
            generated.artifact().clone(),
            *request.duration_seconds(),
            *generated.cost_usd(),
        )?;
        debug!(
            scene = scene_number,
            %backend,
            fingerprint = fingerprint.short(),
            cost_usd = generated.cost_usd(),
            "Generated clip"
        );
        Ok(Clip::new(
            scene_number,
            stored.clip().clone(),
            backend,
            *stored.duration_seconds(),
            *generated.cost_usd(),
            false,
        ))
    }
}
