//! Pipeline construction from configuration and collaborators.

use crate::MontageConfig;
use montage_assembly::AssemblyPipeline;
use montage_cache::ClipCache;
use montage_core::BackendId;
use montage_dispatch::{BackendRegistry, VideoDispatcher};
use montage_error::{ConfigError, MontageResult};
use montage_imaging::{ImageStage, SequentialChainGenerator};
use montage_interface::{ImageGenerator, NarrativePlanner, VideoBackend, VideoEditor};
use montage_pipeline::{GenerationPipeline, GenerationRegistry};
use montage_retry::RetryPolicy;
use montage_storyboard::StoryboardOrchestrator;
use std::sync::Arc;
use tracing::{debug, info};

/// Wires collaborators into a [`GenerationPipeline`].
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use montage::{ImageGenerator, NarrativePlanner, VideoBackend, VideoEditor};
/// use montage::{MontageConfig, PipelineBuilder};
///
/// # fn wire(
/// #     planner: Arc<dyn NarrativePlanner>,
/// #     images: Arc<dyn ImageGenerator>,
/// #     veo: Arc<dyn VideoBackend>,
/// #     editor: Arc<dyn VideoEditor>,
/// # ) -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = PipelineBuilder::new(MontageConfig::load()?)
///     .planner(planner)
///     .image_generator(images)
///     .backend(veo)
///     .editor(editor)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    config: MontageConfig,
    planner: Option<Arc<dyn NarrativePlanner>>,
    image_generator: Option<Arc<dyn ImageGenerator>>,
    backends: Vec<Arc<dyn VideoBackend>>,
    editor: Option<Arc<dyn VideoEditor>>,
    cache: Option<ClipCache>,
    registry: Option<GenerationRegistry>,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("config", &self.config)
            .field("planner", &self.planner.as_ref().map(|p| p.name().to_string()))
            .field("image_generator", &self.image_generator.is_some())
            .field(
                "backends",
                &self.backends.iter().map(|b| b.id().clone()).collect::<Vec<_>>(),
            )
            .field("editor", &self.editor.is_some())
            .finish_non_exhaustive()
    }
}

impl PipelineBuilder {
    /// Start from a configuration.
    pub fn new(config: MontageConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Narrative planner for the storyboard stage.
    pub fn planner(mut self, planner: Arc<dyn NarrativePlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// Image generator for the reference chains.
    pub fn image_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.image_generator = Some(generator);
        self
    }

    /// Register a video backend. The first one registered is the default.
    pub fn backend(mut self, backend: Arc<dyn VideoBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Video editor for assembly.
    pub fn editor(mut self, editor: Arc<dyn VideoEditor>) -> Self {
        self.editor = Some(editor);
        self
    }

    /// Share a clip cache with other pipelines instead of creating one.
    pub fn cache(mut self, cache: ClipCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Share a generation registry with other pipelines instead of creating one.
    pub fn registry(mut self, registry: GenerationRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a collaborator is missing, no backend is
    /// registered, or the dispatch configuration names an unregistered backend.
    pub fn build(self) -> MontageResult<GenerationPipeline> {
        self.config.validate()?;
        let planner = self
            .planner
            .ok_or_else(|| ConfigError::new("No narrative planner configured"))?;
        let image_generator = self
            .image_generator
            .ok_or_else(|| ConfigError::new("No image generator configured"))?;
        let editor = self
            .editor
            .ok_or_else(|| ConfigError::new("No video editor configured"))?;
        if self.backends.is_empty() {
            return Err(ConfigError::new("No video backends configured").into());
        }

        let mut backends = BackendRegistry::new();
        for backend in self.backends {
            let limits = self.config.limits_for(backend.id().as_str());
            debug!(backend = %backend.id(), ?limits, "Registering video backend");
            backends.register_with_limits(backend, limits);
        }

        let dispatch = &self.config.dispatch;
        for name in dispatch
            .preferred_backend()
            .iter()
            .chain(dispatch.fallback_backends().iter())
        {
            if !backends.contains(&BackendId::new(name.as_str())) {
                return Err(ConfigError::new(format!(
                    "dispatch names backend '{}' but no such backend is registered",
                    name
                ))
                .into());
            }
        }

        let retry = RetryPolicy::new(self.config.retry.clone());
        let cache = self
            .cache
            .unwrap_or_else(|| ClipCache::new(self.config.cache.clone()));

        let storyboard =
            StoryboardOrchestrator::new(planner, self.config.storyboard.clone(), retry.clone());
        let images = ImageStage::new(
            SequentialChainGenerator::new(image_generator, retry.clone()),
            self.config.imaging.clone(),
        );
        let dispatcher =
            VideoDispatcher::new(backends, cache, retry.clone(), self.config.dispatch.clone());
        let assembly = AssemblyPipeline::new(editor, retry, self.config.assembly.clone())?;

        info!(
            backends = dispatcher.registry().len(),
            max_concurrency = self.config.dispatch.max_concurrency(),
            "Generation pipeline ready"
        );
        Ok(GenerationPipeline::new(
            self.registry.unwrap_or_default(),
            storyboard,
            images,
            dispatcher,
            assembly,
        ))
    }
}
