//! Layered configuration for the whole pipeline.
//!
//! Sources, later ones overriding earlier ones:
//! - Bundled defaults (`montage.toml` compiled into the library)
//! - `~/.config/montage/montage.toml`
//! - `./montage.toml`

use config::{Config, File, FileFormat};
use montage_core::{
    AssemblyConfig, BackendLimits, ClipCacheConfig, DispatchConfig, ImagingConfig, RetryConfig,
    StoryboardConfig,
};
use montage_error::{ConfigError, MontageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../montage.toml");

/// Top-level Montage configuration.
///
/// # Example
///
/// ```no_run
/// use montage::MontageConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MontageConfig::load()?;
/// println!("Scene jobs in flight: {}", config.dispatch.max_concurrency());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MontageConfig {
    /// Storyboard orchestrator settings
    #[serde(default)]
    pub storyboard: StoryboardConfig,

    /// Image chain settings
    #[serde(default)]
    pub imaging: ImagingConfig,

    /// Video dispatch settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Assembly settings
    #[serde(default)]
    pub assembly: AssemblyConfig,

    /// Retry policy for every external call
    #[serde(default)]
    pub retry: RetryConfig,

    /// Clip cache settings
    #[serde(default)]
    pub cache: ClipCacheConfig,

    /// Rate limits keyed by video backend id
    #[serde(default)]
    pub backends: HashMap<String, BackendLimits>,
}

fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> MontageResult<MontageConfig> {
    let config = builder
        .build()
        .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
        .try_deserialize::<MontageConfig>()
        .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
    config.validate()?;
    Ok(config)
}

impl MontageConfig {
    /// Load the bundled defaults overlaid with user configuration files.
    ///
    /// User files are optional and skipped when absent.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a file cannot be parsed or the merged values
    /// are out of range.
    #[instrument]
    pub fn load() -> MontageResult<Self> {
        debug!("Loading configuration: current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/montage/montage.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("montage").required(false));
        build(builder)
    }

    /// Load the bundled defaults overlaid with one specific file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file is missing, malformed or out of range.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> MontageResult<Self> {
        debug!("Loading configuration from file");

        build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref())),
        )
    }

    /// Parse configuration from TOML text overlaid on the bundled defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use montage::MontageConfig;
    ///
    /// let config = MontageConfig::from_toml_str("[dispatch]\nmax_concurrency = 2\n").unwrap();
    /// assert_eq!(*config.dispatch.max_concurrency(), 2);
    /// assert_eq!(*config.storyboard.minimum_scenes(), 3);
    /// ```
    pub fn from_toml_str(toml: &str) -> MontageResult<Self> {
        build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    /// Limits configured for a backend, unlimited when absent.
    pub fn limits_for(&self, backend: &str) -> BackendLimits {
        self.backends.get(backend).copied().unwrap_or_default()
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let storyboard = &self.storyboard;
        if *storyboard.minimum_scenes() == 0 {
            return Err(ConfigError::new("storyboard.minimum_scenes must be at least 1"));
        }
        if *storyboard.max_clip_seconds() == 0 {
            return Err(ConfigError::new("storyboard.max_clip_seconds must be at least 1"));
        }
        if storyboard.min_target_duration() > storyboard.max_target_duration() {
            return Err(ConfigError::new(format!(
                "storyboard.min_target_duration ({}) exceeds max_target_duration ({})",
                storyboard.min_target_duration(),
                storyboard.max_target_duration()
            )));
        }
        if *self.dispatch.max_concurrency() == 0 {
            return Err(ConfigError::new("dispatch.max_concurrency must be at least 1"));
        }
        if *self.retry.max_attempts() == 0 {
            return Err(ConfigError::new("retry.max_attempts must be at least 1"));
        }
        if !self.assembly.transition_seconds().is_finite() || *self.assembly.transition_seconds() < 0.0
        {
            return Err(ConfigError::new(
                "assembly.transition_seconds must be a non-negative number",
            ));
        }
        Ok(())
    }
}
