//! Component configuration.
//!
//! Every struct deserializes with defaults for missing fields so a partial
//! `montage.toml` section overrides only what it names.

use crate::{AspectRatio, Transition};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Scene-count and duration policy for the storyboard orchestrator.
///
/// # Examples
///
/// ```
/// use montage_core::StoryboardConfig;
///
/// let config = StoryboardConfig::default();
/// assert_eq!(*config.minimum_scenes(), 3);
/// assert_eq!(*config.max_clip_seconds(), 8);
/// assert!(config.accepts_duration(30));
/// assert!(!config.accepts_duration(90));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct StoryboardConfig {
    /// Floor on the scene count when a duration is given
    #[serde(default = "default_minimum_scenes")]
    #[builder(default = "default_minimum_scenes()")]
    minimum_scenes: usize,

    /// Longest clip a single scene may request
    #[serde(default = "default_max_clip_seconds")]
    #[builder(default = "default_max_clip_seconds()")]
    max_clip_seconds: u32,

    /// Scene count used when no valid duration is given
    #[serde(default = "default_scene_count")]
    #[builder(default = "default_scene_count()")]
    default_scene_count: usize,

    /// Shortest accepted target duration in seconds
    #[serde(default = "default_min_target_duration")]
    #[builder(default = "default_min_target_duration()")]
    min_target_duration: u32,

    /// Longest accepted target duration in seconds
    #[serde(default = "default_max_target_duration")]
    #[builder(default = "default_max_target_duration()")]
    max_target_duration: u32,

    /// Clip length used when neither planner nor duration provides one
    #[serde(default = "default_clip_seconds")]
    #[builder(default = "default_clip_seconds()")]
    default_clip_seconds: u32,
}

fn default_minimum_scenes() -> usize {
    3
}

fn default_max_clip_seconds() -> u32 {
    8
}

fn default_scene_count() -> usize {
    5
}

fn default_min_target_duration() -> u32 {
    12
}

fn default_max_target_duration() -> u32 {
    60
}

fn default_clip_seconds() -> u32 {
    5
}

impl Default for StoryboardConfig {
    fn default() -> Self {
        Self {
            minimum_scenes: default_minimum_scenes(),
            max_clip_seconds: default_max_clip_seconds(),
            default_scene_count: default_scene_count(),
            min_target_duration: default_min_target_duration(),
            max_target_duration: default_max_target_duration(),
            default_clip_seconds: default_clip_seconds(),
        }
    }
}

impl StoryboardConfig {
    /// Whether a target duration lies within the valid range.
    pub fn accepts_duration(&self, seconds: u32) -> bool {
        (self.min_target_duration..=self.max_target_duration).contains(&seconds)
    }
}

/// What the image stage does when a chain breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChainFailureMode {
    /// Fail the whole generation
    Abort,
    /// Drop the broken chain's images and continue without references
    #[default]
    Subjectless,
}

/// Image stage configuration.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct ImagingConfig {
    /// Build the reference chain
    #[serde(default = "default_true")]
    #[builder(default = "true")]
    reference_chain: bool,

    /// Build the start-frame chain
    #[serde(default)]
    #[builder(default)]
    start_frames: bool,

    /// Build the end-frame chain
    #[serde(default)]
    #[builder(default)]
    end_frames: bool,

    /// Behavior when a chain breaks
    #[serde(default)]
    #[builder(default)]
    on_chain_failure: ChainFailureMode,
}

fn default_true() -> bool {
    true
}

impl Default for ImagingConfig {
    fn default() -> Self {
        Self {
            reference_chain: true,
            start_frames: false,
            end_frames: false,
            on_chain_failure: ChainFailureMode::default(),
        }
    }
}

/// Video dispatcher configuration.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct DispatchConfig {
    /// Maximum scene jobs in flight
    #[serde(default = "default_max_concurrency")]
    #[builder(default = "default_max_concurrency()")]
    max_concurrency: usize,

    /// Backend tried first for every scene
    #[serde(default)]
    #[builder(default)]
    preferred_backend: Option<String>,

    /// Backends tried in order after the preferred one fails
    #[serde(default)]
    #[builder(default)]
    fallback_backends: Vec<String>,

    /// Seed shared by all scenes of a run
    #[serde(default)]
    #[builder(default)]
    shared_seed: Option<u64>,

    /// Requested aspect ratio
    #[serde(default)]
    #[builder(default)]
    aspect_ratio: AspectRatio,

    /// Requested resolution label
    #[serde(default = "default_resolution")]
    #[builder(default = "default_resolution()")]
    resolution: String,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_resolution() -> String {
    "720p".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            preferred_backend: None,
            fallback_backends: Vec::new(),
            shared_seed: None,
            aspect_ratio: AspectRatio::default(),
            resolution: default_resolution(),
        }
    }
}

/// Assembly pipeline configuration.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct AssemblyConfig {
    /// Brand names recognized in prompts
    #[serde(default = "default_known_brands")]
    #[builder(default = "default_known_brands()")]
    known_brands: Vec<String>,

    /// Transition used when a scene's descriptor is unset or unsupported
    #[serde(default)]
    #[builder(default)]
    default_transition: Transition,

    /// Transition length in seconds
    #[serde(default = "default_transition_seconds")]
    #[builder(default = "default_transition_seconds()")]
    transition_seconds: f64,
}

fn default_known_brands() -> Vec<String> {
    [
        "Nike", "Adidas", "Apple", "Samsung", "Coca-Cola", "Pepsi", "Tesla", "Google", "Amazon",
        "Starbucks", "McDonald's", "Toyota", "BMW", "Mercedes-Benz", "Red Bull", "Sony", "Puma",
        "Lego", "IKEA", "Netflix",
    ]
    .iter()
    .map(|brand| brand.to_string())
    .collect()
}

fn default_transition_seconds() -> f64 {
    0.5
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            known_brands: default_known_brands(),
            default_transition: Transition::default(),
            transition_seconds: default_transition_seconds(),
        }
    }
}

/// Bounded retry with exponential backoff, applied to every external call.
///
/// # Examples
///
/// ```
/// use montage_core::RetryConfig;
///
/// let config = RetryConfig::default().with_max_attempts(5u32);
/// assert_eq!(*config.max_attempts(), 5);
/// assert_eq!(*config.backoff_factor(), 2);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    #[builder(default = "default_max_attempts()")]
    max_attempts: u32,

    /// Delay before the first retry
    #[serde(default = "default_initial_backoff_ms")]
    #[builder(default = "default_initial_backoff_ms()")]
    initial_backoff_ms: u64,

    /// Multiplier applied to each successive delay
    #[serde(default = "default_backoff_factor")]
    #[builder(default = "default_backoff_factor()")]
    backoff_factor: u64,

    /// Cap on any single delay
    #[serde(default = "default_max_delay_ms")]
    #[builder(default = "default_max_delay_ms()")]
    max_delay_ms: u64,

    /// Randomize delays
    #[serde(default = "default_true")]
    #[builder(default = "true")]
    jitter: bool,

    /// Timeout for a single call; expiry consumes one attempt
    #[serde(default = "default_call_timeout_ms")]
    #[builder(default = "default_call_timeout_ms()")]
    call_timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_backoff_factor() -> u64 {
    2
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_call_timeout_ms() -> u64 {
    120_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
            jitter: true,
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

/// Clip cache configuration.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct ClipCacheConfig {
    /// Whether completed clips are stored
    #[serde(default = "default_true")]
    #[builder(default = "true")]
    enabled: bool,

    /// Maximum number of entries before least-recently-used eviction
    #[serde(default = "default_max_entries")]
    #[builder(default = "default_max_entries()")]
    max_entries: usize,
}

fn default_max_entries() -> usize {
    1000
}

impl Default for ClipCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
        }
    }
}

/// Rate limits for one video backend. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendLimits {
    /// Requests per minute
    #[serde(default)]
    pub rpm: Option<u32>,

    /// Maximum concurrent requests
    #[serde(default)]
    pub max_concurrent: Option<u32>,
}
