//! Core data types for the Montage video generation pipeline.
//!
//! This crate provides the data model shared by every stage: the scene plan and
//! its scenes, image chains, clips, assembly results, the generation record and
//! the per-component configuration structs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifact;
mod assembly;
mod backend;
mod cancel;
mod chain;
mod clip;
mod config;
mod cost;
mod plan;
mod progress;
mod record;
mod request;
mod scene;
mod telemetry;

pub use artifact::{ArtifactRef, MediaType};
pub use assembly::{AssemblyResult, StageOutcome};
pub use backend::{AspectRatio, BackendCapabilities, BackendCapabilitiesBuilder, BackendId, VideoInput};
pub use cancel::CancellationFlag;
pub use chain::{ChainKind, ChainLink, ImageChain, LinkSource};
pub use clip::Clip;
pub use config::{
    AssemblyConfig, AssemblyConfigBuilder, BackendLimits, ChainFailureMode, ClipCacheConfig,
    ClipCacheConfigBuilder, DispatchConfig, DispatchConfigBuilder, ImagingConfig,
    ImagingConfigBuilder, RetryConfig, RetryConfigBuilder, StoryboardConfig,
    StoryboardConfigBuilder,
};
pub use cost::CostMeter;
pub use plan::{ConsistencyMarkers, ScenePlan};
pub use progress::{NoopProgress, ProgressSink};
pub use record::{GenerationId, GenerationRecord, GenerationStatus};
pub use request::{GenerationRequest, GenerationRequestBuilder};
pub use scene::{Scene, SceneBuilder, SubjectPresence, Transition};
pub use telemetry::{init_telemetry, shutdown_telemetry};
