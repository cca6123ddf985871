//! Montage - prompt-to-video generation pipeline
//!
//! Montage turns a free-text advertising prompt into a short multi-scene video:
//! a narrative planner writes a storyboard, reference-image chains keep the
//! subject consistent, video backends render every scene in parallel behind a
//! clip cache, and an editor stitches and enriches the result.
//!
//! Every external service is a collaborator trait from `montage_interface`;
//! plug in implementations and build a pipeline with [`PipelineBuilder`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use montage::{GenerationRequestBuilder, MontageConfig, PipelineBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     montage::init_telemetry()?;
//!
//!     let pipeline = PipelineBuilder::new(MontageConfig::load()?)
//!         .planner(planner)
//!         .image_generator(images)
//!         .backend(veo)
//!         .editor(editor)
//!         .build()?;
//!
//!     let request = GenerationRequestBuilder::default()
//!         .prompt("A 30 second spot for Acme trail shoes")
//!         .target_duration(Some(30u32))
//!         .build()?;
//!     let record = pipeline.run(request).await?;
//!     println!("{}: {:?}", record.status(), record.output());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `montage_error` - Error types and retry classification
//! - `montage_core` - Data model, configuration structs, cancellation, telemetry
//! - `montage_interface` - Collaborator traits
//! - `montage_retry` - Retry policy and per-backend rate limiting
//! - `montage_cache` - Content-fingerprinted clip cache
//! - `montage_storyboard` - Storyboard orchestrator
//! - `montage_imaging` - Sequential reference-chain image generator
//! - `montage_dispatch` - Parallel video dispatch
//! - `montage_assembly` - Stitching and enrichment
//! - `montage_pipeline` - Generation state machine and registry
//!
//! This crate re-exports everything for convenience.

#![warn(missing_docs)]

mod builder;
mod config;

pub use crate::builder::PipelineBuilder;
pub use crate::config::MontageConfig;

pub use montage_core::*;
pub use montage_error::*;
pub use montage_interface::*;

pub use montage_assembly::{
    AssemblyAssets, AssemblyPipeline, BrandExtractor, stitch_segments, text_overlays,
};
pub use montage_cache::{CacheStats, ClipCache, ClipCacheEntry, ClipClaim, Fingerprint, Lookup};
pub use montage_dispatch::{
    BackendEntry, BackendRegistry, DispatchOutcome, VideoDispatcher, scene_seed, shape_request,
};
pub use montage_imaging::{
    ChainPrompt, ChainSeed, ImageStage, ImageStageOutcome, SequentialChainGenerator,
};
pub use montage_pipeline::{GenerationPipeline, GenerationRegistry, GenerationWriter, StageRange};
pub use montage_retry::{BackendLimiter, Fallback, LimiterGuard, RetryPolicy};
pub use montage_storyboard::{
    StoryboardOrchestrator, StoryboardOutcome, StoryboardPayload, enforce_subject_identity,
    extract_json, fallback_plan, required_scenes,
};
