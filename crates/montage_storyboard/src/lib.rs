//! Storyboard orchestration for the Montage pipeline.
//!
//! Turns a prompt and an optional target duration into a [`ScenePlan`]:
//!
//! - computes the required scene count from the target duration
//! - asks the narrative planner for the storyboard and validates its payload
//! - enforces the subject-identity invariant, repairing prompts that drop the
//!   master subject description
//! - falls back to a deterministic three-scene template when the planner keeps
//!   failing
//!
//! [`ScenePlan`]: montage_core::ScenePlan

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extraction;
mod fallback;
mod orchestrator;
mod payload;
mod scene_count;

pub use extraction::extract_json;
pub use fallback::fallback_plan;
pub use orchestrator::{StoryboardOrchestrator, StoryboardOutcome};
pub use payload::{MarkersPayload, ScenePayload, StoryboardPayload, enforce_subject_identity};
pub use scene_count::{default_scene_duration, required_scenes, valid_target_duration};
