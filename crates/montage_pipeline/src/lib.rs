//! Generation state machine for the Montage pipeline.
//!
//! A generation moves through `pending → planning → generating_images →
//! generating_video → assembling` and ends `completed`, `failed` or
//! `cancelled`. [`GenerationRegistry`] keys records by generation id and
//! hands out exactly one [`GenerationWriter`] per id; everyone else reads
//! snapshots. [`GenerationPipeline`] drives a run through every stage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod driver;
mod registry;

pub use driver::{GenerationPipeline, StageRange};
pub use registry::{GenerationRegistry, GenerationWriter};
