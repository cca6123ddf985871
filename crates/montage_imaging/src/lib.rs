//! Seed-chained image generation for the Montage pipeline.
//!
//! An image chain is a strict fold over per-scene prompts: each generated
//! image becomes the visual seed of the next, which keeps the recurring
//! subject consistent across scenes. A failure at any position breaks the
//! whole chain, because every later image depends on it.
//!
//! [`ImageStage`] builds the configured chains (reference, start frames, end
//! frames) for a scene plan and attaches the results to its scenes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod generator;
mod stage;

pub use generator::{ChainPrompt, ChainSeed, SequentialChainGenerator};
pub use stage::{ImageStage, ImageStageOutcome};
