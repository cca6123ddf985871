//! Assembly pipeline for the Montage video generator.
//!
//! Completed clips are stitched in scene order, then passed through optional
//! enrichment stages (text overlays, audio, brand overlay) and a final export.
//! Stitching is the only fatal stage; every later stage keeps the pre-stage
//! artifact when it fails.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod brand;
mod pipeline;
mod timeline;

pub use brand::BrandExtractor;
pub use pipeline::{AssemblyAssets, AssemblyPipeline};
pub use timeline::{stitch_segments, text_overlays};
