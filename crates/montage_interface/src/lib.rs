//! Collaborator contracts for the Montage pipeline.
//!
//! The pipeline orchestrates external collaborators it does not implement:
//! a narrative planner, an image generator, any number of interchangeable
//! video backends and a video editor. This crate defines the request and
//! response types they exchange with the pipeline and the `async_trait`
//! contracts they implement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ImageGenerator, NarrativePlanner, VideoBackend, VideoEditor};
pub use types::{
    EditResult, GeneratedClip, GeneratedImage, ImageRequest, PlannerResponse, PlanningRequest,
    StitchSegment, TextOverlaySpec, VideoRequest, VideoRequestBuilder,
};
