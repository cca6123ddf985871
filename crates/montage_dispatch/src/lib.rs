//! Parallel video generation for the Montage pipeline.
//!
//! Every scene becomes one job. Jobs run concurrently up to the configured
//! bound, each shaping its request to the capabilities of the backend it is
//! sent to, consulting the clip cache, and falling back through an ordered
//! backend list before the scene is marked failed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dispatcher;
mod registry;
mod seed;
mod shaping;

pub use dispatcher::{DispatchOutcome, VideoDispatcher};
pub use registry::{BackendEntry, BackendRegistry};
pub use seed::scene_seed;
pub use shaping::shape_request;
