//! Retry policy and rate limiting for external collaborator calls.
//!
//! Every planning, image and video call goes through [`RetryPolicy`]: a bounded
//! number of attempts with exponential backoff, a per-attempt timeout that
//! counts as a transient failure, and an ordered fallback list. Video backends
//! additionally sit behind a [`BackendLimiter`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod limiter;
mod policy;

pub use limiter::{BackendLimiter, LimiterGuard};
pub use policy::{Fallback, RetryPolicy};
