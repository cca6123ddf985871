//! Clip cache for the Montage pipeline.
//!
//! Completed video clips are stored under a content fingerprint so identical
//! scene requests, in the same run or across runs, are generated once. At most
//! one build is in flight per fingerprint; later requesters join it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod fingerprint;

pub use cache::{CacheStats, ClipCache, ClipCacheEntry, ClipClaim, Lookup};
pub use fingerprint::Fingerprint;
