//! Error types for the Montage library.
//!
//! This crate provides the error taxonomy shared by every pipeline stage.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Stage-local failures (a single scene, a single enrichment stage) are absorbed
//! by their stage and recorded. Only structurally fatal failures (chain break,
//! stitch failure, zero successful scenes) surface as run failures.
//!
//! # Examples
//!
//! ```
//! use montage_error::{MontageResult, StitchError, StitchErrorKind};
//!
//! fn stitch() -> MontageResult<String> {
//!     Err(StitchError::new(StitchErrorKind::NoClips))?
//! }
//!
//! assert!(stitch().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod chain;
mod collaborator;
mod config;
mod enrichment;
mod error;
mod pipeline;
mod planning;
mod retry;
mod stitch;
mod video;

pub use cache::{CacheError, CacheErrorKind};
pub use chain::{ChainError, ChainErrorKind};
pub use collaborator::{CollaboratorError, CollaboratorErrorKind};
pub use config::ConfigError;
pub use enrichment::{EnrichmentError, EnrichmentErrorKind};
pub use error::{MontageError, MontageErrorKind, MontageResult};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use planning::{PlanningError, PlanningErrorKind};
pub use retry::RetryableError;
pub use stitch::{StitchError, StitchErrorKind};
pub use video::{VideoBackendError, VideoBackendErrorKind};
