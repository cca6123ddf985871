//! Content fingerprints for video requests.

use montage_core::BackendId;
use montage_error::{CacheError, CacheErrorKind};
use montage_interface::VideoRequest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 over the shaped request and the backend that will serve it.
///
/// The shaped request carries the scene prompt, attached images, duration,
/// aspect ratio, resolution and seed, so two requests that would produce the
/// same clip on the same backend share a fingerprint.
///
/// # Examples
///
/// ```
/// use montage_cache::Fingerprint;
/// use montage_core::BackendId;
/// use montage_interface::VideoRequestBuilder;
///
/// let request = VideoRequestBuilder::default()
///     .prompt("A lighthouse at dusk")
///     .duration_seconds(5u32)
///     .seed(7u64)
///     .build()
///     .unwrap();
///
/// let a = Fingerprint::for_request(&BackendId::new("veo"), &request).unwrap();
/// let b = Fingerprint::for_request(&BackendId::new("veo"), &request).unwrap();
/// let c = Fingerprint::for_request(&BackendId::new("kling"), &request).unwrap();
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a shaped request for a backend.
    pub fn for_request(backend: &BackendId, request: &VideoRequest) -> Result<Self, CacheError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| CacheError::new(CacheErrorKind::Fingerprint(e.to_string())))?;

        let mut hasher = Sha256::new();
        hasher.update(backend.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(&payload);
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, for log fields.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}
