//! Capability table of registered video backends.

use derive_getters::Getters;
use montage_core::{BackendCapabilities, BackendId, BackendLimits};
use montage_error::{VideoBackendError, VideoBackendErrorKind};
use montage_interface::VideoBackend;
use montage_retry::BackendLimiter;
use std::sync::Arc;
use tracing::debug;

/// One registered backend with the capabilities it declared at registration.
#[derive(Clone, Getters)]
pub struct BackendEntry {
    /// Backend implementation
    backend: Arc<dyn VideoBackend>,
    /// Accepted inputs and constraints
    capabilities: BackendCapabilities,
    /// Rate limiter shared by every job sent to this backend
    limiter: BackendLimiter,
}

impl std::fmt::Debug for BackendEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendEntry")
            .field("id", self.backend.id())
            .field("capabilities", &self.capabilities)
            .field("limiter", &self.limiter)
            .finish()
    }
}

/// Lookup table from backend id to its capability descriptor and limiter.
///
/// Registration order is kept; the first registered backend is the default
/// when no preference is configured.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    entries: Vec<BackendEntry>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend without rate limits.
    pub fn register(&mut self, backend: Arc<dyn VideoBackend>) -> &mut Self {
        self.register_with_limits(backend, BackendLimits::default())
    }

    /// Register a backend with rate limits.
    ///
    /// Registering an id twice replaces the earlier entry in place.
    pub fn register_with_limits(
        &mut self,
        backend: Arc<dyn VideoBackend>,
        limits: BackendLimits,
    ) -> &mut Self {
        let entry = BackendEntry {
            capabilities: backend.capabilities(),
            limiter: BackendLimiter::new(&limits),
            backend,
        };
        debug!(
            backend = %entry.backend.id(),
            inputs = ?entry.capabilities.accepted_inputs(),
            rpm = ?limits.rpm,
            max_concurrent = ?limits.max_concurrent,
            "Registered video backend"
        );
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.backend.id() == entry.backend.id())
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    /// Entry for a backend id.
    #[track_caller]
    pub fn get(&self, id: &BackendId) -> Result<&BackendEntry, VideoBackendError> {
        self.entries
            .iter()
            .find(|entry| entry.backend.id() == id)
            .ok_or_else(|| {
                VideoBackendError::new(VideoBackendErrorKind::UnknownBackend(id.to_string()))
            })
    }

    /// Capabilities of a backend.
    pub fn capabilities(&self, id: &BackendId) -> Result<&BackendCapabilities, VideoBackendError> {
        Ok(self.get(id)?.capabilities())
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<BackendId> {
        self.entries
            .iter()
            .map(|entry| entry.backend.id().clone())
            .collect()
    }

    /// Whether a backend id is registered.
    pub fn contains(&self, id: &BackendId) -> bool {
        self.entries.iter().any(|entry| entry.backend.id() == id)
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attempt order for a run: the primary backend, then the fallbacks.
    ///
    /// The primary is the explicit preference, else the first registered
    /// backend. Duplicates are dropped; unregistered ids are an error.
    pub fn attempt_order(
        &self,
        preferred: Option<&BackendId>,
        fallbacks: &[BackendId],
    ) -> Result<Vec<BackendId>, VideoBackendError> {
        let primary = preferred
            .cloned()
            .or_else(|| self.entries.first().map(|entry| entry.backend.id().clone()))
            .ok_or_else(|| VideoBackendError::new(VideoBackendErrorKind::NoBackends))?;

        let mut order: Vec<BackendId> = Vec::with_capacity(fallbacks.len() + 1);
        for id in std::iter::once(&primary).chain(fallbacks) {
            if !self.contains(id) {
                return Err(VideoBackendError::new(VideoBackendErrorKind::UnknownBackend(
                    id.to_string(),
                )));
            }
            if !order.contains(id) {
                order.push(id.clone());
            }
        }
        Ok(order)
    }
}
