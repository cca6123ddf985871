//! Clip cache with at-most-one in-flight build per fingerprint.

use crate::Fingerprint;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use montage_core::{ArtifactRef, ClipCacheConfig};
use montage_error::{CacheError, CacheErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, warn};

/// A completed clip stored under its fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ClipCacheEntry {
    /// Content fingerprint
    fingerprint: Fingerprint,
    /// Clip artifact
    clip: ArtifactRef,
    /// Clip length in seconds
    duration_seconds: u32,
    /// Cost paid to build the clip
    cost_usd: f64,
    /// When the clip was stored
    created_at: DateTime<Utc>,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct CacheStats {
    /// Lookups served from a stored entry
    hits: u64,
    /// Lookups that claimed a build
    misses: u64,
    /// Lookups that waited on another requester's build
    joins: u64,
    /// Entries removed by the size bound or explicit eviction
    evictions: u64,
}

#[derive(Debug, Clone)]
enum BuildState {
    Pending,
    Done(ClipCacheEntry),
    Abandoned,
}

#[derive(Debug)]
enum Slot {
    Ready(ClipCacheEntry),
    Building(watch::Receiver<BuildState>),
}

#[derive(Debug, Default)]
struct CacheState {
    slots: HashMap<Fingerprint, Slot>,
    access_order: VecDeque<Fingerprint>,
    stats: CacheStats,
}

impl CacheState {
    fn touch(&mut self, fingerprint: &Fingerprint) {
        if let Some(pos) = self.access_order.iter().position(|k| k == fingerprint) {
            self.access_order.remove(pos);
        }
        self.access_order.push_back(fingerprint.clone());
    }

    fn forget(&mut self, fingerprint: &Fingerprint) {
        if let Some(pos) = self.access_order.iter().position(|k| k == fingerprint) {
            self.access_order.remove(pos);
        }
    }

    fn evict_over(&mut self, max_entries: usize) {
        while self.access_order.len() > max_entries {
            let Some(oldest) = self.access_order.pop_front() else {
                break;
            };
            self.slots.remove(&oldest);
            self.stats.evictions += 1;
            debug!(fingerprint = oldest.short(), "Evicted least recently used clip");
        }
    }
}

/// Result of [`ClipCache::lookup_or_claim`].
#[derive(Debug)]
pub enum Lookup {
    /// A stored clip.
    Hit(ClipCacheEntry),
    /// A clip built by another requester while this one waited.
    Joined(ClipCacheEntry),
    /// Nobody holds this fingerprint; the caller must build it.
    Claimed(ClipClaim),
}

/// Exclusive right to build one fingerprint.
///
/// Call [`ClipClaim::complete`] with the built clip. Dropping the claim
/// without completing it releases the fingerprint and wakes any waiters so
/// one of them can claim it instead.
#[derive(Debug)]
pub struct ClipClaim {
    fingerprint: Fingerprint,
    state: Option<Arc<Mutex<CacheState>>>,
    max_entries: usize,
    sender: Option<watch::Sender<BuildState>>,
}

impl ClipClaim {
    /// Fingerprint this claim covers.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Store the built clip and hand it to everyone waiting on it.
    pub fn complete(
        mut self,
        clip: ArtifactRef,
        duration_seconds: u32,
        cost_usd: f64,
    ) -> Result<ClipCacheEntry, CacheError> {
        let entry = ClipCacheEntry {
            fingerprint: self.fingerprint.clone(),
            clip,
            duration_seconds,
            cost_usd,
            created_at: Utc::now(),
        };

        if let Some(state) = self.state.take() {
            let mut state = lock(&state)?;
            state
                .slots
                .insert(self.fingerprint.clone(), Slot::Ready(entry.clone()));
            state.touch(&self.fingerprint);
            state.evict_over(self.max_entries);
            debug!(fingerprint = self.fingerprint.short(), "Stored clip");
        }

        if let Some(sender) = self.sender.take() {
            sender.send_replace(BuildState::Done(entry.clone()));
        }
        Ok(entry)
    }
}

impl Drop for ClipClaim {
    fn drop(&mut self) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        if let Some(state) = self.state.take() {
            match state.lock() {
                Ok(mut state) => {
                    if matches!(state.slots.get(&self.fingerprint), Some(Slot::Building(_))) {
                        state.slots.remove(&self.fingerprint);
                    }
                }
                Err(_) => warn!(
                    fingerprint = self.fingerprint.short(),
                    "Cache lock poisoned while releasing claim"
                ),
            }
        }
        debug!(fingerprint = self.fingerprint.short(), "Released unfinished claim");
        sender.send_replace(BuildState::Abandoned);
    }
}

fn lock(state: &Mutex<CacheState>) -> Result<MutexGuard<'_, CacheState>, CacheError> {
    state
        .lock()
        .map_err(|_| CacheError::new(CacheErrorKind::Poisoned))
}

/// Shared clip cache.
///
/// Cloning shares the same store, so one cache can serve many runs.
///
/// # Examples
///
/// ```
/// use montage_cache::{ClipCache, Fingerprint, Lookup};
/// use montage_core::{ArtifactRef, BackendId, ClipCacheConfig};
/// use montage_interface::VideoRequestBuilder;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let cache = ClipCache::new(ClipCacheConfig::default());
/// let request = VideoRequestBuilder::default()
///     .prompt("A lighthouse at dusk")
///     .duration_seconds(5u32)
///     .seed(7u64)
///     .build()
///     .unwrap();
/// let fp = Fingerprint::for_request(&BackendId::new("veo"), &request).unwrap();
///
/// let Lookup::Claimed(claim) = cache.lookup_or_claim(&fp).await.unwrap() else {
///     panic!("empty cache must hand out a claim");
/// };
/// claim.complete(ArtifactRef::video("clip.mp4"), 5, 0.5).unwrap();
///
/// assert!(matches!(cache.lookup_or_claim(&fp).await.unwrap(), Lookup::Hit(_)));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct ClipCache {
    config: ClipCacheConfig,
    state: Arc<Mutex<CacheState>>,
}

impl ClipCache {
    /// Create an empty cache.
    pub fn new(config: ClipCacheConfig) -> Self {
        debug!(
            enabled = config.enabled(),
            max_entries = config.max_entries(),
            "Creating clip cache"
        );
        Self {
            config,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Cache configuration.
    pub fn config(&self) -> &ClipCacheConfig {
        &self.config
    }

    /// Return the stored clip, join an in-flight build, or claim the build.
    ///
    /// When the cache is disabled every lookup returns a claim that stores
    /// nothing.
    #[tracing::instrument(skip(self, fingerprint), fields(fingerprint = fingerprint.short()))]
    pub async fn lookup_or_claim(&self, fingerprint: &Fingerprint) -> Result<Lookup, CacheError> {
        if !self.config.enabled() {
            return Ok(Lookup::Claimed(ClipClaim {
                fingerprint: fingerprint.clone(),
                state: None,
                max_entries: *self.config.max_entries(),
                sender: None,
            }));
        }

        loop {
            let mut receiver = {
                let mut state = lock(&self.state)?;
                let building = match state.slots.get(fingerprint) {
                    Some(Slot::Ready(entry)) => {
                        let entry = entry.clone();
                        state.stats.hits += 1;
                        state.touch(fingerprint);
                        debug!("Cache hit");
                        return Ok(Lookup::Hit(entry));
                    }
                    // A closed channel means the builder vanished without releasing
                    Some(Slot::Building(receiver)) if receiver.has_changed().is_ok() => {
                        Some(receiver.clone())
                    }
                    _ => None,
                };

                match building {
                    Some(receiver) => {
                        state.stats.joins += 1;
                        receiver
                    }
                    None => {
                        let (sender, receiver) = watch::channel(BuildState::Pending);
                        state
                            .slots
                            .insert(fingerprint.clone(), Slot::Building(receiver));
                        state.stats.misses += 1;
                        debug!("Cache miss, claimed build");
                        return Ok(Lookup::Claimed(ClipClaim {
                            fingerprint: fingerprint.clone(),
                            state: Some(self.state.clone()),
                            max_entries: *self.config.max_entries(),
                            sender: Some(sender),
                        }));
                    }
                }
            };

            debug!("Build in flight, waiting");
            let outcome = receiver
                .wait_for(|s| !matches!(s, BuildState::Pending))
                .await
                .map(|s| s.clone());
            match outcome {
                Ok(BuildState::Done(entry)) => return Ok(Lookup::Joined(entry)),
                // Builder gave up; try again, possibly claiming it ourselves
                _ => continue,
            }
        }
    }

    /// Stored clip for a fingerprint, without claiming anything.
    pub fn get(&self, fingerprint: &Fingerprint) -> Result<Option<ClipCacheEntry>, CacheError> {
        let state = lock(&self.state)?;
        Ok(match state.slots.get(fingerprint) {
            Some(Slot::Ready(entry)) => Some(entry.clone()),
            _ => None,
        })
    }

    /// Every stored clip, least recently used first.
    pub fn entries(&self) -> Result<Vec<ClipCacheEntry>, CacheError> {
        let state = lock(&self.state)?;
        Ok(state
            .access_order
            .iter()
            .filter_map(|fp| match state.slots.get(fp) {
                Some(Slot::Ready(entry)) => Some(entry.clone()),
                _ => None,
            })
            .collect())
    }

    /// Number of stored clips.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(lock(&self.state)?.access_order.len())
    }

    /// Whether no clip is stored.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Remove a stored clip. In-flight builds are left alone.
    pub fn evict(&self, fingerprint: &Fingerprint) -> Result<bool, CacheError> {
        let mut state = lock(&self.state)?;
        if matches!(state.slots.get(fingerprint), Some(Slot::Ready(_))) {
            state.slots.remove(fingerprint);
            state.forget(fingerprint);
            state.stats.evictions += 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Remove every stored clip. In-flight builds are left alone.
    pub fn clear(&self) -> Result<(), CacheError> {
        let mut state = lock(&self.state)?;
        let stored = std::mem::take(&mut state.access_order);
        for fingerprint in &stored {
            state.slots.remove(fingerprint);
        }
        state.stats.evictions += stored.len() as u64;
        Ok(())
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(lock(&self.state)?.stats)
    }
}

impl Default for ClipCache {
    fn default() -> Self {
        Self::new(ClipCacheConfig::default())
    }
}
