//! Generation records keyed by id, with one writer per record.

use montage_core::{
    AssemblyResult, CancellationFlag, GenerationId, GenerationRecord, GenerationStatus,
};
use montage_error::{PipelineError, PipelineErrorKind};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, instrument};

#[derive(Debug)]
struct Slot {
    /// Held until a driver claims the record
    sender: Option<watch::Sender<GenerationRecord>>,
    receiver: watch::Receiver<GenerationRecord>,
    cancel: CancellationFlag,
}

/// Registry of generation records.
///
/// Cloning shares the same registry.
///
/// # Examples
///
/// ```
/// use montage_core::GenerationStatus;
/// use montage_pipeline::GenerationRegistry;
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let registry = GenerationRegistry::new();
/// let id = registry.create("A spot for trail shoes").await;
///
/// let writer = registry.claim(id).await.unwrap();
/// assert!(registry.claim(id).await.is_err());
///
/// writer.transition(GenerationStatus::Planning, "Planning storyboard").unwrap();
/// let snapshot = registry.snapshot(id).await.unwrap();
/// assert_eq!(*snapshot.status(), GenerationStatus::Planning);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenerationRegistry {
    slots: Arc<RwLock<HashMap<GenerationId, Slot>>>,
}

impl GenerationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending generation.
    #[instrument(skip(self, prompt))]
    pub async fn create(&self, prompt: impl Into<String>) -> GenerationId {
        let id = GenerationId::new();
        let (sender, receiver) = watch::channel(GenerationRecord::new(id, prompt));
        self.slots.write().await.insert(
            id,
            Slot {
                sender: Some(sender),
                receiver,
                cancel: CancellationFlag::new(),
            },
        );
        debug!(%id, "Registered generation");
        id
    }

    /// Take the single writer for a generation.
    ///
    /// # Errors
    ///
    /// Fails if the id is unknown or a driver already holds the writer.
    #[instrument(skip(self))]
    pub async fn claim(&self, id: GenerationId) -> Result<GenerationWriter, PipelineError> {
        let mut slots = self.slots.write().await;
        let slot = slots
            .get_mut(&id)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::UnknownGeneration(id.to_string())))?;
        let sender = slot.sender.take().ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::DriverAlreadyClaimed(id.to_string()))
        })?;
        debug!("Driver claimed generation");
        Ok(GenerationWriter {
            id,
            sender,
            cancel: slot.cancel.clone(),
        })
    }

    /// Current state of a generation.
    pub async fn snapshot(&self, id: GenerationId) -> Result<GenerationRecord, PipelineError> {
        let slots = self.slots.read().await;
        let slot = slots
            .get(&id)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::UnknownGeneration(id.to_string())))?;
        Ok(slot.receiver.borrow().clone())
    }

    /// Receiver that yields every new snapshot of a generation.
    pub async fn subscribe(
        &self,
        id: GenerationId,
    ) -> Result<watch::Receiver<GenerationRecord>, PipelineError> {
        let slots = self.slots.read().await;
        slots
            .get(&id)
            .map(|slot| slot.receiver.clone())
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::UnknownGeneration(id.to_string())))
    }

    /// Request cancellation.
    ///
    /// Raises the generation's cancellation flag and returns `true` while the
    /// run is still cancellable. A finished run is left alone and `false` is
    /// returned. In-flight image and video calls are abandoned, and the driver
    /// moves the record to `cancelled` at its next check, which includes one
    /// after assembly.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: GenerationId) -> Result<bool, PipelineError> {
        let slots = self.slots.read().await;
        let slot = slots
            .get(&id)
            .ok_or_else(|| PipelineError::new(PipelineErrorKind::UnknownGeneration(id.to_string())))?;
        let status = *slot.receiver.borrow().status();
        if !status.is_cancellable() {
            debug!(%status, "Cancel ignored, generation already finished");
            return Ok(false);
        }
        slot.cancel.cancel();
        info!(%status, "Cancellation requested");
        Ok(true)
    }

    /// Ids of every registered generation.
    pub async fn ids(&self) -> Vec<GenerationId> {
        self.slots.read().await.keys().copied().collect()
    }

    /// Drop finished generations. Returns how many were removed.
    pub async fn prune_finished(&self) -> usize {
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| !slot.receiver.borrow().status().is_terminal());
        before - slots.len()
    }
}

/// Exclusive write access to one generation record.
///
/// Every change is published to the registry's snapshot channel.
#[derive(Debug)]
pub struct GenerationWriter {
    id: GenerationId,
    sender: watch::Sender<GenerationRecord>,
    cancel: CancellationFlag,
}

impl GenerationWriter {
    /// Generation id.
    pub fn id(&self) -> GenerationId {
        self.id
    }

    /// Cancellation flag for this generation.
    pub fn cancel_flag(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// Copy of the current record.
    pub fn record(&self) -> GenerationRecord {
        self.sender.borrow().clone()
    }

    /// Apply a fallible change; the record is published only on success.
    fn try_update<T>(
        &self,
        change: impl FnOnce(&mut GenerationRecord) -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        let mut record = self.record();
        let value = change(&mut record)?;
        self.sender.send_replace(record);
        Ok(value)
    }

    /// Apply an infallible change.
    pub fn update(&self, change: impl FnOnce(&mut GenerationRecord)) {
        self.sender.send_modify(change);
    }

    /// Move to a new status.
    pub fn transition(
        &self,
        status: GenerationStatus,
        step: impl Into<String>,
    ) -> Result<(), PipelineError> {
        let step = step.into();
        self.try_update(|record| record.transition(status, step))
    }

    /// Raise progress; never lowers it.
    pub fn advance(&self, progress: u8, step: impl Into<String>) {
        let step = step.into();
        self.update(|record| record.advance_progress(progress, step));
    }

    /// Add to the accumulated cost.
    pub fn add_cost(&self, cost_usd: f64) {
        self.update(|record| record.add_cost(cost_usd));
    }

    /// Finish successfully.
    pub fn complete(
        &self,
        assembly: AssemblyResult,
        partial_success: bool,
    ) -> Result<(), PipelineError> {
        self.try_update(|record| record.complete(assembly, partial_success))
    }

    /// Finish with a fatal failure.
    pub fn fail(&self, error: impl Into<String>) -> Result<(), PipelineError> {
        let error = error.into();
        self.try_update(|record| record.fail(error))
    }

    /// Finish as cancelled.
    pub fn cancelled(&self) -> Result<(), PipelineError> {
        self.try_update(|record| record.cancel())
    }
}
