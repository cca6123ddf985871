//! Progress reporting from stages to the state machine.

/// Receives unit-of-work completions from a running stage.
///
/// Stages report `completed` out of `total` units; the state machine maps
/// that onto the overall progress range reserved for the stage.
pub trait ProgressSink: Send + Sync {
    /// A unit of work finished.
    fn unit_completed(&self, completed: usize, total: usize, label: &str);
}

/// Sink that discards reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn unit_completed(&self, _completed: usize, _total: usize, _label: &str) {}
}
