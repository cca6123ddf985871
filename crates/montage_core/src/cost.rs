//! Cost accumulation shared by concurrent units of work.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free USD accumulator.
///
/// # Examples
///
/// ```
/// use montage_core::CostMeter;
///
/// let meter = CostMeter::default();
/// meter.add(0.25);
/// meter.add(0.5);
/// assert!((meter.total() - 0.75).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Default)]
pub struct CostMeter(AtomicU64);

impl CostMeter {
    /// Add a cost in USD.
    pub fn add(&self, cost_usd: f64) {
        // fetch_update only fails when the closure returns None
        let _ = self.0.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
            Some((f64::from_bits(bits) + cost_usd).to_bits())
        });
    }

    /// Total accumulated cost in USD.
    pub fn total(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}
