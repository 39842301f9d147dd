use crate::event::Event;

/// Trait for reporting bulk rescan progress.
///
/// The CLI implements it with indicatif. All methods have default no-op implementations.
pub trait ReconcileReporter: Send + Sync {
    fn on_rescan_start(&self, _total_entries: usize) {}
    fn on_rescan_progress(&self, _processed: usize, _event: &Event) {}
    fn on_rescan_complete(&self, _processed: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ReconcileReporter for SilentReporter {}
