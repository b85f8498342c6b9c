/*!
 * Progress reporting and cancellation for batch translation.
 *
 * The translator reports how many items are resolved through a plain
 * synchronous callback. `ProgressReporter` keeps the reported count
 * monotonic and bounded by the total, so a caller can feed it straight
 * into a progress bar.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Progress callback: `(resolved, total, status message)`
pub type ProgressFn<'a> = dyn Fn(usize, usize, &str) + Send + Sync + 'a;

/// Shared flag used to stop a running batch at the next chunk boundary
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wraps an optional progress callback
pub struct ProgressReporter<'a> {
    callback: Option<&'a ProgressFn<'a>>,
    total: usize,
    last: AtomicUsize,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(callback: Option<&'a ProgressFn<'a>>, total: usize) -> Self {
        Self {
            callback,
            total,
            last: AtomicUsize::new(0),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Last value handed to the callback
    pub fn current(&self) -> usize {
        self.last.load(Ordering::SeqCst)
    }

    /// Report `resolved` items, clamped to `[last reported, total]`
    pub fn report(&self, resolved: usize, status: &str) {
        let value = resolved.min(self.total);
        let value = self.last.fetch_max(value, Ordering::SeqCst).max(value);
        if let Some(callback) = self.callback {
            callback(value, self.total, status);
        }
    }

    /// Report completion
    pub fn finish(&self, status: &str) {
        self.report(self.total, status);
    }
}

impl std::fmt::Debug for ProgressReporter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("total", &self.total)
            .field("current", &self.current())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
