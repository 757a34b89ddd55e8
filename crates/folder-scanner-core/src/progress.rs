use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress and cancellation capability handed to every long-running walk.
///
/// CLI implements it with indicatif, tests with recording mocks.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// Human-readable status line (current path or phase).
    fn report_status(&self, _text: &str) {}

    /// Completed fraction in `0.0..=1.0`. Only emitted when a total is known.
    fn report_progress(&self, _fraction: f64) {}

    /// Polled before each unit of work. Returning `true` ends the walk early
    /// with whatever has been produced so far.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Items between two status lines.
    fn status_batch(&self) -> usize {
        DEFAULT_STATUS_BATCH
    }
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Shared cancellation token. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Wrap `inner` so its status/progress pass through while cancellation
    /// comes from this flag (or from `inner` itself).
    pub fn attach<'a, R: ProgressReporter + ?Sized>(&self, inner: &'a R) -> Cancellable<'a, R> {
        Cancellable {
            inner,
            flag: self.clone(),
        }
    }
}

impl ProgressReporter for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.is_set()
    }
}

pub struct Cancellable<'a, R: ProgressReporter + ?Sized> {
    inner: &'a R,
    flag: CancelFlag,
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for Cancellable<'_, R> {
    fn report_status(&self, text: &str) {
        self.inner.report_status(text);
    }

    fn report_progress(&self, fraction: f64) {
        self.inner.report_progress(fraction);
    }

    fn is_cancelled(&self) -> bool {
        self.flag.is_set() || self.inner.is_cancelled()
    }

    fn status_batch(&self) -> usize {
        self.inner.status_batch()
    }
}

pub const DEFAULT_STATUS_BATCH: usize = 250;

/// Limits status lines to the first item and every `every`th item after it.
#[derive(Debug)]
pub struct StatusThrottle {
    every: usize,
    seen: usize,
}

impl StatusThrottle {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            seen: 0,
        }
    }

    /// Count one item; returns true when a status line should be emitted.
    pub fn tick(&mut self) -> bool {
        let emit = self.seen % self.every == 0;
        self.seen += 1;
        emit
    }
}

impl Default for StatusThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_BATCH)
    }
}
