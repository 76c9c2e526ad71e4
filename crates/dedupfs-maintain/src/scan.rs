//! Shared progress and cancellation handles for the bulk scans.
//!
//! Rehash and verify run for hours on large stores. Both hand out cheap
//! cloneable handles backed by atomics so an operator-facing layer can
//! poll progress or request cancellation from another thread without
//! touching the scan itself.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Progress of a single-pass scan, observable from other threads.
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    inner: Arc<ProgressInner>,
}

#[derive(Debug, Default)]
struct ProgressInner {
    total: AtomicU64,
    visited: AtomicU64,
}

impl ScanProgress {
    /// Creates an idle progress handle.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&self, total: u64) {
        self.inner.total.store(total, Ordering::Relaxed);
        self.inner.visited.store(0, Ordering::Relaxed);
    }

    pub(crate) fn advance(&self) {
        self.inner.visited.fetch_add(1, Ordering::Relaxed);
    }

    /// Rows visited so far.
    pub fn visited(&self) -> u64 {
        self.inner.visited.load(Ordering::Relaxed)
    }

    /// Row count captured when the scan started.
    pub fn total(&self) -> u64 {
        self.inner.total.load(Ordering::Relaxed)
    }

    /// Progress percentage (0.0 - 100.0). A scan over an empty store
    /// reports 100.
    pub fn percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 100.0;
        }
        (self.visited() as f64 / total as f64) * 100.0
    }
}

/// Cancellation signal for a running scan. Cancellation is observed at row
/// boundaries and takes the same rollback path as a row-count mismatch —
/// never a partial commit.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    /// Creates a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        let p = ScanProgress::new();
        p.start(4);
        assert_eq!(p.percent(), 0.0);
        p.advance();
        assert_eq!(p.percent(), 25.0);
        p.advance();
        p.advance();
        p.advance();
        assert_eq!(p.percent(), 100.0);
    }

    #[test]
    fn test_empty_scan_reports_complete() {
        let p = ScanProgress::new();
        p.start(0);
        assert_eq!(p.percent(), 100.0);
    }

    #[test]
    fn test_clone_shares_state() {
        let p = ScanProgress::new();
        let observer = p.clone();
        p.start(10);
        p.advance();
        assert_eq!(observer.visited(), 1);
        assert_eq!(observer.total(), 10);
    }

    #[test]
    fn test_cancel_flag() {
        let c = CancelFlag::new();
        let observer = c.clone();
        assert!(!observer.is_cancelled());
        c.cancel();
        assert!(observer.is_cancelled());
        c.cancel();
        assert!(observer.is_cancelled());
    }
}
