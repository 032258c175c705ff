//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress`] to receive events as the
//! batch works through the file list.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a log aggregator, or a
//! database record without the library knowing anything about how the host
//! application communicates. Processing is strictly sequential, so events
//! always arrive in file order, but the trait is still `Send + Sync` so an
//! `Arc` of it can cross the async boundary.

use crate::config::ParseTier;
use crate::output::BatchSummary;
use std::path::Path;
use std::sync::Arc;

/// Called by the batch loop as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after discovery, before any file is processed.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is examined (skip check, tier selection, upload).
    fn on_file_start(&self, index: usize, total: usize, input: &Path) {
        let _ = (index, total, input);
    }

    /// Called when a file is skipped because its output already exists.
    fn on_file_skipped(&self, index: usize, total: usize, input: &Path) {
        let _ = (index, total, input);
    }

    /// Called when a file is newly converted and its output written.
    fn on_file_converted(
        &self,
        index: usize,
        total: usize,
        input: &Path,
        tier: ParseTier,
        bytes: usize,
    ) {
        let _ = (index, total, input, tier, bytes);
    }

    /// Called when a file fails (service error, empty result, write error).
    fn on_file_failed(&self, index: usize, total: usize, input: &Path, error: String) {
        let _ = (index, total, input, error);
    }

    /// Called once after the last file, with the aggregated summary.
    fn on_batch_complete(&self, summary: &BatchSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        converted: AtomicUsize,
        skipped: AtomicUsize,
        failed: AtomicUsize,
        batch_total: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_files: usize) {
            self.batch_total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _input: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_skipped(&self, _index: usize, _total: usize, _input: &Path) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_converted(
            &self,
            _index: usize,
            _total: usize,
            _input: &Path,
            _tier: ParseTier,
            _bytes: usize,
        ) {
            self.converted.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_failed(&self, _index: usize, _total: usize, _input: &Path, _error: String) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(3);
        cb.on_file_start(1, 3, Path::new("a.pdf"));
        cb.on_file_skipped(1, 3, Path::new("a.pdf"));
        cb.on_file_converted(2, 3, Path::new("b.pdf"), ParseTier::Auto, 42);
        cb.on_file_failed(3, 3, Path::new("c.pdf"), "boom".to_string());
        cb.on_batch_complete(&BatchSummary::default());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            converted: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            batch_total: AtomicUsize::new(0),
        };

        tracker.on_batch_start(3);
        tracker.on_file_start(1, 3, Path::new("a.pdf"));
        tracker.on_file_converted(1, 3, Path::new("a.pdf"), ParseTier::Premium, 100);
        tracker.on_file_start(2, 3, Path::new("b.pdf"));
        tracker.on_file_skipped(2, 3, Path::new("b.pdf"));
        tracker.on_file_start(3, 3, Path::new("c.pdf"));
        tracker.on_file_failed(3, 3, Path::new("c.pdf"), "no content".to_string());

        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.converted.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn BatchProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_file_start(1, 10, Path::new("doc.pdf"));
    }
}
