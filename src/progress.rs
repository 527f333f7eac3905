//! Progress-callback trait for per-paragraph annotation events.
//!
//! Inject an [`Arc<dyn AnnotationProgressCallback>`] via
//! [`crate::config::AnnotationConfigBuilder::progress_callback`] to receive
//! events while [`crate::pipeline::annotate::annotate_paragraphs`] works
//! through a batch. The CLI forwards them to an indicatif progress bar.
//!
//! Paragraph extraction itself is synchronous and fast; only the LLM step is
//! slow enough to be worth reporting on.
//!
//! # Example
//!
//! ```rust
//! use edgequake_paragraphs::{AnnotationConfig, AnnotationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl AnnotationProgressCallback for Counter {
//!     fn on_paragraph_complete(&self, _number: u32, _index: usize, _total: usize, _keywords: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = AnnotationConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the annotation step as it processes each paragraph.
///
/// Paragraphs are annotated concurrently, so `on_paragraph_start`,
/// `on_paragraph_complete` and `on_paragraph_error` may be called from
/// different tasks at once. All methods default to no-ops.
pub trait AnnotationProgressCallback: Send + Sync {
    /// Called once before any paragraph is sent to the model.
    fn on_annotation_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before the LLM request for a paragraph.
    ///
    /// `index` is the 0-based position in the batch, `number` the paragraph
    /// number.
    fn on_paragraph_start(&self, number: u32, index: usize, total: usize) {
        let _ = (number, index, total);
    }

    /// Called when a paragraph was annotated; `keywords` is the number of
    /// keywords kept.
    fn on_paragraph_complete(&self, number: u32, index: usize, total: usize, keywords: usize) {
        let _ = (number, index, total, keywords);
    }

    /// Called when a paragraph failed after all retries.
    fn on_paragraph_error(&self, number: u32, index: usize, total: usize, error: &str) {
        let _ = (number, index, total, error);
    }

    /// Called once after every paragraph has been attempted.
    fn on_annotation_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A callback that ignores every event.
pub struct NoopProgressCallback;

impl AnnotationProgressCallback for NoopProgressCallback {}

/// The callback type stored in [`crate::config::AnnotationConfig`].
pub type ProgressCallback = Arc<dyn AnnotationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tracking {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        successes: AtomicUsize,
    }

    impl AnnotationProgressCallback for Tracking {
        fn on_paragraph_start(&self, _number: u32, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_paragraph_complete(&self, _n: u32, _i: usize, _t: usize, _keywords: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_paragraph_error(&self, _n: u32, _i: usize, _t: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_annotation_complete(&self, _total: usize, success_count: usize) {
            self.successes.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_accepts_every_event() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_annotation_start(2);
        cb.on_paragraph_start(4, 0, 2);
        cb.on_paragraph_complete(4, 0, 2, 15);
        cb.on_paragraph_error(9, 1, 2, "timeout");
        cb.on_annotation_complete(2, 1);
    }

    #[test]
    fn tracking_callback_counts_events() {
        let tracker = Tracking::default();
        tracker.on_annotation_start(3);
        tracker.on_paragraph_start(1, 0, 3);
        tracker.on_paragraph_complete(1, 0, 3, 15);
        tracker.on_paragraph_start(2, 1, 3);
        tracker.on_paragraph_complete(2, 1, 3, 12);
        tracker.on_paragraph_start(5, 2, 3);
        tracker.on_paragraph_error(5, 2, 3, "rate limited");
        tracker.on_annotation_complete(3, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 2);
    }
}
