//! Progress-callback trait for per-document and per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the engine walks each PDF. The library never prints; the CLI
//! turns these events into a progress bar.
//!
//! # Example
//!
//! ```rust
//! use service_grid::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct RowCounter {
//!     rows: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for RowCounter {
//!     fn on_page_complete(&self, _page_num: usize, _total_pages: usize, rows: usize) {
//!         self.rows.fetch_add(rows, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(RowCounter { rows: AtomicUsize::new(0) });
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::input::DocumentKind;
use std::sync::Arc;

/// Called by the extraction pipeline as it processes each document and page.
///
/// Implementations must be `Send + Sync`: documents are processed on a
/// blocking worker thread. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once with the number of PDFs that will be read.
    fn on_extraction_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a PDF has been opened.
    fn on_document_start(&self, kind: DocumentKind, file_name: &str, total_pages: usize) {
        let _ = (kind, file_name, total_pages);
    }

    /// Called after a page's rows have been resolved.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages selected in this document
    /// * `rows`        — rows that produced text on this page
    fn on_page_complete(&self, page_num: usize, total_pages: usize, rows: usize) {
        let _ = (page_num, total_pages, rows);
    }

    /// Called when a page could not be read or rendered.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called after a document's grid is complete.
    fn on_document_complete(&self, kind: DocumentKind, items: usize) {
        let _ = (kind, items);
    }

    /// Called once after every document has been merged.
    fn on_extraction_complete(&self, total_documents: usize, total_items: usize) {
        let _ = (total_documents, total_items);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
