//! Error types for the service-grid library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`GridError`] — **Fatal**: the source file cannot be used at all
//!   (missing file, not a PDF, wrong password, pdfium not available).
//!   Returned as `Err(GridError)` from the top-level `extract*` functions and
//!   always names the offending file.
//!
//! * [`PageError`] — **Non-fatal**: a single page could not be read or
//!   rendered. Stored inside [`crate::output::DocumentReport`]; the page simply
//!   contributes nothing to the grid.
//!
//! Missing structure (no anchor, no checkboxes, no model columns) is neither:
//! it degrades the grid and is only logged.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the service-grid library.
#[derive(Debug, Error)]
pub enum GridError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file or directory was not found at the given path.
    #[error("Not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// A model directory contained neither an oil maintenance nor an
    /// inspection PDF.
    #[error("No oil maintenance or inspection PDF found in '{dir}'")]
    NoDocuments { dir: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON file that should hold a service grid could not be parsed.
    #[error("'{path}' is not a service grid: {detail}")]
    InvalidGrid { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Stored in [`crate::output::DocumentReport`] when a page fails. The rest of
/// the document is still processed.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Text or widget geometry could not be read.
    #[error("Page {page}: layout extraction failed: {detail}")]
    LayoutFailed { page: usize, detail: String },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::LayoutFailed { page, .. } | PageError::RenderFailed { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_pdf_names_file() {
        let e = GridError::NotAPdf {
            path: PathBuf::from("/cars/97ADS1/PDFs/Inspection.pdf"),
            magic: *b"PK\x03\x04",
        };
        assert!(e.to_string().contains("Inspection.pdf"));
    }

    #[test]
    fn no_documents_display() {
        let e = GridError::NoDocuments {
            dir: PathBuf::from("Cars/Panamera/97ADS1"),
        };
        assert!(e.to_string().contains("97ADS1"), "got: {e}");
    }

    #[test]
    fn page_error_reports_page() {
        let e = PageError::RenderFailed {
            page: 3,
            detail: "bitmap allocation failed".into(),
        };
        assert_eq!(e.page(), 3);
        assert!(e.to_string().contains("Page 3"));
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::LayoutFailed {
            page: 1,
            detail: "no text layer".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: PageError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
