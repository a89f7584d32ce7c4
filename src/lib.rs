//! # service-grid
//!
//! Reconstruct maintenance-schedule grids from vendor service-form PDFs.
//!
//! ## Why geometry?
//!
//! The service booklets are interactive PDF forms. Their tables are drawn,
//! not encoded: there are no table structures and no rule lines, only
//! positioned words, checkbox widgets and shaded row backgrounds. This crate
//! recovers the table from that evidence. Checkbox X positions give the
//! service-interval columns, rendered background colours give the row
//! extents, and small gray bullets tie each row to the vehicle models it
//! applies to.
//!
//! ## Pipeline Overview
//!
//! ```text
//! model dir
//!  │
//!  ├─ 1. Input    locate the oil maintenance + inspection PDFs
//!  ├─ 2. Layout   words, anchor, checkboxes per page (pdfium, no rendering)
//!  ├─ 3. Columns  service intervals from checkbox X, models from the header
//!  ├─ 4. Raster   per page: row bands, row text, bullet probes
//!  ├─ 5. Grid     service → model → distinct lines
//!  └─ 6. Merge    documents in order, first header wins
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use service_grid::{extract_model_dir, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract_model_dir("Cars/Panamera/97ADS1", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.services)?);
//!     eprintln!("{}", output.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `svcgrid` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! service-grid = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! pdfium is bound at run time from `PDFIUM_LIB_PATH`, then from the working
//! directory, then from the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod grid;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    BulletDetector, ColumnTuning, ExtractionConfig, ExtractionConfigBuilder, IntervalMarker,
    PageSelection, RowTuning, Vocabulary, WidgetShape, ZoneThresholds,
};
pub use error::{GridError, PageError};
pub use extract::{
    extract_document, extract_model, extract_model_dir, extract_model_dir_sync, extract_pdf,
    extract_to_file, inspect, read_grid_file, write_grid_file, DocumentExtraction, DocumentInfo,
};
pub use grid::{RowItems, ServiceEntry, ServiceGrid, ServiceKey, ALL_MODELS};
pub use output::{DocumentReport, ExtractionOutput, GridSummary, SourceMetadata};
pub use pipeline::engine::{EngineRun, EngineStats, GridEngine, PageLayout, PageSource};
pub use pipeline::input::{DocumentKind, ModelDirectory};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
