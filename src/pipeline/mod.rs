//! Pipeline stages for layout-to-grid reconstruction.
//!
//! Each submodule implements one step and is testable on its own with
//! synthetic tokens, widgets and rasters; only [`render`] touches pdfium.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ text / anchor / widgets ──▶ columns
//! (dir)    (pdfium)    (pass 1: layout only)        (whole document)
//!                                                      │
//!          render ──▶ rows ──▶ assemble ──▶ intersect ──▶ engine::GridBuilder
//!          (raster)   (bands)  (row text)   (bullets)     (service grid)
//! ```
//!
//! 1. [`input`]     — find the oil maintenance and inspection PDFs of a model
//! 2. [`render`]    — pdfium-backed [`engine::PageSource`]: layouts and rasters
//! 3. [`text`]      — word tokens split out of pdfium text runs
//! 4. [`anchor`]    — header/table separator
//! 5. [`widgets`]   — checkbox-shaped form widgets
//! 6. [`columns`]   — service-interval and model columns
//! 7. [`raster`]    — layout ↔ pixel mapping
//! 8. [`rows`]      — row bands from background colour zones
//! 9. [`assemble`]  — row text with section-title prefixes trimmed
//! 10. [`intersect`] — bullet detection at row × model crossings
//! 11. [`engine`]   — drives the two passes and builds the grid

pub mod anchor;
pub mod assemble;
pub mod columns;
pub mod engine;
pub mod input;
pub mod intersect;
pub mod raster;
pub mod render;
pub mod rows;
pub mod text;
pub mod widgets;
