//! The layout-to-grid engine for one document.
//!
//! Two passes over the selected pages:
//!
//! 1. **Layout** (no rendering): tokens, anchor and checkboxes of every page.
//!    Service columns need the checkbox X positions of the whole document,
//!    and model columns come from the first page's header.
//! 2. **Raster**: one page at a time, render, resolve rows, read row text,
//!    probe bullets and feed the [`GridBuilder`]. The raster is dropped
//!    before the next page is rendered.
//!
//! Page-level failures are recorded as [`PageError`]s; the page contributes
//! nothing and the run continues.

use super::anchor::{locate_anchor, Anchor};
use super::assemble::{assemble_row_text, clean_row_text};
use super::columns::{ColumnAxis, ModelColumn};
use super::intersect::matched_models;
use super::raster::Raster;
use super::rows::resolve_rows;
use super::text::{PageText, TextToken};
use super::widgets::{scan_checkboxes, CheckboxWidget, WidgetRect};
use crate::config::ExtractionConfig;
use crate::error::PageError;
use crate::grid::{ServiceGrid, ServiceKey};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Geometry of one page, read without rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub page_index: usize,
    pub width: f32,
    pub height: f32,
    pub tokens: Vec<TextToken>,
    pub widgets: Vec<WidgetRect>,
}

/// Where the engine reads pages from.
///
/// The pdfium backend implements this for real files; tests implement it
/// over synthetic layouts and rasters.
pub trait PageSource {
    fn page_count(&self) -> usize;

    fn layout(&self, page_index: usize) -> Result<PageLayout, PageError>;

    /// Render at `zoom` × layout size.
    fn render(&self, page_index: usize, zoom: f32) -> Result<Raster, PageError>;
}

/// One row's contribution to the grid: its text under one service for the
/// models marked on the row.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub text: String,
    pub key: ServiceKey,
    pub header: String,
    pub models: Vec<String>,
}

/// Accumulates cells into a [`ServiceGrid`], deduplicating lines.
pub struct GridBuilder<'a> {
    axis: &'a ColumnAxis,
    max_distance: f32,
    grid: ServiceGrid,
}

impl<'a> GridBuilder<'a> {
    pub fn new(axis: &'a ColumnAxis, max_distance: f32) -> Self {
        Self {
            axis,
            max_distance,
            grid: ServiceGrid::new(),
        }
    }

    /// Cells for a row: one per checkbox that resolves to a matched service.
    pub fn cells_for_row(
        &self,
        text: &str,
        checkbox_xs: &[f32],
        models: &[&ModelColumn],
    ) -> Vec<GridCell> {
        if models.is_empty() {
            return Vec::new();
        }
        checkbox_xs
            .iter()
            .filter_map(|&x| self.axis.nearest_service(x, self.max_distance))
            .filter_map(|col| {
                col.key.map(|key| GridCell {
                    text: text.to_string(),
                    key,
                    header: col.header.clone(),
                    models: models.iter().map(|m| m.name.clone()).collect(),
                })
            })
            .collect()
    }

    /// Returns how many new lines were stored.
    pub fn add_cell(&mut self, cell: &GridCell) -> usize {
        cell.models
            .iter()
            .filter(|model| {
                self.grid
                    .insert_line(cell.key, &cell.header, model.as_str(), &cell.text)
            })
            .count()
    }

    pub fn grid(&self) -> &ServiceGrid {
        &self.grid
    }

    pub fn finish(self) -> ServiceGrid {
        self.grid
    }
}

/// Counters for one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub pages_scanned: usize,
    pub pages_failed: usize,
    pub checkboxes: usize,
    pub rows: usize,
    /// Rows whose text survived trimming and junk filtering.
    pub text_rows: usize,
    pub cells: usize,
    pub lines_added: usize,
    pub duration_ms: u64,
}

/// Result of [`GridEngine::extract`].
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub grid: ServiceGrid,
    pub columns: ColumnAxis,
    pub stats: EngineStats,
    pub page_errors: Vec<PageError>,
}

struct ScannedPage {
    text: PageText,
    anchor: Anchor,
    checkboxes: Vec<CheckboxWidget>,
}

/// Engine context; cheap to build, holds no per-document state.
pub struct GridEngine<'c> {
    config: &'c ExtractionConfig,
}

impl<'c> GridEngine<'c> {
    pub fn new(config: &'c ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, source: &dyn PageSource) -> EngineRun {
        let start = Instant::now();
        let cfg = self.config;
        let total_pages = source.page_count();
        let indices = cfg.pages.to_indices(total_pages);
        let mut stats = EngineStats::default();
        let mut page_errors = Vec::new();

        // ── Pass 1: layout ───────────────────────────────────────────────
        let mut scanned: Vec<ScannedPage> = Vec::with_capacity(indices.len());
        for &idx in &indices {
            match source.layout(idx) {
                Ok(layout) => {
                    let anchor = locate_anchor(&layout.tokens, &cfg.vocabulary);
                    if !anchor.is_found() {
                        debug!("Page {}: no anchor, keeping all tokens", idx + 1);
                    }
                    let checkboxes = scan_checkboxes(&layout.widgets, anchor, &cfg.widget, idx);
                    debug!(
                        "Page {}: {} tokens, {} widgets, {} checkboxes",
                        idx + 1,
                        layout.tokens.len(),
                        layout.widgets.len(),
                        checkboxes.len()
                    );
                    stats.checkboxes += checkboxes.len();
                    scanned.push(ScannedPage {
                        text: PageText::new(idx, layout.tokens),
                        anchor,
                        checkboxes,
                    });
                }
                Err(e) => {
                    warn!("{}", e);
                    self.report_page_error(&e, indices.len());
                    page_errors.push(e);
                    stats.pages_failed += 1;
                }
            }
        }

        let all_xs: Vec<f32> = scanned
            .iter()
            .flat_map(|p| p.checkboxes.iter().map(|c| c.center_x))
            .collect();
        let header: Vec<&TextToken> = scanned
            .first()
            .map(|p| p.text.header_tokens(p.anchor))
            .unwrap_or_default();
        let columns = ColumnAxis::classify(&all_xs, &header, &cfg.columns, &cfg.vocabulary);

        for col in &columns.service_columns {
            match col.key {
                Some(key) => debug!("Service column x={:.1} → {} ({:?})", col.x, key, col.header),
                None => debug!("Service column x={:.1} unmatched ({:?})", col.x, col.header),
            }
        }
        for m in &columns.model_columns {
            debug!("Model column xs={:?} → {:?}", m.xs, m.name);
        }
        if columns.matched_services() == 0 {
            warn!("No service column matched an interval marker");
        }
        if columns.model_columns.is_empty() {
            warn!("No model columns found");
        }

        // ── Pass 2: raster ───────────────────────────────────────────────
        let mut builder = GridBuilder::new(&columns, cfg.columns.service_assign_max_distance);
        for page in &scanned {
            let idx = page.text.page_index();
            if page.checkboxes.is_empty() {
                stats.pages_scanned += 1;
                self.report_page_complete(idx, indices.len(), 0);
                continue;
            }

            let raster = match source.render(idx, cfg.zoom) {
                Ok(r) => r,
                Err(e) => {
                    warn!("{}", e);
                    self.report_page_error(&e, indices.len());
                    page_errors.push(e);
                    stats.pages_failed += 1;
                    continue;
                }
            };

            let rows = resolve_rows(
                &raster,
                &page.checkboxes,
                &cfg.zones,
                cfg.rows.row_merge_tolerance,
            );
            let data = page.text.data_tokens(page.anchor);
            let mut added = 0;
            let mut text_rows = 0;
            for row in &rows {
                if row.band.is_degenerate() {
                    debug!("Page {}: degenerate band at y={:.1}", idx + 1, row.band.checkbox_y);
                }
                let raw = assemble_row_text(&data, &row.band, cfg.rows.line_tolerance);
                let Some(text) = clean_row_text(&raw, &cfg.rows, &cfg.vocabulary) else {
                    continue;
                };
                text_rows += 1;

                let models = matched_models(&raster, row, &columns.model_columns, &cfg.bullet);
                for cell in builder.cells_for_row(&text, &row.checkbox_xs, &models) {
                    stats.cells += 1;
                    added += builder.add_cell(&cell);
                }
            }
            drop(raster);

            debug!("Page {}: {} rows, {} new lines", idx + 1, rows.len(), added);
            stats.rows += rows.len();
            stats.text_rows += text_rows;
            stats.lines_added += added;
            stats.pages_scanned += 1;
            self.report_page_complete(idx, indices.len(), text_rows);
        }

        let grid = builder.finish();
        stats.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Engine: {} pages, {} rows, {} items in {} services ({}ms)",
            stats.pages_scanned,
            stats.rows,
            grid.total_items(),
            grid.len(),
            stats.duration_ms
        );

        EngineRun {
            grid,
            columns,
            stats,
            page_errors,
        }
    }

    fn report_page_complete(&self, page_index: usize, total: usize, rows: usize) {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_page_complete(page_index + 1, total, rows);
        }
    }

    fn report_page_error(&self, error: &PageError, total: usize) {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_page_error(error.page(), total, &error.to_string());
        }
    }
}
