//! Eager extraction entry points.
//!
//! A model's forms are read one after another, oil maintenance first, each
//! inside `spawn_blocking` with its own pdfium binding. Per-document grids
//! are merged in that order, so the first form's lines and headers come
//! first in the combined grid.

use crate::config::ExtractionConfig;
use crate::error::GridError;
use crate::grid::ServiceGrid;
use crate::output::{DocumentReport, ExtractionOutput, SourceMetadata};
use crate::pipeline::engine::{GridEngine, PageSource};
use crate::pipeline::input::{self, DocumentKind, ModelDirectory};
use crate::pipeline::render::{bind_pdfium, PdfiumSource};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// One document's grid and diagnostics, before merging.
#[derive(Debug, Clone)]
pub struct DocumentExtraction {
    pub grid: ServiceGrid,
    pub report: DocumentReport,
}

/// Basic facts about one form, read without scanning it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DocumentInfo {
    pub kind: DocumentKind,
    pub path: PathBuf,
    pub page_count: usize,
}

/// Extract the combined service grid of a model directory.
///
/// # Errors
/// Fatal only when no form can be found or a form cannot be opened. Pages
/// that fail are reported in `documents[..].page_errors`.
pub async fn extract_model_dir(
    dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, GridError> {
    extract_model(input::resolve_model_dir(dir.as_ref())?, config).await
}

/// Extract a single PDF as a form of `kind`.
pub async fn extract_pdf(
    path: impl AsRef<Path>,
    kind: DocumentKind,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, GridError> {
    extract_model(ModelDirectory::single(path.as_ref(), kind)?, config).await
}

/// Extract and merge the forms of an already resolved [`ModelDirectory`].
pub async fn extract_model(
    model: ModelDirectory,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, GridError> {
    config.validate()?;
    let start = Instant::now();
    let documents = model.documents();
    info!(
        "Extracting {} ({} documents)",
        model.root.display(),
        documents.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(documents.len());
    }

    let mut services = ServiceGrid::new();
    let mut reports = Vec::with_capacity(documents.len());
    for (kind, path) in documents {
        let doc = extract_document(path, kind, config).await?;
        services.merge(&doc.grid);
        reports.push(doc.report);
    }

    let total_items = services.total_items();
    info!(
        "Extraction complete: {} services, {} items in {}ms",
        services.len(),
        total_items,
        start.elapsed().as_millis()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(reports.len(), total_items);
    }

    Ok(ExtractionOutput {
        metadata: SourceMetadata {
            model_dir: model.root.clone(),
            oil_maintenance_pdf: model.oil_maintenance.clone(),
            inspection_pdf: model.inspection.clone(),
        },
        services,
        documents: reports,
        total_duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Extract one document's grid.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
pub async fn extract_document(
    path: impl AsRef<Path>,
    kind: DocumentKind,
    config: &ExtractionConfig,
) -> Result<DocumentExtraction, GridError> {
    let path = path.as_ref().to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || extract_document_blocking(&path, kind, &config))
        .await
        .map_err(|e| GridError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_document`].
fn extract_document_blocking(
    path: &Path,
    kind: DocumentKind,
    config: &ExtractionConfig,
) -> Result<DocumentExtraction, GridError> {
    let pdfium = bind_pdfium()?;
    let source = PdfiumSource::open(&pdfium, path, config.password.as_deref())?;
    let page_count = source.page_count();
    let selected = config.pages.to_indices(page_count).len();
    if selected == 0 {
        warn!(
            "{}: page selection is empty ({} pages in document)",
            path.display(),
            page_count
        );
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!("Scanning {} form {} ({} pages)", kind, file_name, page_count);
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(kind, &file_name, selected);
    }

    let run = GridEngine::new(config).extract(&source);
    let items = run.grid.total_items();
    debug!("{}: {} items, {:?}", file_name, items, run.stats);
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_complete(kind, items);
    }

    Ok(DocumentExtraction {
        report: DocumentReport {
            kind,
            path: path.to_path_buf(),
            page_count,
            columns: run.columns,
            stats: run.stats,
            items,
            page_errors: run.page_errors,
        },
        grid: run.grid,
    })
}

/// Synchronous wrapper around [`extract_model_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_model_dir_sync(
    dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, GridError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| GridError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_model_dir(dir, config))
}

/// Extract a model directory and write the grid JSON to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    dir: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, GridError> {
    let output = extract_model_dir(dir, config).await?;
    write_grid_file(&output.services, output_path.as_ref()).await?;
    Ok(output)
}

/// Write `grid` as pretty JSON, atomically.
pub async fn write_grid_file(grid: &ServiceGrid, path: &Path) -> Result<(), GridError> {
    let json = serde_json::to_string_pretty(grid)
        .map_err(|e| GridError::Internal(format!("Failed to serialise grid: {}", e)))?;
    let write_failed = |e: std::io::Error| GridError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(write_failed)?;

    info!("Wrote {}", path.display());
    Ok(())
}

/// Read a grid previously written by this crate or by older exporters.
pub async fn read_grid_file(path: &Path) -> Result<ServiceGrid, GridError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => GridError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => GridError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;
    serde_json::from_slice(&bytes).map_err(|e| GridError::InvalidGrid {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// List a model directory's forms and their page counts without scanning.
///
/// Does not render anything.
pub async fn inspect(dir: impl AsRef<Path>) -> Result<Vec<DocumentInfo>, GridError> {
    let model = input::resolve_model_dir(dir.as_ref())?;
    let documents: Vec<(DocumentKind, PathBuf)> = model
        .documents()
        .into_iter()
        .map(|(k, p)| (k, p.to_path_buf()))
        .collect();

    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        documents
            .into_iter()
            .map(|(kind, path)| {
                let source = PdfiumSource::open(&pdfium, &path, None)?;
                Ok(DocumentInfo {
                    kind,
                    page_count: source.page_count(),
                    path,
                })
            })
            .collect::<Result<Vec<_>, GridError>>()
    })
    .await
    .map_err(|e| GridError::Internal(format!("Inspect task panicked: {}", e)))?
}
