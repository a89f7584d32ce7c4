//! Input resolution: find the service-form PDFs for one vehicle model.
//!
//! A model directory normally keeps its forms under `PDFs/`:
//!
//! ```text
//! Cars/Panamera/97ADS1/
//! └── PDFs/
//!     ├── 97ADS1 Oil maintenance.pdf
//!     └── 97ADS1 Inspection.pdf
//! ```
//!
//! The form kind is read from the file name. A directory without `PDFs/` is
//! searched directly. Every PDF is checked for the `%PDF` magic bytes here, so
//! callers get a meaningful error rather than a pdfium failure.

use crate::error::GridError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Subdirectory that holds a model's forms.
pub const PDF_SUBDIR: &str = "PDFs";

/// Which service form a PDF is. Documents are processed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    OilMaintenance,
    Inspection,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::OilMaintenance, DocumentKind::Inspection];

    /// Lower-case file-name keyword identifying the form.
    pub fn keyword(&self) -> &'static str {
        match self {
            DocumentKind::OilMaintenance => "oil",
            DocumentKind::Inspection => "inspection",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::OilMaintenance => "oil maintenance",
            DocumentKind::Inspection => "inspection",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The forms found for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDirectory {
    pub root: PathBuf,
    pub oil_maintenance: Option<PathBuf>,
    pub inspection: Option<PathBuf>,
}

impl ModelDirectory {
    /// A single PDF treated as a form of `kind`. The root is the PDF's
    /// directory, or its parent when that directory is `PDFs/`.
    pub fn single(path: &Path, kind: DocumentKind) -> Result<Self, GridError> {
        validate_pdf(path)?;
        let root = match path.parent() {
            Some(p) if p.file_name().is_some_and(|n| n == PDF_SUBDIR) => {
                p.parent().unwrap_or(p).to_path_buf()
            }
            Some(p) => p.to_path_buf(),
            None => PathBuf::new(),
        };
        let mut dir = Self {
            root,
            oil_maintenance: None,
            inspection: None,
        };
        dir.set(kind, path.to_path_buf());
        Ok(dir)
    }

    pub fn get(&self, kind: DocumentKind) -> Option<&Path> {
        match kind {
            DocumentKind::OilMaintenance => self.oil_maintenance.as_deref(),
            DocumentKind::Inspection => self.inspection.as_deref(),
        }
    }

    fn set(&mut self, kind: DocumentKind, path: PathBuf) {
        match kind {
            DocumentKind::OilMaintenance => self.oil_maintenance = Some(path),
            DocumentKind::Inspection => self.inspection = Some(path),
        }
    }

    /// Present documents, oil maintenance first.
    pub fn documents(&self) -> Vec<(DocumentKind, &Path)> {
        DocumentKind::ALL
            .iter()
            .filter_map(|&k| self.get(k).map(|p| (k, p)))
            .collect()
    }

    /// Name used for output files: the model directory's last component.
    pub fn model_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string())
    }
}

/// Classify a PDF by its file name.
pub fn classify_file_name(name: &str) -> Option<DocumentKind> {
    let lower = name.to_lowercase();
    DocumentKind::ALL
        .into_iter()
        .find(|k| lower.contains(k.keyword()))
}

/// Resolve a model directory to its forms.
///
/// When several files match one kind, the first in name order wins.
pub fn resolve_model_dir(dir: &Path) -> Result<ModelDirectory, GridError> {
    if !dir.exists() {
        return Err(GridError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let nested = dir.join(PDF_SUBDIR);
    let search = if nested.is_dir() { nested } else { dir.to_path_buf() };
    debug!("Searching {} for forms", search.display());

    let mut resolved = ModelDirectory {
        root: dir.to_path_buf(),
        oil_maintenance: None,
        inspection: None,
    };
    for path in list_pdfs(&search)? {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        match classify_file_name(&name) {
            Some(kind) if resolved.get(kind).is_none() => {
                validate_pdf(&path)?;
                info!("Found {} form: {}", kind, path.display());
                resolved.set(kind, path);
            }
            Some(kind) => warn!("Ignoring extra {} form: {}", kind, path.display()),
            None => debug!("Ignoring unrelated PDF: {}", path.display()),
        }
    }

    if resolved.documents().is_empty() {
        return Err(GridError::NoDocuments {
            dir: dir.to_path_buf(),
        });
    }
    Ok(resolved)
}

/// `*.pdf` files of `dir`, sorted by name.
fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, GridError> {
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => GridError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => GridError::FileNotFound {
            path: dir.to_path_buf(),
        },
    })?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

/// Validate existence, readability and PDF magic bytes.
pub fn validate_pdf(path: &Path) -> Result<(), GridError> {
    if !path.exists() {
        return Err(GridError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(GridError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(GridError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(GridError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated PDF: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_pdf(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, b"%PDF-1.7\n%stub\n").unwrap();
        p
    }

    #[test]
    fn classifies_by_file_name() {
        assert_eq!(
            classify_file_name("97ADS1 Oil maintenance.pdf"),
            Some(DocumentKind::OilMaintenance)
        );
        assert_eq!(classify_file_name("97ADS1_INSPECTION.PDF"), Some(DocumentKind::Inspection));
        assert_eq!(classify_file_name("brochure.pdf"), None);
    }

    #[test]
    fn resolves_pdfs_subdirectory() {
        let tmp = tempfile::tempdir().unwrap();
        let model = tmp.path().join("97ADS1");
        let pdfs = model.join(PDF_SUBDIR);
        fs::create_dir_all(&pdfs).unwrap();
        let oil = write_pdf(&pdfs, "97ADS1 Oil maintenance.pdf");
        let insp = write_pdf(&pdfs, "97ADS1 Inspection.pdf");
        write_pdf(&pdfs, "notes.pdf");

        let dir = resolve_model_dir(&model).unwrap();
        assert_eq!(dir.oil_maintenance.as_deref(), Some(oil.as_path()));
        assert_eq!(dir.inspection.as_deref(), Some(insp.as_path()));
        assert_eq!(dir.model_name(), "97ADS1");

        let kinds: Vec<DocumentKind> = dir.documents().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, [DocumentKind::OilMaintenance, DocumentKind::Inspection]);
    }

    #[test]
    fn falls_back_to_directory_itself() {
        let tmp = tempfile::tempdir().unwrap();
        write_pdf(tmp.path(), "Inspection.pdf");

        let dir = resolve_model_dir(tmp.path()).unwrap();
        assert!(dir.oil_maintenance.is_none());
        assert_eq!(dir.documents().len(), 1);
    }

    #[test]
    fn first_match_in_name_order_wins() {
        let tmp = tempfile::tempdir().unwrap();
        write_pdf(tmp.path(), "b oil.pdf");
        let first = write_pdf(tmp.path(), "a oil.pdf");

        let dir = resolve_model_dir(tmp.path()).unwrap();
        assert_eq!(dir.oil_maintenance, Some(first));
    }

    #[test]
    fn single_pdf_root_skips_pdfs_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let pdfs = tmp.path().join("95BAT1").join(PDF_SUBDIR);
        fs::create_dir_all(&pdfs).unwrap();
        let p = write_pdf(&pdfs, "form.pdf");

        let dir = ModelDirectory::single(&p, DocumentKind::Inspection).unwrap();
        assert_eq!(dir.model_name(), "95BAT1");
        assert_eq!(dir.documents(), [(DocumentKind::Inspection, p.as_path())]);
    }

    #[test]
    fn empty_directory_has_no_documents() {
        let tmp = tempfile::tempdir().unwrap();
        write_pdf(tmp.path(), "brochure.pdf");
        assert!(matches!(
            resolve_model_dir(tmp.path()),
            Err(GridError::NoDocuments { .. })
        ));
    }

    #[test]
    fn missing_directory_is_not_found() {
        assert!(matches!(
            resolve_model_dir(Path::new("/nonexistent/97ADS1")),
            Err(GridError::FileNotFound { .. })
        ));
    }

    #[test]
    fn non_pdf_is_rejected_by_magic_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let fake = tmp.path().join("Oil maintenance.pdf");
        fs::write(&fake, b"PK\x03\x04zip").unwrap();

        match resolve_model_dir(tmp.path()) {
            Err(GridError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn single_pdf_uses_given_kind() {
        let tmp = tempfile::tempdir().unwrap();
        let p = write_pdf(tmp.path(), "form.pdf");
        let dir = ModelDirectory::single(&p, DocumentKind::Inspection).unwrap();
        assert_eq!(dir.documents(), vec![(DocumentKind::Inspection, p.as_path())]);
    }
}
