//! Result types returned by the extraction entry points.

use crate::error::PageError;
use crate::grid::{ServiceGrid, ServiceKey};
use crate::pipeline::columns::ColumnAxis;
use crate::pipeline::engine::EngineStats;
use crate::pipeline::input::DocumentKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where the grid came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub model_dir: PathBuf,
    pub oil_maintenance_pdf: Option<PathBuf>,
    pub inspection_pdf: Option<PathBuf>,
}

/// Per-document diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub kind: DocumentKind,
    pub path: PathBuf,
    pub page_count: usize,
    /// Columns the engine recognised; useful when a grid comes out empty.
    pub columns: ColumnAxis,
    pub stats: EngineStats,
    /// Distinct lines this document contributed before merging.
    pub items: usize,
    pub page_errors: Vec<PageError>,
}

/// Complete result of extracting one model.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    pub metadata: SourceMetadata,
    /// Merged grid over all documents.
    pub services: ServiceGrid,
    pub documents: Vec<DocumentReport>,
    pub total_duration_ms: u64,
}

impl ExtractionOutput {
    pub fn summary(&self) -> GridSummary {
        self.services.summary()
    }

    pub fn total_items(&self) -> usize {
        self.services.total_items()
    }

    /// Pages that failed across all documents.
    pub fn failed_pages(&self) -> usize {
        self.documents.iter().map(|d| d.page_errors.len()).sum()
    }
}

/// Item counts per service and model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GridSummary {
    pub services: Vec<ServiceSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSummary {
    pub service: ServiceKey,
    pub original_header: String,
    pub models: Vec<ModelCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelCount {
    pub model: String,
    pub items: usize,
}

impl GridSummary {
    pub fn total_items(&self) -> usize {
        self.services
            .iter()
            .flat_map(|s| s.models.iter())
            .map(|m| m.items)
            .sum()
    }
}

impl fmt::Display for GridSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.services.is_empty() {
            return writeln!(f, "(no services)");
        }
        for s in &self.services {
            writeln!(f, "{}  {}", s.service, s.original_header)?;
            for m in &s.models {
                let name: String = m.model.chars().take(60).collect();
                writeln!(f, "  {:<60} {:>4} items", name, m.items)?;
            }
        }
        write!(
            f,
            "{} services, {} items",
            self.services.len(),
            self.total_items()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> ServiceGrid {
        let mut g = ServiceGrid::new();
        g.insert_line(ServiceKey::Service30000, "30 tkm", "Panamera", "Fill in engine oil");
        g.insert_line(ServiceKey::Service30000, "30 tkm", "Panamera", "Replace oil filter");
        g.insert_line(ServiceKey::Service30000, "30 tkm", "GTS", "Fill in engine oil");
        g.insert_line(ServiceKey::TimeDependent, "Time-dependent", "*", "Brake fluid");
        g
    }

    #[test]
    fn summary_counts_and_renders() {
        let summary = grid().summary();
        assert_eq!(summary.total_items(), 4);
        assert_eq!(summary.services[0].service, ServiceKey::Service30000);
        assert_eq!(
            summary.services[0].models[0],
            ModelCount {
                model: "Panamera".into(),
                items: 2
            }
        );

        let text = summary.to_string();
        assert!(text.contains("service_30000  30 tkm"), "got: {text}");
        assert!(text.ends_with("2 services, 4 items"));
    }

    #[test]
    fn empty_summary_renders() {
        assert_eq!(GridSummary::default().to_string(), "(no services)\n");
    }

    #[test]
    fn output_serialises_services_in_interval_order() {
        let out = ExtractionOutput {
            metadata: SourceMetadata {
                model_dir: PathBuf::from("Cars/97ADS1"),
                ..Default::default()
            },
            services: grid(),
            documents: Vec::new(),
            total_duration_ms: 5,
        };
        let json = serde_json::to_string(&out).unwrap();
        let a = json.find("service_30000").unwrap();
        let b = json.find("service_time_dependent").unwrap();
        assert!(a < b);
        assert_eq!(out.failed_pages(), 0);
        assert_eq!(out.total_items(), 4);
    }
}
