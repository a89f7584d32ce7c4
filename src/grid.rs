//! The reconstructed service grid: service interval → model → treatment lines.
//!
//! [`ServiceGrid`] is the only artifact that outlives the page loop. It is
//! built append-only: [`ServiceGrid::insert_line`] ignores a line that is
//! already present for the same (service, model) pair, and
//! [`ServiceGrid::merge`] unions two grids keeping the receiver's order first.
//! Both operations are idempotent, so re-processing a page or a document never
//! changes the result.
//!
//! ## JSON shape
//!
//! ```json
//! {
//!   "service_15000": {
//!     "original_header": "Every 15 tkm/10 tmls or 1 year",
//!     "items": { "Panamera GTS": ["Fill in engine oil", "Change oil filter"] }
//!   }
//! }
//! ```
//!
//! Older exports stored the model map directly under the service key, or a
//! plain list of lines under `items`. [`RowItems`] normalises both when a grid
//! is deserialised, so the rest of the crate only ever sees the model map.

use crate::output::{GridSummary, ModelCount, ServiceSummary};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Model name used when a legacy `items` list carries no per-model split.
pub const ALL_MODELS: &str = "*";

/// Canonical maintenance-interval identifier.
///
/// Variants are declared in interval order so the derived `Ord` sorts grids
/// the way the service booklet does, with the time-dependent column last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceKey {
    #[serde(rename = "service_15000")]
    Service15000,
    #[serde(rename = "service_30000")]
    Service30000,
    #[serde(rename = "service_45000")]
    Service45000,
    #[serde(rename = "service_60000")]
    Service60000,
    #[serde(rename = "service_90000")]
    Service90000,
    #[serde(rename = "service_120000")]
    Service120000,
    #[serde(rename = "service_180000")]
    Service180000,
    #[serde(rename = "service_240000")]
    Service240000,
    #[serde(rename = "service_time_dependent")]
    TimeDependent,
}

impl ServiceKey {
    /// Every key, in output order.
    pub const ALL: [ServiceKey; 9] = [
        ServiceKey::Service15000,
        ServiceKey::Service30000,
        ServiceKey::Service45000,
        ServiceKey::Service60000,
        ServiceKey::Service90000,
        ServiceKey::Service120000,
        ServiceKey::Service180000,
        ServiceKey::Service240000,
        ServiceKey::TimeDependent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKey::Service15000 => "service_15000",
            ServiceKey::Service30000 => "service_30000",
            ServiceKey::Service45000 => "service_45000",
            ServiceKey::Service60000 => "service_60000",
            ServiceKey::Service90000 => "service_90000",
            ServiceKey::Service120000 => "service_120000",
            ServiceKey::Service180000 => "service_180000",
            ServiceKey::Service240000 => "service_240000",
            ServiceKey::TimeDependent => "service_time_dependent",
        }
    }

    /// Distance interval in km, `None` for the time-dependent service.
    pub fn interval_km(&self) -> Option<u32> {
        match self {
            ServiceKey::Service15000 => Some(15_000),
            ServiceKey::Service30000 => Some(30_000),
            ServiceKey::Service45000 => Some(45_000),
            ServiceKey::Service60000 => Some(60_000),
            ServiceKey::Service90000 => Some(90_000),
            ServiceKey::Service120000 => Some(120_000),
            ServiceKey::Service180000 => Some(180_000),
            ServiceKey::Service240000 => Some(240_000),
            ServiceKey::TimeDependent => None,
        }
    }

    /// Parse the serialised form (`service_15000`, …).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lines for one service interval, grouped by model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Raw header text of the service column, for display.
    pub original_header: String,
    /// model name → distinct lines in first-seen order.
    pub items: IndexMap<String, Vec<String>>,
}

impl ServiceEntry {
    fn new(original_header: impl Into<String>) -> Self {
        Self {
            original_header: original_header.into(),
            items: IndexMap::new(),
        }
    }

    fn push(&mut self, model: &str, line: &str) -> bool {
        let lines = self.items.entry(model.to_string()).or_default();
        if lines.iter().any(|l| l == line) {
            return false;
        }
        lines.push(line.to_string());
        true
    }
}

/// `mapping[service_key][model_name] -> ordered distinct treatment lines`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ServiceGrid {
    services: BTreeMap<ServiceKey, ServiceEntry>,
}

impl ServiceGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `line` under `(key, model)` unless it is already there.
    ///
    /// `original_header` is only recorded when the service entry is created.
    /// Returns `true` when the line was new.
    pub fn insert_line(
        &mut self,
        key: ServiceKey,
        original_header: &str,
        model: &str,
        line: &str,
    ) -> bool {
        self.services
            .entry(key)
            .or_insert_with(|| ServiceEntry::new(original_header))
            .push(model, line)
    }

    /// Union `other` into `self`.
    ///
    /// Lines already in `self` keep their position; new ones from `other`
    /// are appended in `other`'s order. `self`'s header wins when both grids
    /// have the service.
    pub fn merge(&mut self, other: &ServiceGrid) {
        for (key, entry) in &other.services {
            let target = self
                .services
                .entry(*key)
                .or_insert_with(|| ServiceEntry::new(entry.original_header.clone()));
            if target.original_header.is_empty() {
                target.original_header = entry.original_header.clone();
            }
            for (model, lines) in &entry.items {
                for line in lines {
                    target.push(model, line);
                }
            }
        }
    }

    pub fn get(&self, key: ServiceKey) -> Option<&ServiceEntry> {
        self.services.get(&key)
    }

    /// Lines for one (service, model) pair; empty when absent.
    pub fn lines(&self, key: ServiceKey, model: &str) -> &[String] {
        self.services
            .get(&key)
            .and_then(|e| e.items.get(model))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Services in interval order.
    pub fn iter(&self) -> impl Iterator<Item = (ServiceKey, &ServiceEntry)> {
        self.services.iter().map(|(k, v)| (*k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = ServiceKey> + '_ {
        self.services.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Number of services present.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Sum of line counts over every (service, model) pair.
    pub fn total_items(&self) -> usize {
        self.services
            .values()
            .flat_map(|e| e.items.values())
            .map(Vec::len)
            .sum()
    }

    /// Per-service, per-model item counts.
    pub fn summary(&self) -> GridSummary {
        GridSummary {
            services: self
                .iter()
                .map(|(key, entry)| ServiceSummary {
                    service: key,
                    original_header: entry.original_header.clone(),
                    models: entry
                        .items
                        .iter()
                        .map(|(model, lines)| ModelCount {
                            model: model.clone(),
                            items: lines.len(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

// ── Legacy shape normalisation ───────────────────────────────────────────

/// The two shapes an `items` field has been written in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RowItems {
    /// `{ "model": ["line", ...] }`
    ByModel(IndexMap<String, Vec<String>>),
    /// `["line", ...]` with no model split.
    List(Vec<String>),
}

impl RowItems {
    /// Normalise to a model map with distinct lines per model.
    pub fn into_by_model(self) -> IndexMap<String, Vec<String>> {
        let raw = match self {
            RowItems::ByModel(map) => map,
            RowItems::List(lines) => IndexMap::from([(ALL_MODELS.to_string(), lines)]),
        };
        raw.into_iter()
            .map(|(model, lines)| {
                let mut distinct: Vec<String> = Vec::with_capacity(lines.len());
                for line in lines {
                    if !distinct.contains(&line) {
                        distinct.push(line);
                    }
                }
                (model, distinct)
            })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawServiceEntry {
    WithHeader {
        #[serde(default)]
        original_header: Option<String>,
        items: RowItems,
    },
    Bare(RowItems),
}

impl<'de> Deserialize<'de> for ServiceGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;

        // Foreign top-level keys may hold any JSON value, so entries are
        // only shaped once their key is known.
        let raw: IndexMap<String, serde_json::Value> = IndexMap::deserialize(deserializer)?;
        let mut services = BTreeMap::new();
        for (name, value) in raw {
            let Some(key) = ServiceKey::parse(&name) else {
                warn!("Ignoring unknown service key '{}'", name);
                continue;
            };
            let entry = RawServiceEntry::deserialize(value)
                .map_err(|e| D::Error::custom(format!("{name}: {e}")))?;
            let (header, items) = match entry {
                RawServiceEntry::WithHeader {
                    original_header,
                    items,
                } => (original_header.unwrap_or_else(|| name.clone()), items),
                RawServiceEntry::Bare(items) => (name.clone(), items),
            };
            services.insert(
                key,
                ServiceEntry {
                    original_header: header,
                    items: items.into_by_model(),
                },
            );
        }
        Ok(ServiceGrid { services })
    }
}
