//! Configuration types for grid extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Every pixel threshold and every word
//! list the heuristics use lives here rather than inline in the algorithms:
//! the values were tuned against one vendor's renderer and are expected to
//! move when a new batch of forms arrives.
//!
//! The tunable sub-structs derive `Serialize`/`Deserialize`, so a whole
//! config can be dumped to the log or loaded from a JSON file (`--config`).

use crate::error::GridError;
use crate::grid::ServiceKey;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest accepted boundary scan, in raster pixels per direction.
pub const MAX_SCAN_BUDGET_PX: u32 = 10_000;

/// Largest accepted bullet window half-width, in raster pixels.
pub const MAX_BULLET_WINDOW_PX: u32 = 200;

/// Configuration for one extraction run.
///
/// # Example
/// ```rust
/// use service_grid::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .zoom(2.0)
///     .password("secret")
///     .build()
///     .unwrap();
/// assert_eq!(config.zones.white, 240);
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Raster zoom relative to PDF layout units. Default: 2.0.
    ///
    /// Row bands and bullets are measured on the raster, so zoom sets the
    /// precision of both. The pixel budgets in [`ZoneThresholds`] and
    /// [`BulletDetector`] are expressed at this zoom.
    pub zoom: f32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    pub zones: ZoneThresholds,
    pub bullet: BulletDetector,
    pub widget: WidgetShape,
    pub columns: ColumnTuning,
    pub rows: RowTuning,
    pub vocabulary: Vocabulary,

    /// Optional per-page progress events.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            zoom: 2.0,
            password: None,
            pages: PageSelection::default(),
            zones: ZoneThresholds::default(),
            bullet: BulletDetector::default(),
            widget: WidgetShape::default(),
            columns: ColumnTuning::default(),
            rows: RowTuning::default(),
            vocabulary: Vocabulary::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("zoom", &self.zoom)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("zones", &self.zones)
            .field("bullet", &self.bullet)
            .field("widget", &self.widget)
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check cross-field constraints. Called by the builder and after
    /// loading a config from JSON.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.zoom.is_nan() || self.zoom <= 0.0 {
            return Err(GridError::InvalidConfig(format!(
                "zoom must be > 0, got {}",
                self.zoom
            )));
        }
        if self.zones.background >= self.zones.white {
            return Err(GridError::InvalidConfig(format!(
                "background threshold ({}) must be below white threshold ({})",
                self.zones.background, self.zones.white
            )));
        }
        if self.zones.scan_budget_px == 0 || self.zones.scan_budget_px > MAX_SCAN_BUDGET_PX {
            return Err(GridError::InvalidConfig(format!(
                "zone scan budget must be 1..={MAX_SCAN_BUDGET_PX} px, got {}",
                self.zones.scan_budget_px
            )));
        }
        if self.bullet.window_px == 0 || self.bullet.window_px > MAX_BULLET_WINDOW_PX {
            return Err(GridError::InvalidConfig(format!(
                "bullet window must be 1..={MAX_BULLET_WINDOW_PX} px, got {}",
                self.bullet.window_px
            )));
        }
        if self.bullet.gray_min > self.bullet.gray_max {
            return Err(GridError::InvalidConfig(format!(
                "bullet gray band is inverted: {}..={}",
                self.bullet.gray_min, self.bullet.gray_max
            )));
        }
        if self.widget.min_aspect >= self.widget.max_aspect
            || self.widget.min_size >= self.widget.max_size
        {
            return Err(GridError::InvalidConfig(
                "checkbox aspect/size ranges must be non-empty".into(),
            ));
        }
        if self.columns.model_min_distance >= self.columns.model_max_distance {
            return Err(GridError::InvalidConfig(format!(
                "model column distance window is empty: {}..{}",
                self.columns.model_min_distance, self.columns.model_max_distance
            )));
        }
        if self.columns.model_merge_min_gap > self.columns.model_merge_max_gap {
            return Err(GridError::InvalidConfig(
                "model merge gap range is inverted".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn zoom(mut self, zoom: f32) -> Self {
        self.config.zoom = zoom.clamp(0.5, 8.0);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn zones(mut self, zones: ZoneThresholds) -> Self {
        self.config.zones = zones;
        self
    }

    pub fn bullet(mut self, bullet: BulletDetector) -> Self {
        self.config.bullet = bullet;
        self
    }

    pub fn widget(mut self, widget: WidgetShape) -> Self {
        self.config.widget = widget;
        self
    }

    pub fn columns(mut self, columns: ColumnTuning) -> Self {
        self.config.columns = columns;
        self
    }

    pub fn rows(mut self, rows: RowTuning) -> Self {
        self.config.rows = rows;
        self
    }

    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.config.vocabulary = vocabulary;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, GridError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── Tunables ─────────────────────────────────────────────────────────────

/// Intensity thresholds for the three-zone row-boundary scan.
///
/// Intensity is the integer mean of the R, G and B channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneThresholds {
    /// At or above this the pixel is white: checkbox interior or page.
    pub white: u8,
    /// At or above this (and below `white`) the pixel is row background.
    pub background: u8,
    /// Maximum raster rows scanned in each direction.
    pub scan_budget_px: u32,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            white: 240,
            background: 200,
            scan_budget_px: 150,
        }
    }
}

/// Mid-gray bullet recognition at a row × model-column intersection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletDetector {
    pub gray_min: u8,
    pub gray_max: u8,
    /// Largest allowed difference between any two channels.
    pub max_channel_spread: u8,
    /// Half-width of the square window, in raster pixels.
    pub window_px: u32,
    /// Matching pixels needed to call the intersection marked.
    pub min_pixels: usize,
}

impl Default for BulletDetector {
    fn default() -> Self {
        Self {
            gray_min: 116,
            gray_max: 156,
            max_channel_spread: 20,
            window_px: 10,
            min_pixels: 5,
        }
    }
}

/// Shape filter separating checkboxes from other form widgets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetShape {
    /// Exclusive lower bound on height / width.
    pub min_aspect: f32,
    /// Exclusive upper bound on height / width.
    pub max_aspect: f32,
    /// Exclusive lower bound on width, layout units.
    pub min_size: f32,
    /// Exclusive upper bound on width, layout units.
    pub max_size: f32,
    /// Widgets whose centres are this close on both axes are one widget.
    pub dedup_tolerance: f32,
}

impl Default for WidgetShape {
    fn default() -> Self {
        Self {
            min_aspect: 0.7,
            max_aspect: 1.3,
            min_size: 8.0,
            max_size: 25.0,
            dedup_tolerance: 1.0,
        }
    }
}

/// Horizontal clustering parameters, all in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnTuning {
    pub service_cluster_tolerance: f32,
    /// Header tokens within this distance of a service column describe it.
    pub service_header_radius: f32,
    pub service_header_max_tokens: usize,
    /// A checkbox further than this from every service column is unassigned.
    pub service_assign_max_distance: f32,
    /// Model labels sit this far left of the first service column, inclusive.
    pub model_min_distance: f32,
    pub model_max_distance: f32,
    pub model_cluster_tolerance: f32,
    /// Adjacent model clusters this far apart are one two-line label.
    pub model_merge_min_gap: f32,
    pub model_merge_max_gap: f32,
    pub model_name_max_tokens: usize,
}

impl Default for ColumnTuning {
    fn default() -> Self {
        Self {
            service_cluster_tolerance: 10.0,
            service_header_radius: 15.0,
            service_header_max_tokens: 8,
            service_assign_max_distance: 20.0,
            model_min_distance: 20.0,
            model_max_distance: 100.0,
            model_cluster_tolerance: 10.0,
            model_merge_min_gap: 15.0,
            model_merge_max_gap: 25.0,
            model_name_max_tokens: 5,
        }
    }
}

/// Row grouping and text cleanup parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowTuning {
    /// Checkboxes whose centre Y differ by at most this share one row.
    pub row_merge_tolerance: f32,
    /// Tokens whose centre Y differ by at most this share one text line.
    pub line_tolerance: f32,
    /// A trimmed row shorter than this falls back to the untrimmed text.
    pub min_trimmed_len: usize,
}

impl Default for RowTuning {
    fn default() -> Self {
        Self {
            row_merge_tolerance: 2.0,
            line_tolerance: 3.0,
            min_trimmed_len: 10,
        }
    }
}

/// Header markers that identify one service interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalMarker {
    pub key: ServiceKey,
    /// Case-insensitive substrings; any one of them matches.
    pub markers: Vec<String>,
}

impl IntervalMarker {
    fn new(key: ServiceKey, markers: &[&str]) -> Self {
        Self {
            key,
            markers: markers.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Word lists driving the text heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Exact token that separates the header from the data table.
    pub anchor_marker: String,
    /// Section-title words; fallback anchors and trimmed row prefixes.
    pub category_words: Vec<String>,
    /// A row containing any of these is form boilerplate.
    pub junk_patterns: Vec<String>,
    /// Header tokens never used in model names.
    pub model_stopwords: Vec<String>,
    /// Checked in order; list larger intervals first.
    pub interval_markers: Vec<IntervalMarker>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        Self {
            anchor_marker: "Measures".to_string(),
            category_words: words(&[
                "Electrics",
                "Inside",
                "the",
                "vehicle",
                "Outside",
                "Under",
                "Engine",
                "compartment",
                "Additional",
                "work",
                "every",
                "years",
                "Test",
                "drive",
                "2",
                "Measures",
            ]),
            junk_patterns: words(&[
                "Name Date",
                "Licence No",
                "Vehicle Ident",
                "Order No",
                "WP0ZZZ",
                "Mileage",
                "Date",
            ]),
            model_stopwords: words(&[
                "or", "and", "the", "years", "tkm", "tmls", "->", "Every", "/",
            ]),
            interval_markers: vec![
                IntervalMarker::new(ServiceKey::Service240000, &["240 tkm", "160 tmls"]),
                IntervalMarker::new(ServiceKey::Service180000, &["180 tkm", "120 tmls"]),
                IntervalMarker::new(ServiceKey::Service120000, &["120 tkm", "80 tmls"]),
                IntervalMarker::new(ServiceKey::Service90000, &["90 tkm", "60 tmls"]),
                IntervalMarker::new(ServiceKey::Service60000, &["60 tkm", "40 tmls"]),
                IntervalMarker::new(ServiceKey::Service45000, &["45 tkm", "30 tmls"]),
                IntervalMarker::new(ServiceKey::Service30000, &["30 tkm", "20 tmls"]),
                IntervalMarker::new(ServiceKey::Service15000, &["15 tkm", "10 tmls"]),
                IntervalMarker::new(ServiceKey::TimeDependent, &["time-dependent"]),
            ],
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of each PDF to scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Scan all pages (default).
    #[default]
    All,
    /// Scan a single page (1-indexed).
    Single(usize),
    /// Scan a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Scan specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
