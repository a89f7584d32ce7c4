//! Engine integration tests over a synthetic page source.
//!
//! No pdfium involved: the layout is a hand-placed service form (two rows,
//! two interval columns, two model labels) and the raster is painted with
//! the same shading the real forms use, so every stage from anchor lookup to
//! bullet probing runs on known geometry.
//!
//! Run with:
//!   cargo test --test engine

use image::{Rgb, RgbImage};
use service_grid::pipeline::raster::Raster;
use service_grid::pipeline::text::TextToken;
use service_grid::pipeline::widgets::WidgetRect;
use service_grid::{
    DocumentKind, ExtractionConfig, ExtractionProgressCallback, GridEngine, PageError,
    PageLayout, PageSelection, PageSource, ServiceGrid, ServiceKey,
};
use std::sync::{Arc, Mutex};

// ── Synthetic form ───────────────────────────────────────────────────────────

const PAGE_W: f32 = 600.0;
const PAGE_H: f32 = 400.0;

const ROW_BG: u8 = 220;
const FRAME: u8 = 170;
const BULLET: u8 = 136;

/// A filled rectangle in layout units.
#[derive(Clone, Copy)]
struct Fill {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    value: u8,
}

#[derive(Clone)]
struct FakePage {
    layout: PageLayout,
    paint: Vec<Fill>,
    fail_layout: bool,
    fail_render: bool,
}

struct FakeSource {
    pages: Vec<FakePage>,
}

impl PageSource for FakeSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn layout(&self, page_index: usize) -> Result<PageLayout, PageError> {
        let page = &self.pages[page_index];
        if page.fail_layout {
            return Err(PageError::LayoutFailed {
                page: page_index + 1,
                detail: "text layer unreadable".into(),
            });
        }
        Ok(page.layout.clone())
    }

    fn render(&self, page_index: usize, zoom: f32) -> Result<Raster, PageError> {
        let page = &self.pages[page_index];
        if page.fail_render {
            return Err(PageError::RenderFailed {
                page: page_index + 1,
                detail: "bitmap allocation failed".into(),
            });
        }
        let w = (PAGE_W * zoom) as u32;
        let h = (PAGE_H * zoom) as u32;
        let mut img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));
        for f in &page.paint {
            let px = |v: f32, max: u32| ((v * zoom) as u32).min(max);
            for y in px(f.y0, h)..px(f.y1, h) {
                for x in px(f.x0, w)..px(f.x1, w) {
                    img.put_pixel(x, y, Rgb([f.value; 3]));
                }
            }
        }
        Ok(Raster::new(img, PAGE_W, PAGE_H))
    }
}

/// Word token centred at `(cx, cy)`.
fn word(text: &str, cx: f32, cy: f32, page: usize) -> TextToken {
    let half = text.chars().count() as f32 * 2.5;
    TextToken::new(text, cx - half, cy - 4.0, cx + half, cy + 4.0, page)
}

/// Word token starting at `x0` on the line centred at `cy`.
fn data_word(text: &str, x0: f32, cy: f32, page: usize) -> TextToken {
    TextToken::new(text, x0, cy - 4.0, x0 + 30.0, cy + 4.0, page)
}

fn checkbox(cx: f32, cy: f32) -> WidgetRect {
    WidgetRect {
        x0: cx - 6.0,
        y0: cy - 6.0,
        x1: cx + 6.0,
        y1: cy + 6.0,
    }
}

fn fill(x0: f32, y0: f32, x1: f32, y1: f32, value: u8) -> Fill {
    Fill { x0, y0, x1, y1, value }
}

/// Frame plus white interior around a checkbox centre.
fn checkbox_paint(cx: f32, cy: f32) -> [Fill; 2] {
    [
        fill(cx - 6.0, cy - 6.0, cx + 6.0, cy + 6.0, FRAME),
        fill(cx - 5.0, cy - 5.0, cx + 5.0, cy + 5.0, 255),
    ]
}

/// 7×7 mid-gray dot centred on `(cx, cy)`.
fn bullet_paint(cx: f32, cy: f32) -> Fill {
    fill(cx - 3.0, cy - 3.0, cx + 4.0, cy + 4.0, BULLET)
}

/// One form page:
///
/// ```text
///              GTS  Panamera   30 tkm   Time-dependent
/// Measures
/// ░ Engine compartment Replace oil filter       ●        ☐
/// ░ Check brake fluid                      ●             ☐         ☐
/// ```
///
/// Row 1 (y=150) is marked for Panamera under 30 tkm only. Row 2 (y=250) is
/// marked for GTS under both intervals.
fn service_page(page: usize, row1: &str, row2: &str) -> FakePage {
    let mut tokens = vec![
        word("GTS", 300.0, 40.0, page),
        word("Panamera", 340.0, 40.0, page),
        word("30", 396.0, 40.0, page),
        word("tkm", 404.0, 40.0, page),
        word("Time-dependent", 460.0, 40.0, page),
        TextToken::new("Measures", 50.0, 96.0, 90.0, 104.0, page),
    ];
    for (y, text) in [(150.0, row1), (250.0, row2)] {
        let mut x = 60.0;
        for w in text.split_whitespace() {
            tokens.push(data_word(w, x, y, page));
            x += 40.0;
        }
    }

    let widgets = vec![
        checkbox(400.0, 150.0),
        checkbox(400.0, 250.0),
        checkbox(460.0, 250.0),
        // Signature field: not checkbox-shaped.
        WidgetRect {
            x0: 60.0,
            y0: 330.0,
            x1: 300.0,
            y1: 350.0,
        },
    ];

    let mut paint = vec![
        fill(0.0, 120.0, PAGE_W, 180.0, ROW_BG),
        fill(0.0, 200.0, PAGE_W, 300.0, ROW_BG),
    ];
    paint.extend(checkbox_paint(400.0, 150.0));
    paint.extend(checkbox_paint(400.0, 250.0));
    paint.extend(checkbox_paint(460.0, 250.0));
    paint.push(bullet_paint(340.0, 150.0));
    paint.push(bullet_paint(300.0, 250.0));

    FakePage {
        layout: PageLayout {
            page_index: page,
            width: PAGE_W,
            height: PAGE_H,
            tokens,
            widgets,
        },
        paint,
        fail_layout: false,
        fail_render: false,
    }
}

fn single_page_source() -> FakeSource {
    FakeSource {
        pages: vec![service_page(
            0,
            "Engine compartment Replace oil filter",
            "Check brake fluid",
        )],
    }
}

fn config(zoom: f32) -> ExtractionConfig {
    ExtractionConfig::builder().zoom(zoom).build().unwrap()
}

// ── Progress recorder ────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ExtractionProgressCallback for Recorder {
    fn on_page_complete(&self, page_num: usize, total_pages: usize, rows: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("page {page_num}/{total_pages}: {rows} rows"));
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, _error: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("page {page_num}/{total_pages}: error"));
    }

    fn on_document_complete(&self, kind: DocumentKind, items: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{kind}: {items} items"));
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn rows_land_under_their_service_and_model() {
    let config = config(1.0);
    let run = GridEngine::new(&config).extract(&single_page_source());

    assert!(run.page_errors.is_empty(), "{:?}", run.page_errors);
    let grid = &run.grid;
    assert_eq!(grid.lines(ServiceKey::Service30000, "Panamera"), ["Replace oil filter"]);
    assert_eq!(grid.lines(ServiceKey::Service30000, "GTS"), ["Check brake fluid"]);
    assert_eq!(grid.lines(ServiceKey::TimeDependent, "GTS"), ["Check brake fluid"]);
    assert!(grid.lines(ServiceKey::TimeDependent, "Panamera").is_empty());
    assert_eq!(grid.total_items(), 3);

    assert_eq!(grid.get(ServiceKey::Service30000).unwrap().original_header, "30 tkm");
    assert_eq!(
        grid.get(ServiceKey::TimeDependent).unwrap().original_header,
        "Time-dependent"
    );
}

#[test]
fn columns_and_stats_are_reported() {
    let config = config(1.0);
    let run = GridEngine::new(&config).extract(&single_page_source());

    let xs: Vec<f32> = run.columns.service_columns.iter().map(|c| c.x).collect();
    assert_eq!(xs, vec![400.0, 460.0]);
    let models: Vec<&str> = run.columns.model_columns.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(models, vec!["GTS", "Panamera"]);

    assert_eq!(run.stats.pages_scanned, 1);
    assert_eq!(run.stats.checkboxes, 3);
    assert_eq!(run.stats.rows, 2);
    assert_eq!(run.stats.text_rows, 2);
    assert_eq!(run.stats.cells, 3);
    assert_eq!(run.stats.lines_added, 3);
}

#[test]
fn grid_does_not_depend_on_zoom() {
    let source = single_page_source();
    let low = GridEngine::new(&config(1.0)).extract(&source).grid;
    let high = GridEngine::new(&config(2.0)).extract(&source).grid;
    assert_eq!(low, high);
}

#[test]
fn extraction_is_idempotent() {
    let config = config(1.0);
    let source = single_page_source();
    let first = GridEngine::new(&config).extract(&source).grid;
    let second = GridEngine::new(&config).extract(&source).grid;
    assert_eq!(first, second);

    let mut merged = first.clone();
    merged.merge(&second);
    assert_eq!(merged, first);
}

#[test]
fn later_pages_append_without_duplicates() {
    let source = FakeSource {
        pages: vec![
            service_page(0, "Engine compartment Replace oil filter", "Check brake fluid"),
            service_page(1, "Engine compartment Replace oil filter", "Replace wiper blades"),
        ],
    };
    let config = config(1.0);
    let run = GridEngine::new(&config).extract(&source);

    assert_eq!(run.stats.pages_scanned, 2);
    assert_eq!(
        run.grid.lines(ServiceKey::Service30000, "GTS"),
        ["Check brake fluid", "Replace wiper blades"]
    );
    assert_eq!(run.grid.lines(ServiceKey::Service30000, "Panamera"), ["Replace oil filter"]);
}

#[test]
fn documents_merge_in_order() {
    let config = config(1.0);
    let oil = GridEngine::new(&config)
        .extract(&FakeSource {
            pages: vec![service_page(
                0,
                "Engine compartment Replace oil filter",
                "Fill in engine oil",
            )],
        })
        .grid;
    let inspection = GridEngine::new(&config).extract(&single_page_source()).grid;

    let mut services = ServiceGrid::new();
    services.merge(&oil);
    services.merge(&inspection);

    assert_eq!(
        services.lines(ServiceKey::Service30000, "GTS"),
        ["Fill in engine oil", "Check brake fluid"]
    );
    assert_eq!(services.lines(ServiceKey::Service30000, "Panamera"), ["Replace oil filter"]);
}

#[test]
fn failing_pages_are_reported_and_skipped() {
    let mut broken_layout = service_page(1, "Replace spark plugs now", "Check tyre pressure");
    broken_layout.fail_layout = true;
    let mut broken_render = service_page(2, "Replace air filter element", "Check tyre pressure");
    broken_render.fail_render = true;

    let source = FakeSource {
        pages: vec![
            service_page(0, "Engine compartment Replace oil filter", "Check brake fluid"),
            broken_layout,
            broken_render,
        ],
    };
    let recorder = Arc::new(Recorder::default());
    let config = ExtractionConfig::builder()
        .zoom(1.0)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let run = GridEngine::new(&config).extract(&source);

    assert_eq!(run.page_errors.len(), 2);
    assert_eq!(run.page_errors[0].page(), 2);
    assert!(matches!(run.page_errors[1], PageError::RenderFailed { page: 3, .. }));
    assert_eq!(run.stats.pages_failed, 2);
    assert_eq!(run.stats.pages_scanned, 1);
    assert_eq!(run.grid.total_items(), 3);

    assert_eq!(
        recorder.events(),
        vec!["page 2/3: error", "page 1/3: 2 rows", "page 3/3: error"]
    );
}

#[test]
fn page_selection_limits_scanning() {
    let source = FakeSource {
        pages: vec![
            service_page(0, "Engine compartment Replace oil filter", "Check brake fluid"),
            service_page(1, "Engine compartment Replace oil filter", "Replace wiper blades"),
        ],
    };
    let config = ExtractionConfig::builder()
        .zoom(1.0)
        .pages(PageSelection::Single(2))
        .build()
        .unwrap();
    let run = GridEngine::new(&config).extract(&source);

    assert_eq!(run.stats.pages_scanned, 1);
    assert_eq!(run.grid.lines(ServiceKey::Service30000, "GTS"), ["Replace wiper blades"]);
}

#[test]
fn page_without_checkboxes_contributes_nothing() {
    let mut page = service_page(0, "Engine compartment Replace oil filter", "Check brake fluid");
    page.layout.widgets.clear();
    page.fail_render = true;
    let config = config(1.0);
    let run = GridEngine::new(&config).extract(&FakeSource { pages: vec![page] });

    // No checkboxes: not rendered, so the render failure never surfaces.
    assert!(run.page_errors.is_empty());
    assert!(run.grid.is_empty());
    assert_eq!(run.stats.pages_scanned, 1);
}

#[test]
fn unshaded_page_still_reads_checkbox_lines() {
    // No row backgrounds: bands collapse onto the checkbox centres, which
    // still pick up the text on the checkbox line.
    let mut page = service_page(0, "Engine compartment Replace oil filter", "Check brake fluid");
    page.paint.retain(|f| f.value != ROW_BG);
    let config = config(1.0);
    let run = GridEngine::new(&config).extract(&FakeSource { pages: vec![page] });

    assert_eq!(run.grid.lines(ServiceKey::Service30000, "Panamera"), ["Replace oil filter"]);
    assert_eq!(run.grid.lines(ServiceKey::TimeDependent, "GTS"), ["Check brake fluid"]);
}
