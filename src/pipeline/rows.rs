//! Row bands recovered from rendered background colours.
//!
//! The forms draw no rule lines: each table row is a shaded band, and the
//! checkbox sits inside it with a white interior and a darker frame. Starting
//! at the checkbox centre and walking one raster column up (then down), the
//! scan has to
//!
//! 1. leave the white interior (intensity drops below `white`),
//! 2. cross the frame or adjacent ink until it reaches row background
//!    (`background <= intensity < white`),
//! 3. stop at the first pixel that is no longer background, which is the
//!    row boundary on that side.
//!
//! A side with no boundary inside the pixel budget collapses onto the
//! checkbox centre. The resulting zero-height band is valid input for every
//! later stage.

use super::raster::Raster;
use super::widgets::CheckboxWidget;
use crate::config::ZoneThresholds;
use serde::Serialize;

/// Vertical extent of one table row, layout units.
///
/// Invariant: `top_y <= checkbox_y <= bottom_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowBand {
    pub checkbox_y: f32,
    pub top_y: f32,
    pub bottom_y: f32,
}

impl RowBand {
    /// Zero-height band used when no boundary was found on either side.
    pub fn degenerate(checkbox_y: f32) -> Self {
        Self {
            checkbox_y,
            top_y: checkbox_y,
            bottom_y: checkbox_y,
        }
    }

    pub fn height(&self) -> f32 {
        self.bottom_y - self.top_y
    }

    pub fn is_degenerate(&self) -> bool {
        self.height() == 0.0
    }

    pub fn contains(&self, y: f32) -> bool {
        self.top_y <= y && y <= self.bottom_y
    }

    /// Half-open membership, so neighbours sharing a boundary never both
    /// claim a token on it. A degenerate band keeps its single line.
    pub fn owns(&self, y: f32) -> bool {
        if self.is_degenerate() {
            self.contains(y)
        } else {
            self.top_y <= y && y < self.bottom_y
        }
    }
}

/// One table row: its band and the X of every checkbox on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRow {
    pub band: RowBand,
    pub checkbox_xs: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Interior,
    Frame,
    Background,
}

/// Walk from `(px, py)` in `direction` and return the first pixel row past
/// the row background, or `None` within the budget.
pub fn find_background_boundary(
    raster: &Raster,
    px: u32,
    py: u32,
    direction: ScanDirection,
    zones: &ZoneThresholds,
) -> Option<u32> {
    if px >= raster.width() || py >= raster.height() {
        return None;
    }

    let budget = zones.scan_budget_px as i64;
    let (step, end) = match direction {
        ScanDirection::Up => (-1i64, (py as i64 - budget).max(0)),
        ScanDirection::Down => (1i64, (py as i64 + budget).min(raster.height() as i64 - 1)),
    };

    let mut zone = Zone::Interior;
    let mut y = py as i64;
    loop {
        let v = raster.intensity(px, y as u32);
        match zone {
            Zone::Interior => {
                if v < zones.white {
                    zone = Zone::Frame;
                }
            }
            Zone::Frame => {
                if v >= zones.background && v < zones.white {
                    zone = Zone::Background;
                }
            }
            Zone::Background => {
                if v < zones.background || v >= zones.white {
                    return Some(y as u32);
                }
            }
        }
        if y == end {
            return None;
        }
        y += step;
    }
}

/// Band for a single checkbox; each side falls back to the centre.
pub fn resolve_band(raster: &Raster, checkbox: &CheckboxWidget, zones: &ZoneThresholds) -> RowBand {
    let (px, py) = raster.to_pixel(checkbox.center_x, checkbox.center_y);
    let cy = checkbox.center_y;

    let top = find_background_boundary(raster, px, py, ScanDirection::Up, zones)
        .map(|p| raster.pixel_to_page_y(p))
        .unwrap_or(cy);
    let bottom = find_background_boundary(raster, px, py, ScanDirection::Down, zones)
        .map(|p| raster.pixel_to_page_y(p))
        .unwrap_or(cy);

    RowBand {
        checkbox_y: cy,
        top_y: top.min(cy),
        bottom_y: bottom.max(cy),
    }
}

/// Group checkboxes into rows, measure each row, and make neighbouring rows
/// disjoint. Rows come back sorted top to bottom.
pub fn resolve_rows(
    raster: &Raster,
    checkboxes: &[CheckboxWidget],
    zones: &ZoneThresholds,
    row_merge_tolerance: f32,
) -> Vec<PageRow> {
    let mut sorted = checkboxes.to_vec();
    sorted.sort_by(|a, b| a.center_y.total_cmp(&b.center_y));

    let mut groups: Vec<Vec<CheckboxWidget>> = Vec::new();
    for cb in sorted {
        match groups.last_mut() {
            Some(group) if cb.center_y - group[0].center_y <= row_merge_tolerance => group.push(cb),
            _ => groups.push(vec![cb]),
        }
    }

    let mut rows: Vec<PageRow> = groups
        .iter()
        .map(|group| {
            let checkbox_y = group.iter().map(|c| c.center_y).sum::<f32>() / group.len() as f32;
            let mut band = RowBand::degenerate(checkbox_y);
            for cb in group {
                let b = resolve_band(raster, cb, zones);
                band.top_y = band.top_y.min(b.top_y);
                band.bottom_y = band.bottom_y.max(b.bottom_y);
            }
            PageRow {
                band,
                checkbox_xs: group.iter().map(|c| c.center_x).collect(),
            }
        })
        .collect();

    separate_rows(&mut rows);
    rows
}

/// Clip overlapping neighbours to a shared boundary at the overlap midpoint,
/// kept between the two checkbox centres.
pub(crate) fn separate_rows(rows: &mut [PageRow]) {
    for i in 1..rows.len() {
        let (head, tail) = rows.split_at_mut(i);
        let prev = &mut head[i - 1].band;
        let next = &mut tail[0].band;
        if prev.bottom_y > next.top_y {
            let shared = ((prev.bottom_y + next.top_y) / 2.0)
                .max(prev.checkbox_y)
                .min(next.checkbox_y);
            prev.bottom_y = shared;
            next.top_y = shared;
        }
    }
}
