//! Checkbox detection among a page's form widgets.

use super::anchor::Anchor;
use crate::config::WidgetShape;
use serde::Serialize;

/// A widget annotation rectangle in top-left layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl WidgetRect {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

/// A square form field below the anchor: one cell of the treatment table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CheckboxWidget {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    pub page_index: usize,
}

/// Keep checkbox-shaped widgets below the anchor, merging duplicates.
///
/// Some generators emit one widget per appearance state, so the same box can
/// show up twice at (almost) the same centre.
pub fn scan_checkboxes(
    rects: &[WidgetRect],
    anchor: Anchor,
    shape: &WidgetShape,
    page_index: usize,
) -> Vec<CheckboxWidget> {
    let mut found: Vec<CheckboxWidget> = Vec::new();

    for rect in rects {
        let (width, height) = (rect.width(), rect.height());
        if width <= 0.0 || height <= 0.0 {
            continue;
        }
        let ratio = height / width;
        if ratio <= shape.min_aspect || ratio >= shape.max_aspect {
            continue;
        }
        if width <= shape.min_size || width >= shape.max_size {
            continue;
        }

        let center_x = (rect.x0 + rect.x1) / 2.0;
        let center_y = (rect.y0 + rect.y1) / 2.0;
        if center_y <= anchor.y {
            continue;
        }

        let duplicate = found.iter().any(|c| {
            (c.center_x - center_x).abs() <= shape.dedup_tolerance
                && (c.center_y - center_y).abs() <= shape.dedup_tolerance
        });
        if duplicate {
            continue;
        }

        found.push(CheckboxWidget {
            center_x,
            center_y,
            width,
            height,
            page_index,
        });
    }

    found
}
