//! Bullet detection where a row crosses a model column.
//!
//! A model applies to a row when the form prints a small mid-gray dot at the
//! crossing. Row shading (~210) and text ink (<100) both fall outside the
//! bullet band, so a plain pixel count is enough.

use super::columns::ModelColumn;
use super::raster::Raster;
use super::rows::PageRow;
use crate::config::BulletDetector;

/// Bullet-coloured pixels in the square window around layout point `(x, y)`.
pub fn count_bullet_pixels(raster: &Raster, x: f32, y: f32, detector: &BulletDetector) -> usize {
    if raster.is_empty() {
        return 0;
    }
    let (cx, cy) = raster.to_pixel(x, y);
    let w = detector.window_px;
    let x_range = cx.saturating_sub(w)..=cx.saturating_add(w).min(raster.width() - 1);
    let y_range = cy.saturating_sub(w)..=cy.saturating_add(w).min(raster.height() - 1);

    let mut count = 0;
    for py in y_range {
        for px in x_range.clone() {
            if is_bullet_pixel(raster.rgb(px, py), detector) {
                count += 1;
            }
        }
    }
    count
}

fn is_bullet_pixel([r, g, b]: [u8; 3], detector: &BulletDetector) -> bool {
    let band = detector.gray_min..=detector.gray_max;
    if !(band.contains(&r) && band.contains(&g) && band.contains(&b)) {
        return false;
    }
    let spread = detector.max_channel_spread;
    r.abs_diff(g) < spread && g.abs_diff(b) < spread && r.abs_diff(b) < spread
}

pub fn has_bullet(raster: &Raster, x: f32, y: f32, detector: &BulletDetector) -> bool {
    count_bullet_pixels(raster, x, y, detector) >= detector.min_pixels
}

/// Models marked on `row`, in column order.
pub fn matched_models<'a>(
    raster: &Raster,
    row: &PageRow,
    models: &'a [ModelColumn],
    detector: &BulletDetector,
) -> Vec<&'a ModelColumn> {
    models
        .iter()
        .filter(|m| {
            m.xs
                .iter()
                .any(|&x| has_bullet(raster, x, row.band.checkbox_y, detector))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rows::RowBand;
    use image::{Rgb, RgbImage};

    fn raster_with_dot(cx: u32, cy: u32, half: u32, colour: [u8; 3]) -> Raster {
        let mut img = RgbImage::from_pixel(200, 200, Rgb([210, 210, 210]));
        for y in cy - half..=cy + half {
            for x in cx - half..=cx + half {
                img.put_pixel(x, y, Rgb(colour));
            }
        }
        Raster::new(img, 200.0, 200.0)
    }

    #[test]
    fn gray_dot_is_a_bullet() {
        let raster = raster_with_dot(50, 50, 2, [136, 136, 136]);
        let det = BulletDetector::default();
        assert_eq!(count_bullet_pixels(&raster, 50.0, 50.0, &det), 25);
        assert!(has_bullet(&raster, 50.0, 50.0, &det));
        // Window is ±10 px: a dot 8 px away is still caught, 30 px is not.
        assert!(has_bullet(&raster, 50.0, 58.0, &det));
        assert!(!has_bullet(&raster, 50.0, 80.0, &det));
    }

    #[test]
    fn huge_window_is_clamped_to_the_raster() {
        let raster = raster_with_dot(197, 197, 2, [136, 136, 136]);
        let det = BulletDetector {
            window_px: u32::MAX,
            ..BulletDetector::default()
        };
        assert_eq!(count_bullet_pixels(&raster, 199.0, 199.0, &det), 25);
        assert_eq!(count_bullet_pixels(&raster, 0.0, 0.0, &det), 25);
    }

    #[test]
    fn ink_and_tinted_pixels_are_ignored() {
        let det = BulletDetector::default();
        let black = raster_with_dot(50, 50, 3, [20, 20, 20]);
        assert_eq!(count_bullet_pixels(&black, 50.0, 50.0, &det), 0);
        // In band per channel, but not gray.
        let tinted = raster_with_dot(50, 50, 3, [118, 150, 118]);
        assert_eq!(count_bullet_pixels(&tinted, 50.0, 50.0, &det), 0);
    }

    #[test]
    fn too_few_pixels_is_not_a_bullet() {
        let mut img = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        for x in 10..14 {
            img.put_pixel(x, 10, Rgb([140, 140, 140]));
        }
        let raster = Raster::new(img, 40.0, 40.0);
        let det = BulletDetector::default();
        assert_eq!(count_bullet_pixels(&raster, 12.0, 10.0, &det), 4);
        assert!(!has_bullet(&raster, 12.0, 10.0, &det));
    }

    #[test]
    fn window_is_clamped_at_the_edge() {
        let raster = raster_with_dot(3, 3, 3, [136, 136, 136]);
        assert!(has_bullet(&raster, 0.0, 0.0, &BulletDetector::default()));
    }

    #[test]
    fn split_model_column_matches_on_either_member() {
        let raster = raster_with_dot(150, 100, 3, [136, 136, 136]);
        let models = vec![
            ModelColumn { xs: vec![60.0], name: "Macan".into() },
            ModelColumn { xs: vec![130.0, 150.0], name: "Panamera GTS".into() },
        ];
        let row = PageRow {
            band: RowBand::degenerate(100.0),
            checkbox_xs: vec![190.0],
        };
        let hits = matched_models(&raster, &row, &models, &BulletDetector::default());
        let names: Vec<&str> = hits.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Panamera GTS"]);
    }
}
