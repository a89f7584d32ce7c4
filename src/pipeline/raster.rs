//! A rendered page and the mapping between layout units and pixels.
//!
//! Rasters are scoped to one page: the engine renders a page, resolves all of
//! its rows and bullets, then drops the raster before touching the next page.

use image::{DynamicImage, RgbImage};

/// RGB raster of one page plus the page size it was rendered from.
pub struct Raster {
    image: RgbImage,
    page_width: f32,
    page_height: f32,
}

impl Raster {
    pub fn new(image: RgbImage, page_width: f32, page_height: f32) -> Self {
        Self {
            image,
            page_width,
            page_height,
        }
    }

    /// Wrap a pdfium render, dropping any alpha channel.
    pub fn from_dynamic(image: DynamicImage, page_width: f32, page_height: f32) -> Self {
        Self::new(image.to_rgb8(), page_width, page_height)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Layout point → pixel, clamped into the raster.
    pub fn to_pixel(&self, x: f32, y: f32) -> (u32, u32) {
        (
            scale_to_pixel(x, self.page_width, self.width()),
            scale_to_pixel(y, self.page_height, self.height()),
        )
    }

    /// Pixel row → layout Y.
    pub fn pixel_to_page_y(&self, py: u32) -> f32 {
        if self.height() == 0 {
            return 0.0;
        }
        py as f32 * self.page_height / self.height() as f32
    }

    /// Caller guarantees `(px, py)` is inside the raster.
    pub fn rgb(&self, px: u32, py: u32) -> [u8; 3] {
        self.image.get_pixel(px, py).0
    }

    /// Integer mean of the three channels.
    pub fn intensity(&self, px: u32, py: u32) -> u8 {
        let [r, g, b] = self.rgb(px, py);
        ((r as u16 + g as u16 + b as u16) / 3) as u8
    }
}

fn scale_to_pixel(v: f32, extent: f32, pixels: u32) -> u32 {
    if pixels == 0 || extent <= 0.0 {
        return 0;
    }
    let p = (v / extent * pixels as f32).floor();
    if p <= 0.0 {
        0
    } else {
        (p as u32).min(pixels - 1)
    }
}
