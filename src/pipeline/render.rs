//! pdfium-backed [`PageSource`]: page layouts and rasters from a PDF file.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! Everything in this module is blocking; the async entry points in
//! [`crate::extract`] move a whole document onto a `spawn_blocking` thread
//! and open, scan and close it there.
//!
//! ## Coordinates
//!
//! pdfium reports rectangles with a bottom-left origin. Every rectangle that
//! leaves this module is flipped to the top-left origin the engine uses.

use super::engine::{PageLayout, PageSource};
use super::raster::Raster;
use super::text::{split_segment, TextToken};
use super::widgets::WidgetRect;
use crate::error::{GridError, PageError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind pdfium: `$PDFIUM_LIB_PATH`, then the working directory, then the
/// system library.
pub fn bind_pdfium() -> Result<Pdfium, GridError> {
    let bindings = match std::env::var_os(PDFIUM_LIB_ENV) {
        Some(path) => {
            debug!("Binding pdfium from {}", PathBuf::from(&path).display());
            Pdfium::bind_to_library(PathBuf::from(path))
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| GridError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// An open PDF document.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumSource<'a> {
    pub fn open(
        pdfium: &'a Pdfium,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Self, GridError> {
        let document = pdfium.load_pdf_from_file(path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    GridError::WrongPassword {
                        path: path.to_path_buf(),
                    }
                } else {
                    GridError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                }
            } else {
                GridError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        info!(
            "Opened {}: {} pages",
            path.display(),
            document.pages().len()
        );
        Ok(Self { document })
    }

    fn page(&self, page_index: usize) -> Result<PdfPage<'_>, PdfiumError> {
        self.document.pages().get(page_index as u16)
    }
}

impl PageSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn layout(&self, page_index: usize) -> Result<PageLayout, PageError> {
        let failed = |e: PdfiumError| PageError::LayoutFailed {
            page: page_index + 1,
            detail: format!("{:?}", e),
        };

        let page = self.page(page_index).map_err(failed)?;
        let width = page.width().value;
        let height = page.height().value;

        let mut tokens: Vec<TextToken> = Vec::new();
        let text = page.text().map_err(failed)?;
        for segment in text.segments().iter() {
            let content = segment.text();
            if content.trim().is_empty() {
                continue;
            }
            let b = segment.bounds();
            tokens.extend(split_segment(
                &content,
                b.left().value,
                height - b.top().value,
                b.right().value,
                height - b.bottom().value,
                page_index,
            ));
        }

        let mut widgets: Vec<WidgetRect> = Vec::new();
        for annotation in page.annotations().iter() {
            if annotation.annotation_type() != PdfPageAnnotationType::Widget {
                continue;
            }
            let Ok(b) = annotation.bounds() else {
                continue;
            };
            widgets.push(WidgetRect {
                x0: b.left().value,
                y0: height - b.top().value,
                x1: b.right().value,
                y1: height - b.bottom().value,
            });
        }

        debug!(
            "Page {}: {:.0}x{:.0}, {} tokens, {} widgets",
            page_index + 1,
            width,
            height,
            tokens.len(),
            widgets.len()
        );

        Ok(PageLayout {
            page_index,
            width,
            height,
            tokens,
            widgets,
        })
    }

    fn render(&self, page_index: usize, zoom: f32) -> Result<Raster, PageError> {
        let failed = |e: PdfiumError| PageError::RenderFailed {
            page: page_index + 1,
            detail: format!("{:?}", e),
        };

        let page = self.page(page_index).map_err(failed)?;
        let width = page.width().value;
        let height = page.height().value;

        let render_config = PdfRenderConfig::new()
            .set_target_width((width * zoom).round() as i32)
            .set_target_height((height * zoom).round() as i32)
            .render_form_data(true)
            .render_annotations(true);
        let bitmap = page.render_with_config(&render_config).map_err(failed)?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_index + 1,
            image.width(),
            image.height()
        );
        Ok(Raster::from_dynamic(image, width, height))
    }
}
