// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF page rasterisation.
//
// Rendering PDF pages needs a real PDF engine. With the `render` feature the
// pdfium shared library is bound at call time (`PDFIUM_LIB_PATH`, then the
// system library path); without it, or when binding fails, rendering reports
// `CodecUnavailable`.

use doc2any_core::error::{Doc2AnyError, Result};
use image::DynamicImage;

/// Pages rendered from a PDF, in page order.
#[derive(Debug, Clone)]
pub struct RenderedPages {
    pub pages: Vec<DynamicImage>,
    /// Page count of the whole document, which may exceed `pages.len()`.
    pub total_pages: usize,
}

impl RenderedPages {
    pub fn truncated(&self) -> bool {
        self.total_pages > self.pages.len()
    }
}

/// Callback invoked after each page with `(page_number, pages_to_render)`.
/// Returning an error stops rendering.
pub type PageCallback<'a> = dyn FnMut(usize, usize) -> Result<()> + 'a;

/// Renders the first `max_pages` pages of a PDF at `scale` times their
/// nominal 72 DPI size.
pub trait PageRenderer: Send + Sync {
    fn render_pages(
        &self,
        pdf: &[u8],
        max_pages: usize,
        scale: f32,
        on_page: &mut PageCallback<'_>,
    ) -> Result<RenderedPages>;
}

/// Renderer used when no PDF engine is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRenderer;

impl PageRenderer for UnavailableRenderer {
    fn render_pages(
        &self,
        _pdf: &[u8],
        _max_pages: usize,
        _scale: f32,
        _on_page: &mut PageCallback<'_>,
    ) -> Result<RenderedPages> {
        Err(Doc2AnyError::CodecUnavailable(
            "PDF page rendering requires the `render` feature and a pdfium library".into(),
        ))
    }
}

/// The renderer this build provides.
pub fn default_renderer() -> Box<dyn PageRenderer> {
    #[cfg(feature = "render")]
    {
        Box::new(pdfium::PdfiumRenderer)
    }
    #[cfg(not(feature = "render"))]
    {
        Box::new(UnavailableRenderer)
    }
}

#[cfg(feature = "render")]
pub mod pdfium {
    use std::path::PathBuf;

    use doc2any_core::error::{Doc2AnyError, Result};
    use pdfium_render::prelude::*;
    use tracing::{debug, info, instrument};

    use super::{PageCallback, PageRenderer, RenderedPages};

    /// Renders through the pdfium C library via `pdfium-render`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct PdfiumRenderer;

    fn bind() -> Result<Pdfium> {
        let bindings = match std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from) {
            Some(path) if path.exists() => Pdfium::bind_to_library(&path),
            _ => Pdfium::bind_to_system_library(),
        };
        bindings
            .map(Pdfium::new)
            .map_err(|e| Doc2AnyError::CodecUnavailable(format!("pdfium library not found: {}", e)))
    }

    impl PageRenderer for PdfiumRenderer {
        #[instrument(skip(self, pdf, on_page), fields(bytes_len = pdf.len()))]
        fn render_pages(
            &self,
            pdf: &[u8],
            max_pages: usize,
            scale: f32,
            on_page: &mut PageCallback<'_>,
        ) -> Result<RenderedPages> {
            let pdfium = bind()?;
            let document = pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .map_err(|e| Doc2AnyError::PdfError(format!("failed to open PDF: {:?}", e)))?;

            let pages = document.pages();
            let total_pages = pages.len() as usize;
            let wanted = total_pages.min(max_pages);
            info!(total_pages, wanted, scale, "Rendering PDF pages");

            let config = PdfRenderConfig::new().scale_page_by_factor(scale);
            let mut rendered = Vec::with_capacity(wanted);
            for index in 0..wanted {
                let page = pages.get(index as u16).map_err(|e| {
                    Doc2AnyError::PdfError(format!("page {}: {:?}", index + 1, e))
                })?;
                let bitmap = page.render_with_config(&config).map_err(|e| {
                    Doc2AnyError::PdfError(format!("rendering page {} failed: {:?}", index + 1, e))
                })?;
                let image = bitmap.as_image();
                debug!(
                    page = index + 1,
                    width = image.width(),
                    height = image.height(),
                    "Page rendered"
                );
                rendered.push(image);
                on_page(index + 1, wanted)?;
            }

            Ok(RenderedPages {
                pages: rendered,
                total_pages,
            })
        }
    }
}
