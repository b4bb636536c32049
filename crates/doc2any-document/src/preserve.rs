// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image-preserving paths — conversions that keep visuals instead of going
// through extracted text.
//
// Each attempt returns `Ok(Some(bytes))` on success, `Ok(None)` when the
// path does not apply to this particular file (e.g. a DOCX without
// pictures), or an error. The orchestrator decides which errors are fatal.

use doc2any_core::error::{Doc2AnyError, Result};
use doc2any_core::{ConverterConfig, Format, PreservingPath, SourceDescriptor};
use tracing::{debug, info, instrument};

use crate::encode::{EncodeContext, PdfWriter, docx};
use crate::extract::{DocxReader, PdfReader};
use crate::html;
use crate::image::ImageProcessor;
use crate::progress::{CancelToken, ProgressEvent, ProgressSink};
use crate::render::PageRenderer;

/// The image-preserving path for a source/target pair, if any.
pub fn select(source: Format, target: Format) -> Option<PreservingPath> {
    match (source, target) {
        (s, t) if s.is_image() && (t.is_image() || t == Format::Pdf) => {
            Some(PreservingPath::ImageRaster)
        }
        (Format::Pdf, t) if t.is_raster_target() => Some(PreservingPath::PdfToImage),
        (Format::Pdf, Format::Docx) => Some(PreservingPath::PdfToDocx),
        (Format::Docx, Format::Pdf) => Some(PreservingPath::DocxToPdf),
        _ => None,
    }
}

/// Output of a successful attempt.
#[derive(Debug, Clone)]
pub struct Preserved {
    pub data: Vec<u8>,
    pub notices: Vec<String>,
}

impl Preserved {
    fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            notices: Vec::new(),
        }
    }
}

/// Collaborators an attempt may need.
pub struct Attempt<'a> {
    pub config: &'a ConverterConfig,
    pub encode: &'a EncodeContext,
    pub renderer: &'a dyn PageRenderer,
    pub progress: &'a ProgressSink,
    pub cancel: &'a CancelToken,
}

impl Attempt<'_> {
    #[instrument(
        skip(self, source, data),
        fields(path = path.label(), source = %source.filename, target = %target)
    )]
    pub fn run(
        &self,
        path: PreservingPath,
        source: &SourceDescriptor,
        target: Format,
        data: &[u8],
    ) -> Result<Option<Preserved>> {
        self.cancel.check()?;
        match path {
            PreservingPath::ImageRaster => self.image_raster(source.format, target, data),
            PreservingPath::PdfToImage => self.pdf_to_image(target, data),
            PreservingPath::PdfToDocx => self.pdf_to_docx(data),
            PreservingPath::DocxToPdf => self.docx_to_pdf(data),
        }
    }

    fn image_raster(
        &self,
        source: Format,
        target: Format,
        data: &[u8],
    ) -> Result<Option<Preserved>> {
        let processor = ImageProcessor::decode(source, data)?;
        let bytes = if target == Format::Pdf {
            let mut writer = PdfWriter::new(self.encode.paper_size);
            writer.set_title(self.encode.original_name.clone());
            writer.create_from_images(&[processor.into_dynamic()])?
        } else {
            processor.encode(target, self.encode.jpeg_quality)?
        };
        Ok(Some(Preserved::new(bytes)))
    }

    fn pdf_to_image(&self, target: Format, data: &[u8]) -> Result<Option<Preserved>> {
        // An icon shows the first page only.
        let max_pages = if target == Format::Ico {
            1
        } else {
            self.config.max_rendered_pages
        };
        let mut on_page = |page: usize, total: usize| -> Result<()> {
            self.progress.emit(ProgressEvent::PageRendered { page, total });
            self.cancel.check()
        };
        let rendered = self.renderer.render_pages(
            data,
            max_pages,
            self.config.render_scale,
            &mut on_page,
        )?;
        if rendered.pages.is_empty() {
            return Err(Doc2AnyError::PdfError("document has no pages".into()));
        }

        let stacked = ImageProcessor::stack_vertical(&rendered.pages)?;
        let mut preserved = Preserved::new(stacked.encode(target, self.encode.jpeg_quality)?);
        if rendered.truncated() {
            let notice = if target == Format::Ico {
                format!("Icon uses page 1 of {}", rendered.total_pages)
            } else {
                format!(
                    "Converted first {} of {} pages",
                    rendered.pages.len(),
                    rendered.total_pages
                )
            };
            info!(%notice, "PDF page output truncated");
            self.progress.notice(notice.clone());
            preserved.notices.push(notice);
        }
        Ok(Some(preserved))
    }

    fn pdf_to_docx(&self, data: &[u8]) -> Result<Option<Preserved>> {
        let html = PdfReader::from_bytes(data)?.to_html();
        if html::count_images(&html) == 0 {
            debug!("PDF has no embedded images");
            return Ok(None);
        }
        self.cancel.check()?;
        let bytes = docx::html_to_docx(&html, &self.encode.original_name)?;
        Ok(Some(Preserved::new(bytes)))
    }

    fn docx_to_pdf(&self, data: &[u8]) -> Result<Option<Preserved>> {
        let reader = DocxReader::from_bytes(data)?;
        if reader.image_count() == 0 {
            debug!("DOCX has no embedded images");
            return Ok(None);
        }
        self.cancel.check()?;
        let mut writer = PdfWriter::new(self.encode.paper_size);
        writer.set_title(self.encode.original_name.clone());
        Ok(Some(Preserved::new(writer.create_from_html(&reader.to_html())?)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extract::docx::tests::{docx_with_image, docx_without_images, tiny_png};
    use crate::extract::pdf::tests::{build_pdf, tiny_jpeg};
    use crate::render::{PageCallback, RenderedPages, UnavailableRenderer};
    use image::{DynamicImage, RgbImage};

    /// Renders every page as a 10×4 grey image.
    pub(crate) struct FakeRenderer {
        pub(crate) pages: usize,
    }

    impl PageRenderer for FakeRenderer {
        fn render_pages(
            &self,
            _pdf: &[u8],
            max_pages: usize,
            _scale: f32,
            on_page: &mut PageCallback<'_>,
        ) -> Result<RenderedPages> {
            let wanted = self.pages.min(max_pages);
            let mut pages = Vec::new();
            for page in 1..=wanted {
                let grey = RgbImage::from_pixel(10, 4, image::Rgb([90, 90, 90]));
                pages.push(DynamicImage::ImageRgb8(grey));
                on_page(page, wanted)?;
            }
            Ok(RenderedPages {
                pages,
                total_pages: self.pages,
            })
        }
    }

    fn run(
        renderer: &dyn PageRenderer,
        path: PreservingPath,
        name: &str,
        target: Format,
        data: &[u8],
    ) -> Result<Option<Preserved>> {
        let config = ConverterConfig::default();
        let encode = EncodeContext::new(name, &config);
        let progress = ProgressSink::disabled();
        let cancel = CancelToken::new();
        let source = SourceDescriptor::new(name, data.len() as u64).unwrap();
        Attempt {
            config: &config,
            encode: &encode,
            renderer,
            progress: &progress,
            cancel: &cancel,
        }
        .run(path, &source, target, data)
    }

    #[test]
    fn selection_table() {
        use Format::*;
        assert_eq!(select(Png, Ico), Some(PreservingPath::ImageRaster));
        assert_eq!(select(Svg, Pdf), Some(PreservingPath::ImageRaster));
        assert_eq!(select(Pdf, Jpg), Some(PreservingPath::PdfToImage));
        assert_eq!(select(Pdf, Ico), Some(PreservingPath::PdfToImage));
        assert_eq!(select(Pdf, Docx), Some(PreservingPath::PdfToDocx));
        assert_eq!(select(Docx, Pdf), Some(PreservingPath::DocxToPdf));
        assert_eq!(select(Pdf, Txt), None);
        assert_eq!(select(Docx, Html), None);
        assert_eq!(select(Csv, Pdf), None);
    }

    /// Paths that never need a page renderer.
    fn offline(
        path: PreservingPath,
        name: &str,
        target: Format,
        data: &[u8],
    ) -> Result<Option<Preserved>> {
        run(&UnavailableRenderer, path, name, target, data)
    }

    #[test]
    fn image_to_pdf_and_raster() {
        let png = tiny_png();
        let pdf = offline(PreservingPath::ImageRaster, "dot.png", Format::Pdf, &png)
            .unwrap()
            .unwrap();
        assert!(pdf.data.starts_with(b"%PDF"));

        let jpg = offline(PreservingPath::ImageRaster, "dot.png", Format::Jpg, &png)
            .unwrap()
            .unwrap();
        assert_eq!(image::guess_format(&jpg.data).unwrap(), image::ImageFormat::Jpeg);
    }

    #[test]
    fn long_pdf_is_capped_with_notice() {
        let preserved = run(
            &FakeRenderer { pages: 25 },
            PreservingPath::PdfToImage,
            "long.pdf",
            Format::Png,
            b"%PDF",
        )
        .unwrap()
        .unwrap();
        let stacked = image::load_from_memory(&preserved.data).unwrap();
        assert_eq!((stacked.width(), stacked.height()), (10, 80));
        assert_eq!(preserved.notices, vec!["Converted first 20 of 25 pages"]);
    }

    #[test]
    fn icon_from_pdf_uses_first_page() {
        let preserved = run(
            &FakeRenderer { pages: 3 },
            PreservingPath::PdfToImage,
            "deck.pdf",
            Format::Ico,
            b"%PDF",
        )
        .unwrap()
        .unwrap();
        let icon = image::load_from_memory(&preserved.data).unwrap();
        // A single page, not the 10x12 stack of all three.
        assert_eq!((icon.width(), icon.height()), (10, 4));
        assert_eq!(preserved.notices, vec!["Icon uses page 1 of 3"]);

        let single = run(
            &FakeRenderer { pages: 1 },
            PreservingPath::PdfToImage,
            "one.pdf",
            Format::Ico,
            b"%PDF",
        )
        .unwrap()
        .unwrap();
        assert!(single.notices.is_empty());
    }

    #[test]
    fn missing_renderer_is_an_error() {
        let err = offline(PreservingPath::PdfToImage, "a.pdf", Format::Png, b"%PDF").unwrap_err();
        assert!(matches!(err, Doc2AnyError::CodecUnavailable(_)));
    }

    #[test]
    fn pdf_to_docx_needs_images() {
        let plain = build_pdf(&["Words only"], None);
        let skipped = offline(PreservingPath::PdfToDocx, "a.pdf", Format::Docx, &plain).unwrap();
        assert!(skipped.is_none());

        let jpeg = tiny_jpeg();
        let pictured = build_pdf(&["Caption"], Some((jpeg.as_slice(), 4, 3)));
        let docx = offline(PreservingPath::PdfToDocx, "a.pdf", Format::Docx, &pictured)
            .unwrap()
            .unwrap();
        assert_eq!(DocxReader::from_bytes(&docx.data).unwrap().image_count(), 1);
    }

    #[test]
    fn docx_to_pdf_needs_images() {
        let plain = docx_without_images();
        let skipped = offline(PreservingPath::DocxToPdf, "a.docx", Format::Pdf, &plain).unwrap();
        assert!(skipped.is_none());

        let pictured = docx_with_image();
        let pdf = offline(PreservingPath::DocxToPdf, "a.docx", Format::Pdf, &pictured)
            .unwrap()
            .unwrap();
        assert_eq!(PdfReader::from_bytes(&pdf.data).unwrap().page_count(), 1);
    }
}
