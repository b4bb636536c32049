// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — lay out converted text, page images or structured HTML using
// `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. Layout below works in millimetres from the top of
// the page; `PageFlow` converts to PDF's bottom-left origin.

use doc2any_core::PaperSize;
use doc2any_core::error::{Doc2AnyError, Result};
use image::DynamicImage;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, RawImage,
    RawImageData, RawImageFormat, TextItem, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::html::{self, HtmlVisitor};
use crate::image::ImageProcessor;

/// Pixel to millimetre factor at 96 DPI.
pub const PX_TO_MM: f32 = 0.264583;
const IMAGE_DPI: f32 = 96.0;

const BODY_SIZE: f32 = 11.0;
const LINE_HEIGHT_MM: f32 = 6.0;
const TEXT_MARGIN_MM: f32 = 20.0;
const IMAGE_MARGIN_MM: f32 = 10.0;

/// Creates PDF documents for the conversion encoders and the DOCX image path.
pub struct PdfWriter {
    /// Paper size for page creation.
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl PdfWriter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: "Converted Document".into(),
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    fn page_mm(&self) -> (f32, f32) {
        let (w, h) = self.paper_size.dimensions_mm();
        (w as f32, h as f32)
    }

    // -- Text to PDF ----------------------------------------------------------

    /// Provenance header followed by the text, one wrapped block per
    /// blank-line separated paragraph.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn create_from_text(&self, text: &str, original_name: &str) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_mm();
        info!(paper = ?self.paper_size, original_name, "Creating text PDF");

        let mut flow = PageFlow::new(&self.title, page_w, page_h, TEXT_MARGIN_MM);
        flow.centred_text(20.0, "Converted Document", 16.0, BuiltinFont::HelveticaBold);
        let original = format!("Original: {original_name}");
        flow.centred_text(28.0, &original, 10.0, BuiltinFont::Helvetica);
        flow.centred_text(34.0, "Converted by Doc2Any", 10.0, BuiltinFont::Helvetica);
        flow.y_mm = 50.0;

        let max_chars = chars_per_line(flow.content_width(), BODY_SIZE);
        let mut line_count = 0usize;
        for paragraph in split_paragraphs(text) {
            for line in wrap_text(paragraph, max_chars) {
                if flow.y_mm > flow.bottom() {
                    flow.new_page();
                }
                flow.text_at(flow.margin_mm, flow.y_mm, &line, BODY_SIZE, BuiltinFont::Helvetica);
                flow.y_mm += LINE_HEIGHT_MM;
                line_count += 1;
            }
            flow.y_mm += LINE_HEIGHT_MM / 2.0;
        }

        debug!(lines = line_count, "Text layout complete");
        Ok(flow.finish())
    }

    // -- Images to PDF --------------------------------------------------------

    /// One page per image. Wide images get a landscape page; each image is
    /// sized at 96 DPI, shrunk to fit inside a 10mm margin and centred.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn create_from_images(&self, images: &[DynamicImage]) -> Result<Vec<u8>> {
        let (portrait_w, portrait_h) = self.page_mm();
        let mut flow = PageFlow::new(&self.title, portrait_w, portrait_h, IMAGE_MARGIN_MM);
        flow.pages_started = false;

        for image in images {
            let (page_w, page_h) = if image.width() > image.height() {
                (portrait_h, portrait_w)
            } else {
                (portrait_w, portrait_h)
            };
            flow.start_page(page_w, page_h);

            let (w, h) = fit_mm(
                image,
                page_w - 2.0 * IMAGE_MARGIN_MM,
                page_h - 2.0 * IMAGE_MARGIN_MM,
            );
            let x = (page_w - w) / 2.0;
            let top = (page_h - h) / 2.0;
            flow.image_at(image, x, top, w, h);
            debug!(w_mm = w, h_mm = h, landscape = page_w > page_h, "Image placed on page");
        }

        info!(pages = images.len(), "Image PDF created");
        Ok(flow.finish())
    }

    // -- Structured HTML to PDF -----------------------------------------------

    /// Flow an HTML fragment top to bottom: text lines, headings in bold at
    /// `18 - 2 * level` pt, and data-URI images at their 96 DPI size.
    #[instrument(skip(self, html), fields(html_len = html.len()))]
    pub fn create_from_html(&self, html: &str) -> Result<Vec<u8>> {
        let (page_w, page_h) = self.page_mm();
        let mut layout = HtmlLayout {
            flow: PageFlow::new(&self.title, page_w, page_h, TEXT_MARGIN_MM),
            font_size: BODY_SIZE,
            font: BuiltinFont::Helvetica,
            images: 0,
        };
        html::walk(html, &mut layout)?;
        info!(images = layout.images, "HTML laid out as PDF");
        Ok(layout.flow.finish())
    }
}

// -- Page flow ----------------------------------------------------------------

/// Page list under construction plus a vertical cursor in mm from the top.
struct PageFlow {
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    ops: Vec<Op>,
    page_w: f32,
    page_h: f32,
    margin_mm: f32,
    y_mm: f32,
    pages_started: bool,
}

impl PageFlow {
    fn new(title: &str, page_w: f32, page_h: f32, margin_mm: f32) -> Self {
        Self {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            ops: Vec::new(),
            page_w,
            page_h,
            margin_mm,
            y_mm: margin_mm,
            pages_started: true,
        }
    }

    fn bottom(&self) -> f32 {
        self.page_h - self.margin_mm
    }

    fn content_width(&self) -> f32 {
        self.page_w - 2.0 * self.margin_mm
    }

    fn content_height(&self) -> f32 {
        self.page_h - 2.0 * self.margin_mm
    }

    /// Close the current page and open another of the same size.
    fn new_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.pages
            .push(PdfPage::new(Mm(self.page_w), Mm(self.page_h), ops));
        self.y_mm = self.margin_mm;
    }

    /// Open a page of a new size, closing the current one if it was started.
    fn start_page(&mut self, page_w: f32, page_h: f32) {
        if self.pages_started {
            self.new_page();
        }
        self.pages_started = true;
        self.page_w = page_w;
        self.page_h = page_h;
        self.y_mm = self.margin_mm;
    }

    /// Break to a new page unless `needed_mm` still fits above the margin.
    fn ensure_room(&mut self, needed_mm: f32) {
        if self.y_mm + needed_mm > self.bottom() {
            self.new_page();
        }
    }

    fn text_at(&mut self, x_mm: f32, y_mm: f32, text: &str, size: f32, font: BuiltinFont) {
        let y_pt = Mm(self.page_h - y_mm).into_pt().0;
        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(Mm(x_mm).into_pt().0),
                y: Pt(y_pt),
            },
        });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(size),
            font,
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_string())],
            font,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn centred_text(&mut self, y_mm: f32, text: &str, size: f32, font: BuiltinFont) {
        let width = text.chars().count() as f32 * char_width_mm(size);
        let x = ((self.page_w - width) / 2.0).max(self.margin_mm);
        self.text_at(x, y_mm, text, size, font);
    }

    /// Draw `image` with its top-left corner at (`x_mm`, `top_mm`), scaled to
    /// `w_mm` wide. Transparency is flattened onto white.
    fn image_at(&mut self, image: &DynamicImage, x_mm: f32, top_mm: f32, w_mm: f32, h_mm: f32) {
        let flat = ImageProcessor::from_dynamic(image.clone())
            .flatten_onto_white()
            .into_dynamic()
            .to_rgb8();
        let (px_w, px_h) = (flat.width(), flat.height());
        let raw = RawImage {
            pixels: RawImageData::U8(flat.into_raw()),
            width: px_w as usize,
            height: px_h as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.doc.add_image(&raw);

        let scale = w_mm / (px_w.max(1) as f32 * PX_TO_MM);
        self.ops.push(Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(Mm(x_mm).into_pt().0)),
                translate_y: Some(Pt(Mm(self.page_h - top_mm - h_mm).into_pt().0)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        });
    }

    fn finish(mut self) -> Vec<u8> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            let ops = std::mem::take(&mut self.ops);
            self.pages
                .push(PdfPage::new(Mm(self.page_w), Mm(self.page_h), ops));
        }
        let pages = std::mem::take(&mut self.pages);
        self.doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(warnings = warnings.len(), "PDF saved with warnings");
        }
        output
    }
}

struct HtmlLayout {
    flow: PageFlow,
    font_size: f32,
    font: BuiltinFont,
    images: usize,
}

impl HtmlVisitor for HtmlLayout {
    type Error = Doc2AnyError;

    fn text(&mut self, text: &str) -> Result<()> {
        let max_chars = chars_per_line(self.flow.content_width(), self.font_size);
        for line in wrap_text(text, max_chars) {
            self.flow.ensure_room(LINE_HEIGHT_MM);
            let (margin, y) = (self.flow.margin_mm, self.flow.y_mm);
            self.flow.text_at(margin, y, &line, self.font_size, self.font);
            self.flow.y_mm += LINE_HEIGHT_MM;
        }
        Ok(())
    }

    fn heading_start(&mut self, level: u8) -> Result<()> {
        self.font_size = 18.0 - 2.0 * f32::from(level);
        self.font = BuiltinFont::HelveticaBold;
        self.flow.y_mm += 4.0;
        Ok(())
    }

    fn heading_end(&mut self, _level: u8) -> Result<()> {
        self.font_size = BODY_SIZE;
        self.font = BuiltinFont::Helvetica;
        self.flow.y_mm += 2.0;
        Ok(())
    }

    fn image(&mut self, src: &str) -> Result<()> {
        let Some((_, bytes)) = html::decode_data_uri(src) else {
            return Ok(());
        };
        let image = match image::load_from_memory(&bytes) {
            Ok(image) => image,
            Err(err) => {
                warn!(error = %err, "Skipping undecodable embedded image");
                return Ok(());
            }
        };
        let (w, h) = fit_mm(&image, self.flow.content_width(), self.flow.content_height());
        self.flow.ensure_room(h);
        let (margin, y) = (self.flow.margin_mm, self.flow.y_mm);
        self.flow.image_at(&image, margin, y, w, h);
        self.flow.y_mm += h + 5.0;
        self.images += 1;
        Ok(())
    }

    fn block_end(&mut self) -> Result<()> {
        self.flow.y_mm += 3.0;
        Ok(())
    }
}

// -- Layout helpers -----------------------------------------------------------

/// Approximate Helvetica advance: half the font size, in mm.
fn char_width_mm(size_pt: f32) -> f32 {
    0.50 * size_pt * 0.3528
}

fn chars_per_line(width_mm: f32, size_pt: f32) -> usize {
    ((width_mm / char_width_mm(size_pt)) as usize).max(1)
}

/// Image size in mm at 96 DPI, shrunk (never enlarged) to fit the box.
pub fn fit_mm(image: &DynamicImage, max_w: f32, max_h: f32) -> (f32, f32) {
    let mut w = image.width() as f32 * PX_TO_MM;
    let mut h = image.height() as f32 * PX_TO_MM;
    if w > max_w {
        h *= max_w / w;
        w = max_w;
    }
    if h > max_h {
        w *= max_h / h;
        h = max_h;
    }
    (w, h)
}

/// Trimmed, non-empty paragraphs separated by one or more blank lines.
pub fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
}

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then performs simple word-wrap within each
/// paragraph. Words longer than `max_width` are force-broken.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        let mut current_len = 0usize;

        for word in words {
            let word_len = word.chars().count();
            if word_len > max_width {
                if !current_line.is_empty() {
                    result.push(std::mem::take(&mut current_line));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    let piece: String = chunk.iter().collect();
                    if chunks.peek().is_some() {
                        result.push(piece);
                    } else {
                        current_len = chunk.len();
                        current_line = piece;
                    }
                }
            } else if current_line.is_empty() {
                current_line.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
                current_len += 1 + word_len;
            } else {
                result.push(std::mem::replace(&mut current_line, word.to_string()));
                current_len = word_len;
            }
        }

        if !current_line.is_empty() {
            result.push(current_line);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page_count(pdf: &[u8]) -> usize {
        lopdf::Document::load_mem(pdf).unwrap().get_pages().len()
    }

    #[test]
    fn wrap_respects_width_and_breaks_long_words() {
        let lines = wrap_text("aaa bbb ccc", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);

        let lines = wrap_text("abcdefghij xy", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy"]);

        let lines = wrap_text("äöüäöü", 3);
        assert_eq!(lines, vec!["äöü", "äöü"]);
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let paragraphs: Vec<&str> = split_paragraphs("one\n\n\n\ntwo\nlines\n\n  ").collect();
        assert_eq!(paragraphs, vec!["one", "two\nlines"]);
    }

    #[test]
    fn text_pdf_is_readable_and_paginates() {
        let writer = PdfWriter::new(PaperSize::A4);
        let short = writer.create_from_text("Hello world", "a.txt").unwrap();
        assert!(short.starts_with(b"%PDF"));
        assert_eq!(page_count(&short), 1);

        let long: String = (0..120).map(|i| format!("Paragraph {i}\n\n")).collect();
        let pdf = writer.create_from_text(&long, "long.txt").unwrap();
        assert!(page_count(&pdf) >= 2);
    }

    #[test]
    fn wide_image_fits_margin() {
        let wide = DynamicImage::ImageRgb8(RgbImage::from_pixel(2000, 500, Rgb([1, 2, 3])));
        let (w, h) = fit_mm(&wide, 277.0, 190.0);
        assert!((w - 277.0).abs() < 0.01);
        assert!(h < 190.0);

        let small = DynamicImage::ImageRgb8(RgbImage::new(100, 100));
        let (w, _) = fit_mm(&small, 190.0, 277.0);
        assert!((w - 26.4583).abs() < 0.01);
    }

    #[test]
    fn one_page_per_image() {
        let images = vec![
            DynamicImage::ImageRgb8(RgbImage::new(40, 20)),
            DynamicImage::ImageRgb8(RgbImage::new(20, 40)),
        ];
        let pdf = PdfWriter::new(PaperSize::A4).create_from_images(&images).unwrap();
        assert_eq!(page_count(&pdf), 2);
    }

    #[test]
    fn html_with_image_becomes_pdf() {
        let png = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(RgbImage::new(8, 8)))
            .to_png_bytes()
            .unwrap();
        let html = format!(
            "<h1>Title</h1><p>Body text</p><p><img src=\"{}\"></p>",
            html::data_uri("image/png", &png)
        );
        let pdf = PdfWriter::new(PaperSize::A4).create_from_html(&html).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(page_count(&pdf), 1);
    }
}
