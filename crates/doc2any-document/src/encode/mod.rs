// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content encoders — turn one `IntermediateContent` into the bytes of the
// target format. Every textual encoder writes the Doc2Any provenance header.

pub mod docx;
pub mod markup;
pub mod pdf;
pub mod plain;
pub mod pptx;
pub mod xlsx;

use chrono::{DateTime, Local};
use doc2any_core::error::{Doc2AnyError, Result};
use doc2any_core::{ConverterConfig, Format, PaperSize};
use tracing::{debug, instrument};

use crate::content::IntermediateContent;
use crate::html;
use crate::image::ImageProcessor;

pub use pdf::PdfWriter;

/// Everything an encoder needs besides the content itself.
#[derive(Debug, Clone)]
pub struct EncodeContext {
    pub original_name: String,
    pub timestamp: DateTime<Local>,
    pub paper_size: PaperSize,
    pub jpeg_quality: u8,
    pub slide_char_budget: usize,
}

impl EncodeContext {
    pub fn new(original_name: impl Into<String>, config: &ConverterConfig) -> Self {
        Self {
            original_name: original_name.into(),
            timestamp: Local::now(),
            paper_size: config.paper_size,
            jpeg_quality: config.jpeg_quality,
            slide_char_budget: config.slide_char_budget,
        }
    }
}

/// Encode `content` as `target`.
///
/// Image content only reaches raster targets and PDF; text content never
/// reaches a raster target. Formats that are only ever read (doc, xls, ppt,
/// svg, tiff) have no encoder.
#[instrument(skip(content, ctx), fields(target = %target, kind = content.kind_name()))]
pub fn encode(
    target: Format,
    content: IntermediateContent,
    ctx: &EncodeContext,
) -> Result<Vec<u8>> {
    let bytes = match content {
        IntermediateContent::PageImageSet(pages) => encode_pages(target, &pages, ctx)?,
        IntermediateContent::SemanticHtml(fragment) if target == Format::Html => {
            markup::encode_semantic_html(&fragment, &ctx.original_name).into_bytes()
        }
        IntermediateContent::SemanticHtml(fragment) => {
            encode_text(target, &html::strip_to_text(&fragment), ctx)?
        }
        IntermediateContent::PlainText(text) => encode_text(target, &text, ctx)?,
    };
    debug!(bytes = bytes.len(), "Content encoded");
    Ok(bytes)
}

fn encode_pages(
    target: Format,
    pages: &[image::DynamicImage],
    ctx: &EncodeContext,
) -> Result<Vec<u8>> {
    match target {
        Format::Pdf => {
            let mut writer = PdfWriter::new(ctx.paper_size);
            writer.set_title(ctx.original_name.clone());
            writer.create_from_images(pages)
        }
        raster if raster.is_raster_target() => {
            ImageProcessor::stack_vertical(pages)?.encode(raster, ctx.jpeg_quality)
        }
        other => Err(Doc2AnyError::Encoding(format!(
            "image content cannot be written as {other}"
        ))),
    }
}

fn encode_text(target: Format, text: &str, ctx: &EncodeContext) -> Result<Vec<u8>> {
    let name = ctx.original_name.as_str();
    Ok(match target {
        Format::Pdf => PdfWriter::new(ctx.paper_size).create_from_text(text, name)?,
        Format::Html => markup::encode_html(text, name).into_bytes(),
        Format::Txt => plain::encode_txt(text, name, &ctx.timestamp).into_bytes(),
        Format::Csv => plain::encode_csv(text, name, &ctx.timestamp).into_bytes(),
        Format::Rtf => markup::encode_rtf(text, name).into_bytes(),
        Format::Odt => markup::encode_fodt(text, name).into_bytes(),
        Format::Docx => docx::encode_docx(text, name)?,
        Format::Xlsx => xlsx::encode_xlsx(text, name)?,
        Format::Pptx => pptx::encode_pptx(text, name, ctx.slide_char_budget)?,
        raster if raster.is_raster_target() => {
            return Err(Doc2AnyError::Encoding(format!(
                "text content has no route to {raster}"
            )));
        }
        other => {
            return Err(Doc2AnyError::Encoding(format!("no encoder for {other}")));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};

    fn ctx() -> EncodeContext {
        EncodeContext::new("sample.txt", &ConverterConfig::default())
    }

    #[test]
    fn every_text_target_produces_bytes() {
        let text = IntermediateContent::PlainText("Heading\n\nBody line\nnext".into());
        for target in [
            Format::Pdf,
            Format::Html,
            Format::Txt,
            Format::Csv,
            Format::Rtf,
            Format::Odt,
            Format::Docx,
            Format::Xlsx,
            Format::Pptx,
        ] {
            let bytes = encode(target, text.clone(), &ctx()).unwrap();
            assert!(!bytes.is_empty(), "{target}");
        }
    }

    #[test]
    fn text_never_reaches_raster() {
        let text = IntermediateContent::PlainText("x".into());
        let err = encode(Format::Png, text, &ctx()).unwrap_err();
        assert!(matches!(err, Doc2AnyError::Encoding(_)));
    }

    #[test]
    fn input_only_targets_have_no_encoder() {
        for target in [Format::Doc, Format::Xls, Format::Ppt, Format::Svg, Format::Tiff] {
            assert!(encode(target, IntermediateContent::PlainText("x".into()), &ctx()).is_err());
        }
    }

    #[test]
    fn pages_stack_into_one_image() {
        let pages = vec![
            DynamicImage::ImageRgba8(RgbaImage::new(10, 5)),
            DynamicImage::ImageRgba8(RgbaImage::new(10, 5)),
        ];
        let png = encode(Format::Png, IntermediateContent::PageImageSet(pages), &ctx()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }

    #[test]
    fn semantic_html_is_not_re_escaped() {
        let bytes = encode(
            Format::Html,
            IntermediateContent::SemanticHtml("<h1>Kept</h1>".into()),
            &ctx(),
        )
        .unwrap();
        let page = String::from_utf8(bytes).unwrap();
        assert!(page.contains("<h1>Kept</h1>"));
        assert!(page.contains("Original: sample.txt"));
    }
}
