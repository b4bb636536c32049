// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content extractors — one reader per source format, dispatched by
// [`extract`] into an [`IntermediateContent`].

pub mod archive;
pub mod csv;
pub mod docx;
pub mod odt;
pub mod package;
pub mod pdf;
pub mod text;

use doc2any_core::error::Result;
use doc2any_core::{Format, SourceDescriptor};
use tracing::{debug, instrument};

use crate::content::IntermediateContent;
use crate::image::ImageProcessor;

pub use docx::DocxReader;
pub use pdf::PdfReader;

/// Read `data` as the source's format. HTML targets receive semantic HTML
/// where the source carries structure; everything else gets plain text,
/// and image sources become a single decoded page.
#[instrument(
    skip(data),
    fields(source = %source.filename, target = %target, bytes_len = data.len())
)]
pub fn extract(
    source: &SourceDescriptor,
    target: Format,
    data: &[u8],
) -> Result<IntermediateContent> {
    use IntermediateContent::{PageImageSet, PlainText, SemanticHtml};

    let content = match source.format {
        Format::Pdf => PlainText(PdfReader::from_bytes(data)?.extract_text()),
        Format::Docx => docx_content(data, target)?,
        // Some ".doc" files are really OOXML packages.
        Format::Doc if data.starts_with(b"PK") => docx_content(data, target)?,
        Format::Doc => PlainText(text::extract_doc(data)),
        // No binary PowerPoint codec: only mislabelled PPTX packages open.
        Format::Pptx | Format::Ppt => PlainText(package::extract_pptx(data)?),
        Format::Xlsx => PlainText(package::extract_xlsx(data)?),
        Format::Xls => PlainText(package::extract_xls(data)?),
        Format::Odt => PlainText(odt::extract_odt(data)?),
        Format::Txt | Format::Rtf => PlainText(text::decode_text(data)),
        Format::Html if target == Format::Html => SemanticHtml(text::extract_html(data, target)),
        Format::Html => PlainText(text::extract_html(data, target)),
        Format::Csv => PlainText(csv::csv_to_text(&csv::parse_csv(&text::decode_text(data)))),
        image_format => {
            PageImageSet(vec![ImageProcessor::decode(image_format, data)?.into_dynamic()])
        }
    };
    debug!(kind = content.kind_name(), "Content extracted");
    Ok(content)
}

fn docx_content(data: &[u8], target: Format) -> Result<IntermediateContent> {
    let reader = DocxReader::from_bytes(data)?;
    Ok(if target == Format::Html {
        IntermediateContent::SemanticHtml(reader.to_html())
    } else {
        IntermediateContent::PlainText(reader.to_text())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc2any_core::Doc2AnyError;

    fn source(name: &str, data: &[u8]) -> SourceDescriptor {
        SourceDescriptor::new(name, data.len() as u64).unwrap()
    }

    #[test]
    fn csv_becomes_tabbed_text() {
        let data = b"name,score\n\"Smith, J\",10\n";
        let content = extract(&source("report.csv", data), Format::Docx, data).unwrap();
        match content {
            IntermediateContent::PlainText(text) => assert_eq!(text, "name\tscore\nSmith, J\t10"),
            other => panic!("unexpected {}", other.kind_name()),
        }
    }

    #[test]
    fn docx_to_html_keeps_structure() {
        let data = docx::tests::docx_with_image();
        let content = extract(&source("a.docx", &data), Format::Html, &data).unwrap();
        assert!(
            matches!(content, IntermediateContent::SemanticHtml(ref html) if html.contains("<img"))
        );

        let content = extract(&source("a.docx", &data), Format::Txt, &data).unwrap();
        assert!(matches!(content, IntermediateContent::PlainText(_)));
    }

    #[test]
    fn html_source_is_raw_only_for_html_target() {
        let data = b"<p>Hello <b>there</b></p>";
        let raw = extract(&source("page.html", data), Format::Html, data).unwrap();
        assert!(matches!(raw, IntermediateContent::SemanticHtml(ref s) if s.contains("<b>")));
        let text = extract(&source("page.html", data), Format::Pdf, data).unwrap();
        assert!(matches!(text, IntermediateContent::PlainText(ref s) if s == "Hello there"));
    }

    #[test]
    fn image_source_decodes_to_single_page() {
        let data = docx::tests::tiny_png();
        let content = extract(&source("dot.png", &data), Format::Jpg, &data).unwrap();
        assert!(
            matches!(content, IntermediateContent::PageImageSet(ref pages) if pages.len() == 1)
        );
    }

    #[test]
    fn legacy_ppt_has_no_codec() {
        let data = b"\xD0\xCF\x11\xE0 binary powerpoint";
        let err = extract(&source("deck.ppt", data), Format::Txt, data).unwrap_err();
        assert!(matches!(err, Doc2AnyError::Archive(_)));
    }

    #[test]
    fn pdf_text_is_extracted() {
        let data = pdf::tests::build_pdf(&["First page", "Second page"], None);
        let content = extract(&source("two.pdf", &data), Format::Txt, &data).unwrap();
        match content {
            IntermediateContent::PlainText(text) => {
                assert!(text.contains("First page"));
                assert!(text.contains("Second page"));
            }
            other => panic!("unexpected {}", other.kind_name()),
        }
    }
}
