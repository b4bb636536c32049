// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Intermediate content passed from an extractor to exactly one encoder.

use image::DynamicImage;

/// Format-neutral content of a source file.
#[derive(Debug, Clone)]
pub enum IntermediateContent {
    PlainText(String),
    /// HTML fragment with headings, paragraphs and data-URI images.
    SemanticHtml(String),
    /// Decoded raster pages, top to bottom.
    PageImageSet(Vec<DynamicImage>),
}

impl IntermediateContent {
    /// True when there is nothing worth encoding.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::PlainText(text) | Self::SemanticHtml(text) => text.trim().is_empty(),
            Self::PageImageSet(pages) => pages.is_empty(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::PlainText(_) => "plain-text",
            Self::SemanticHtml(_) => "semantic-html",
            Self::PageImageSet(_) => "page-images",
        }
    }
}

/// Placeholder used when extraction produced no text.
pub fn empty_content_placeholder(name: &str) -> String {
    format!(
        "[No text content could be extracted from {name}]\n\n\
         This may be because:\n\
         - The file is image-based (scanned document)\n\
         - The file is encrypted or protected\n\
         - The file format is not fully supported for text extraction"
    )
}

/// Placeholder used when an extractor failed outright.
pub fn extraction_failed_placeholder(name: &str) -> String {
    format!(
        "[Content from {name}]\n\n\
         This file could not be fully read for conversion.\n\
         Basic text extraction was attempted."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_text_is_empty() {
        assert!(IntermediateContent::PlainText(" \n\t".into()).is_empty());
        assert!(!IntermediateContent::SemanticHtml("<p>x</p>".into()).is_empty());
        assert!(IntermediateContent::PageImageSet(Vec::new()).is_empty());
    }

    #[test]
    fn placeholder_names_the_file() {
        let text = empty_content_placeholder("scan.pdf");
        assert!(text.starts_with("[No text content could be extracted from scan.pdf]"));
        assert!(text.contains("- The file is encrypted or protected"));
    }
}
