// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Converter configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum accepted source size for conversion (100 MiB).
pub const MAX_SOURCE_BYTES: u64 = 100 * 1024 * 1024;
/// Maximum accepted image size for OCR (10 MiB).
pub const MAX_OCR_BYTES: u64 = 10 * 1024 * 1024;

/// Tunable limits and output settings for the conversion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Largest source file accepted for conversion.
    pub max_source_bytes: u64,
    /// Largest image accepted for OCR.
    pub max_ocr_bytes: u64,
    /// PDF pages rendered when producing an image from a PDF.
    pub max_rendered_pages: usize,
    /// Render scale factor for PDF pages.
    pub render_scale: f32,
    /// Page size for generated PDFs.
    pub paper_size: crate::PaperSize,
    /// JPEG output quality (1-100).
    pub jpeg_quality: u8,
    /// Characters of body text per generated slide.
    pub slide_char_budget: usize,
    /// Default OCR language code.
    pub ocr_language: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_source_bytes: MAX_SOURCE_BYTES,
            max_ocr_bytes: MAX_OCR_BYTES,
            max_rendered_pages: 20,
            render_scale: 2.0,
            paper_size: crate::PaperSize::A4,
            jpeg_quality: 92,
            slide_char_budget: 1500,
            ocr_language: "eng".into(),
        }
    }
}

impl ConverterConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ConverterConfig =
            serde_json::from_str(r#"{"max_rendered_pages": 5}"#).expect("valid config");
        assert_eq!(config.max_rendered_pages, 5);
        assert_eq!(config.max_source_bytes, MAX_SOURCE_BYTES);
        assert_eq!(config.ocr_language, "eng");
    }
}
