// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Doc2Any conversion pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Doc2AnyError, Result};

/// Unique identifier for a conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse content family of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Document,
    Spreadsheet,
    Presentation,
    Image,
    Text,
}

impl ContentKind {
    /// Short tag shown next to a format in listings.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Document => "[DOC]",
            Self::Spreadsheet => "[SHEET]",
            Self::Presentation => "[SLIDES]",
            Self::Image => "[IMG]",
            Self::Text => "[TEXT]",
        }
    }
}

/// Every file format accepted as a conversion source or produced as a target.
///
/// Extensions outside this set are rejected at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Pdf,
    Doc,
    Docx,
    Odt,
    Txt,
    Rtf,
    Xls,
    Xlsx,
    Ppt,
    Pptx,
    Html,
    Csv,
    Jpg,
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
    Svg,
    Tiff,
    Tif,
    Ico,
}

impl Format {
    /// The full whitelist, in display order.
    pub const ALL: [Format; 22] = [
        Self::Pdf,
        Self::Doc,
        Self::Docx,
        Self::Odt,
        Self::Txt,
        Self::Rtf,
        Self::Xls,
        Self::Xlsx,
        Self::Ppt,
        Self::Pptx,
        Self::Html,
        Self::Csv,
        Self::Jpg,
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::Bmp,
        Self::Webp,
        Self::Svg,
        Self::Tiff,
        Self::Tif,
        Self::Ico,
    ];

    /// Parse a file extension (case-insensitive, leading dot tolerated).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Canonical lowercase extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Odt => "odt",
            Self::Txt => "txt",
            Self::Rtf => "rtf",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Ppt => "ppt",
            Self::Pptx => "pptx",
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
            Self::Svg => "svg",
            Self::Tiff => "tiff",
            Self::Tif => "tif",
            Self::Ico => "ico",
        }
    }

    /// Extension written on converted output. ODT targets are emitted as a
    /// single flat XML document.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Self::Odt => "fodt",
            other => other.extension(),
        }
    }

    /// MIME type of a file in this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Doc => "application/msword",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Odt => "application/vnd.oasis.opendocument.text",
            Self::Txt => "text/plain",
            Self::Rtf => "application/rtf",
            Self::Xls => "application/vnd.ms-excel",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Ppt => "application/vnd.ms-powerpoint",
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Html => "text/html",
            Self::Csv => "text/csv",
            Self::Jpg | Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
            Self::Svg => "image/svg+xml",
            Self::Tiff | Self::Tif => "image/tiff",
            Self::Ico => "image/x-icon",
        }
    }

    /// MIME type of converted output in this format.
    pub fn output_mime_type(&self) -> &'static str {
        match self {
            Self::Odt => "application/vnd.oasis.opendocument.text-flat-xml",
            other => other.mime_type(),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Pdf | Self::Doc | Self::Docx | Self::Odt | Self::Rtf => ContentKind::Document,
            Self::Txt | Self::Html => ContentKind::Text,
            Self::Xls | Self::Xlsx | Self::Csv => ContentKind::Spreadsheet,
            Self::Ppt | Self::Pptx => ContentKind::Presentation,
            Self::Jpg
            | Self::Jpeg
            | Self::Png
            | Self::Gif
            | Self::Bmp
            | Self::Webp
            | Self::Svg
            | Self::Tiff
            | Self::Tif
            | Self::Ico => ContentKind::Image,
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind() == ContentKind::Image
    }

    pub fn icon(&self) -> &'static str {
        self.kind().icon()
    }

    /// Whether converted output in this format is a pixel image.
    pub fn is_raster_target(&self) -> bool {
        matches!(
            self,
            Self::Jpg | Self::Jpeg | Self::Png | Self::Gif | Self::Bmp | Self::Webp | Self::Ico
        )
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for Format {
    type Err = Doc2AnyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s).ok_or_else(|| Doc2AnyError::UnsupportedExtension(s.to_string()))
    }
}

/// A selected input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub filename: String,
    pub size: u64,
    /// Lowercased substring after the final `.` of the filename.
    pub extension: String,
    pub format: Format,
    pub kind: ContentKind,
}

impl SourceDescriptor {
    /// Describe a selected file, rejecting extensions outside the whitelist.
    pub fn new(filename: impl Into<String>, size: u64) -> Result<Self> {
        let filename = filename.into();
        let extension = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => String::new(),
        };
        let format = Format::from_extension(&extension).ok_or_else(|| {
            Doc2AnyError::UnsupportedExtension(if extension.is_empty() {
                filename.clone()
            } else {
                extension.clone()
            })
        })?;
        Ok(Self {
            filename,
            size,
            extension,
            format,
            kind: format.kind(),
        })
    }

    /// Filename with its final extension removed.
    pub fn base_name(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((base, _)) => base,
            None => &self.filename,
        }
    }

    /// `{base}_converted.{ext}` for the given target.
    pub fn output_name(&self, target: Format) -> String {
        format!("{}_converted.{}", self.base_name(), target.output_extension())
    }
}

/// A validated conversion request. Only produced by the validation step, so
/// the target is always present in the source format's target list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub id: RequestId,
    pub source: SourceDescriptor,
    pub target: Format,
}

/// Image-preserving special cases, tried before generic extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreservingPath {
    /// Image source to image or PDF target.
    ImageRaster,
    /// PDF pages rendered to a stacked raster image.
    PdfToImage,
    /// PDF to DOCX keeping embedded images.
    PdfToDocx,
    /// DOCX to PDF keeping embedded images.
    DocxToPdf,
}

impl PreservingPath {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ImageRaster => "image-raster",
            Self::PdfToImage => "pdf-to-image",
            Self::PdfToDocx => "pdf-to-docx",
            Self::DocxToPdf => "docx-to-pdf",
        }
    }
}

/// Which route produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionRoute {
    Standard,
    ImagePreserving(PreservingPath),
}

/// Encoded output of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub data: Vec<u8>,
    pub file_name: String,
    pub target: Format,
    pub route: ConversionRoute,
    /// User-visible notices raised along the way (e.g. page truncation).
    pub notices: Vec<String>,
}

impl ConversionResult {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn extension(&self) -> &'static str {
        self.target.output_extension()
    }

    pub fn mime_type(&self) -> &'static str {
        self.target.output_mime_type()
    }
}

/// Text recognised from an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    /// Mean recognition confidence, 0–100, when the engine reports one.
    pub confidence: Option<f32>,
    pub source_name: String,
}

impl OcrResult {
    /// Promote the recognised text into a plain-text source named
    /// `{base}_ocr.txt`, ready to feed back into a conversion.
    pub fn into_source(self) -> (SourceDescriptor, Vec<u8>) {
        let base = match self.source_name.rsplit_once('.') {
            Some((base, _)) => base,
            None => self.source_name.as_str(),
        };
        let data = self.text.into_bytes();
        let descriptor = SourceDescriptor {
            filename: format!("{base}_ocr.txt"),
            size: data.len() as u64,
            extension: "txt".into(),
            format: Format::Txt,
            kind: ContentKind::Text,
        };
        (descriptor, data)
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height), portrait.
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions with width and height swapped.
    pub fn landscape_mm(&self) -> (u32, u32) {
        let (w, h) = self.dimensions_mm();
        (h, w)
    }
}

/// Sink for successful-conversion counters.
pub trait ConversionRecorder {
    /// Add `files` conversions totalling `bytes` source bytes.
    fn record_conversion(&self, files: u64, bytes: u64) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(Format::from_extension("PDF"), Some(Format::Pdf));
        assert_eq!(Format::from_extension(".Docx"), Some(Format::Docx));
        assert_eq!(Format::from_extension("exe"), None);
    }

    #[test]
    fn icon_follows_content_kind() {
        assert_eq!(Format::Xlsx.icon(), "[SHEET]");
        assert_eq!(Format::Svg.icon(), Format::Png.icon());
    }

    #[test]
    fn whitelist_has_twenty_two_entries() {
        assert_eq!(Format::ALL.len(), 22);
        for format in Format::ALL {
            assert_eq!(Format::from_extension(format.extension()), Some(format));
        }
    }

    #[test]
    fn descriptor_rejects_unknown_extension() {
        let err = SourceDescriptor::new("setup.exe", 10).expect_err("exe must be rejected");
        assert!(matches!(err, Doc2AnyError::UnsupportedExtension(ext) if ext == "exe"));
        assert!(SourceDescriptor::new("README", 10).is_err());
    }

    #[test]
    fn descriptor_lowercases_extension() {
        let source = SourceDescriptor::new("Report.Final.CSV", 42).expect("csv is valid");
        assert_eq!(source.extension, "csv");
        assert_eq!(source.format, Format::Csv);
        assert_eq!(source.kind, ContentKind::Spreadsheet);
        assert_eq!(source.base_name(), "Report.Final");
    }

    #[test]
    fn output_name_uses_flat_odt_extension() {
        let source = SourceDescriptor::new("letter.docx", 1).expect("docx is valid");
        assert_eq!(source.output_name(Format::Pdf), "letter_converted.pdf");
        assert_eq!(source.output_name(Format::Odt), "letter_converted.fodt");
    }

    #[test]
    fn ocr_result_becomes_text_source() {
        let result = OcrResult {
            text: "hello".into(),
            confidence: Some(91.5),
            source_name: "scan.png".into(),
        };
        let (source, data) = result.into_source();
        assert_eq!(source.filename, "scan_ocr.txt");
        assert_eq!(source.format, Format::Txt);
        assert_eq!(source.size, 5);
        assert_eq!(data, b"hello");
    }
}
