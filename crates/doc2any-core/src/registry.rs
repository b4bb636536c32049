// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format registry — the static conversion matrix and input whitelists.
//
// All tables are `'static` and read-only; lookups are pure.

use crate::error::{Doc2AnyError, Result};
use crate::types::{Format, SourceDescriptor};

use Format::*;

/// Targets offered for an extension with no matrix entry.
pub const DEFAULT_TARGETS: &[Format] = &[Pdf, Txt, Docx, Html];

/// Extensions accepted by the OCR path.
pub const OCR_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "bmp", "webp"];

/// Ordered list of valid targets for a source format.
pub fn valid_targets(source: Format) -> &'static [Format] {
    match source {
        Pdf => &[Docx, Txt, Odt, Rtf, Html, Xlsx, Pptx, Csv, Jpg, Png],
        Doc => &[Pdf, Docx, Txt, Odt, Rtf, Html, Xlsx, Pptx, Csv],
        Docx => &[Pdf, Txt, Odt, Rtf, Html, Xlsx, Pptx, Csv],
        Odt => &[Pdf, Docx, Txt, Rtf, Html, Xlsx, Pptx, Csv],
        Txt => &[Pdf, Docx, Odt, Rtf, Html, Xlsx, Pptx, Csv],
        Rtf => &[Pdf, Docx, Txt, Odt, Html, Xlsx, Pptx, Csv],
        Xls => &[Pdf, Xlsx, Html, Docx, Txt, Csv],
        Xlsx => &[Pdf, Html, Docx, Txt, Csv],
        Ppt => &[Pdf, Pptx, Docx, Txt, Csv],
        Pptx => &[Pdf, Docx, Txt, Csv],
        Html => &[Pdf, Docx, Txt, Odt, Rtf, Csv],
        Csv => &[Pdf, Docx, Txt, Xlsx, Html, Odt, Rtf],
        Jpg | Jpeg => &[Png, Webp, Gif, Bmp, Ico, Pdf],
        Png => &[Jpg, Webp, Gif, Bmp, Ico, Pdf],
        Gif => &[Jpg, Png, Webp, Bmp, Ico, Pdf],
        Bmp => &[Jpg, Png, Webp, Gif, Ico, Pdf],
        Webp => &[Jpg, Png, Gif, Bmp, Ico, Pdf],
        Svg | Tiff | Tif | Ico => &[Jpg, Png, Webp, Gif, Bmp, Pdf],
    }
}

/// Targets for a raw extension string, falling back to [`DEFAULT_TARGETS`].
pub fn targets_for_extension(ext: &str) -> &'static [Format] {
    match Format::from_extension(ext) {
        Some(format) => valid_targets(format),
        None => DEFAULT_TARGETS,
    }
}

pub fn is_image_format(ext: &str) -> bool {
    Format::from_extension(ext).is_some_and(|f| f.is_image())
}

pub fn is_valid_input(ext: &str) -> bool {
    Format::from_extension(ext).is_some()
}

pub fn is_valid_ocr_input(ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    OCR_EXTENSIONS.contains(&ext.as_str())
}

/// Reject a source that exceeds `max_bytes`.
pub fn check_size(source: &SourceDescriptor, max_bytes: u64) -> Result<()> {
    if source.size > max_bytes {
        return Err(Doc2AnyError::FileTooLarge {
            size: source.size,
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Check the size limit and that `target` is offered for the source format.
pub fn validate_request(source: &SourceDescriptor, target: Format, max_bytes: u64) -> Result<()> {
    check_size(source, max_bytes)?;
    if !valid_targets(source.format).contains(&target) {
        return Err(Doc2AnyError::UnsupportedConversion {
            from: source.extension.clone(),
            to: target.extension().to_string(),
        });
    }
    Ok(())
}
