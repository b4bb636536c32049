// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Doc2Any.

use thiserror::Error;

/// Top-level error type for all Doc2Any operations.
#[derive(Debug, Error)]
pub enum Doc2AnyError {
    // -- Validation errors --
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("file is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("cannot convert {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    // -- Extraction errors --
    #[error("codec unavailable: {0}")]
    CodecUnavailable(String),

    #[error("content extraction failed: {0}")]
    Extraction(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("package archive error: {0}")]
    Archive(String),

    #[error("malformed XML: {0}")]
    Xml(String),

    // -- Encoding errors --
    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("conversion cancelled")]
    Cancelled,

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broad grouping used when deciding whether a failure is recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    Extraction,
    Encoding,
    Other,
}

impl Doc2AnyError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnsupportedExtension(_)
            | Self::FileTooLarge { .. }
            | Self::UnsupportedConversion { .. } => ErrorClass::Validation,
            Self::CodecUnavailable(_)
            | Self::Extraction(_)
            | Self::PdfError(_)
            | Self::ImageError(_)
            | Self::Archive(_)
            | Self::Xml(_) => ErrorClass::Extraction,
            Self::Encoding(_) => ErrorClass::Encoding,
            _ => ErrorClass::Other,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, Doc2AnyError>;
