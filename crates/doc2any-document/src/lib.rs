// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// doc2any-document — Content extraction, encoding and the conversion pipeline.
//
// Provides readers for every accepted source format, encoders for every
// output format, image-preserving shortcuts (raster-to-raster, PDF page
// rendering, picture-keeping DOCX/PDF paths), the conversion orchestrator
// and OCR adapters.

pub mod content;
pub mod encode;
pub mod extract;
pub mod html;
pub mod image;
pub mod ocr;
pub mod pipeline;
pub mod preserve;
pub mod progress;
pub mod render;

// Re-export the primary types so callers can use `doc2any_document::Converter` etc.
pub use content::IntermediateContent;
pub use encode::{EncodeContext, PdfWriter};
pub use extract::{DocxReader, PdfReader};
pub use self::image::ImageProcessor;
pub use ocr::{OcrAdapter, RecognitionEngine, TesseractEngine};
pub use pipeline::Converter;
pub use progress::{CancelToken, OcrPhase, ProgressEvent, ProgressSink, Stage};
pub use render::{PageRenderer, RenderedPages};

#[cfg(feature = "ocr")]
pub use ocr::ocrs_engine::OcrsEngine;
