// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR adapter — validates an image source, decodes it and hands it to a
// recognition engine, reporting engine phases as progress.
//
// Two engines exist: the Tesseract command-line tool (always compiled) and
// the pure-Rust `ocrs` engine behind the `ocr` feature.

#[cfg(feature = "ocr")]
pub mod ocrs_engine;
pub mod tesseract;

use doc2any_core::error::{Doc2AnyError, Result};
use doc2any_core::{ConverterConfig, OcrResult, SourceDescriptor, registry};
use image::DynamicImage;
use tracing::{info, instrument, warn};

use crate::image::ImageProcessor;
use crate::progress::{CancelToken, OcrPhase, ProgressEvent, ProgressSink};

pub use tesseract::TesseractEngine;

/// Text and mean confidence returned by an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// Mean confidence, 0–100.
    pub confidence: Option<f32>,
}

/// A text recognition backend.
pub trait RecognitionEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Make sure the engine can run at all (binary present, models loaded).
    fn initialize(&self) -> Result<()>;

    /// Make sure `language` can be recognised.
    fn load_language(&self, language: &str) -> Result<()>;

    /// Recognise text, reporting percent complete through `on_progress` when
    /// the engine knows it.
    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<Recognition>;
}

/// Runs OCR requests against one engine.
pub struct OcrAdapter {
    engine: Box<dyn RecognitionEngine>,
    max_bytes: u64,
}

impl OcrAdapter {
    pub fn new(engine: Box<dyn RecognitionEngine>, config: &ConverterConfig) -> Self {
        Self {
            engine,
            max_bytes: config.max_ocr_bytes,
        }
    }

    /// The `ocrs` engine when compiled in and its models are cached,
    /// otherwise Tesseract.
    pub fn with_default_engine(config: &ConverterConfig) -> Self {
        Self::new(default_engine(), config)
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Recognise the text in an image source.
    #[instrument(
        skip(self, data, progress, cancel),
        fields(
            source = %source.filename,
            engine = self.engine.name(),
            bytes_len = data.len()
        )
    )]
    pub fn recognize(
        &self,
        source: &SourceDescriptor,
        data: &[u8],
        language: &str,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<OcrResult> {
        if !registry::is_valid_ocr_input(&source.extension) {
            return Err(Doc2AnyError::UnsupportedExtension(source.extension.clone()));
        }
        registry::check_size(source, self.max_bytes)?;

        progress.emit(ProgressEvent::Ocr(OcrPhase::Initializing));
        self.engine.initialize()?;
        cancel.check()?;

        progress.emit(ProgressEvent::Ocr(OcrPhase::LoadingLanguage));
        self.engine.load_language(language)?;
        cancel.check()?;

        let image = ImageProcessor::decode(source.format, data)?.into_dynamic();
        progress.emit(ProgressEvent::Ocr(OcrPhase::Recognizing { percent: 0 }));
        let recognition = self.engine.recognize(&image, language, &mut |percent| {
            progress.emit(ProgressEvent::Ocr(OcrPhase::Recognizing {
                percent: percent.min(100),
            }))
        })?;
        cancel.check()?;
        progress.emit(ProgressEvent::Ocr(OcrPhase::Recognizing { percent: 100 }));

        let text = recognition.text.trim().to_string();
        if text.is_empty() {
            warn!("No text recognised");
        }
        info!(
            chars = text.chars().count(),
            confidence = ?recognition.confidence,
            "OCR complete"
        );
        Ok(OcrResult {
            text,
            confidence: recognition.confidence,
            source_name: source.filename.clone(),
        })
    }
}

pub fn default_engine() -> Box<dyn RecognitionEngine> {
    #[cfg(feature = "ocr")]
    {
        if ocrs_engine::models_available() {
            return Box::new(ocrs_engine::OcrsEngine::new(ocrs_engine::OcrsConfig::default()));
        }
    }
    Box::new(TesseractEngine::new())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extract::docx::tests::tiny_png;
    use std::sync::Mutex;

    /// Engine returning canned text, remembering the language it was given.
    pub(crate) struct CannedEngine {
        pub(crate) text: &'static str,
        pub(crate) languages: Mutex<Vec<String>>,
    }

    impl CannedEngine {
        pub(crate) fn new(text: &'static str) -> Self {
            Self {
                text,
                languages: Mutex::new(Vec::new()),
            }
        }
    }

    impl RecognitionEngine for CannedEngine {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn initialize(&self) -> Result<()> {
            Ok(())
        }

        fn load_language(&self, language: &str) -> Result<()> {
            self.languages.lock().unwrap().push(language.to_string());
            Ok(())
        }

        fn recognize(
            &self,
            _image: &DynamicImage,
            _language: &str,
            on_progress: &mut dyn FnMut(u8),
        ) -> Result<Recognition> {
            on_progress(50);
            Ok(Recognition {
                text: format!("  {}\n", self.text),
                confidence: Some(87.5),
            })
        }
    }

    fn adapter(text: &'static str) -> OcrAdapter {
        OcrAdapter::new(Box::new(CannedEngine::new(text)), &ConverterConfig::default())
    }

    #[test]
    fn recognizes_and_reports_phases() {
        let png = tiny_png();
        let source = SourceDescriptor::new("scan.png", png.len() as u64).unwrap();
        let (progress, mut rx) = ProgressSink::channel();

        let result = adapter("Invoice 42")
            .recognize(&source, &png, "deu", &progress, &CancelToken::new())
            .unwrap();
        assert_eq!(result.text, "Invoice 42");
        assert_eq!(result.confidence, Some(87.5));
        assert_eq!(result.source_name, "scan.png");

        let mut phases = Vec::new();
        while let Ok(ProgressEvent::Ocr(phase)) = rx.try_recv() {
            phases.push(phase);
        }
        assert_eq!(
            phases,
            vec![
                OcrPhase::Initializing,
                OcrPhase::LoadingLanguage,
                OcrPhase::Recognizing { percent: 0 },
                OcrPhase::Recognizing { percent: 50 },
                OcrPhase::Recognizing { percent: 100 },
            ]
        );
    }

    #[test]
    fn result_promotes_to_text_source() {
        let png = tiny_png();
        let source = SourceDescriptor::new("scan.png", png.len() as u64).unwrap();
        let result = adapter("Hello")
            .recognize(&source, &png, "eng", &ProgressSink::disabled(), &CancelToken::new())
            .unwrap();
        let (descriptor, data) = result.into_source();
        assert_eq!(descriptor.filename, "scan_ocr.txt");
        assert_eq!(data, b"Hello");
    }

    #[test]
    fn rejects_non_ocr_formats() {
        let source = SourceDescriptor::new("vector.svg", 10).unwrap();
        let err = adapter("x")
            .recognize(&source, b"<svg/>", "eng", &ProgressSink::disabled(), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Doc2AnyError::UnsupportedExtension(_)));
    }

    #[test]
    fn rejects_oversized_images() {
        let source = SourceDescriptor::new("huge.png", 11 * 1024 * 1024).unwrap();
        let err = adapter("x")
            .recognize(&source, b"", "eng", &ProgressSink::disabled(), &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Doc2AnyError::FileTooLarge { .. }));
    }

    #[test]
    fn cancellation_stops_before_recognition() {
        let png = tiny_png();
        let source = SourceDescriptor::new("scan.png", png.len() as u64).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = adapter("x")
            .recognize(&source, &png, "eng", &ProgressSink::disabled(), &cancel)
            .unwrap_err();
        assert!(matches!(err, Doc2AnyError::Cancelled));
    }
}
