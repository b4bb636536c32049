// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion orchestrator.
//
// One request walks Idle → Validating → (ImagePreservingAttempt)? →
// Extracting → Encoding → Complete, with Failed reachable from every step.
// Each transition is reported on the progress sink and cancellation is
// checked between steps.

use doc2any_core::error::{Doc2AnyError, Result};
use doc2any_core::{
    ConversionRecorder, ConversionResult, ConversionRoute, ConverterConfig, Format,
    SourceDescriptor, registry,
};
use tracing::{info, instrument, warn};

use crate::content::{self, IntermediateContent};
use crate::encode::{self, EncodeContext};
use crate::extract;
use crate::preserve::{self, Attempt};
use crate::progress::{CancelToken, ProgressSink, Stage};
use crate::render::{self, PageRenderer};

/// Runs conversions with one configuration, page renderer and optional
/// stats recorder.
pub struct Converter {
    config: ConverterConfig,
    renderer: Box<dyn PageRenderer>,
    recorder: Option<Box<dyn ConversionRecorder + Send>>,
}

impl Converter {
    /// A converter using the renderer this build provides and no recorder.
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            renderer: render::default_renderer(),
            recorder: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn PageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_recorder(mut self, recorder: Box<dyn ConversionRecorder + Send>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert `data` (the bytes of `source`) into `target`.
    ///
    /// On failure the error is returned and no partial output exists.
    #[instrument(
        skip(self, data, progress, cancel),
        fields(source = %source.filename, target = %target, bytes_len = data.len())
    )]
    pub fn convert(
        &self,
        source: &SourceDescriptor,
        data: &[u8],
        target: Format,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<ConversionResult> {
        progress.stage(Stage::Idle);
        match self.run(source, data, target, progress, cancel) {
            Ok(result) => {
                progress.stage(Stage::Complete);
                self.record(source);
                info!(
                    file = %result.file_name,
                    output_len = result.size(),
                    route = ?result.route,
                    "Conversion complete"
                );
                Ok(result)
            }
            Err(err) => {
                progress.stage(Stage::Failed);
                warn!(error = %err, "Conversion failed");
                Err(err)
            }
        }
    }

    fn run(
        &self,
        source: &SourceDescriptor,
        data: &[u8],
        target: Format,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<ConversionResult> {
        progress.stage(Stage::Validating);
        registry::validate_request(source, target, self.config.max_source_bytes)?;
        cancel.check()?;

        let ctx = EncodeContext::new(source.filename.clone(), &self.config);
        let file_name = source.output_name(target);

        if let Some(path) = preserve::select(source.format, target) {
            progress.stage(Stage::ImagePreservingAttempt);
            let attempt = Attempt {
                config: &self.config,
                encode: &ctx,
                renderer: self.renderer.as_ref(),
                progress,
                cancel,
            };
            match attempt.run(path, source, target, data) {
                Ok(Some(preserved)) => {
                    return Ok(ConversionResult {
                        data: preserved.data,
                        file_name,
                        target,
                        route: ConversionRoute::ImagePreserving(path),
                        notices: preserved.notices,
                    });
                }
                Ok(None) => info!(path = path.label(), "Image-preserving path not applicable"),
                Err(err) if is_fatal_preserving_error(&err, target) => return Err(err),
                Err(err) => warn!(
                    path = path.label(),
                    error = %err,
                    "Image-preserving path failed, using text route"
                ),
            }
            cancel.check()?;
        }

        progress.stage(Stage::Extracting);
        let content = self.extract(source, target, data)?;
        cancel.check()?;

        progress.stage(Stage::Encoding);
        let bytes = encode::encode(target, content, &ctx)?;
        if bytes.is_empty() {
            return Err(Doc2AnyError::Encoding(format!(
                "{target} encoder produced no output"
            )));
        }
        cancel.check()?;

        Ok(ConversionResult {
            data: bytes,
            file_name,
            target,
            route: ConversionRoute::Standard,
            notices: Vec::new(),
        })
    }

    /// Extract with the placeholder policy: a failing extractor yields a
    /// placeholder text unless the failure leaves nothing to fall back on.
    fn extract(
        &self,
        source: &SourceDescriptor,
        target: Format,
        data: &[u8],
    ) -> Result<IntermediateContent> {
        let content = match extract::extract(source, target, data) {
            Ok(content) => content,
            Err(err) if is_fatal_extraction_error(&err, source) => return Err(err),
            Err(err) => {
                warn!(error = %err, "Extraction failed, using placeholder text");
                return Ok(IntermediateContent::PlainText(
                    content::extraction_failed_placeholder(&source.filename),
                ));
            }
        };

        Ok(if content.is_empty() && !source.format.is_image() {
            info!("No text extracted, using placeholder text");
            IntermediateContent::PlainText(content::empty_content_placeholder(&source.filename))
        } else {
            content
        })
    }

    fn record(&self, source: &SourceDescriptor) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        if let Err(err) = recorder.record_conversion(1, source.size) {
            warn!(error = %err, "Failed to record conversion stats");
        }
    }
}

/// Raster targets have no text route to fall back to.
fn is_fatal_preserving_error(err: &Doc2AnyError, target: Format) -> bool {
    matches!(err, Doc2AnyError::Cancelled) || target.is_raster_target()
}

fn is_fatal_extraction_error(err: &Doc2AnyError, source: &SourceDescriptor) -> bool {
    matches!(
        err,
        Doc2AnyError::Cancelled | Doc2AnyError::CodecUnavailable(_)
    ) || source.format.is_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::docx::tests::{docx_with_image, docx_without_images, tiny_png};
    use crate::preserve::tests::FakeRenderer;
    use crate::progress::ProgressEvent;
    use doc2any_core::PreservingPath;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct MemoryRecorder(Arc<Mutex<Vec<(u64, u64)>>>);

    impl ConversionRecorder for MemoryRecorder {
        fn record_conversion(&self, files: u64, bytes: u64) -> Result<()> {
            self.0.lock().unwrap().push((files, bytes));
            Ok(())
        }
    }

    struct FailingRecorder;

    impl ConversionRecorder for FailingRecorder {
        fn record_conversion(&self, _files: u64, _bytes: u64) -> Result<()> {
            Err(Doc2AnyError::Database("disk full".into()))
        }
    }

    fn source(name: &str, data: &[u8]) -> SourceDescriptor {
        SourceDescriptor::new(name, data.len() as u64).unwrap()
    }

    fn quietly(
        converter: &Converter,
        name: &str,
        data: &[u8],
        target: Format,
    ) -> Result<ConversionResult> {
        let progress = ProgressSink::disabled();
        converter.convert(&source(name, data), data, target, &progress, &CancelToken::new())
    }

    fn stages(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<Stage> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ProgressEvent::Stage(stage) = event {
                out.push(stage);
            }
        }
        out
    }

    #[test]
    fn text_conversion_walks_every_stage() {
        let recorder = MemoryRecorder::default();
        let converter =
            Converter::new(ConverterConfig::default()).with_recorder(Box::new(recorder.clone()));
        let (progress, mut rx) = ProgressSink::channel();
        let data = b"Hello\n\nWorld";

        let result = converter
            .convert(&source("notes.txt", data), data, Format::Html, &progress, &CancelToken::new())
            .unwrap();

        assert_eq!(result.file_name, "notes_converted.html");
        assert_eq!(result.route, ConversionRoute::Standard);
        assert!(String::from_utf8(result.data).unwrap().contains("<p>World</p>"));
        assert_eq!(
            stages(&mut rx),
            vec![
                Stage::Idle,
                Stage::Validating,
                Stage::Extracting,
                Stage::Encoding,
                Stage::Complete
            ]
        );
        assert_eq!(*recorder.0.lock().unwrap(), vec![(1, data.len() as u64)]);
    }

    #[test]
    fn unsupported_pair_fails_before_extraction() {
        let converter = Converter::new(ConverterConfig::default());
        let (progress, mut rx) = ProgressSink::channel();
        let data = b"a,b\n";
        let err = converter
            .convert(&source("a.csv", data), data, Format::Pptx, &progress, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, Doc2AnyError::UnsupportedConversion { .. }));
        assert_eq!(stages(&mut rx), vec![Stage::Idle, Stage::Validating, Stage::Failed]);
    }

    #[test]
    fn oversized_source_is_rejected() {
        let config = ConverterConfig {
            max_source_bytes: 4,
            ..ConverterConfig::default()
        };
        let data = b"too long";
        let err = quietly(&Converter::new(config), "a.txt", data, Format::Html).unwrap_err();
        assert!(matches!(err, Doc2AnyError::FileTooLarge { size: 8, limit: 4 }));
    }

    #[test]
    fn cancelled_request_fails() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let data = b"text";
        let err = Converter::new(ConverterConfig::default())
            .convert(&source("a.txt", data), data, Format::Pdf, &ProgressSink::disabled(), &cancel)
            .unwrap_err();
        assert!(matches!(err, Doc2AnyError::Cancelled));
    }

    #[test]
    fn broken_package_becomes_placeholder() {
        let data = b"not a zip at all";
        let converter = Converter::new(ConverterConfig::default());
        let result = quietly(&converter, "broken.docx", data, Format::Txt).unwrap();
        let text = String::from_utf8(result.data).unwrap();
        assert!(text.contains("[Content from broken.docx]"));
    }

    #[test]
    fn corrupt_image_is_fatal() {
        let data = b"definitely not a png";
        let converter = Converter::new(ConverterConfig::default());
        let err = quietly(&converter, "bad.png", data, Format::Jpg).unwrap_err();
        assert!(matches!(err, Doc2AnyError::ImageError(_)));
    }

    #[test]
    fn docx_with_pictures_takes_preserving_route() {
        let converter = Converter::new(ConverterConfig::default());
        let plain = docx_without_images();
        let result = quietly(&converter, "a.docx", &plain, Format::Pdf).unwrap();
        assert_eq!(result.route, ConversionRoute::Standard);

        let pictured = docx_with_image();
        let result = quietly(&converter, "b.docx", &pictured, Format::Pdf).unwrap();
        assert_eq!(
            result.route,
            ConversionRoute::ImagePreserving(PreservingPath::DocxToPdf)
        );
        assert!(result.data.starts_with(b"%PDF"));
    }

    #[test]
    fn raster_target_without_renderer_is_fatal() {
        let converter = Converter::new(ConverterConfig::default())
            .with_renderer(Box::new(render::UnavailableRenderer));
        let data = b"%PDF-1.4";
        let err = quietly(&converter, "a.pdf", data, Format::Png).unwrap_err();
        assert!(matches!(err, Doc2AnyError::CodecUnavailable(_)));
    }

    #[test]
    fn pdf_pages_render_with_progress() {
        let converter = Converter::new(ConverterConfig::default())
            .with_renderer(Box::new(FakeRenderer { pages: 3 }));
        let (progress, mut rx) = ProgressSink::channel();
        let data = b"%PDF-1.4";
        let result = converter
            .convert(&source("a.pdf", data), data, Format::Jpg, &progress, &CancelToken::new())
            .unwrap();
        assert!(result.notices.is_empty());
        assert_eq!(result.file_name, "a_converted.jpg");

        let mut pages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ProgressEvent::PageRendered { page, total } = event {
                pages.push((page, total));
            }
        }
        assert_eq!(pages, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn recorder_failure_is_not_fatal() {
        let converter =
            Converter::new(ConverterConfig::default()).with_recorder(Box::new(FailingRecorder));
        let png = tiny_png();
        let result = quietly(&converter, "dot.png", &png, Format::Bmp).unwrap();
        assert_eq!(
            result.route,
            ConversionRoute::ImagePreserving(PreservingPath::ImageRaster)
        );
    }
}
