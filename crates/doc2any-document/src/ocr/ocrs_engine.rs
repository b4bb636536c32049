// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pure-Rust OCR via `ocrs`, with neural network models executed by `rten`.
//
// # Model Setup
//
// The engine needs two model files in one directory:
//
// - `text-detection.rten` locates text regions.
// - `text-recognition.rten` decodes characters in each region.
//
// Running `ocrs-cli` once downloads both into `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is where this engine looks by default.
//
// The recognition model covers Latin script only; other language codes are
// accepted with a warning.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use doc2any_core::error::{Doc2AnyError, Result};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument, warn};

use super::{Recognition, RecognitionEngine};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
pub fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where the two model files live.
#[derive(Debug, Clone)]
pub struct OcrsConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrsConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrsConfig {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(Doc2AnyError::CodecUnavailable(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Both model files are present in the default cache directory.
pub fn models_available() -> bool {
    OcrsConfig::default().validate().is_ok()
}

/// `ocrs` engine. Models load on first use and are kept for later requests.
pub struct OcrsEngine {
    config: OcrsConfig,
    engine: OnceLock<OcrEngine>,
}

impl OcrsEngine {
    pub fn new(config: OcrsConfig) -> Self {
        Self {
            config,
            engine: OnceLock::new(),
        }
    }

    fn engine(&self) -> Result<&OcrEngine> {
        if let Some(engine) = self.engine.get() {
            return Ok(engine);
        }
        let engine = load_engine(&self.config)?;
        Ok(self.engine.get_or_init(|| engine))
    }
}

#[instrument(skip_all, fields(
    detection = %config.detection_model_path.display(),
    recognition = %config.recognition_model_path.display(),
))]
fn load_engine(config: &OcrsConfig) -> Result<OcrEngine> {
    config.validate()?;

    info!("Loading OCR detection model");
    let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
        Doc2AnyError::OcrError(format!(
            "failed to load detection model from {}: {}",
            config.detection_model_path.display(),
            err
        ))
    })?;

    info!("Loading OCR recognition model");
    let recognition_model = Model::load_file(&config.recognition_model_path).map_err(|err| {
        Doc2AnyError::OcrError(format!(
            "failed to load recognition model from {}: {}",
            config.recognition_model_path.display(),
            err
        ))
    })?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|err| Doc2AnyError::OcrError(format!("failed to initialise OCR engine: {}", err)))
}

impl RecognitionEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn initialize(&self) -> Result<()> {
        self.engine().map(|_| ())
    }

    fn load_language(&self, language: &str) -> Result<()> {
        if language != "eng" {
            warn!(language, "ocrs recognises Latin script only");
        }
        Ok(())
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(
        &self,
        image: &DynamicImage,
        _language: &str,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<Recognition> {
        let engine = self.engine()?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            Doc2AnyError::OcrError(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = engine
            .prepare_input(source)
            .map_err(|err| Doc2AnyError::OcrError(format!("OCR preprocessing failed: {}", err)))?;
        on_progress(20);

        let words = engine
            .detect_words(&input)
            .map_err(|err| Doc2AnyError::OcrError(format!("word detection failed: {}", err)))?;
        let lines = engine.find_text_lines(&input, &words);
        debug!(words = words.len(), lines = lines.len(), "Text lines found");
        on_progress(50);

        let recognised = engine
            .recognize_text(&input, &lines)
            .map_err(|err| Doc2AnyError::OcrError(format!("line recognition failed: {}", err)))?;

        let text = recognised
            .iter()
            .flatten()
            .map(|line| line.to_string())
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        // ocrs reports no confidence scores.
        Ok(Recognition {
            text,
            confidence: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_dir() {
        let config = OcrsConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn missing_models_are_codec_unavailable() {
        let engine = OcrsEngine::new(OcrsConfig::from_dir("/nonexistent/path/ocr-models"));
        assert!(matches!(
            engine.initialize(),
            Err(Doc2AnyError::CodecUnavailable(_))
        ));
    }
}
