// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract command-line engine.
//
// The image is written to a temporary PNG and `tesseract <png> stdout -l
// <lang> tsv` is run on it. The TSV word rows give both the text layout and
// per-word confidences.

use std::io::ErrorKind;
use std::process::{Command, Output};

use doc2any_core::error::{Doc2AnyError, Result};
use image::{DynamicImage, ImageFormat};
use tracing::{debug, instrument};

use super::{Recognition, RecognitionEngine};

const BINARY: &str = "tesseract";

/// Runs the `tesseract` binary found on `PATH` (or at an explicit path).
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self {
            binary: BINARY.to_string(),
        }
    }

    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let output = Command::new(&self.binary).args(args).output().map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                Doc2AnyError::CodecUnavailable(format!(
                    "{} not found (install tesseract-ocr)",
                    self.binary
                ))
            } else {
                Doc2AnyError::Io(err)
            }
        })?;
        if !output.status.success() {
            return Err(Doc2AnyError::OcrError(format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn initialize(&self) -> Result<()> {
        self.run(&["--version"]).map(|_| ())
    }

    fn load_language(&self, language: &str) -> Result<()> {
        let output = self.run(&["--list-langs"])?;
        // Some builds print the list on stderr.
        let listing = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let installed = installed_languages(&listing);
        // `eng+deu` needs every component.
        match language.split('+').find(|lang| !installed.contains(lang)) {
            Some(missing) => Err(Doc2AnyError::OcrError(format!(
                "tesseract language '{missing}' is not installed"
            ))),
            None => Ok(()),
        }
    }

    #[instrument(
        skip(self, image, on_progress),
        fields(width = image.width(), height = image.height())
    )]
    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        on_progress: &mut dyn FnMut(u8),
    ) -> Result<Recognition> {
        let file = tempfile::Builder::new().suffix(".png").tempfile()?;
        image
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(|err| Doc2AnyError::ImageError(format!("failed to stage OCR input: {err}")))?;
        on_progress(10);

        let path = file.path().to_string_lossy().into_owned();
        let output = self.run(&[path.as_str(), "stdout", "-l", language, "tsv"])?;
        let recognition = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!(
            chars = recognition.text.len(),
            confidence = ?recognition.confidence,
            "tesseract finished"
        );
        Ok(recognition)
    }
}

/// Language codes from `tesseract --list-langs` output.
fn installed_languages(listing: &str) -> Vec<&str> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("List of"))
        .collect()
}

/// Rebuild text from TSV word rows (level 5). Words on one line are joined
/// by spaces, lines by newlines, and a new paragraph or block starts after a
/// blank line. Confidence is the mean over words with a non-negative score.
pub fn parse_tsv(tsv: &str) -> Recognition {
    let mut text = String::new();
    let mut last: Option<(&str, &str, &str, &str)> = None;
    let (mut total, mut words) = (0.0f32, 0u32);

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let word = cols[11].trim();
        if word.is_empty() {
            continue;
        }
        let position = (cols[1], cols[2], cols[3], cols[4]);
        match last {
            Some(prev) if prev == position => text.push(' '),
            Some(prev) if (prev.0, prev.1, prev.2) == (position.0, position.1, position.2) => {
                text.push('\n')
            }
            Some(_) => text.push_str("\n\n"),
            None => {}
        }
        text.push_str(word);
        last = Some(position);

        match cols[10].parse::<f32>() {
            Ok(conf) if conf >= 0.0 => {
                total += conf;
                words += 1;
            }
            _ => {}
        }
    }

    Recognition {
        text,
        confidence: (words > 0).then(|| total / words as f32),
    }
}
