// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal rendering of conversion and OCR progress events.

use std::time::Duration;

use doc2any_document::{OcrPhase, ProgressEvent};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc::UnboundedReceiver;

/// Drain `events` into a progress bar until the sender side is dropped.
/// Returns the notices seen along the way.
pub async fn render(mut events: UnboundedReceiver<ProgressEvent>, quiet: bool) -> Vec<String> {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    let template = "{spinner:.cyan} [{bar:40.green/238}] {pos:>3}%  {msg}";
    let style = ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(80));

    let mut notices = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            ProgressEvent::Stage(stage) => {
                bar.set_position(u64::from(stage.percent()));
                bar.set_message(stage.label());
            }
            ProgressEvent::PageRendered { page, total } => {
                bar.set_message(format!("rendered page {page}/{total}"));
            }
            ProgressEvent::Ocr(phase) => {
                let (percent, message) = ocr_display(phase);
                bar.set_position(percent);
                bar.set_message(message);
            }
            ProgressEvent::Notice(notice) => {
                bar.println(format!("note: {notice}"));
                notices.push(notice);
            }
        }
    }
    bar.finish_and_clear();
    notices
}

fn ocr_display(phase: OcrPhase) -> (u64, String) {
    match phase {
        OcrPhase::Initializing => (0, "starting OCR engine".into()),
        OcrPhase::LoadingLanguage => (10, "loading language data".into()),
        OcrPhase::Recognizing { percent } => (
            10 + u64::from(percent.min(100)) * 9 / 10,
            format!("recognising text ({percent}%)"),
        ),
    }
}
