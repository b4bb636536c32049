// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress events and cancellation for conversions and OCR.
//
// Events flow over an unbounded tokio channel so a UI task can render them
// while the conversion runs on a blocking thread. Only real progress is
// reported: stage transitions, rendered pages and OCR phases.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use doc2any_core::error::{Doc2AnyError, Result};
use tokio::sync::mpsc;

/// Orchestrator states, in the order a successful conversion visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    ImagePreservingAttempt,
    Extracting,
    Encoding,
    Complete,
    Failed,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::ImagePreservingAttempt => "preserving images",
            Self::Extracting => "extracting content",
            Self::Encoding => "encoding output",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Rough completion percentage for display.
    pub fn percent(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Validating => 5,
            Self::ImagePreservingAttempt => 15,
            Self::Extracting => 30,
            Self::Encoding => 70,
            Self::Complete | Self::Failed => 100,
        }
    }
}

/// OCR engine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrPhase {
    Initializing,
    LoadingLanguage,
    Recognizing { percent: u8 },
}

/// Progress reported while a request runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The orchestrator entered a new state.
    Stage(Stage),
    /// A PDF page was rendered to an image (1-based).
    PageRendered { page: usize, total: usize },
    /// The OCR engine advanced.
    Ocr(OcrPhase),
    /// A user-visible notice, e.g. page truncation.
    Notice(String),
}

/// Sending half of a progress stream. A disabled sink drops every event.
#[derive(Debug, Clone, Default)]
pub struct ProgressSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSink {
    /// Create a connected sink and the receiver that observes it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Send an event. A dropped receiver is not an error.
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn stage(&self, stage: Stage) {
        self.emit(ProgressEvent::Stage(stage));
    }

    pub fn notice(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::Notice(message.into()));
    }
}

/// Shared cancellation flag, checked between pipeline stages and between
/// rendered pages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Doc2AnyError::Cancelled)
        } else {
            Ok(())
        }
    }
}
