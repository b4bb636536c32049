// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// A failed conversion surfaces exactly one of these to the user.

use crate::error::Doc2AnyError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying again may work.
    Transient,
    /// User must do something (pick another file, another format).
    ActionRequired,
    /// Cannot be fixed by retrying — damaged file, missing codec.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same request may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `Doc2AnyError` into a `HumanError`.
pub fn humanize_error(err: &Doc2AnyError) -> HumanError {
    match err {
        // -- Validation --
        Doc2AnyError::UnsupportedExtension(ext) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!(
                "Choose a document, spreadsheet, presentation or image file. (File type: {ext})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        Doc2AnyError::FileTooLarge { limit, .. } => HumanError {
            message: "This file is too large.".into(),
            suggestion: format!(
                "Files up to {} MB can be converted. Try splitting or compressing it first.",
                limit / (1024 * 1024)
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        Doc2AnyError::UnsupportedConversion { from, to } => HumanError {
            message: format!("A {from} file can't be turned into {to}."),
            suggestion: "Pick one of the target formats offered for this file.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Extraction --
        Doc2AnyError::CodecUnavailable(detail) => HumanError {
            message: "A component needed for this conversion isn't installed.".into(),
            suggestion: format!("Install the missing component and try again. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        Doc2AnyError::Extraction(_) | Doc2AnyError::Archive(_) | Doc2AnyError::Xml(_) => {
            HumanError {
                message: "We couldn't read the contents of this file.".into(),
                suggestion: "The file may be damaged or saved by an unusual program. Try opening and re-saving it first.".into(),
                retriable: false,
                severity: Severity::Permanent,
            }
        }

        Doc2AnyError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged or password protected. Try opening it in a PDF viewer first to check it works.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        Doc2AnyError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Encoding --
        Doc2AnyError::Encoding(_) => HumanError {
            message: "We couldn't create the converted file.".into(),
            suggestion: "Try a different target format.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        Doc2AnyError::OcrError(_) => HumanError {
            message: "Text recognition didn't work on this image.".into(),
            suggestion: "Try a sharper scan with good lighting, making sure the text is clear and in focus.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        Doc2AnyError::Cancelled => HumanError {
            message: "The conversion was cancelled.".into(),
            suggestion: "Start the conversion again when you're ready.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        Doc2AnyError::Database(_) => HumanError {
            message: "The conversion statistics couldn't be saved.".into(),
            suggestion: "Your converted file is unaffected. Check that the data directory is writable.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        Doc2AnyError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file to a different location first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: format!("Try again. ({io_err})"),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        Doc2AnyError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check config.json for typos, or delete it to go back to the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversize_mentions_limit_in_megabytes() {
        let human = humanize_error(&Doc2AnyError::FileTooLarge {
            size: 200 * 1024 * 1024,
            limit: 100 * 1024 * 1024,
        });
        assert!(human.suggestion.contains("100 MB"));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = Doc2AnyError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn pair_rejection_names_both_formats() {
        let human = humanize_error(&Doc2AnyError::UnsupportedConversion {
            from: "pptx".into(),
            to: "xlsx".into(),
        });
        assert!(human.message.contains("pptx"));
        assert!(human.message.contains("xlsx"));
    }
}
