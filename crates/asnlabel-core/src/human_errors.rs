// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the CLI and HTTP front ends.
//
// Every generation error is mapped to plain English with a suggestion, plus
// the HTTP status and process exit code the front ends report it with.

use crate::error::LabelError;

/// Severity of an error from the caller's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Environment hiccup (disk, temp dir); trying again may succeed.
    Transient,
    /// The caller must change the request.
    ActionRequired,
    /// The request can never succeed as given.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the caller should try.
    pub suggestion: String,
    /// Whether repeating the identical request could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    /// HTTP status code the server answers with.
    pub fn http_status(&self) -> u16 {
        match self.severity {
            Severity::Transient => 500,
            Severity::ActionRequired | Severity::Permanent => 400,
        }
    }

    /// Process exit code the CLI terminates with.
    pub fn exit_code(&self) -> i32 {
        match self.severity {
            Severity::Transient => 1,
            Severity::ActionRequired | Severity::Permanent => 2,
        }
    }
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `LabelError` into a `HumanError`.
pub fn humanize_error(err: &LabelError) -> HumanError {
    match err {
        LabelError::InvalidRequest(detail) => HumanError {
            message: "The label request is not valid.".into(),
            suggestion: format!("Check the start number, page count and padding. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LabelError::Encoding { identifier, reason } => HumanError {
            message: format!("The label \"{identifier}\" cannot be turned into a QR code."),
            suggestion: format!("Use a shorter prefix or fewer digits. ({reason})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        LabelError::Storage { identifier, reason } => HumanError {
            message: format!("Could not store the QR image for \"{identifier}\"."),
            suggestion: format!(
                "Make sure the temporary directory exists and has free space. ({reason})"
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        LabelError::Output {
            destination,
            reason,
        } => HumanError {
            message: format!("Could not write the label sheet to {destination}."),
            suggestion: format!("Check that the location is writable. ({reason})"),
            retriable: true,
            severity: Severity::Transient,
        },

        LabelError::Page { page, source } => {
            let inner = humanize_error(source);
            HumanError {
                message: format!("Page {page}: {}", inner.message),
                ..inner
            }
        }

        LabelError::Server(detail) => HumanError {
            message: "The label server had a problem.".into(),
            suggestion: format!("Try restarting the server. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        LabelError::Io(e) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check file permissions and free space. ({e})"),
            retriable: true,
            severity: Severity::Transient,
        },

        LabelError::Serialization(e) => HumanError {
            message: "The configuration file could not be read.".into(),
            suggestion: format!("Fix or remove the configuration file. ({e})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
