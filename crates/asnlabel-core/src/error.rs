// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the label generator.

use thiserror::Error;

/// Top-level error type for all label generation operations.
#[derive(Debug, Error)]
pub enum LabelError {
    // -- Request errors --
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    // -- Generation errors --
    #[error("QR encoding failed for {identifier}: {reason}")]
    Encoding { identifier: String, reason: String },

    #[error("glyph storage failed for {identifier}: {reason}")]
    Storage { identifier: String, reason: String },

    #[error("document output to {destination} failed: {reason}")]
    Output { destination: String, reason: String },

    /// A failure while composing the one-based `page`.
    #[error("error generating page {page}: {source}")]
    Page {
        page: u32,
        #[source]
        source: Box<LabelError>,
    },

    // -- Front ends --
    #[error("label server error: {0}")]
    Server(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LabelError {
    /// Identifier or destination the error is about, if it names one.
    pub fn subject(&self) -> Option<&str> {
        match self.root() {
            Self::Encoding { identifier, .. } | Self::Storage { identifier, .. } => {
                Some(identifier)
            }
            Self::Output { destination, .. } => Some(destination),
            _ => None,
        }
    }

    /// The underlying failure with any page context stripped.
    pub fn root(&self) -> &LabelError {
        match self {
            Self::Page { source, .. } => source.root(),
            other => other,
        }
    }

    /// Attach the one-based page number the failure occurred on.
    pub fn on_page(self, page: u32) -> Self {
        Self::Page {
            page,
            source: Box::new(self),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LabelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_error_names_identifier() {
        let err = LabelError::Encoding {
            identifier: "ASN0001".into(),
            reason: "data too long".into(),
        };
        assert_eq!(err.subject(), Some("ASN0001"));
        assert_eq!(
            err.to_string(),
            "QR encoding failed for ASN0001: data too long"
        );
    }

    #[test]
    fn page_context_wraps_the_cause() {
        let err = LabelError::Storage {
            identifier: "ASN0190".into(),
            reason: "disk full".into(),
        }
        .on_page(2);

        assert_eq!(
            err.to_string(),
            "error generating page 2: glyph storage failed for ASN0190: disk full"
        );
        assert_eq!(err.subject(), Some("ASN0190"));
        assert!(matches!(err.root(), LabelError::Storage { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn io_errors_have_no_subject() {
        let err: LabelError = std::io::Error::other("disk full").into();
        assert!(err.subject().is_none());
    }
}
