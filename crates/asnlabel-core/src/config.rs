// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::GenerationRequest;

/// Values the front ends substitute for missing request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    pub start: u64,
    pub prefix: String,
    pub pages: u32,
    pub zeros: usize,
    pub borders: bool,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            start: 1,
            prefix: "ASN".into(),
            pages: 1,
            zeros: 4,
            borders: false,
        }
    }
}

impl RequestDefaults {
    /// A request made entirely of default values.
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest::new(self.start, self.prefix.clone(), self.zeros, self.pages)
            .with_borders(self.borders)
    }
}

/// Persistent generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Defaults for omitted CLI flags and query parameters.
    pub defaults: RequestDefaults,
    /// Port for the on-demand HTTP server.
    pub server_port: u16,
    /// Destination of one-shot CLI runs.
    pub output_file: PathBuf,
    /// Directory for transient glyph images (system temp dir when unset).
    pub glyph_dir: Option<PathBuf>,
    /// Worker threads used to encode the glyphs of one page.
    pub workers: usize,
    /// Largest page count the HTTP server accepts in one request.
    pub max_pages: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            defaults: RequestDefaults::default(),
            server_port: 8080,
            output_file: PathBuf::from("labels.pdf"),
            glyph_dir: None,
            workers: 4,
            max_pages: 100,
        }
    }
}

impl ServiceConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Directory glyph images are written to.
    pub fn glyph_dir(&self) -> PathBuf {
        self.glyph_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
