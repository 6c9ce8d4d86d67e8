// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transient glyph storage.
//
// Each encoded glyph is written as a standalone PNG so the page composer can
// reference it by path. The store tracks every file it creates and deletes
// them all on `release_all` or when dropped, whichever comes first.

use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use asnlabel_core::error::{LabelError, Result};
use image::{ImageFormat, RgbaImage};
use tempfile::TempPath;
use tracing::{debug, warn};

/// File name prefix of every materialized glyph.
pub const GLYPH_FILE_PREFIX: &str = "asn-label-";

/// Request-scoped set of transient glyph images.
///
/// `materialize` may be called from several threads at once; only the
/// tracking list is locked, the file writes run in parallel.
pub struct GlyphStore {
    dir: PathBuf,
    tracked: Mutex<Vec<TempPath>>,
}

impl GlyphStore {
    /// Create a store writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tracked: Mutex::new(Vec::new()),
        }
    }

    /// Number of glyph files currently held.
    pub fn len(&self) -> usize {
        self.tracked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write `glyph` to a uniquely named PNG and return its path.
    ///
    /// The file is tracked before any bytes are written, so a failed write
    /// is still cleaned up by `release_all`.
    pub fn materialize(&self, identifier: &str, glyph: &RgbaImage) -> Result<PathBuf> {
        let storage_err = |reason: String| LabelError::Storage {
            identifier: identifier.to_string(),
            reason,
        };

        let file = tempfile::Builder::new()
            .prefix(GLYPH_FILE_PREFIX)
            .suffix(".png")
            .tempfile_in(&self.dir)
            .map_err(|err| {
                storage_err(format!(
                    "create temp file in {}: {err}",
                    self.dir.display()
                ))
            })?;

        let (file, temp_path) = file.into_parts();
        let path = temp_path.to_path_buf();
        self.tracked().push(temp_path);

        let mut writer = BufWriter::new(file);
        glyph
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|err| storage_err(format!("encode PNG {}: {err}", path.display())))?;
        writer
            .flush()
            .map_err(|err| storage_err(format!("flush {}: {err}", path.display())))?;

        debug!(identifier, path = %path.display(), "glyph materialized");
        Ok(path)
    }

    /// Delete every tracked glyph file. Safe to call repeatedly.
    ///
    /// Returns the number of files released.
    pub fn release_all(&self) -> usize {
        let paths = std::mem::take(&mut *self.tracked());
        let count = paths.len();
        for path in paths {
            let shown = path.display().to_string();
            if let Err(err) = path.close() {
                warn!(path = %shown, error = %err, "failed to delete glyph file");
            }
        }
        if count > 0 {
            debug!(count, dir = %self.dir.display(), "glyph files released");
        }
        count
    }

    fn tracked(&self) -> MutexGuard<'_, Vec<TempPath>> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for GlyphStore {
    fn drop(&mut self) {
        self.release_all();
    }
}
