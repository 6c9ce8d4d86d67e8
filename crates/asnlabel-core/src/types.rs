// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the label generator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LabelError, Result};

/// Unique identifier for one document-generation call, used to tag logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationId(pub Uuid);

impl GenerationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GenerationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed physical layout of one supported label sheet. All lengths in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridSpec {
    /// Human-readable sheet name.
    pub name: &'static str,
    pub page_width: f32,
    pub page_height: f32,
    pub labels_across: u32,
    pub labels_down: u32,
    pub label_width: f32,
    pub label_height: f32,
    /// Horizontal gap between adjacent label columns.
    pub gutter_x: f32,
    pub margin_left: f32,
    pub margin_top: f32,
    /// Edge length of the square QR glyph.
    pub glyph_size: f32,
    /// Gap between the glyph's right edge and the caption.
    pub glyph_margin_x: f32,
    /// Vertical offset of the glyph inside its label.
    pub glyph_offset_y: f32,
    /// Caption font size in points.
    pub caption_font_pt: f32,
}

/// Avery L4731REV-25: 7 x 27 labels of 25.4 x 10 mm on A4 portrait.
pub const AVERY_L4731REV_25: GridSpec = GridSpec {
    name: "Avery L4731REV-25",
    page_width: 210.0,
    page_height: 297.0,
    labels_across: 7,
    labels_down: 27,
    label_width: 25.4,
    label_height: 10.0,
    gutter_x: 2.55,
    margin_left: 8.45,
    margin_top: 13.5,
    glyph_size: 9.0,
    glyph_margin_x: 0.5,
    glyph_offset_y: 0.5,
    caption_font_pt: 8.0,
};

impl GridSpec {
    /// The one sheet type the generator lays out.
    pub const fn standard() -> &'static GridSpec {
        &AVERY_L4731REV_25
    }

    pub fn labels_per_page(&self) -> u64 {
        u64::from(self.labels_across) * u64::from(self.labels_down)
    }

    /// Top-left corner of a label cell, measured from the page's top-left.
    pub fn cell_origin(&self, row: u32, col: u32) -> (f32, f32) {
        let x = self.margin_left + col as f32 * (self.label_width + self.gutter_x);
        let y = self.margin_top + row as f32 * self.label_height;
        (x, y)
    }
}

/// Validated input for one document-generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Number printed on the first label of the first page.
    pub start: u64,
    /// Text placed before every label number.
    pub prefix: String,
    /// Minimum digit count; numbers are left-padded with zeros to this width.
    pub zero_width: usize,
    /// Number of sheets to produce (at least one).
    pub pages: u32,
    /// Outline every label cell (for alignment checks).
    pub show_borders: bool,
}

impl GenerationRequest {
    pub fn new(start: u64, prefix: impl Into<String>, zero_width: usize, pages: u32) -> Self {
        Self {
            start,
            prefix: prefix.into(),
            zero_width,
            pages,
            show_borders: false,
        }
    }

    pub fn with_borders(mut self, show_borders: bool) -> Self {
        self.show_borders = show_borders;
        self
    }

    /// Reject values the generator cannot honour. Numbers wider than
    /// `zero_width` are allowed and simply widen the field.
    pub fn validate(&self, grid: &GridSpec) -> Result<()> {
        if self.pages == 0 {
            return Err(LabelError::InvalidRequest(
                "page count must be at least 1".into(),
            ));
        }
        if self.last_number(grid).is_none() {
            return Err(LabelError::InvalidRequest(format!(
                "{} pages starting at {} overflow the label number range",
                self.pages, self.start
            )));
        }
        Ok(())
    }

    /// Number of the first label on the zero-based `page`.
    pub fn page_start(&self, page: u32, grid: &GridSpec) -> Option<u64> {
        grid.labels_per_page()
            .checked_mul(u64::from(page))
            .and_then(|offset| self.start.checked_add(offset))
    }

    /// Number on the final label of the final page, `None` on overflow.
    pub fn last_number(&self, grid: &GridSpec) -> Option<u64> {
        grid.labels_per_page()
            .checked_mul(u64::from(self.pages))
            .and_then(|count| count.checked_sub(1))
            .and_then(|span| self.start.checked_add(span))
    }

    /// Total labels across all requested pages.
    pub fn label_count(&self, grid: &GridSpec) -> u64 {
        grid.labels_per_page() * u64::from(self.pages)
    }
}

/// One label as placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCell {
    pub row: u32,
    pub col: u32,
    pub identifier: String,
    /// Left edge in mm from the page's left edge.
    pub x: f32,
    /// Top edge in mm from the page's top edge.
    pub y: f32,
}

/// The labels placed on one page, in reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    /// Zero-based page index.
    pub index: u32,
    pub first_number: u64,
    pub cells: Vec<LabelCell>,
}

impl PageLayout {
    /// The label at `row`/`col`, if the page has that cell.
    pub fn cell(&self, row: u32, col: u32) -> Option<&LabelCell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }
}

/// Lifecycle state of the on-demand label server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Stopped,
    Starting,
    Running,
    Error,
}
