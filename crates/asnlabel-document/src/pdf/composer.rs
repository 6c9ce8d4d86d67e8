// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page composer: places QR glyphs and captions on one label sheet.
//
// Layout is specified in millimetres from the sheet's top-left corner, the
// way label vendors publish it. printpdf works in points from the bottom-left,
// so every placement flips the y axis against the page height.

use std::path::{Path, PathBuf};

use asnlabel_core::error::{LabelError, Result};
use asnlabel_core::types::{GenerationRequest, GridSpec, LabelCell};
use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Mm, Op, PdfDocument, PdfPage, Point, Pt, RawImage,
    RawImageData, RawImageFormat, Rgb, TextItem, XObjectTransform,
};
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::glyph::GlyphStore;
use crate::sequence::identifier_at;
use crate::symbol::SymbolEncoder;

/// Resolution glyph rasters are embedded at before scaling to size.
const GLYPH_DPI: f32 = 300.0;

/// Stroke width of the debug border around each label.
const BORDER_WIDTH_MM: f32 = 0.2;

const CAPTION_FONT: BuiltinFont = BuiltinFont::Helvetica;

// ---------------------------------------------------------------------------
// PageSurface
// ---------------------------------------------------------------------------

/// Append-only drawing surface for one sheet.
///
/// Labels can only be added at the next free cell in reading order (left to
/// right, then top to bottom), so identifier order on paper follows directly
/// from append order.
pub struct PageSurface<'a> {
    doc: &'a mut PdfDocument,
    grid: &'a GridSpec,
    ops: Vec<Op>,
    cells: Vec<LabelCell>,
    stroke_ready: bool,
}

impl<'a> PageSurface<'a> {
    /// Start a blank sheet whose images are registered in `doc`.
    pub fn new(doc: &'a mut PdfDocument, grid: &'a GridSpec) -> Self {
        Self {
            doc,
            grid,
            ops: Vec::new(),
            cells: Vec::with_capacity(grid.labels_per_page() as usize),
            stroke_ready: false,
        }
    }

    /// Row and column the next label will occupy, `None` once the sheet is full.
    pub fn next_slot(&self) -> Option<(u32, u32)> {
        let placed = self.cells.len() as u64;
        if placed >= self.grid.labels_per_page() {
            return None;
        }
        let across = u64::from(self.grid.labels_across);
        Some(((placed / across) as u32, (placed % across) as u32))
    }

    pub fn is_full(&self) -> bool {
        self.next_slot().is_none()
    }

    /// Labels placed so far, in reading order.
    pub fn cells(&self) -> &[LabelCell] {
        &self.cells
    }

    /// Place the glyph at `glyph` and the caption `identifier` in the next
    /// free cell, optionally outlining the cell.
    pub fn append_label(&mut self, identifier: &str, glyph: &Path, outline: bool) -> Result<()> {
        let (row, col) = self.next_slot().ok_or_else(|| {
            LabelError::InvalidRequest(format!(
                "sheet already holds {} labels, cannot place {identifier}",
                self.cells.len()
            ))
        })?;
        let (x, y) = self.grid.cell_origin(row, col);

        self.place_glyph(identifier, glyph, x, y)?;
        self.place_caption(identifier, x, y);
        if outline {
            self.outline_cell(x, y);
        }

        self.cells.push(LabelCell {
            row,
            col,
            identifier: identifier.to_string(),
            x,
            y,
        });
        Ok(())
    }

    /// Close the sheet, yielding the printpdf page and its placed labels.
    pub fn into_page(self) -> (PdfPage, Vec<LabelCell>) {
        let page = PdfPage::new(
            Mm(self.grid.page_width),
            Mm(self.grid.page_height),
            self.ops,
        );
        (page, self.cells)
    }

    /// Convert a distance from the top edge into a PDF y coordinate.
    fn pdf_y(&self, y_mm: f32) -> Pt {
        Mm(self.grid.page_height - y_mm).into_pt()
    }

    fn place_glyph(&mut self, identifier: &str, glyph: &Path, x: f32, y: f32) -> Result<()> {
        let rgb = image::open(glyph)
            .map_err(|err| LabelError::Storage {
                identifier: identifier.to_string(),
                reason: format!("read glyph {}: {err}", glyph.display()),
            })?
            .to_rgb8();
        let (width, height) = rgb.dimensions();

        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.doc.add_image(&raw);

        let native_pt = width as f32 / GLYPH_DPI * 72.0;
        let scale = Mm(self.grid.glyph_size).into_pt().0 / native_pt;
        let bottom = y + self.grid.glyph_offset_y + self.grid.glyph_size;

        self.ops.push(Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Mm(x).into_pt()),
                translate_y: Some(self.pdf_y(bottom)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(GLYPH_DPI),
                rotate: None,
            },
        });
        Ok(())
    }

    /// Caption sits right of the glyph with its baseline at mid-label.
    fn place_caption(&mut self, identifier: &str, x: f32, y: f32) {
        let pos = Point {
            x: Mm(x + self.grid.glyph_size + self.grid.glyph_margin_x).into_pt(),
            y: self.pdf_y(y + self.grid.label_height / 2.0),
        };

        self.ops.push(Op::StartTextSection);
        self.ops.push(Op::SetTextCursor { pos });
        self.ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(self.grid.caption_font_pt),
            font: CAPTION_FONT,
        });
        self.ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(identifier.to_string())],
            font: CAPTION_FONT,
        });
        self.ops.push(Op::EndTextSection);
    }

    fn outline_cell(&mut self, x: f32, y: f32) {
        if !self.stroke_ready {
            self.ops.push(Op::SetOutlineColor {
                col: Color::Rgb(Rgb {
                    r: 0.0,
                    g: 0.0,
                    b: 0.0,
                    icc_profile: None,
                }),
            });
            self.ops.push(Op::SetOutlineThickness {
                pt: Mm(BORDER_WIDTH_MM).into_pt(),
            });
            self.stroke_ready = true;
        }

        let right = x + self.grid.label_width;
        let bottom = y + self.grid.label_height;
        let points = [(x, y), (right, y), (right, bottom), (x, bottom)]
            .into_iter()
            .map(|(px, py)| LinePoint {
                p: Point {
                    x: Mm(px).into_pt(),
                    y: self.pdf_y(py),
                },
                bezier: false,
            })
            .collect();

        self.ops.push(Op::DrawLine {
            line: Line {
                points,
                is_closed: true,
            },
        });
    }
}

// ---------------------------------------------------------------------------
// PageComposer
// ---------------------------------------------------------------------------

/// Fills one sheet with consecutive labels.
///
/// Glyphs for the whole sheet are encoded and stored on the worker pool,
/// then placed one by one in reading order.
pub struct PageComposer<'a> {
    grid: &'a GridSpec,
    encoder: &'a SymbolEncoder,
    store: &'a GlyphStore,
    pool: &'a ThreadPool,
}

impl<'a> PageComposer<'a> {
    pub fn new(
        grid: &'a GridSpec,
        encoder: &'a SymbolEncoder,
        store: &'a GlyphStore,
        pool: &'a ThreadPool,
    ) -> Self {
        Self {
            grid,
            encoder,
            store,
            pool,
        }
    }

    /// Identifiers of a sheet starting at `first_number`, in reading order.
    pub fn identifiers(&self, first_number: u64, request: &GenerationRequest) -> Vec<String> {
        let across = self.grid.labels_across;
        (0..self.grid.labels_down)
            .flat_map(|row| (0..across).map(move |col| (row, col)))
            .map(|(row, col)| {
                identifier_at(
                    first_number,
                    row,
                    col,
                    across,
                    &request.prefix,
                    request.zero_width,
                )
            })
            .collect()
    }

    /// Fill `surface` with labels numbered from `first_number`.
    ///
    /// Stops at the first label (in reading order) whose glyph cannot be
    /// produced; labels already placed stay on the surface.
    #[instrument(skip(self, surface, request), fields(prefix = %request.prefix))]
    pub fn compose_page(
        &self,
        surface: &mut PageSurface<'_>,
        first_number: u64,
        request: &GenerationRequest,
    ) -> Result<()> {
        let identifiers = self.identifiers(first_number, request);

        let glyphs: Vec<Result<PathBuf>> = self.pool.install(|| {
            identifiers
                .par_iter()
                .map(|identifier| self.render_glyph(identifier))
                .collect()
        });

        for (identifier, glyph) in identifiers.iter().zip(glyphs) {
            let path = glyph?;
            surface.append_label(identifier, &path, request.show_borders)?;
        }

        debug!(
            labels = identifiers.len(),
            borders = request.show_borders,
            "page composed"
        );
        Ok(())
    }

    fn render_glyph(&self, identifier: &str) -> Result<PathBuf> {
        let glyph = self.encoder.encode(identifier)?;
        self.store.materialize(identifier, &glyph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asnlabel_core::types::AVERY_L4731REV_25;

    /// Three labels across, two down; small enough to keep tests quick.
    fn small_grid() -> GridSpec {
        GridSpec {
            labels_across: 3,
            labels_down: 2,
            ..AVERY_L4731REV_25
        }
    }

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .expect("thread pool")
    }

    #[test]
    fn slots_advance_in_reading_order() {
        let grid = small_grid();
        let mut doc = PdfDocument::new("slots");
        let surface = PageSurface::new(&mut doc, &grid);
        assert_eq!(surface.next_slot(), Some((0, 0)));
        assert!(!surface.is_full());
    }

    #[test]
    fn composed_page_fills_grid_row_major() {
        let grid = small_grid();
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GlyphStore::new(dir.path());
        let encoder = SymbolEncoder::new();
        let pool = pool();
        let composer = PageComposer::new(&grid, &encoder, &store, &pool);
        let request = GenerationRequest::new(10, "ASN", 4, 1);

        let mut doc = PdfDocument::new("compose");
        let mut surface = PageSurface::new(&mut doc, &grid);
        composer
            .compose_page(&mut surface, 10, &request)
            .expect("compose");

        assert!(surface.is_full());
        let ids: Vec<&str> = surface.cells().iter().map(|c| c.identifier.as_str()).collect();
        assert_eq!(
            ids,
            ["ASN0010", "ASN0011", "ASN0012", "ASN0013", "ASN0014", "ASN0015"]
        );

        let last = &surface.cells()[5];
        assert_eq!((last.row, last.col), (1, 2));
        let (x, y) = grid.cell_origin(1, 2);
        assert_eq!((last.x, last.y), (x, y));

        // One glyph file per label until the store is released.
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn full_surface_rejects_more_labels() {
        let grid = small_grid();
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GlyphStore::new(dir.path());
        let encoder = SymbolEncoder::new();
        let pool = pool();
        let composer = PageComposer::new(&grid, &encoder, &store, &pool);
        let request = GenerationRequest::new(1, "ASN", 4, 1);

        let mut doc = PdfDocument::new("full");
        let mut surface = PageSurface::new(&mut doc, &grid);
        composer
            .compose_page(&mut surface, 1, &request)
            .expect("compose");

        let glyph = encoder.encode("ASN0007").expect("encode");
        let path = store.materialize("ASN0007", &glyph).expect("materialize");
        assert!(surface.append_label("ASN0007", &path, false).is_err());
        assert_eq!(surface.cells().len(), 6);
    }

    #[test]
    fn borders_draw_one_outline_per_label() {
        let grid = small_grid();
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GlyphStore::new(dir.path());
        let encoder = SymbolEncoder::new();
        let pool = pool();
        let composer = PageComposer::new(&grid, &encoder, &store, &pool);

        let count_outlines = |borders: bool| {
            let request = GenerationRequest::new(1, "ASN", 4, 1).with_borders(borders);
            let mut doc = PdfDocument::new("borders");
            let mut surface = PageSurface::new(&mut doc, &grid);
            composer
                .compose_page(&mut surface, 1, &request)
                .expect("compose");
            let (page, _) = surface.into_page();
            page.ops
                .iter()
                .filter(|op| matches!(op, Op::DrawLine { .. }))
                .count()
        };

        assert_eq!(count_outlines(true), 6);
        assert_eq!(count_outlines(false), 0);
    }

    #[test]
    fn unencodable_label_stops_composition() {
        let grid = small_grid();
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GlyphStore::new(dir.path());
        let encoder = SymbolEncoder::new();
        let pool = pool();
        let composer = PageComposer::new(&grid, &encoder, &store, &pool);
        let request = GenerationRequest::new(1, "x".repeat(3000), 4, 1);

        let mut doc = PdfDocument::new("fail");
        let mut surface = PageSurface::new(&mut doc, &grid);
        let err = composer
            .compose_page(&mut surface, 1, &request)
            .unwrap_err();

        match err {
            LabelError::Encoding { identifier, .. } => {
                assert!(identifier.ends_with("0001"));
            }
            other => panic!("expected encoding error, got {other}"),
        }
        assert!(surface.cells().is_empty());
    }
}
