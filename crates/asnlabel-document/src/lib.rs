// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// asnlabel-document -- label sheet generation.
//
// Turns a numeric range into QR-coded labels: identifier sequencing, QR
// symbol encoding, transient glyph storage, and PDF page composition on the
// fixed Avery L4731REV-25 grid.

pub mod glyph;
pub mod pdf;
pub mod sequence;
pub mod symbol;

// Re-export the primary structs so callers can use `asnlabel_document::DocumentAssembler` etc.
pub use glyph::GlyphStore;
pub use pdf::assembler::{DocumentAssembler, LabelDocument};
pub use pdf::composer::{PageComposer, PageSurface};
pub use sequence::identifier_at;
pub use symbol::SymbolEncoder;
