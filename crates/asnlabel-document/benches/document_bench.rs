// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the asnlabel-document crate: QR symbol encoding on
// its own, and a full single-sheet generation including glyph storage and PDF
// serialisation.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use asnlabel_core::GenerationRequest;
use asnlabel_document::{DocumentAssembler, SymbolEncoder};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Encode one typical identifier into a 100x100 glyph.
fn bench_symbol_encode(c: &mut Criterion) {
    let encoder = SymbolEncoder::new();

    c.bench_function("symbol_encode (ASN0001)", |b| {
        b.iter(|| {
            let glyph = encoder.encode(black_box("ASN0001")).expect("encode");
            black_box(glyph);
        });
    });
}

/// Generate one full 189-label sheet in memory.
///
/// Glyphs go to a scratch directory that is emptied after every iteration,
/// so this measures encoding, PNG round-trip, and PDF output together.
fn bench_single_sheet(c: &mut Criterion) {
    let scratch = tempfile::tempdir().expect("tempdir");
    let assembler = DocumentAssembler::new(scratch.path(), 4).expect("assembler");
    let request = GenerationRequest::new(1, "ASN", 4, 1);

    let mut group = c.benchmark_group("sheet");
    group.sample_size(10);
    group.bench_function("generate (1 page, 189 labels)", |b| {
        b.iter(|| {
            let document = assembler.generate(black_box(&request)).expect("generate");
            black_box(document.bytes.len());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_symbol_encode, bench_single_sheet);
criterion_main!(benches);
