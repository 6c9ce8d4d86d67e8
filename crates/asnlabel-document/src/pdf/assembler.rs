// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler: drives page composition across the requested page
// count and serialises the finished label sheets with `printpdf` 0.8.
//
// Every call owns its own `GlyphStore`; glyph files are released when the
// call returns, whether it succeeded or not.

use std::io::Write;
use std::path::{Path, PathBuf};

use asnlabel_core::error::{LabelError, Result};
use asnlabel_core::types::{GenerationId, GenerationRequest, GridSpec, PageLayout};
use printpdf::{PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg};
use rayon::ThreadPool;
use tracing::{debug, info, info_span, warn};

use crate::glyph::GlyphStore;
use crate::pdf::composer::{PageComposer, PageSurface};
use crate::sequence::format_identifier;
use crate::symbol::SymbolEncoder;

/// A finished label document.
#[derive(Debug, Clone)]
pub struct LabelDocument {
    /// The generation call that produced this document.
    pub id: GenerationId,
    /// Serialised PDF.
    pub bytes: Vec<u8>,
    /// Labels placed on each page, in page order.
    pub pages: Vec<PageLayout>,
}

impl LabelDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn label_count(&self) -> usize {
        self.pages.iter().map(|p| p.cells.len()).sum()
    }

    /// All identifiers in print order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.cells.iter().map(|c| c.identifier.as_str()))
    }

    /// Write the PDF to `path`, creating parent directories as needed.
    ///
    /// Bytes go to a sibling temp file that is renamed into place, so a
    /// failed write never leaves a partial file at `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let output_err = |reason: String| LabelError::Output {
            destination: path.display().to_string(),
            reason,
        };

        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .map_err(|err| output_err(format!("create directory {}: {err}", parent.display())))?;

        let mut staged = tempfile::Builder::new()
            .prefix(".asn-labels-")
            .suffix(".pdf.part")
            .tempfile_in(&parent)
            .map_err(|err| output_err(format!("create staging file: {err}")))?;
        staged
            .write_all(&self.bytes)
            .map_err(|err| output_err(format!("write: {err}")))?;
        staged
            .as_file()
            .sync_all()
            .map_err(|err| output_err(format!("sync: {err}")))?;
        staged
            .persist(path)
            .map_err(|err| output_err(format!("rename into place: {}", err.error)))?;

        info!(
            path = %path.display(),
            bytes = self.bytes.len(),
            "Wrote label PDF"
        );
        Ok(())
    }
}

/// Generates label documents on the fixed sheet grid.
///
/// One assembler can serve many requests, sequentially or from several
/// threads; each `generate` call keeps its state to itself.
pub struct DocumentAssembler {
    grid: &'static GridSpec,
    encoder: SymbolEncoder,
    glyph_dir: PathBuf,
    pool: ThreadPool,
}

impl DocumentAssembler {
    /// Create an assembler storing glyphs in `glyph_dir` and encoding each
    /// page on `workers` threads.
    pub fn new(glyph_dir: impl Into<PathBuf>, workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("glyph-worker-{i}"))
            .build()
            .map_err(|err| LabelError::Io(std::io::Error::other(err.to_string())))?;

        Ok(Self {
            grid: GridSpec::standard(),
            encoder: SymbolEncoder::new(),
            glyph_dir: glyph_dir.into(),
            pool,
        })
    }

    pub fn grid(&self) -> &'static GridSpec {
        self.grid
    }

    /// Generate the document described by `request` in memory.
    pub fn generate(&self, request: &GenerationRequest) -> Result<LabelDocument> {
        self.run(request, None)
    }

    /// Generate the document and write it to `path`.
    pub fn generate_to_file(
        &self,
        request: &GenerationRequest,
        path: impl AsRef<Path>,
    ) -> Result<LabelDocument> {
        self.run(request, Some(path.as_ref()))
    }

    fn run(&self, request: &GenerationRequest, destination: Option<&Path>) -> Result<LabelDocument> {
        let id = GenerationId::new();
        let span = info_span!(
            "generate",
            %id,
            start = request.start,
            prefix = %request.prefix,
            pages = request.pages,
        );
        let _entered = span.enter();

        request.validate(self.grid)?;
        debug!(labels = request.label_count(self.grid), "generation started");

        let store = GlyphStore::new(&self.glyph_dir);
        let result = self.assemble(id, request, &store).and_then(|document| {
            if let Some(path) = destination {
                document.write_to(path)?;
            }
            Ok(document)
        });
        let released = store.release_all();

        match &result {
            Ok(document) => info!(
                pages = document.page_count(),
                labels = document.label_count(),
                bytes = document.bytes.len(),
                released,
                "Label document generated"
            ),
            Err(err) => warn!(error = %err, released, "Label generation failed"),
        }
        result
    }

    fn assemble(
        &self,
        id: GenerationId,
        request: &GenerationRequest,
        store: &GlyphStore,
    ) -> Result<LabelDocument> {
        let mut doc = PdfDocument::new(&self.title(request));
        let composer = PageComposer::new(self.grid, &self.encoder, store, &self.pool);

        let mut pages: Vec<PdfPage> = Vec::with_capacity(request.pages as usize);
        let mut layouts: Vec<PageLayout> = Vec::with_capacity(request.pages as usize);

        for index in 0..request.pages {
            let first_number = request.page_start(index, self.grid).ok_or_else(|| {
                LabelError::InvalidRequest(format!("page {} overflows the number range", index + 1))
            })?;

            let mut surface = PageSurface::new(&mut doc, self.grid);
            composer
                .compose_page(&mut surface, first_number, request)
                .map_err(|err| err.on_page(index + 1))?;
            let (page, cells) = surface.into_page();

            debug!(page = index + 1, first_number, "page added");
            pages.push(page);
            layouts.push(PageLayout {
                index,
                first_number,
                cells,
            });
        }

        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(warnings = warnings.len(), "PDF serialised with warnings");
        }

        Ok(LabelDocument {
            id,
            bytes,
            pages: layouts,
        })
    }

    /// PDF title naming the first and last label.
    fn title(&self, request: &GenerationRequest) -> String {
        let first = format_identifier(&request.prefix, request.start, request.zero_width);
        match request.last_number(self.grid) {
            Some(last) => format!(
                "ASN Labels {first} - {}",
                format_identifier(&request.prefix, last, request.zero_width)
            ),
            None => format!("ASN Labels from {first}"),
        }
    }
}
