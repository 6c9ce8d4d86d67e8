// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: label page composition and multi-page document assembly.

pub mod assembler;
pub mod composer;

pub use assembler::{DocumentAssembler, LabelDocument};
pub use composer::{PageComposer, PageSurface};
