// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// asnlabel-server -- on-demand HTTP front end for label generation.

pub mod http;
pub mod params;
pub mod server;

pub use server::LabelServer;
