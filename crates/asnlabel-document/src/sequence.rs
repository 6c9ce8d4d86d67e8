// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label identifier sequencing.

/// Identifier of the label at `row`/`col` on a page whose first label is
/// numbered `start`.
///
/// The number is zero-padded to `zero_width` digits; numbers with more digits
/// are rendered in full. Request validation keeps the sum within `u64`.
pub fn identifier_at(
    start: u64,
    row: u32,
    col: u32,
    across: u32,
    prefix: &str,
    zero_width: usize,
) -> String {
    let number = start + u64::from(row) * u64::from(across) + u64::from(col);
    format_identifier(prefix, number, zero_width)
}

/// `prefix` followed by `number` padded to `zero_width` digits.
pub fn format_identifier(prefix: &str, number: u64, zero_width: usize) -> String {
    format!("{prefix}{number:0zero_width$}")
}
