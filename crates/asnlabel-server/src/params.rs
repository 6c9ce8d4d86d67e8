// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Query parameter mapping for `/generate`.
//
// Missing, unparsable, or zero numeric values fall back to the configured
// defaults, as does an empty prefix. `borders` accepts the usual boolean
// spellings and falls back to the default otherwise.

use asnlabel_core::GenerationRequest;
use asnlabel_core::config::RequestDefaults;

use crate::http::HttpRequest;

/// Build a generation request from the query of `request`.
pub fn request_from_query(request: &HttpRequest, defaults: &RequestDefaults) -> GenerationRequest {
    let start = nonzero(request.param("start"), defaults.start);
    let pages = nonzero(request.param("pages"), u64::from(defaults.pages));
    let zeros = nonzero(request.param("zeros"), defaults.zeros as u64);

    let prefix = match request.param("prefix") {
        Some(prefix) if !prefix.is_empty() => prefix.to_string(),
        _ => defaults.prefix.clone(),
    };
    let borders = request
        .param("borders")
        .and_then(parse_bool)
        .unwrap_or(defaults.borders);

    GenerationRequest {
        start,
        prefix,
        // Out-of-range values are left for request validation to reject.
        zero_width: usize::try_from(zeros).unwrap_or(usize::MAX),
        pages: u32::try_from(pages).unwrap_or(u32::MAX),
        show_borders: borders,
    }
}

/// File name offered for download.
pub fn download_name(request: &GenerationRequest) -> String {
    format!("asn-{}.pdf", request.start)
}

fn nonzero(value: Option<&str>, default: u64) -> u64 {
    match value.and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(0) | None => default,
        Some(n) => n,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_request_head;

    fn query(target: &str) -> HttpRequest {
        parse_request_head(format!("GET {target} HTTP/1.1\r\n\r\n").as_bytes()).expect("parse")
    }

    #[test]
    fn empty_query_uses_defaults() {
        let req = request_from_query(&query("/generate"), &RequestDefaults::default());
        assert_eq!(req, GenerationRequest::new(1, "ASN", 4, 1));
    }

    #[test]
    fn all_parameters_are_honoured() {
        let req = request_from_query(
            &query("/generate?start=1000&prefix=DOC&pages=2&zeros=5&borders=true"),
            &RequestDefaults::default(),
        );
        assert_eq!(req, GenerationRequest::new(1000, "DOC", 5, 2).with_borders(true));
        assert_eq!(download_name(&req), "asn-1000.pdf");
    }

    #[test]
    fn zero_and_garbage_fall_back() {
        let req = request_from_query(
            &query("/generate?start=0&pages=-3&zeros=abc&prefix=&borders=maybe"),
            &RequestDefaults::default(),
        );
        assert_eq!(req, GenerationRequest::new(1, "ASN", 4, 1));
    }

    #[test]
    fn configured_defaults_apply() {
        let defaults = RequestDefaults {
            start: 500,
            prefix: "BOX".into(),
            pages: 3,
            zeros: 6,
            borders: true,
        };
        let req = request_from_query(&query("/generate?borders=0"), &defaults);
        assert_eq!(req, GenerationRequest::new(500, "BOX", 6, 3));
    }

    #[test]
    fn wide_padding_passes_through() {
        let req = request_from_query(&query("/generate?zeros=25"), &RequestDefaults::default());
        assert_eq!(req.zero_width, 25);
        assert!(req.validate(asnlabel_core::GridSpec::standard()).is_ok());
    }

    #[test]
    fn huge_page_count_saturates() {
        let req = request_from_query(
            &query("/generate?pages=99999999999"),
            &RequestDefaults::default(),
        );
        assert_eq!(req.pages, u32::MAX);
    }
}
