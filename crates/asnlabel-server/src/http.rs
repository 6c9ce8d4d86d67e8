// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimal HTTP/1.1 framing for the label server.
//
// Only what the two routes need: the request line, a percent-decoded query
// string, and a `Connection: close` response with a fixed body.

/// Upper bound on the request head; anything larger is rejected.
pub const MAX_REQUEST_BYTES: usize = 16 * 1024;

/// Parsed request line of an incoming HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    /// Decoded query parameters in the order they appeared.
    pub query: Vec<(String, String)>,
}

impl HttpRequest {
    /// First value of query parameter `name`, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Offset just past the blank line ending the request head.
pub fn head_end(data: &[u8]) -> Option<usize> {
    find_subsequence(data, b"\r\n\r\n").map(|pos| pos + 4)
}

/// Parse the request line (`GET /generate?start=1 HTTP/1.1`).
///
/// Returns `None` when the line is missing or malformed.
pub fn parse_request_head(data: &[u8]) -> Option<HttpRequest> {
    let end = find_subsequence(data, b"\r\n")?;
    let line = std::str::from_utf8(&data[..end]).ok()?;

    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let version = parts.next()?;
    if !version.starts_with("HTTP/") || parts.next().is_some() {
        return None;
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, parse_query(query)),
        None => (target, Vec::new()),
    };

    Some(HttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        query,
    })
}

/// Split `a=1&b=two` into decoded key/value pairs.
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(value))
        })
        .collect()
}

/// Decode `%XX` escapes and `+` as space. Invalid escapes are kept verbatim.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            other => out.push(other),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Find the first occurrence of `needle` in `haystack`.
fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// A complete response, written in one go before the connection closes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub extra_headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            extra_headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Plain-text response with a trailing newline.
    pub fn text(status: u16, message: &str) -> Self {
        Self::new(status, "text/plain; charset=utf-8", format!("{message}\n"))
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.extra_headers.push((name, value.into()));
        self
    }

    /// Serialise status line, headers, and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len()
        );
        for (name, value) in &self.extra_headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("Connection: close\r\n\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Content Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_line_and_query() {
        let raw = b"GET /generate?start=1000&prefix=ASN&pages=2 HTTP/1.1\r\nHost: x\r\n\r\n";
        let req = parse_request_head(raw).expect("parse");
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/generate");
        assert_eq!(req.param("start"), Some("1000"));
        assert_eq!(req.param("prefix"), Some("ASN"));
        assert_eq!(req.param("pages"), Some("2"));
        assert_eq!(req.param("zeros"), None);
    }

    #[test]
    fn decodes_percent_escapes() {
        let raw = b"GET /generate?prefix=A%20B%2Dc+d&x=%zz HTTP/1.1\r\n\r\n";
        let req = parse_request_head(raw).expect("parse");
        assert_eq!(req.param("prefix"), Some("A B-c d"));
        assert_eq!(req.param("x"), Some("%zz"));
    }

    #[test]
    fn trailing_percent_is_kept() {
        let raw = b"GET /generate?prefix=AB% HTTP/1.1\r\n\r\n";
        let req = parse_request_head(raw).expect("parse");
        assert_eq!(req.param("prefix"), Some("AB%"));
    }

    #[test]
    fn rejects_malformed_request_line() {
        assert!(parse_request_head(b"GARBAGE\r\n\r\n").is_none());
        assert!(parse_request_head(b"GET / FTP/1.0\r\n\r\n").is_none());
        assert!(parse_request_head(b"GET /").is_none());
    }

    #[test]
    fn head_end_points_past_blank_line() {
        let raw = b"GET / HTTP/1.1\r\nHost: x\r\n\r\nbody";
        let end = head_end(raw).expect("end");
        assert_eq!(&raw[end..], b"body");
    }

    #[test]
    fn response_carries_length_and_extra_headers() {
        let response = HttpResponse::new(200, "application/pdf", b"%PDF".to_vec())
            .with_header("Content-Disposition", "attachment; filename=asn-1.pdf");
        let text = String::from_utf8(response.to_bytes()).expect("utf8");
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(text.contains("Content-Disposition: attachment; filename=asn-1.pdf\r\n"));
        assert!(text.ends_with("\r\n\r\n%PDF"));
    }
}
