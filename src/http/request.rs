//! Client request head parsing.
//!
//! # Responsibilities
//! - Decode raw request bytes without ever failing on byte values
//! - Split the request line into method, target and version
//! - Build a case-insensitive header map
//!
//! # Design Decisions
//! - Bytes are decoded as Latin-1: each octet maps to exactly one char
//! - Parsing is a pure function returning a tagged result
//! - Header lines without a colon are skipped, not rejected

use std::collections::HashMap;

/// The head terminator separating headers from the body.
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Error type for request head parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No bytes were supplied.
    #[error("empty request")]
    Empty,
    /// The request line did not contain method, target and version.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
}

/// A parsed client request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    pub method: String,
    pub target: String,
    pub version: String,
    /// Header map keyed by trimmed, lower-cased field name.
    pub headers: HashMap<String, String>,
}

impl ParsedRequest {
    /// Look up a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Decode bytes as ISO-8859-1.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode a string as ISO-8859-1.
///
/// Chars outside the Latin-1 range cannot come out of [`decode_latin1`];
/// they are replaced with `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Position of the first `\r\n\r\n` in `haystack`.
pub fn find_head_end(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
}

/// Parse a raw request head.
///
/// Anything after the first `\r\n\r\n` is ignored.
pub fn parse_request_head(raw: &[u8]) -> Result<ParsedRequest, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::Empty);
    }

    let head = match find_head_end(raw) {
        Some(end) => &raw[..end],
        None => raw,
    };
    let text = decode_latin1(head);
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut tokens = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(ParseError::MalformedRequestLine(request_line.to_string()));
    };

    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    Ok(ParsedRequest {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
        headers,
    })
}
