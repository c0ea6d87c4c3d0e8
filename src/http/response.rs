//! Origin response handling and proxy-generated replies.
//!
//! # Responsibilities
//! - Split a raw origin response into status line, header block and body
//! - Extract the status code and single header values
//! - Render the few replies the proxy produces itself
//!
//! # Design Decisions
//! - A response without a head terminator is split best-effort into the
//!   `Degraded` variant and forwarded as-is
//! - Origin bytes are never rewritten; only inspected

use super::request::{decode_latin1, find_head_end, HEAD_TERMINATOR};

/// A raw origin response divided into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitResponse<'a> {
    /// A `\r\n\r\n` terminator was found.
    Complete {
        /// First line, including its `\r\n`.
        status_line: &'a [u8],
        /// Everything up to and including the terminator.
        headers: &'a [u8],
        body: &'a [u8],
    },
    /// No terminator: the whole input is treated as headers, body is empty.
    Degraded {
        status_line: &'a [u8],
        headers: &'a [u8],
    },
}

impl<'a> SplitResponse<'a> {
    pub fn status_line(&self) -> &'a [u8] {
        match *self {
            SplitResponse::Complete { status_line, .. } => status_line,
            SplitResponse::Degraded { status_line, .. } => status_line,
        }
    }

    pub fn headers(&self) -> &'a [u8] {
        match *self {
            SplitResponse::Complete { headers, .. } => headers,
            SplitResponse::Degraded { headers, .. } => headers,
        }
    }

    pub fn body(&self) -> &'a [u8] {
        match *self {
            SplitResponse::Complete { body, .. } => body,
            SplitResponse::Degraded { .. } => &[],
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SplitResponse::Degraded { .. })
    }

    /// Numeric status from the second token of the status line.
    pub fn status_code(&self) -> Option<u16> {
        decode_latin1(self.status_line())
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
    }

    /// First value of the named header, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<String> {
        header_value(self.headers(), name)
    }
}

/// Split a complete raw response.
pub fn split_response(raw: &[u8]) -> SplitResponse<'_> {
    let status_line = first_line(raw);
    match find_head_end(raw) {
        Some(end) => {
            let split_at = end + HEAD_TERMINATOR.len();
            SplitResponse::Complete {
                status_line,
                headers: &raw[..split_at],
                body: &raw[split_at..],
            }
        }
        None => SplitResponse::Degraded {
            status_line,
            headers: raw,
        },
    }
}

fn first_line(raw: &[u8]) -> &[u8] {
    match raw.windows(2).position(|w| w == b"\r\n") {
        Some(pos) => &raw[..pos + 2],
        None => raw,
    }
}

/// Case-insensitive lookup of a header in a raw header block.
pub fn header_value(header_block: &[u8], name: &str) -> Option<String> {
    decode_latin1(header_block)
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim().to_string())
}

/// Replies the proxy generates without contacting an origin, or when the
/// origin cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Malformed request, oversized head, missing `Host`, unusable target.
    BadRequest,
    /// Any method other than `GET`.
    Forbidden,
    /// Origin unreachable with nothing cached.
    BadGateway,
    /// Version other than `HTTP/1.0` or `HTTP/1.1`.
    VersionNotSupported,
}

impl Rejection {
    pub fn status_code(self) -> u16 {
        match self {
            Rejection::BadRequest => 400,
            Rejection::Forbidden => 403,
            Rejection::BadGateway => 502,
            Rejection::VersionNotSupported => 505,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Rejection::BadRequest => "Bad Request",
            Rejection::Forbidden => "Forbidden",
            Rejection::BadGateway => "Bad Gateway",
            Rejection::VersionNotSupported => "HTTP Version Not Supported",
        }
    }

    /// Full wire form of the reply.
    pub fn to_bytes(self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\nConnection: close\r\n\r\n",
            self.status_code(),
            self.reason()
        )
        .into_bytes()
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status_code(), self.reason())
    }
}
