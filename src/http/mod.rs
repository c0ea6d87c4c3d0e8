//! HTTP/1.x wire handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one task per session)
//!     → request.rs (Latin-1 decode, request line and headers)
//!     → [proxy pipeline: validate, cache, origin]
//!     → response.rs (split origin bytes, status and Last-Modified, error replies)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Heads are decoded as Latin-1 so arbitrary bytes never fail to decode
//! - Origin bodies are never decoded; they pass through as raw bytes

pub mod request;
pub mod response;
pub mod server;

pub use request::{parse_request_head, ParseError, ParsedRequest};
pub use response::{split_response, Rejection, SplitResponse};
pub use server::ProxyServer;
