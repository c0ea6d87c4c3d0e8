//! Origin communication subsystem.
//!
//! # Data Flow
//! ```text
//! Session builds request bytes
//!     → connector.rs (connect, write, read to EOF, bounded by timeouts)
//!     → raw response bytes | OriginError
//!     → back to the session for interpretation
//! ```
//!
//! # Design Decisions
//! - `Connection: close` on every request; no pooling or reuse
//! - Connector is a trait so sessions can run against scripted origins

pub mod connector;

pub use connector::{OriginConnector, OriginError, TcpOriginConnector};
