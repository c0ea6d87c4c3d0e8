//! Caching proxy pipeline.
//!
//! # Data Flow
//! ```text
//! Accepted client stream
//!     → session.rs (read head: terminator | EOF | idle timeout)
//!     → handler.rs validate (400 / 403 / 505)
//!     → target.rs (resolve target, derive cache key)
//!     → handler.rs
//!         hit  → conditional GET → 304: cached | 200: replace | down: stale
//!         miss → plain GET       → 200: store  | other: forward | down: 502
//!     → session.rs (write reply, shut down)
//! ```

pub mod handler;
pub mod session;
pub mod target;

pub use handler::{ProxyHandler, Reply, SessionOutcome};
pub use session::{Session, SessionError};
pub use target::Target;
