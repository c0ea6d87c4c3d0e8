//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved request target
//!     → key.rs (scheme://host:port/path?query)
//!     → store.rs get (under the store mutex)
//!     → [session contacts origin, lock NOT held]
//!     → store.rs put (complete replacement entry)
//! ```
//!
//! # Design Decisions
//! - One mutex guards the whole map; entries are replaced, never patched
//! - Entries hold reference-counted bytes so reads clone cheaply
//! - Only origin 200 responses are ever stored
//! - No expiry: every hit is revalidated against the origin
//! - Revalidation is not atomic per key; the later put wins

pub mod entry;
pub mod key;
pub mod store;

pub use entry::{CacheEntry, EntrySummary};
pub use key::CacheKey;
pub use store::CacheStore;
