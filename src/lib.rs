//! Caching forward HTTP proxy library.
//!
//! Clients send `GET` requests (absolute-form or origin-form) to the proxy.
//! The first request for a resource is fetched from the origin and the
//! `200` response is cached verbatim. Later requests revalidate with
//! `If-Modified-Since`; a `304` serves the cached bytes, and an unreachable
//! origin falls back to them.

// Core pipeline
pub mod cache;
pub mod http;
pub mod origin;
pub mod proxy;

// Plumbing
pub mod config;
pub mod net;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use cache::CacheStore;
pub use config::ProxyConfig;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
