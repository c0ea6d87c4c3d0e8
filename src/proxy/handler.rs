//! Request-to-reply pipeline.
//!
//! # Responsibilities
//! - Validate the request head (version, method, target)
//! - Look up the cache and choose a fresh or conditional origin request
//! - Interpret the origin's answer and update the cache
//! - Decide the exact bytes the client receives
//!
//! # Design Decisions
//! - The store lock is never held across the origin round trip
//! - Only status 200 is cached; 304 on a hit serves the cached bytes
//! - An unreachable origin on a hit serves the cached bytes (stale-on-error);
//!   this is the only fallback, there are no retries

use std::sync::Arc;

use bytes::Bytes;

use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::http::request::parse_request_head;
use crate::http::response::{split_response, Rejection};
use crate::observability::metrics;
use crate::origin::OriginConnector;
use crate::proxy::target::Target;

/// Versions accepted on the client side.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["HTTP/1.1", "HTTP/1.0"];

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The client sent nothing.
    NoRequest,
    /// The proxy answered without a usable origin response.
    Rejected(Rejection),
    /// Miss: origin returned 200 and the response was cached.
    Stored,
    /// Origin response passed through without touching the cache.
    Forwarded { status: Option<u16> },
    /// Hit: origin returned 304 and the cached response was served.
    Revalidated,
    /// Hit: origin returned 200 and the entry was replaced.
    Refreshed,
    /// Hit: origin unreachable, cached response served.
    StaleFallback,
}

impl SessionOutcome {
    /// Short label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::NoRequest => "no_request",
            SessionOutcome::Rejected(Rejection::BadGateway) => "bad_gateway",
            SessionOutcome::Rejected(_) => "rejected",
            SessionOutcome::Stored => "stored",
            SessionOutcome::Forwarded { .. } => "forwarded",
            SessionOutcome::Revalidated => "revalidated",
            SessionOutcome::Refreshed => "refreshed",
            SessionOutcome::StaleFallback => "stale_fallback",
        }
    }
}

/// Bytes to send back plus how they were produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub bytes: Bytes,
    pub outcome: SessionOutcome,
}

impl Reply {
    fn new(bytes: impl Into<Bytes>, outcome: SessionOutcome) -> Self {
        Self {
            bytes: bytes.into(),
            outcome,
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self::new(rejection.to_bytes(), SessionOutcome::Rejected(rejection))
    }
}

/// Shared, per-server pipeline state: the cache and the origin connector.
pub struct ProxyHandler<C> {
    store: CacheStore,
    connector: Arc<C>,
    user_agent: Arc<str>,
}

impl<C> Clone for ProxyHandler<C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            connector: Arc::clone(&self.connector),
            user_agent: Arc::clone(&self.user_agent),
        }
    }
}

impl<C: OriginConnector> ProxyHandler<C> {
    pub fn new(store: CacheStore, connector: C, user_agent: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            connector: Arc::new(connector),
            user_agent: user_agent.into(),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Produce the reply for one raw request head.
    pub async fn respond(&self, raw_request: &[u8]) -> Reply {
        let target = match validate(raw_request) {
            Ok(target) => target,
            Err(rejection) => {
                tracing::debug!(status = %rejection, "Request rejected");
                return Reply::rejected(rejection);
            }
        };

        let key = target.cache_key();
        let cached = self.store.get(&key);
        metrics::record_cache_lookup(cached.is_some());

        match cached {
            Some(entry) => {
                tracing::debug!(key = %key, validator = ?entry.last_modified, "Cache hit");
                self.revalidate(&target, key, entry).await
            }
            None => {
                tracing::debug!(key = %key, "Cache miss");
                self.fetch(&target, key).await
            }
        }
    }

    async fn revalidate(&self, target: &Target, key: CacheKey, entry: CacheEntry) -> Reply {
        let request = target.origin_request(&self.user_agent, entry.last_modified.as_deref());
        let response = match self.connector.forward(&target.host, target.port, &request).await {
            Ok(response) => Bytes::from(response),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Origin unreachable, serving cached response");
                return Reply::new(entry.raw_response, SessionOutcome::StaleFallback);
            }
        };

        let (status, last_modified) = inspect(&response);
        match status {
            Some(304) => {
                tracing::debug!(key = %key, "Not modified, serving cached response");
                Reply::new(entry.raw_response, SessionOutcome::Revalidated)
            }
            Some(200) => {
                self.store
                    .put(key.clone(), CacheEntry::new(response.clone(), last_modified));
                tracing::debug!(key = %key, "Cache entry refreshed");
                Reply::new(response, SessionOutcome::Refreshed)
            }
            status => {
                tracing::debug!(key = %key, status = ?status, "Forwarding origin response");
                Reply::new(response, SessionOutcome::Forwarded { status })
            }
        }
    }

    async fn fetch(&self, target: &Target, key: CacheKey) -> Reply {
        let request = target.origin_request(&self.user_agent, None);
        let response = match self.connector.forward(&target.host, target.port, &request).await {
            Ok(response) => Bytes::from(response),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Origin unreachable");
                return Reply::rejected(Rejection::BadGateway);
            }
        };

        let (status, last_modified) = inspect(&response);
        if status == Some(200) {
            self.store
                .put(key.clone(), CacheEntry::new(response.clone(), last_modified));
            tracing::debug!(key = %key, "Stored in cache");
            Reply::new(response, SessionOutcome::Stored)
        } else {
            tracing::debug!(key = %key, status = ?status, "Forwarding origin response");
            Reply::new(response, SessionOutcome::Forwarded { status })
        }
    }
}

/// Parse and validate a request head, resolving its target.
pub fn validate(raw_request: &[u8]) -> Result<Target, Rejection> {
    let request = parse_request_head(raw_request).map_err(|e| {
        tracing::debug!(error = %e, "Unparseable request");
        Rejection::BadRequest
    })?;
    tracing::debug!(
        method = %request.method,
        target = %request.target,
        version = %request.version,
        "Request received"
    );

    if !SUPPORTED_VERSIONS.contains(&request.version.as_str()) {
        return Err(Rejection::VersionNotSupported);
    }
    if request.method != "GET" {
        return Err(Rejection::Forbidden);
    }
    Target::resolve(&request)
}

/// Status code and `Last-Modified` of a raw origin response.
fn inspect(response: &[u8]) -> (Option<u16>, Option<String>) {
    let split = split_response(response);
    if split.is_degraded() {
        tracing::debug!("Origin response has no header terminator");
    }
    (split.status_code(), split.header_value("last-modified"))
}
