//! Short-lived outbound connections to origin servers.
//!
//! # Responsibilities
//! - Open one TCP connection per request (no pooling)
//! - Send the prepared request bytes
//! - Read until the origin closes the stream
//!
//! # Design Decisions
//! - Every failure comes back as an `OriginError` value; the session decides
//!   between 502 and the stale fallback
//! - The timeout bounds the connect and each individual read, so a slow but
//!   steady origin is not cut off
//! - No retries at this layer

use std::future::Future;
use std::io;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

use crate::config::OriginConfig;
use crate::observability::metrics;

/// Error type for origin round trips.
#[derive(Debug, thiserror::Error)]
pub enum OriginError {
    #[error("connect to {addr} failed: {source}")]
    Connect { addr: String, source: io::Error },
    #[error("origin {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },
    #[error("I/O with origin {addr} failed: {source}")]
    Io { addr: String, source: io::Error },
    #[error("origin {addr} response exceeded {limit} bytes")]
    TooLarge { addr: String, limit: usize },
}

/// Sends a fully built request to an origin and returns its raw response.
pub trait OriginConnector: Send + Sync + 'static {
    fn forward(
        &self,
        host: &str,
        port: u16,
        request: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, OriginError>> + Send;
}

/// Plain TCP origin connector.
#[derive(Debug, Clone)]
pub struct TcpOriginConnector {
    timeout: Duration,
    read_chunk_bytes: usize,
    max_response_bytes: usize,
}

impl TcpOriginConnector {
    pub fn new(config: &OriginConfig) -> Self {
        Self {
            timeout: config.timeout(),
            read_chunk_bytes: config.read_chunk_bytes.max(1),
            max_response_bytes: config.max_response_bytes,
        }
    }

    async fn round_trip(&self, addr: &str, request: &[u8]) -> Result<Vec<u8>, OriginError> {
        let timed_out = || OriginError::Timeout {
            addr: addr.to_string(),
            timeout: self.timeout,
        };
        let io_err = |source| OriginError::Io {
            addr: addr.to_string(),
            source,
        };

        let mut stream = time::timeout(self.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| timed_out())?
            .map_err(|source| OriginError::Connect {
                addr: addr.to_string(),
                source,
            })?;

        time::timeout(self.timeout, stream.write_all(request))
            .await
            .map_err(|_| timed_out())?
            .map_err(io_err)?;

        let mut response = Vec::new();
        let mut chunk = vec![0u8; self.read_chunk_bytes];
        loop {
            let read = time::timeout(self.timeout, stream.read(&mut chunk))
                .await
                .map_err(|_| timed_out())?
                .map_err(io_err)?;
            if read == 0 {
                break;
            }
            if response.len() + read > self.max_response_bytes {
                return Err(OriginError::TooLarge {
                    addr: addr.to_string(),
                    limit: self.max_response_bytes,
                });
            }
            response.extend_from_slice(&chunk[..read]);
        }

        Ok(response)
    }
}

impl OriginConnector for TcpOriginConnector {
    async fn forward(&self, host: &str, port: u16, request: &[u8]) -> Result<Vec<u8>, OriginError> {
        let addr = authority(host, port);
        let start = Instant::now();
        let result = self.round_trip(&addr, request).await;

        metrics::record_origin_request(result.is_ok(), start);
        match &result {
            Ok(response) => {
                tracing::debug!(origin = %addr, bytes = response.len(), "Origin responded");
            }
            Err(e) => {
                tracing::warn!(origin = %addr, error = %e, "Origin request failed");
            }
        }
        result
    }
}

/// `host:port`, bracketing IPv6 literals.
fn authority(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}
