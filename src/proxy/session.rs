//! Per-connection session.
//!
//! # States
//! ```text
//! AwaitRequest → Validate → (CacheHit | CacheMiss) → ForwardToOrigin → Respond → Closed
//! ```
//!
//! # Design Decisions
//! - Exactly one request/response per connection; no keep-alive
//! - Reading stops at the head terminator, on EOF, or after an inactivity
//!   timeout; whatever arrived by then is parsed
//! - The stream is shut down on every exit path

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time;

use crate::config::ClientConfig;
use crate::http::request::{find_head_end, HEAD_TERMINATOR};
use crate::http::response::Rejection;
use crate::origin::OriginConnector;
use crate::proxy::handler::{ProxyHandler, SessionOutcome};

const READ_CHUNK: usize = 4096;

/// Error type for client-side I/O failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to read request: {0}")]
    Read(#[source] io::Error),
    #[error("failed to write response: {0}")]
    Write(#[source] io::Error),
}

/// What the client sent before the read phase ended.
#[derive(Debug, PartialEq, Eq)]
enum RequestHead {
    Empty,
    Received(Vec<u8>),
    Oversized,
}

/// One client connection driven through the proxy pipeline.
pub struct Session<S, C> {
    stream: S,
    handler: ProxyHandler<C>,
    limits: ClientConfig,
}

impl<S, C> Session<S, C>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: OriginConnector,
{
    pub fn new(stream: S, handler: ProxyHandler<C>, limits: ClientConfig) -> Self {
        Self {
            stream,
            handler,
            limits,
        }
    }

    /// Serve a single request and close the connection.
    pub async fn run(mut self) -> Result<SessionOutcome, SessionError> {
        let result = self.exchange().await;
        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(error = %e, "Client shutdown failed");
        }
        result
    }

    async fn exchange(&mut self) -> Result<SessionOutcome, SessionError> {
        let raw = match self.read_request_head().await.map_err(SessionError::Read)? {
            RequestHead::Empty => return Ok(SessionOutcome::NoRequest),
            RequestHead::Oversized => {
                tracing::debug!(limit = self.limits.max_head_bytes, "Request head too large");
                self.write(&Rejection::BadRequest.to_bytes()).await?;
                return Ok(SessionOutcome::Rejected(Rejection::BadRequest));
            }
            RequestHead::Received(raw) => raw,
        };

        let reply = self.handler.respond(&raw).await;
        self.write(&reply.bytes).await?;
        Ok(reply.outcome)
    }

    async fn read_request_head(&mut self) -> io::Result<RequestHead> {
        let idle = self.limits.idle_timeout();
        let mut data = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let read = match time::timeout(idle, self.stream.read(&mut chunk)).await {
                Ok(read) => read?,
                Err(_) => {
                    tracing::debug!(received = data.len(), "Client idle, parsing what arrived");
                    break;
                }
            };
            if read == 0 {
                break;
            }

            let scan_from = data.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
            data.extend_from_slice(&chunk[..read]);
            if find_head_end(&data[scan_from..]).is_some() {
                break;
            }
            if data.len() > self.limits.max_head_bytes {
                return Ok(RequestHead::Oversized);
            }
        }

        if data.is_empty() {
            Ok(RequestHead::Empty)
        } else {
            Ok(RequestHead::Received(data))
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        self.stream.write_all(bytes).await.map_err(SessionError::Write)?;
        self.stream.flush().await.map_err(SessionError::Write)
    }
}
