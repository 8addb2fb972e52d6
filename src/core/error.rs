//! Error types for the poll service.

use thiserror::Error;

/// Errors produced by the poll service manager.
#[derive(Debug, Error)]
pub enum PollError {
    /// Configuration rejected at start.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The ingress queue reached its admission limit.
    #[error("ingress queue full: {depth} requests pending")]
    QueueFull {
        /// Queue depth at the time of rejection.
        depth: usize,
    },
    /// A dispatcher or worker thread could not be spawned.
    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        /// Which thread failed (`dispatcher` or `worker`).
        role: &'static str,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a [`ResponseSink`](crate::core::ResponseSink) while writing
/// the terminal response.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The receiving side of the response channel is gone.
    #[error("response channel closed")]
    Closed,
    /// I/O failure on the underlying stream.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Transport-specific failure with context.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Application-facing result using anyhow for readiness capabilities.
pub type AppResult<T> = Result<T, anyhow::Error>;
