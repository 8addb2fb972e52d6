//! Poll request entity and terminal response delivery.
//!
//! A [`PollRequest`] owns the single response channel of one held exchange.
//! The channel is consumed by the first terminal write, so a request can be
//! answered at most once; the `Drop` implementation answers it with a
//! no-events payload if it is discarded unanswered, so it is never answered
//! zero times either.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{AppResult, SinkError};
use super::readiness::{guarded, PollReadiness, ResponseContext};

/// Opaque identifier of one pending exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RequestId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a terminal response was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// Readiness reported events; body built by `get_events`.
    Events,
    /// Poll timeout elapsed; body built by `no_events`.
    NoEvents,
    /// Answered during shutdown or rejected at admission; body built by `no_events`.
    Drained,
}

/// Terminal response handed to a [`ResponseSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResponse {
    /// Reason for the response.
    pub kind: ResponseKind,
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header value.
    pub content_type: String,
    /// Whether the connection stays open afterwards.
    pub keep_alive: bool,
    /// Response body.
    pub body: Vec<u8>,
}

impl PollResponse {
    /// Build a response from a payload and the head the builder prepared.
    #[must_use]
    pub fn new(kind: ResponseKind, ctx: ResponseContext, body: Vec<u8>) -> Self {
        Self {
            kind,
            status: ctx.status,
            content_type: ctx.content_type,
            keep_alive: ctx.keep_alive,
            body,
        }
    }

    /// Body length in bytes, as sent in `Content-Length`.
    #[must_use]
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Whether this response carries an events payload.
    #[must_use]
    pub fn has_events(&self) -> bool {
        self.kind == ResponseKind::Events
    }
}

/// The one response channel of a held exchange.
///
/// Implemented by the transport layer. `send` consumes the sink, so it is
/// called at most once per request. Errors are logged by the caller and the
/// request is considered disposed; the write is never retried.
pub trait ResponseSink: Send {
    /// Write the terminal response.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the transport could not deliver the response.
    fn send(self: Box<Self>, response: PollResponse) -> Result<(), SinkError>;
}

/// Outcome of a terminal write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Sent,
    Failed,
}

/// One held long-poll exchange plus its readiness capability.
pub struct PollRequest {
    id: RequestId,
    session_key: String,
    enqueued_at: Instant,
    readiness: Arc<dyn PollReadiness>,
    sink: Option<Box<dyn ResponseSink>>,
}

impl PollRequest {
    /// Create a request with a fresh id.
    pub fn new<S>(session_key: impl Into<String>, readiness: Arc<dyn PollReadiness>, sink: S) -> Self
    where
        S: ResponseSink + 'static,
    {
        Self {
            id: RequestId::new(),
            session_key: session_key.into(),
            enqueued_at: Instant::now(),
            readiness,
            sink: Some(Box::new(sink)),
        }
    }

    /// Replace the generated id with a caller-supplied one.
    #[must_use]
    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    /// Request identifier.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Session or channel the requester is polling on.
    #[must_use]
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// When the request was admitted by the manager.
    #[must_use]
    pub const fn enqueued_at(&self) -> Instant {
        self.enqueued_at
    }

    /// Whether the poll timeout has elapsed since admission.
    #[must_use]
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.enqueued_at) >= timeout
    }

    pub(crate) fn mark_enqueued(&mut self, now: Instant) {
        self.enqueued_at = now;
    }

    pub(crate) fn has_events(&self) -> AppResult<bool> {
        guarded("has_events", || {
            self.readiness.has_events(self.id, &self.session_key)
        })
    }

    /// Build the events payload and write it.
    ///
    /// If the payload builder fails the request is handed back untouched.
    pub(crate) fn respond_with_events(mut self) -> Result<Delivery, (Self, anyhow::Error)> {
        let mut ctx = ResponseContext::default();
        let built = guarded("get_events", || {
            self.readiness.get_events(self.id, &self.session_key, &mut ctx)
        });
        match built {
            Ok(body) => Ok(self.write(ResponseKind::Events, ctx, body)),
            Err(e) => Err((self, e)),
        }
    }

    /// Build the no-events payload and write it.
    pub(crate) fn respond_empty(mut self, kind: ResponseKind) -> Delivery {
        self.write_empty(kind)
    }

    fn write_empty(&mut self, kind: ResponseKind) -> Delivery {
        let mut ctx = ResponseContext::default();
        let built = guarded("no_events", || {
            self.readiness.no_events(self.id, &self.session_key, &mut ctx)
        });
        let body = match built {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    request_id = %self.id,
                    session_key = %self.session_key,
                    error = %e,
                    "no_events builder failed; sending empty body"
                );
                ctx = ResponseContext::default();
                Vec::new()
            }
        };
        self.write(kind, ctx, body)
    }

    fn write(&mut self, kind: ResponseKind, ctx: ResponseContext, body: Vec<u8>) -> Delivery {
        // The sink is only taken here, and every caller owns an unanswered request.
        let Some(sink) = self.sink.take() else {
            return Delivery::Failed;
        };
        let response = PollResponse::new(kind, ctx, body);
        match panic::catch_unwind(AssertUnwindSafe(move || sink.send(response))) {
            Ok(Ok(())) => {
                debug!(request_id = %self.id, kind = ?kind, "poll request completed");
                Delivery::Sent
            }
            Ok(Err(e)) => {
                warn!(
                    request_id = %self.id,
                    session_key = %self.session_key,
                    error = %e,
                    "terminal write failed; request disposed"
                );
                Delivery::Failed
            }
            Err(_) => {
                warn!(
                    request_id = %self.id,
                    session_key = %self.session_key,
                    "response sink panicked; request disposed"
                );
                Delivery::Failed
            }
        }
    }
}

impl Drop for PollRequest {
    fn drop(&mut self) {
        if self.sink.is_some() {
            warn!(
                request_id = %self.id,
                "poll request dropped without a response; answering with no-events"
            );
            self.write_empty(ResponseKind::Drained);
        }
    }
}

impl fmt::Debug for PollRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollRequest")
            .field("id", &self.id)
            .field("session_key", &self.session_key)
            .field("enqueued_at", &self.enqueued_at)
            .field("answered", &self.sink.is_none())
            .finish_non_exhaustive()
    }
}
