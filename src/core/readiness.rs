//! Readiness capability consumed per poll request.

use std::panic::{self, AssertUnwindSafe};

use anyhow::anyhow;

use super::error::AppResult;
use super::request::RequestId;

/// Default content type for terminal responses.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Mutable response head handed to payload builders.
///
/// Builders may adjust the status, content type, or keep-alive flag before the
/// terminal write; the body length is always derived from the returned payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseContext {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header value.
    pub content_type: String,
    /// Whether the connection stays open after the response.
    pub keep_alive: bool,
}

impl Default for ResponseContext {
    fn default() -> Self {
        Self {
            status: 200,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            keep_alive: true,
        }
    }
}

/// Decides whether a held request can be completed and builds its payloads.
///
/// One capability is usually shared by every request polling the same
/// subsystem, so implementations are `Send + Sync` and receive the request id
/// and session key on each call.
///
/// All three calls run on a worker thread in the middle of a batch. They must
/// be non-blocking or bounded in time: a call that blocks stalls every other
/// request held by that worker.
///
/// # Example
///
/// ```rust,ignore
/// use poll_service::core::{AppResult, PollReadiness, RequestId, ResponseContext};
///
/// struct EventQueue { /* ... */ }
///
/// impl PollReadiness for EventQueue {
///     fn has_events(&self, _id: RequestId, session_key: &str) -> AppResult<bool> {
///         Ok(self.pending(session_key) > 0)
///     }
///
///     fn get_events(&self, _id: RequestId, session_key: &str, ctx: &mut ResponseContext) -> AppResult<Vec<u8>> {
///         ctx.content_type = "application/json".into();
///         self.take_json(session_key)
///     }
///
///     fn no_events(&self, _id: RequestId, _session_key: &str, _ctx: &mut ResponseContext) -> AppResult<Vec<u8>> {
///         Ok(b"[]".to_vec())
///     }
/// }
/// ```
pub trait PollReadiness: Send + Sync {
    /// Non-blocking readiness probe.
    ///
    /// An error is treated as "not ready": the request is retried on the next
    /// partition cycle until it times out.
    fn has_events(&self, request_id: RequestId, session_key: &str) -> AppResult<bool>;

    /// Build the events payload. Only called after `has_events` returned `true`.
    fn get_events(
        &self,
        request_id: RequestId,
        session_key: &str,
        ctx: &mut ResponseContext,
    ) -> AppResult<Vec<u8>>;

    /// Build the empty payload used on timeout and on shutdown drain.
    fn no_events(
        &self,
        request_id: RequestId,
        session_key: &str,
        ctx: &mut ResponseContext,
    ) -> AppResult<Vec<u8>>;
}

/// Run a capability call, turning a panic into an error.
pub(crate) fn guarded<T>(op: &'static str, f: impl FnOnce() -> AppResult<T>) -> AppResult<T> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|_| Err(anyhow!("readiness capability panicked in {op}")))
}
