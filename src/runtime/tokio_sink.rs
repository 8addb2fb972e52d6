//! Tokio oneshot sink for async transports.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::core::{PollResponse, ResponseSink, SinkError};

/// Sink backed by a tokio oneshot channel.
#[derive(Debug)]
pub struct OneshotSink {
    tx: oneshot::Sender<PollResponse>,
}

impl ResponseSink for OneshotSink {
    fn send(self: Box<Self>, response: PollResponse) -> Result<(), SinkError> {
        self.tx.send(response).map_err(|_| SinkError::Closed)
    }
}

/// Future resolving to the terminal response of one poll request.
///
/// Resolves to `SinkError::Closed` if the request was discarded without a
/// response, which the poll service never does while the future is alive.
#[derive(Debug)]
pub struct PendingResponse {
    rx: oneshot::Receiver<PollResponse>,
}

impl Future for PendingResponse {
    type Output = Result<PollResponse, SinkError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| SinkError::Closed))
    }
}

/// Create a sink for a [`PollRequest`](crate::core::PollRequest) and the
/// future an async handler awaits for its response.
#[must_use]
pub fn pending_response() -> (OneshotSink, PendingResponse) {
    let (tx, rx) = oneshot::channel();
    (OneshotSink { tx }, PendingResponse { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ResponseContext, ResponseKind};

    #[tokio::test]
    async fn test_pending_response_resolves() {
        let (sink, pending) = pending_response();
        let response = PollResponse::new(ResponseKind::Events, ResponseContext::default(), b"ok".to_vec());
        Box::new(sink).send(response.clone()).unwrap();
        assert_eq!(pending.await.unwrap(), response);
    }

    #[tokio::test]
    async fn test_dropped_sink_closes() {
        let (sink, pending) = pending_response();
        drop(sink);
        assert!(matches!(pending.await, Err(SinkError::Closed)));
    }
}
