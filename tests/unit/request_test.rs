//! Tests for requests and responses

use std::sync::Arc;
use std::time::Duration;

use poll_service::core::{
    AppResult, PollReadiness, PollRequest, PollResponse, RequestId, ResponseContext, ResponseKind,
    DEFAULT_CONTENT_TYPE,
};
use poll_service::runtime::ChannelSink;

struct Idle;

impl PollReadiness for Idle {
    fn has_events(&self, _: RequestId, _: &str) -> AppResult<bool> {
        Ok(false)
    }

    fn get_events(&self, _: RequestId, _: &str, _: &mut ResponseContext) -> AppResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn no_events(&self, _: RequestId, _: &str, _: &mut ResponseContext) -> AppResult<Vec<u8>> {
        Ok(b"idle".to_vec())
    }
}

#[test]
fn test_request_ids_are_unique() {
    let a = RequestId::new();
    let b = RequestId::new();
    assert_ne!(a, b);
    assert_eq!(a.to_string(), a.as_uuid().to_string());
}

#[test]
fn test_request_expiry() {
    let (sink, _rx) = ChannelSink::pair();
    let request = PollRequest::new("session", Arc::new(Idle), sink);
    let start = request.enqueued_at();

    assert!(!request.is_expired(start, Duration::from_secs(1)));
    assert!(request.is_expired(start + Duration::from_secs(1), Duration::from_secs(1)));
    assert_eq!(request.session_key(), "session");
}

#[test]
fn test_dropped_request_is_answered() {
    let (sink, rx) = ChannelSink::pair();
    let id = RequestId::new();
    let request = PollRequest::new("session", Arc::new(Idle), sink).with_id(id);
    assert_eq!(request.id(), id);

    drop(request);
    let response = rx.try_recv().unwrap();
    assert_eq!(response.kind, ResponseKind::Drained);
    assert_eq!(response.body, b"idle".to_vec());
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_response_defaults() {
    let response = PollResponse::new(ResponseKind::NoEvents, ResponseContext::default(), Vec::new());
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, DEFAULT_CONTENT_TYPE);
    assert!(response.keep_alive);
    assert_eq!(response.content_length(), 0);
    assert!(!response.has_events());
}
