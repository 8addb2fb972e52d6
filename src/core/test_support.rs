//! Stub capabilities and sinks shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use parking_lot::Mutex;

use super::error::{AppResult, SinkError};
use super::readiness::{PollReadiness, ResponseContext};
use super::request::{PollResponse, RequestId, ResponseSink};

/// Readiness stub with switchable behaviour.
#[derive(Default)]
pub(crate) struct StubReadiness {
    ready: AtomicBool,
    fail_has_events: AtomicBool,
    fail_get_events: AtomicBool,
    fail_no_events: AtomicBool,
    pub probes: AtomicUsize,
}

impl StubReadiness {
    pub fn ready() -> Arc<Self> {
        let stub = Self::default();
        stub.ready.store(true, Ordering::SeqCst);
        Arc::new(stub)
    }

    pub fn never_ready() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn fail_has_events(&self, fail: bool) {
        self.fail_has_events.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get_events(&self, fail: bool) {
        self.fail_get_events.store(fail, Ordering::SeqCst);
    }

    pub fn fail_no_events(&self, fail: bool) {
        self.fail_no_events.store(fail, Ordering::SeqCst);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl PollReadiness for StubReadiness {
    fn has_events(&self, _request_id: RequestId, _session_key: &str) -> AppResult<bool> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.fail_has_events.load(Ordering::SeqCst) {
            return Err(anyhow!("probe failed"));
        }
        Ok(self.ready.load(Ordering::SeqCst))
    }

    fn get_events(
        &self,
        _request_id: RequestId,
        _session_key: &str,
        _ctx: &mut ResponseContext,
    ) -> AppResult<Vec<u8>> {
        if self.fail_get_events.load(Ordering::SeqCst) {
            return Err(anyhow!("get_events failed"));
        }
        Ok(b"events".to_vec())
    }

    fn no_events(
        &self,
        _request_id: RequestId,
        _session_key: &str,
        _ctx: &mut ResponseContext,
    ) -> AppResult<Vec<u8>> {
        if self.fail_no_events.load(Ordering::SeqCst) {
            return Err(anyhow!("no_events failed"));
        }
        Ok(b"none".to_vec())
    }
}

/// Sink that records every response it is handed.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    responses: Arc<Mutex<Vec<PollResponse>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responses(&self) -> Vec<PollResponse> {
        self.responses.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.responses.lock().len()
    }
}

impl ResponseSink for RecordingSink {
    fn send(self: Box<Self>, response: PollResponse) -> Result<(), SinkError> {
        self.responses.lock().push(response);
        Ok(())
    }
}

/// Sink whose transport is always broken.
pub(crate) struct FailingSink;

impl ResponseSink for FailingSink {
    fn send(self: Box<Self>, _response: PollResponse) -> Result<(), SinkError> {
        Err(SinkError::Transport("connection reset".into()))
    }
}

/// Sink whose transport panics mid-write.
pub(crate) struct PanickingSink;

impl ResponseSink for PanickingSink {
    fn send(self: Box<Self>, _response: PollResponse) -> Result<(), SinkError> {
        panic!("transport exploded")
    }
}
