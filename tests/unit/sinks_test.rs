//! Tests for transport sinks

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use poll_service::core::{PollResponse, ResponseContext, ResponseKind, ResponseSink, SinkError};
use poll_service::runtime::{response_head, WriterSink};

/// Writer that appends into a shared buffer.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer whose peer has gone away.
struct ClosedSocket;

impl Write for ClosedSocket {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_writer_sink_writes_full_response() {
    let buffer = SharedBuffer::default();
    let body = "{\"events\":[\"héllo\"]}".as_bytes().to_vec();
    let ctx = ResponseContext {
        status: 200,
        content_type: "application/json".into(),
        keep_alive: true,
    };
    let response = PollResponse::new(ResponseKind::Events, ctx, body.clone());

    Box::new(WriterSink::new(buffer.clone()))
        .send(response.clone())
        .unwrap();

    let written = buffer.0.lock().unwrap().clone();
    let head = response_head(&response);
    assert!(head.contains(&format!("Content-Length: {}\r\n", body.len())));
    assert!(head.contains("Connection: keep-alive"));
    assert!(!head.contains("Transfer-Encoding"));
    assert_eq!(written, [head.as_bytes(), body.as_slice()].concat());
}

#[test]
fn test_writer_sink_reports_io_failure() {
    let response = PollResponse::new(ResponseKind::NoEvents, ResponseContext::default(), Vec::new());
    let result = Box::new(WriterSink::new(ClosedSocket)).send(response);
    assert!(matches!(result, Err(SinkError::Io(_))));
}

#[test]
fn test_response_head_unknown_status() {
    let ctx = ResponseContext {
        status: 299,
        ..ResponseContext::default()
    };
    let response = PollResponse::new(ResponseKind::NoEvents, ctx, Vec::new());
    assert!(response_head(&response).starts_with("HTTP/1.1 299 \r\n"));
}
