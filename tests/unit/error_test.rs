//! Tests for error types

use std::io;

use poll_service::core::{PollError, SinkError};

#[test]
fn test_poll_error_display() {
    let err = PollError::InvalidConfig("worker_count must be greater than 0".into());
    assert_eq!(
        err.to_string(),
        "invalid configuration: worker_count must be greater than 0"
    );

    let err = PollError::QueueFull { depth: 512 };
    assert_eq!(err.to_string(), "ingress queue full: 512 requests pending");
}

#[test]
fn test_spawn_error_keeps_source() {
    let err = PollError::Spawn {
        role: "worker",
        source: io::Error::new(io::ErrorKind::OutOfMemory, "no stack"),
    };
    assert!(err.to_string().starts_with("failed to spawn worker thread"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_sink_error_display() {
    assert_eq!(SinkError::Closed.to_string(), "response channel closed");
    assert_eq!(
        SinkError::Transport("reset".into()).to_string(),
        "transport error: reset"
    );

    let io_err: SinkError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
    assert!(matches!(io_err, SinkError::Io(_)));
}
