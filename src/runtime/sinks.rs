//! Blocking response sinks: a crossbeam channel and a raw HTTP/1.1 writer.

use std::io::Write;

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::core::{PollResponse, ResponseSink, SinkError};

/// Sink that forwards the terminal response over a channel.
///
/// Suited to blocking transports where the connection handler parks on the
/// receiver until the poll service answers.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<PollResponse>,
}

impl ChannelSink {
    /// Wrap an existing sender.
    #[must_use]
    pub const fn new(tx: Sender<PollResponse>) -> Self {
        Self { tx }
    }

    /// Create a sink and the receiver its response arrives on.
    #[must_use]
    pub fn pair() -> (Self, Receiver<PollResponse>) {
        let (tx, rx) = bounded(1);
        (Self { tx }, rx)
    }
}

impl ResponseSink for ChannelSink {
    fn send(self: Box<Self>, response: PollResponse) -> Result<(), SinkError> {
        self.tx.try_send(response).map_err(|_| SinkError::Closed)
    }
}

/// Sink that writes a complete HTTP/1.1 response to a byte stream.
///
/// The response is sent with an explicit `Content-Length` (never chunked).
/// Writing and flushing form a single terminal action: the first failure is
/// returned and nothing further is attempted on the stream.
#[derive(Debug)]
pub struct WriterSink<W> {
    stream: W,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writable stream.
    pub fn new(stream: W) -> Self {
        Self { stream }
    }
}

/// Render the status line and headers for `response`.
#[must_use]
pub fn response_head(response: &PollResponse) -> String {
    let connection = if response.keep_alive { "keep-alive" } else { "close" };
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: {}\r\n\r\n",
        response.status,
        reason_phrase(response.status),
        response.content_type,
        response.content_length(),
        connection,
    )
}

const fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}

impl<W: Write + Send> ResponseSink for WriterSink<W> {
    fn send(mut self: Box<Self>, response: PollResponse) -> Result<(), SinkError> {
        let head = response_head(&response);
        self.stream.write_all(head.as_bytes())?;
        self.stream.write_all(&response.body)?;
        self.stream.flush()?;
        Ok(())
    }
}
