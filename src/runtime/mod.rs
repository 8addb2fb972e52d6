//! Transport adapters: response sinks for blocking and async front ends.

pub mod sinks;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_sink;

pub use sinks::{response_head, ChannelSink, WriterSink};
#[cfg(feature = "tokio-runtime")]
pub use tokio_sink::{pending_response, OneshotSink, PendingResponse};
