//! Long-poll dispatch core: request entity, shared ingress queue, dispatcher,
//! workers, and the manager that ties them together.

pub mod error;
pub mod ingress;
pub mod manager;
pub mod readiness;
pub mod request;
pub mod stats;

mod dispatcher;
mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{AppResult, PollError, SinkError};
pub use ingress::partition;
pub use manager::{PollServiceManager, ShutdownReport};
pub use readiness::{PollReadiness, ResponseContext, DEFAULT_CONTENT_TYPE};
pub use request::{PollRequest, PollResponse, RequestId, ResponseKind, ResponseSink};
pub use stats::PollStats;
