//! Configuration for the poll service.

pub mod service;

pub use service::{PollServiceConfig, ENV_PREFIX};
