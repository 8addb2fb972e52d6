//! # Poll Service
//!
//! A long-poll request dispatch engine. Transports hand over held-open HTTP
//! exchanges; a fixed pool of worker threads keeps each one open until its
//! readiness capability reports events or its poll timeout elapses, then
//! writes exactly one terminal response.
//!
//! ## Architecture
//!
//! - **Shared ingress queue**: every new or retried request enters one FIFO
//! - **Dispatcher**: one thread that, once per dispatch interval, splits the
//!   whole queue into even, order-preserving batches, one per worker
//! - **Workers**: dedicated OS threads that probe readiness for each request
//!   in their private queue, then complete it, time it out, or requeue it
//! - **Manager**: owns startup, admission, and the drain that answers every
//!   pending request on shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use poll_service::config::PollServiceConfig;
//! use poll_service::core::{PollRequest, PollServiceManager};
//! use poll_service::runtime::pending_response;
//!
//! let manager = PollServiceManager::start(
//!     PollServiceConfig::new()
//!         .with_worker_count(4)
//!         .with_poll_timeout(Duration::from_secs(25)),
//! )?;
//!
//! // Inside an async HTTP handler:
//! let (sink, pending) = pending_response();
//! manager.enqueue(PollRequest::new(session_id, Arc::clone(&event_queue), sink))?;
//! let response = pending.await?;
//!
//! // On shutdown every request still waiting gets a no-events response.
//! let report = manager.stop();
//! ```
//!
//! For complete examples, see `tests/poll_service_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Configuration models for the service.
pub mod config;
/// Dispatch core: requests, queues, dispatcher, workers, manager.
pub mod core;
/// Transport adapters (response sinks).
pub mod runtime;
/// Shared utilities.
pub mod util;
