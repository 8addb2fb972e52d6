//! Poll service manager: lifecycle, admission, and the shutdown drain.
//!
//! The manager spawns a fixed set of worker threads plus one dispatcher
//! thread, and owns the shared ingress queue they all feed from.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use poll_service::config::PollServiceConfig;
//! use poll_service::core::{PollRequest, PollServiceManager};
//! use poll_service::runtime::ChannelSink;
//!
//! let manager = PollServiceManager::start(
//!     PollServiceConfig::new()
//!         .with_worker_count(4)
//!         .with_poll_timeout(Duration::from_secs(25)),
//! )?;
//!
//! let (sink, response) = ChannelSink::pair();
//! manager.enqueue(PollRequest::new("agent-7", Arc::clone(&events), sink))?;
//! let reply = response.recv()?;
//!
//! let report = manager.stop();
//! ```

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::PollServiceConfig;

use super::dispatcher::Dispatcher;
use super::error::PollError;
use super::ingress::{Admission, Ingress};
use super::request::{Delivery, PollRequest, ResponseKind};
use super::stats::{PollStats, ServiceCounters};
use super::worker::{Step, Worker};

/// Depth step at which an unbounded queue logs a warning.
const DEPTH_WARN_STEP: usize = 1024;

/// State shared by the manager, the dispatcher, and every worker.
pub(crate) struct Shared {
    pub ingress: Ingress<PollRequest>,
    pub counters: ServiceCounters,
    pub poll_timeout: Duration,
}

impl Shared {
    pub fn new(ingress: Ingress<PollRequest>, poll_timeout: Duration) -> Self {
        Self {
            ingress,
            counters: ServiceCounters::default(),
            poll_timeout,
        }
    }

    /// Put a request back for the next cycle, or drain it if stopping.
    pub fn requeue(&self, request: PollRequest) -> Step {
        match self.ingress.push(request, false) {
            Admission::Accepted { .. } => {
                ServiceCounters::bump(&self.counters.requeued);
                Step::Requeued
            }
            Admission::Full { item, .. } | Admission::Stopped(item) => {
                self.drain_one(item);
                Step::Drained
            }
        }
    }

    /// Answer a request with no-events as part of shutdown.
    pub fn drain_one(&self, request: PollRequest) -> Delivery {
        ServiceCounters::bump(&self.counters.drained);
        let delivery = request.respond_empty(ResponseKind::Drained);
        self.record(delivery);
        delivery
    }

    pub fn record(&self, delivery: Delivery) {
        if delivery == Delivery::Failed {
            ServiceCounters::bump(&self.counters.write_failures);
        }
    }
}

/// Summary of a [`PollServiceManager::stop`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Requests answered from the shared queue by this call.
    pub drained: usize,
    /// Drained requests whose terminal write failed.
    pub write_failures: usize,
    /// Threads that did not exit within the grace period and were detached.
    pub detached_threads: usize,
}

/// Long-poll dispatch engine.
///
/// Accepts held requests through [`enqueue`](Self::enqueue), spreads them
/// across a fixed worker pool once per dispatch interval, and guarantees each
/// one a single terminal response: events, a timeout no-events payload, or a
/// drain response when the service stops.
pub struct PollServiceManager {
    config: PollServiceConfig,
    shared: Arc<Shared>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl PollServiceManager {
    /// Validate the configuration and start the worker and dispatcher threads.
    ///
    /// # Errors
    ///
    /// - `PollError::InvalidConfig` if the configuration is invalid (for
    ///   example zero workers); no thread is started.
    /// - `PollError::Spawn` if a thread could not be created; threads
    ///   already started are told to stop.
    pub fn start(config: PollServiceConfig) -> Result<Self, PollError> {
        config.validate().map_err(PollError::InvalidConfig)?;

        let shared = Arc::new(Shared::new(
            Ingress::new(config.max_queue_depth),
            config.poll_timeout(),
        ));

        let mut lanes = Vec::with_capacity(config.worker_count);
        let mut workers = Vec::with_capacity(config.worker_count);

        for worker_id in 0..config.worker_count {
            let (lane, inbox) = unbounded();
            let worker = Worker::new(worker_id, inbox, Arc::clone(&shared), config.worker_idle());
            let name = format!("{}-worker-{worker_id}", config.thread_name_prefix);
            match worker.spawn(name, config.thread_stack_size) {
                Ok(handle) => {
                    lanes.push(lane);
                    workers.push(handle);
                }
                Err(source) => {
                    shared.ingress.stop();
                    return Err(PollError::Spawn {
                        role: "worker",
                        source,
                    });
                }
            }
        }

        let dispatcher = Dispatcher::new(lanes, Arc::clone(&shared), config.dispatch_interval());
        let name = format!("{}-dispatcher", config.thread_name_prefix);
        let dispatcher = match dispatcher.spawn(name, config.thread_stack_size) {
            Ok(handle) => handle,
            Err(source) => {
                shared.ingress.stop();
                return Err(PollError::Spawn {
                    role: "dispatcher",
                    source,
                });
            }
        };

        info!(
            worker_count = config.worker_count,
            poll_timeout_ms = config.poll_timeout_ms,
            dispatch_interval_ms = config.dispatch_interval_ms,
            max_queue_depth = ?config.max_queue_depth,
            "PollServiceManager started"
        );

        Ok(Self {
            config,
            shared,
            dispatcher: Mutex::new(Some(dispatcher)),
            workers: Mutex::new(workers),
        })
    }

    /// Admit a held request.
    ///
    /// Returns immediately. If the service has been stopped the request is
    /// accepted and answered with a drain response at once.
    ///
    /// # Errors
    ///
    /// `PollError::QueueFull` if the admission limit is reached. The request
    /// has already been answered with a no-events payload in that case.
    pub fn enqueue(&self, mut request: PollRequest) -> Result<(), PollError> {
        request.mark_enqueued(Instant::now());
        let request_id = request.id();

        match self.shared.ingress.push(request, true) {
            Admission::Accepted { depth } => {
                ServiceCounters::bump(&self.shared.counters.enqueued);
                if self.config.max_queue_depth.is_none() && depth % DEPTH_WARN_STEP == 0 {
                    warn!(depth = depth, "Ingress queue depth crossed a high-water mark");
                }
                debug!(request_id = %request_id, depth = depth, "Poll request enqueued");
                Ok(())
            }
            Admission::Full { item, depth } => {
                ServiceCounters::bump(&self.shared.counters.rejected);
                warn!(request_id = %request_id, depth = depth, "Ingress queue full; rejecting poll request");
                let delivery = item.respond_empty(ResponseKind::Drained);
                self.shared.record(delivery);
                Err(PollError::QueueFull { depth })
            }
            Admission::Stopped(item) => {
                ServiceCounters::bump(&self.shared.counters.enqueued);
                debug!(request_id = %request_id, "Poll service stopped; draining new request");
                self.shared.drain_one(item);
                Ok(())
            }
        }
    }

    /// Hand a request back for another dispatch cycle.
    ///
    /// Same contract as [`enqueue`](Self::enqueue) except that the original
    /// admission time is kept and the admission limit does not apply.
    pub fn requeue(&self, request: PollRequest) {
        self.shared.requeue(request);
    }

    /// Stop the service and answer everything still pending.
    ///
    /// Flips the running flag, joins the dispatcher, drains the shared queue
    /// with no-events responses, then joins the workers, which drain their
    /// own queues on the way out. Each join waits at most the configured
    /// grace period; a thread still running after that is detached.
    ///
    /// Calling `stop` again is a no-op.
    pub fn stop(&self) -> ShutdownReport {
        if self.shared.ingress.stop() {
            info!("Stopping poll service");
        }
        let grace = self.config.shutdown_grace();
        let mut report = ShutdownReport::default();

        if let Some(handle) = self.dispatcher.lock().take() {
            if !join_with_grace("dispatcher", 0, handle, grace) {
                report.detached_threads += 1;
            }
        }

        // Take the items out first; terminal writes happen without the lock.
        let pending = self.shared.ingress.drain();
        for request in pending {
            report.drained += 1;
            if self.shared.drain_one(request) == Delivery::Failed {
                report.write_failures += 1;
            }
        }

        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for (worker_id, handle) in workers.into_iter().enumerate() {
            if !join_with_grace("worker", worker_id, handle, grace) {
                report.detached_threads += 1;
            }
        }

        info!(
            drained = report.drained,
            write_failures = report.write_failures,
            detached_threads = report.detached_threads,
            "Poll service stopped"
        );
        report
    }

    /// Whether the service still accepts requests for evaluation.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.ingress.is_running()
    }

    /// Requests waiting in the shared queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.shared.ingress.len()
    }

    /// Current service statistics.
    #[must_use]
    pub fn stats(&self) -> PollStats {
        self.shared
            .counters
            .snapshot(self.config.worker_count, self.shared.ingress.len())
    }

    /// Configuration the service was started with.
    #[must_use]
    pub const fn config(&self) -> &PollServiceConfig {
        &self.config
    }
}

impl Drop for PollServiceManager {
    fn drop(&mut self) {
        // Answer what is queued but don't join threads here; they exit on
        // their own once they see the flag.
        if self.shared.ingress.stop() {
            let pending = self.shared.ingress.drain();
            debug!(
                pending = pending.len(),
                "PollServiceManager dropped without explicit stop - draining and detaching threads"
            );
            for request in pending {
                self.shared.drain_one(request);
            }
        }
    }
}

/// Join a thread, giving up after `grace`. Returns `false` if it was detached.
fn join_with_grace(role: &'static str, idx: usize, handle: JoinHandle<()>, grace: Duration) -> bool {
    let (tx, rx) = bounded(1);
    let joiner = thread::spawn(move || {
        let _ = tx.send(handle.join().is_ok());
    });

    match rx.recv_timeout(grace) {
        Ok(clean) => {
            if clean {
                debug!(role = role, index = idx, "Thread joined");
            } else {
                warn!(role = role, index = idx, "Thread panicked");
            }
            let _ = joiner.join();
            true
        }
        Err(_) => {
            warn!(role = role, index = idx, "Thread did not exit within grace period - detaching");
            false
        }
    }
}
