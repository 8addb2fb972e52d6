//! Poll worker: drives each request in its private queue to completion,
//! timeout, or another dispatch cycle.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::debug;

use super::manager::Shared;
use super::request::{PollRequest, ResponseKind};
use super::stats::ServiceCounters;

/// What a worker did with one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Answered with an events payload.
    Completed,
    /// Answered with no-events after the poll timeout.
    TimedOut,
    /// Handed back to the shared queue.
    Requeued,
    /// Answered with no-events because the service is stopping.
    Drained,
}

/// One worker thread and its private queue.
///
/// The receiver is the worker's private FIFO; the dispatcher holds the only
/// sender. Nothing else touches it.
pub(crate) struct Worker {
    id: usize,
    inbox: Receiver<PollRequest>,
    shared: Arc<Shared>,
    idle_wait: Duration,
}

impl Worker {
    pub fn new(id: usize, inbox: Receiver<PollRequest>, shared: Arc<Shared>, idle_wait: Duration) -> Self {
        Self {
            id,
            inbox,
            shared,
            idle_wait,
        }
    }

    /// Start the worker on a dedicated OS thread.
    pub fn spawn(self, name: String, stack_size: usize) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(name)
            .stack_size(stack_size)
            .spawn(move || self.run())
    }

    fn run(self) {
        debug!(worker_id = self.id, "Worker thread started");

        loop {
            // Block for the next batch; wake periodically to notice shutdown
            // even if the dispatcher never drops its sender.
            let first = match self.inbox.recv_timeout(self.idle_wait) {
                Ok(request) => request,
                Err(RecvTimeoutError::Timeout) => {
                    if self.shared.ingress.is_running() {
                        continue;
                    }
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    debug!(worker_id = self.id, "Worker channel closed, exiting");
                    break;
                }
            };

            // Process the private queue to exhaustion.
            let batch: Vec<PollRequest> = std::iter::once(first).chain(self.inbox.try_iter()).collect();
            debug!(worker_id = self.id, batch = batch.len(), "Worker pass");
            for request in batch {
                self.evaluate(request, Instant::now());
            }
        }

        let mut leftovers = 0usize;
        for request in self.inbox.try_iter() {
            self.shared.drain_one(request);
            leftovers += 1;
        }
        debug!(worker_id = self.id, drained = leftovers, "Worker thread exiting");
    }

    /// Evaluate one request at `now`.
    pub(crate) fn evaluate(&self, request: PollRequest, now: Instant) -> Step {
        let shared = &self.shared;

        if !shared.ingress.is_running() {
            shared.drain_one(request);
            return Step::Drained;
        }

        // Measured from admission, so requeues cannot extend the budget.
        if request.is_expired(now, shared.poll_timeout) {
            ServiceCounters::bump(&shared.counters.timed_out);
            let delivery = request.respond_empty(ResponseKind::NoEvents);
            shared.record(delivery);
            return Step::TimedOut;
        }

        match request.has_events() {
            Ok(true) => match request.respond_with_events() {
                Ok(delivery) => {
                    ServiceCounters::bump(&shared.counters.completed_with_events);
                    shared.record(delivery);
                    Step::Completed
                }
                Err((request, e)) => {
                    debug!(
                        worker_id = self.id,
                        request_id = %request.id(),
                        error = %e,
                        "Events payload failed; retrying next cycle"
                    );
                    ServiceCounters::bump(&shared.counters.readiness_failures);
                    shared.requeue(request)
                }
            },
            Ok(false) => shared.requeue(request),
            Err(e) => {
                debug!(
                    worker_id = self.id,
                    request_id = %request.id(),
                    error = %e,
                    "Readiness probe failed; treating as not ready"
                );
                ServiceCounters::bump(&shared.counters.readiness_failures);
                shared.requeue(request)
            }
        }
    }
}
