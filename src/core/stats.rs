//! Service counters and their snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Statistics about the poll service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Requests waiting in the shared ingress queue.
    pub queued: usize,

    /// Requests admitted through `enqueue`.
    pub enqueued: u64,

    /// Requests handed back by workers for another cycle.
    pub requeued: u64,

    /// Requests answered with an events payload.
    pub completed_with_events: u64,

    /// Requests answered with no-events after their poll timeout.
    pub timed_out: u64,

    /// Requests answered with no-events during shutdown.
    pub drained: u64,

    /// Requests refused at the admission limit.
    pub rejected: u64,

    /// Readiness probes or payload builders that failed.
    pub readiness_failures: u64,

    /// Terminal writes the transport could not deliver.
    pub write_failures: u64,
}

impl PollStats {
    /// Requests that have received their terminal write (or a failed attempt at it).
    #[must_use]
    pub const fn answered(&self) -> u64 {
        self.completed_with_events + self.timed_out + self.drained + self.rejected
    }
}

/// Internal counters (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct ServiceCounters {
    pub enqueued: AtomicU64,
    pub requeued: AtomicU64,
    pub completed_with_events: AtomicU64,
    pub timed_out: AtomicU64,
    pub drained: AtomicU64,
    pub rejected: AtomicU64,
    pub readiness_failures: AtomicU64,
    pub write_failures: AtomicU64,
}

impl ServiceCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, queued: usize) -> PollStats {
        PollStats {
            worker_count,
            queued,
            enqueued: self.enqueued.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            completed_with_events: self.completed_with_events.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            readiness_failures: self.readiness_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}
