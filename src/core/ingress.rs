//! Shared ingress queue and the partition step of a dispatch cycle.
//!
//! Every new or retried request enters one FIFO guarded by a
//! `parking_lot::Mutex`. The dispatcher empties it once per cycle, splitting
//! the snapshot into one contiguous batch per worker. The lock is only held
//! for queue mutation, never across a terminal write.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Result of offering an item to the ingress queue.
#[derive(Debug)]
pub(crate) enum Admission<T> {
    /// Queued; `depth` is the queue length including the new item.
    Accepted { depth: usize },
    /// Refused at the admission limit; the item is handed back.
    Full { item: T, depth: usize },
    /// The service is stopping; the item is handed back.
    Stopped(T),
}

/// What the dispatcher should do after asking for work.
#[derive(Debug)]
pub(crate) enum Cycle<T> {
    /// One batch per worker, in worker order.
    Batches(Vec<Vec<T>>),
    /// Nothing arrived within the wait.
    Idle,
    /// The service is stopping.
    Stopped,
}

struct IngressState<T> {
    queue: VecDeque<T>,
    running: bool,
}

/// Shared FIFO with a running flag and wake signals.
pub(crate) struct Ingress<T> {
    state: Mutex<IngressState<T>>,
    /// Signalled on push and on stop; the dispatcher waits here while idle.
    work_ready: Condvar,
    /// Signalled on stop only; the dispatcher waits here between cycles.
    stop_signal: Condvar,
    /// Lock-free mirror of `running` for per-request checks on worker threads.
    live: AtomicBool,
    max_depth: Option<usize>,
}

impl<T> Ingress<T> {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            state: Mutex::new(IngressState {
                queue: VecDeque::new(),
                running: true,
            }),
            work_ready: Condvar::new(),
            stop_signal: Condvar::new(),
            live: AtomicBool::new(true),
            max_depth,
        }
    }

    /// Append an item. `bounded` applies the admission limit.
    pub fn push(&self, item: T, bounded: bool) -> Admission<T> {
        let mut state = self.state.lock();
        if !state.running {
            return Admission::Stopped(item);
        }
        let depth = state.queue.len();
        if bounded && self.max_depth.is_some_and(|max| depth >= max) {
            return Admission::Full { item, depth };
        }
        state.queue.push_back(item);
        drop(state);

        self.work_ready.notify_one();
        Admission::Accepted { depth: depth + 1 }
    }

    /// Take the current snapshot split across `worker_count` batches.
    ///
    /// Waits up to `idle_wait` if the queue is empty; a push or a stop ends
    /// the wait early.
    pub fn next_cycle(&self, worker_count: usize, idle_wait: Duration) -> Cycle<T> {
        let mut state = self.state.lock();
        if !state.running {
            return Cycle::Stopped;
        }
        if state.queue.is_empty() {
            self.work_ready.wait_for(&mut state, idle_wait);
            if !state.running {
                return Cycle::Stopped;
            }
            if state.queue.is_empty() {
                return Cycle::Idle;
            }
        }
        Cycle::Batches(partition(&mut state.queue, worker_count))
    }

    /// Sleep for `interval` unless stopped first. Returns whether still running.
    pub fn pause(&self, interval: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let mut state = self.state.lock();
        while state.running {
            if self.stop_signal.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.running
    }

    /// Flip the running flag and wake every waiter. Returns the previous value.
    pub fn stop(&self) -> bool {
        let was_running = {
            let mut state = self.state.lock();
            self.live.store(false, Ordering::Release);
            std::mem::replace(&mut state.running, false)
        };
        self.work_ready.notify_all();
        self.stop_signal.notify_all();
        was_running
    }

    /// Remove everything still queued.
    pub fn drain(&self) -> Vec<T> {
        self.state.lock().queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Split the whole queue into `worker_count` contiguous, order-preserving batches.
///
/// With `N` items and `W` workers the first `N % W` batches hold `ceil(N / W)`
/// items and the rest hold `floor(N / W)`, so earlier items always land on
/// lower worker indices. Returns no batches when `worker_count` is zero.
pub fn partition<T>(queue: &mut VecDeque<T>, worker_count: usize) -> Vec<Vec<T>> {
    if worker_count == 0 {
        return Vec::new();
    }
    let total = queue.len();
    let base = total / worker_count;
    let extra = total % worker_count;

    (0..worker_count)
        .map(|idx| {
            let take = base + usize::from(idx < extra);
            queue.drain(..take).collect()
        })
        .collect()
}
