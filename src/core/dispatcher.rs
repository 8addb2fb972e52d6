//! Dispatcher: moves the shared ingress queue into worker private queues
//! once per cycle.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{SendError, Sender};
use tracing::{debug, error, info};

use super::ingress::Cycle;
use super::manager::Shared;
use super::request::PollRequest;

/// Partitions the shared queue across workers at a fixed cadence.
pub(crate) struct Dispatcher {
    lanes: Vec<Sender<PollRequest>>,
    shared: Arc<Shared>,
    interval: Duration,
}

impl Dispatcher {
    pub fn new(lanes: Vec<Sender<PollRequest>>, shared: Arc<Shared>, interval: Duration) -> Self {
        Self {
            lanes,
            shared,
            interval,
        }
    }

    /// Start the dispatcher on a dedicated OS thread.
    pub fn spawn(self, name: String, stack_size: usize) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(name)
            .stack_size(stack_size)
            .spawn(move || self.run())
    }

    fn run(self) {
        info!(workers = self.lanes.len(), interval = ?self.interval, "Dispatcher started");

        loop {
            match self.shared.ingress.next_cycle(self.lanes.len(), self.interval) {
                Cycle::Stopped => break,
                Cycle::Idle => {}
                Cycle::Batches(batches) => {
                    self.hand_off(batches);
                    // Pace cycles so a request that is not ready is probed at
                    // most once per interval.
                    if !self.shared.ingress.pause(self.interval) {
                        break;
                    }
                }
            }
        }

        // Dropping the lanes lets idle workers see a closed channel.
        debug!("Dispatcher exiting");
    }

    /// Push each batch into its worker's queue. Returns how many were handed over.
    pub(crate) fn hand_off(&self, batches: Vec<Vec<PollRequest>>) -> usize {
        let mut moved = 0;
        for (worker_id, (lane, batch)) in self.lanes.iter().zip(batches).enumerate() {
            for request in batch {
                match lane.send(request) {
                    Ok(()) => moved += 1,
                    Err(SendError(request)) => {
                        error!(
                            worker_id = worker_id,
                            request_id = %request.id(),
                            "Worker queue closed; draining request"
                        );
                        self.shared.drain_one(request);
                    }
                }
            }
        }
        debug!(moved = moved, "Partition cycle complete");
        moved
    }
}
