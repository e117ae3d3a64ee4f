// Dispatch state machine. Every method here runs under the queue lock.

use super::SharedState;
use crate::application::stats::{QueueCounters, QueueStats};
use crate::application::submission::{BoundWorker, Outcome};
use crate::domain::{RingBuffer, Sequence, Worker, WorkerId};
use crate::error::DispatchError;
use std::collections::HashMap;
use std::sync::Weak;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// A submission waiting for (or being handed to) a worker
pub(crate) struct Item<E> {
    pub(crate) sequence: Sequence,
    pub(crate) event: E,
    pub(crate) completion: oneshot::Sender<Outcome<E>>,
}

pub(crate) struct QueueState<E> {
    buffer: RingBuffer<Item<E>>,
    workers: Vec<Worker>,
    /// Detached by a shrink but still running: worker -> in-flight sequence
    draining: HashMap<WorkerId, Sequence>,
    capacity: usize,
    next_sequence: Sequence,
    next_worker_id: u64,
    counters: QueueCounters,
    this: Weak<SharedState<E>>,
}

impl<E> QueueState<E> {
    pub(crate) fn new(capacity: usize, this: Weak<SharedState<E>>) -> Self {
        Self {
            buffer: RingBuffer::new(),
            workers: Vec::new(),
            draining: HashMap::new(),
            capacity,
            next_sequence: 1,
            next_worker_id: 1,
            counters: QueueCounters::default(),
            this,
        }
    }

    pub(crate) fn next_sequence(&mut self) -> Sequence {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.counters.submitted += 1;
        sequence
    }

    // ------------------------------------------------------------------
    // Admission
    // ------------------------------------------------------------------

    /// Direct bind, else buffer, else reject (item handed back)
    pub(crate) fn admit(&mut self, item: Item<E>) -> Result<(), (DispatchError, Item<E>)> {
        if let Some(idx) = self.idle_worker_index() {
            if self.bind(idx, item) {
                self.counters.dispatched_direct += 1;
            }
            return Ok(());
        }

        if self.can_enqueue() {
            debug!(
                sequence = item.sequence,
                buffered = self.buffer.len() + 1,
                capacity = self.capacity,
                "No idle worker, buffering submission"
            );
            self.buffer.push(item);
            self.counters.buffered += 1;
            self.dispatch_pass();
            return Ok(());
        }

        self.counters.rejected += 1;
        let error = DispatchError::Saturated {
            capacity: self.capacity,
            buffered: self.buffer.len(),
        };
        warn!(
            sequence = item.sequence,
            capacity = self.capacity,
            buffered = self.buffer.len(),
            "Submission rejected: queue saturated"
        );
        Err((error, item))
    }

    /// Match idle workers to the oldest buffered items until one side runs out
    pub(crate) fn dispatch_pass(&mut self) -> usize {
        let mut bound = 0;
        while let Some(idx) = self.idle_worker_index() {
            let Some(item) = self.buffer.pop() else {
                break;
            };
            if self.bind(idx, item) {
                self.counters.dispatched_buffered += 1;
                bound += 1;
            }
        }
        self.check_invariants();
        bound
    }

    /// Assign the item to `workers[idx]` and resolve its handle.
    /// Returns false when the binding did not stick (abandoned or invariant broken).
    fn bind(&mut self, idx: usize, item: Item<E>) -> bool {
        let Item {
            sequence,
            event,
            completion,
        } = item;
        let worker = &mut self.workers[idx];
        let worker_id = worker.id();

        if let Err(e) = worker.assign(sequence) {
            error!(worker_id = %worker_id, sequence, error = %e, "Refusing to double-book worker");
            let _ = completion.send(Err(DispatchError::InvariantViolation(e)));
            return false;
        }

        let bound = BoundWorker::new(worker_id, sequence, event, self.this.clone());
        match completion.send(Ok(bound)) {
            Ok(()) => {
                debug!(worker_id = %worker_id, sequence, "Submission bound to worker");
                true
            }
            Err(returned) => {
                // Handle dropped: free the worker here, we already hold the lock
                if let Ok(mut bound) = returned {
                    bound.disarm();
                }
                let _ = self.workers[idx].complete();
                self.counters.abandoned += 1;
                debug!(worker_id = %worker_id, sequence, "Submission abandoned before binding");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// busy -> idle for `worker_id`, then let it pick up buffered work
    pub(crate) fn complete_worker(&mut self, worker_id: WorkerId, sequence: Sequence) {
        if let Some(worker) = self.workers.iter_mut().find(|w| w.id() == worker_id) {
            match worker.in_flight() {
                Some(current) if current == sequence => {
                    let _ = worker.complete();
                    self.counters.completed += 1;
                    debug!(worker_id = %worker_id, sequence, "Worker completed submission");
                    self.dispatch_pass();
                }
                current => {
                    error!(
                        worker_id = %worker_id,
                        sequence,
                        in_flight = ?current,
                        "Completion does not match the worker's in-flight submission"
                    );
                }
            }
            return;
        }

        match self.draining.remove(&worker_id) {
            Some(_) => {
                self.counters.completed += 1;
                debug!(worker_id = %worker_id, sequence, "Detached worker drained");
            }
            None => {
                error!(worker_id = %worker_id, sequence, "Completion for unknown worker");
            }
        }
    }

    // ------------------------------------------------------------------
    // Reconfiguration
    // ------------------------------------------------------------------

    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        if capacity < self.buffer.len() {
            info!(
                capacity,
                buffered = self.buffer.len(),
                "Capacity lowered below current length; buffer drains naturally"
            );
        } else {
            info!(capacity, previous = self.capacity, "Capacity updated");
        }
        self.capacity = capacity;
    }

    pub(crate) fn set_pool_size(&mut self, pool_size: usize) {
        let current = self.workers.len();
        if pool_size > current {
            while self.workers.len() < pool_size {
                let id = WorkerId::new(self.next_worker_id);
                self.next_worker_id += 1;
                self.workers.push(Worker::new(id));
                self.dispatch_pass();
            }
        } else {
            for worker in self.workers.drain(pool_size..) {
                if let Some(sequence) = worker.in_flight() {
                    self.draining.insert(worker.id(), sequence);
                }
            }
        }
        if pool_size != current {
            info!(
                pool_size,
                previous = current,
                draining = self.draining.len(),
                "Worker pool resized"
            );
        }
        self.check_invariants();
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn pool_size(&self) -> usize {
        self.workers.len()
    }

    pub(crate) fn worker_ids(&self) -> Vec<WorkerId> {
        self.workers.iter().map(Worker::id).collect()
    }

    pub(crate) fn count_busy(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_idle()).count()
    }

    pub(crate) fn count_draining(&self) -> usize {
        self.draining.len()
    }

    pub(crate) fn can_enqueue(&self) -> bool {
        self.buffer.len() < self.capacity
    }

    pub(crate) fn has_idle_worker(&self) -> bool {
        self.idle_worker_index().is_some()
    }

    pub(crate) fn is_full(&self) -> bool {
        !self.can_enqueue() && !self.has_idle_worker()
    }

    pub(crate) fn buffered_sequences(&self) -> Vec<Sequence> {
        self.buffer.iter().map(|item| item.sequence).collect()
    }

    pub(crate) fn stats(&self) -> QueueStats {
        let busy = self.count_busy();
        QueueStats {
            length: self.buffer.len(),
            capacity: self.capacity,
            pool_size: self.workers.len(),
            busy_workers: busy,
            idle_workers: self.workers.len() - busy,
            draining_workers: self.draining.len(),
            counters: self.counters,
        }
    }

    fn idle_worker_index(&self) -> Option<usize> {
        self.workers.iter().position(Worker::is_idle)
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.buffer.is_empty() || !self.has_idle_worker(),
            "idle worker coexists with {} buffered items",
            self.buffer.len()
        );
    }
}
