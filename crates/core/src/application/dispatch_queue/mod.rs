//! Dispatch Queue - bounded FIFO admission in front of a worker pool
//!
//! `submit` decides, under one lock, between three outcomes:
//! 1. an idle worker exists: bind the event to it right away
//! 2. otherwise, if the buffer has room: buffer the event (FIFO)
//! 3. otherwise: reject with `DispatchError::Saturated`
//!
//! Direct handoff is always tried before buffering, so the buffer is only
//! ever non-empty while every live worker is busy. Worker completions go
//! through the same lock and run a dispatch pass that hands the oldest
//! buffered items to whichever workers are idle.

mod state;

pub(crate) use state::QueueState;

use crate::application::stats::QueueStats;
use crate::application::submission::{Rejected, SubmissionHandle};
use crate::domain::{QueueConfig, Sequence, WorkerId};
use crate::error::{DispatchError, Result};
use state::Item;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

pub(crate) type SharedState<E> = Mutex<QueueState<E>>;

/// Every state change happens inside a single critical section, so a
/// poisoned lock still guards consistent state.
pub(crate) fn lock<E>(shared: &SharedState<E>) -> MutexGuard<'_, QueueState<E>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounded FIFO dispatch queue
///
/// Share it between producers with `Arc<DispatchQueue<E>>`.
pub struct DispatchQueue<E> {
    shared: Arc<SharedState<E>>,
}

impl<E> DispatchQueue<E> {
    /// Create a queue with `capacity` buffer slots and `pool_size` idle workers
    pub fn new(capacity: usize, pool_size: usize) -> Self {
        let shared = Arc::new_cyclic(|this| Mutex::new(QueueState::new(capacity, this.clone())));
        let queue = Self { shared };
        queue.set_pool_size(pool_size);
        queue
    }

    /// Create a queue from validated configuration
    pub fn from_config(config: &QueueConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| DispatchError::Config(e.to_string()))?;
        Ok(Self::new(config.capacity, config.pool_size))
    }

    /// Apply capacity, then pool size (so a grow drains into the new threshold)
    pub fn reconfigure(&self, config: &QueueConfig) -> Result<()> {
        config
            .validate()
            .map_err(|e| DispatchError::Config(e.to_string()))?;
        self.set_capacity(config.capacity);
        self.set_pool_size(config.pool_size);
        Ok(())
    }

    /// Submit an event. Never blocks.
    ///
    /// The handle is already resolved when the event was bound directly or
    /// rejected; otherwise it resolves when a worker frees up.
    pub fn submit(&self, event: E) -> SubmissionHandle<E> {
        match self.try_submit(event) {
            Ok(handle) => handle,
            Err(rejected) => SubmissionHandle::failed(rejected.sequence, rejected.error),
        }
    }

    /// Like [`submit`](Self::submit), but a saturation rejection is returned
    /// synchronously together with the event so the caller can retry it.
    pub fn try_submit(&self, event: E) -> std::result::Result<SubmissionHandle<E>, Rejected<E>> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state();
        let sequence = state.next_sequence();
        let item = Item {
            sequence,
            event,
            completion: tx,
        };

        match state.admit(item) {
            Ok(()) => Ok(SubmissionHandle::new(sequence, rx)),
            Err((error, item)) => Err(Rejected {
                sequence,
                error,
                event: item.event,
            }),
        }
    }

    /// Change the admission threshold. Already-buffered items are never evicted.
    pub fn set_capacity(&self, capacity: usize) {
        self.state().set_capacity(capacity);
    }

    /// Grow (new idle workers drain the buffer immediately) or shrink
    /// (excess workers are detached; their in-flight events keep running).
    pub fn set_pool_size(&self, pool_size: usize) {
        self.state().set_pool_size(pool_size);
    }

    /// Items currently buffered
    pub fn length(&self) -> usize {
        self.state().len()
    }

    pub fn capacity(&self) -> usize {
        self.state().capacity()
    }

    /// Live workers (detached, draining workers excluded)
    pub fn pool_size(&self) -> usize {
        self.state().pool_size()
    }

    pub fn worker_ids(&self) -> Vec<WorkerId> {
        self.state().worker_ids()
    }

    pub fn count_busy_workers(&self) -> usize {
        self.state().count_busy()
    }

    pub fn count_idle_workers(&self) -> usize {
        let state = self.state();
        state.pool_size() - state.count_busy()
    }

    pub fn count_draining_workers(&self) -> usize {
        self.state().count_draining()
    }

    /// True iff the next `submit` would be rejected
    pub fn is_full(&self) -> bool {
        self.state().is_full()
    }

    /// Buffer has room (ignores idle workers)
    pub fn can_enqueue(&self) -> bool {
        self.state().can_enqueue()
    }

    pub fn has_idle_worker(&self) -> bool {
        self.state().has_idle_worker()
    }

    /// Sequences of buffered items, oldest first
    pub fn buffered_sequences(&self) -> Vec<Sequence> {
        self.state().buffered_sequences()
    }

    pub fn stats(&self) -> QueueStats {
        self.state().stats()
    }

    fn state(&self) -> MutexGuard<'_, QueueState<E>> {
        lock(&self.shared)
    }
}

impl<E> std::fmt::Debug for DispatchQueue<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("stats", &self.stats())
            .finish()
    }
}
