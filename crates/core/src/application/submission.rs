//! Submission handles and bound workers
//!
//! A [`SubmissionHandle`] resolves exactly once, to either a
//! [`BoundWorker`] or a [`DispatchError`]. The bound worker owns the event
//! and hands the worker back to the queue when it is completed or dropped,
//! so the "completion signal exactly once" contract is carried by ownership.

use super::dispatch_queue::SharedState;
use crate::domain::{Sequence, WorkerId};
use crate::error::DispatchError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// What a handle resolves to
pub type Outcome<E> = Result<BoundWorker<E>, DispatchError>;

/// Pending result of `DispatchQueue::submit`
///
/// Await it to get the bound worker. Dropping it before resolution
/// abandons the submission: the item is skipped when its turn comes.
#[must_use = "dropping a submission handle abandons the submission"]
pub struct SubmissionHandle<E> {
    sequence: Sequence,
    rx: oneshot::Receiver<Outcome<E>>,
}

impl<E> SubmissionHandle<E> {
    pub(crate) fn new(sequence: Sequence, rx: oneshot::Receiver<Outcome<E>>) -> Self {
        Self { sequence, rx }
    }

    /// Handle that is already failed
    pub(crate) fn failed(sequence: Sequence, error: DispatchError) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(error));
        Self { sequence, rx }
    }

    /// Arrival order of this submission (1-based, per queue)
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// Take the outcome if it is already known, otherwise get the handle back
    pub fn try_ready(mut self) -> Result<Outcome<E>, Self> {
        match self.rx.try_recv() {
            Ok(outcome) => Ok(outcome),
            Err(oneshot::error::TryRecvError::Empty) => Err(self),
            Err(oneshot::error::TryRecvError::Closed) => Ok(Err(DispatchError::QueueDropped)),
        }
    }
}

impl<E> Future for SubmissionHandle<E> {
    type Output = Outcome<E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DispatchError::QueueDropped)))
    }
}

impl<E> std::fmt::Debug for SubmissionHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionHandle")
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

/// Synchronous rejection from `DispatchQueue::try_submit`; gives the event back
#[derive(Debug)]
pub struct Rejected<E> {
    pub sequence: Sequence,
    pub error: DispatchError,
    pub event: E,
}

impl<E> Rejected<E> {
    pub fn into_event(self) -> E {
        self.event
    }
}

/// A worker bound to one event.
///
/// Call [`BoundWorker::complete`] once the event has finished. Dropping
/// the value without completing it has the same effect, so a worker can
/// never be leaked busy.
pub struct BoundWorker<E> {
    worker: WorkerId,
    sequence: Sequence,
    event: Option<E>,
    queue: Weak<SharedState<E>>,
    armed: bool,
}

impl<E> BoundWorker<E> {
    pub(crate) fn new(
        worker: WorkerId,
        sequence: Sequence,
        event: E,
        queue: Weak<SharedState<E>>,
    ) -> Self {
        Self {
            worker,
            sequence,
            event: Some(event),
            queue,
            armed: true,
        }
    }

    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    /// The event, unless it was already taken for execution
    pub fn event(&self) -> Option<&E> {
        self.event.as_ref()
    }

    /// Move the event out to run it; the worker stays busy until completion
    pub fn take_event(&mut self) -> Option<E> {
        self.event.take()
    }

    /// Signal that the event finished; the worker becomes eligible again
    pub fn complete(mut self) {
        self.release();
    }

    /// Forget the binding without touching queue state.
    /// Only valid while the caller already holds the state lock.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }

    fn release(&mut self) {
        if !std::mem::replace(&mut self.armed, false) {
            return;
        }
        if let Some(queue) = self.queue.upgrade() {
            super::dispatch_queue::lock(&queue).complete_worker(self.worker, self.sequence);
        }
    }
}

impl<E> Drop for BoundWorker<E> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<E> std::fmt::Debug for BoundWorker<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundWorker")
            .field("worker", &self.worker)
            .field("sequence", &self.sequence)
            .field("has_event", &self.event.is_some())
            .field("armed", &self.armed)
            .finish()
    }
}
