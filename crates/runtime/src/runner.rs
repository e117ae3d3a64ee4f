//! Queue Runner - tokio execution context for a dispatch queue
//!
//! For every submission the runner awaits the binding, runs the handler
//! on an isolated task, then completes the worker so the queue can hand
//! it the next buffered item. Completion happens whatever the handler
//! outcome (success, error or panic), and only once the handler is done:
//! the bound worker lives on the isolated task, not in the caller.

use crate::constants::SATURATION_BACKOFF;
use crate::panic_guard::{run_isolated, PanicGuardResult};
use crate::shutdown::ShutdownToken;
use dispatchq_core::application::Rejected;
use dispatchq_core::domain::Sequence;
use dispatchq_core::port::time_provider::SystemTimeProvider;
use dispatchq_core::port::{EventHandler, TimeProvider};
use dispatchq_core::{BoundWorker, DispatchError, DispatchQueue, Result, WorkerId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How one event ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    Failed(String),
    Panicked(String),
}

/// Result of running one bound event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub worker: WorkerId,
    pub sequence: Sequence,
    pub status: ExecutionStatus,
    pub started_at_ms: i64,
    pub finished_at_ms: i64,
}

impl ExecutionReport {
    pub fn duration_ms(&self) -> i64 {
        self.finished_at_ms - self.started_at_ms
    }
}

/// What the intake loop does with an event the queue rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaturationPolicy {
    /// Drop the event and count it
    Drop,
    /// Sleep, then re-submit the same event (until shutdown)
    Backoff(Duration),
}

impl Default for SaturationPolicy {
    fn default() -> Self {
        SaturationPolicy::Backoff(SATURATION_BACKOFF)
    }
}

/// Totals reported when an intake loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeSummary {
    pub accepted: u64,
    pub dropped: u64,
    pub retries: u64,
}

/// Runs events submitted to a [`DispatchQueue`] on tokio tasks
pub struct QueueRunner<E> {
    queue: Arc<DispatchQueue<E>>,
    handler: Arc<dyn EventHandler<E>>,
    time_provider: Arc<dyn TimeProvider>,
    saturation_policy: SaturationPolicy,
    in_flight: Arc<watch::Sender<usize>>,
}

impl<E: Send + 'static> QueueRunner<E> {
    pub fn new(queue: Arc<DispatchQueue<E>>, handler: Arc<dyn EventHandler<E>>) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            queue,
            handler,
            time_provider: Arc::new(SystemTimeProvider),
            saturation_policy: SaturationPolicy::default(),
            in_flight: Arc::new(in_flight),
        }
    }

    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    pub fn with_saturation_policy(mut self, policy: SaturationPolicy) -> Self {
        self.saturation_policy = policy;
        self
    }

    pub fn queue(&self) -> &Arc<DispatchQueue<E>> {
        &self.queue
    }

    /// Submit and run in the background.
    ///
    /// A saturation rejection comes back synchronously with the event.
    /// Outside a tokio runtime the event is handed back with
    /// [`DispatchError::NoRuntime`] before the queue ever sees it
    /// (`sequence` is then 0).
    pub fn spawn(
        &self,
        event: E,
    ) -> std::result::Result<JoinHandle<Result<ExecutionReport>>, Rejected<E>> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "Spawn called outside a tokio runtime");
                return Err(Rejected {
                    sequence: 0,
                    error: DispatchError::NoRuntime,
                    event,
                });
            }
        };

        let handle = self.queue.try_submit(event)?;
        let guard = InFlightGuard::enter(Arc::clone(&self.in_flight));
        let handler = Arc::clone(&self.handler);
        let time_provider = Arc::clone(&self.time_provider);

        Ok(runtime.spawn(async move {
            let bound = handle.await?;
            Result::Ok(run_bound(handler, time_provider, bound, guard).await)
        }))
    }

    /// Submit, wait for a worker, run the event and report.
    ///
    /// Dropping this future (timeout, `select!`) only stops waiting for the
    /// report. A bound event still runs to the end and keeps its worker
    /// busy until then.
    pub async fn execute(&self, event: E) -> Result<ExecutionReport> {
        let guard = InFlightGuard::enter(Arc::clone(&self.in_flight));
        let bound = self.queue.submit(event).await?;
        Ok(run_bound(
            Arc::clone(&self.handler),
            Arc::clone(&self.time_provider),
            bound,
            guard,
        )
        .await)
    }

    /// Executions started through this runner that have not finished
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Resolve once nothing started through this runner is still running
    pub async fn wait_idle(&self) {
        let mut rx = self.in_flight.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    /// Pull events off `rx` and run them until the channel closes or
    /// shutdown is requested. Events already spawned keep running.
    pub async fn run_intake(
        &self,
        mut rx: mpsc::Receiver<E>,
        mut shutdown: ShutdownToken,
    ) -> IntakeSummary {
        let mut summary = IntakeSummary::default();
        info!(policy = ?self.saturation_policy, "Intake started");

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            let event = tokio::select! {
                received = rx.recv() => match received {
                    Some(event) => event,
                    None => {
                        info!("Intake channel closed");
                        break;
                    }
                },
                _ = shutdown.wait() => break,
            };

            if !self.admit(event, &mut shutdown, &mut summary).await {
                break;
            }
        }

        info!(
            accepted = summary.accepted,
            dropped = summary.dropped,
            retries = summary.retries,
            "Intake stopped"
        );
        summary
    }

    /// Returns false when shutdown interrupted a back-off
    async fn admit(
        &self,
        mut event: E,
        shutdown: &mut ShutdownToken,
        summary: &mut IntakeSummary,
    ) -> bool {
        loop {
            let rejected = match self.spawn(event) {
                Ok(_) => {
                    summary.accepted += 1;
                    return true;
                }
                Err(rejected) => rejected,
            };

            match self.saturation_policy {
                SaturationPolicy::Drop => {
                    summary.dropped += 1;
                    warn!(
                        sequence = rejected.sequence,
                        error = %rejected.error,
                        "Dropping event rejected by saturated queue"
                    );
                    return true;
                }
                SaturationPolicy::Backoff(delay) => {
                    summary.retries += 1;
                    debug!(
                        sequence = rejected.sequence,
                        delay_ms = delay.as_millis() as u64,
                        "Queue saturated, backing off"
                    );
                    event = rejected.into_event();
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {},
                        _ = shutdown.wait() => {
                            summary.dropped += 1;
                            info!("Intake interrupted during back-off");
                            return false;
                        }
                    }
                }
            }
        }
    }
}

/// Run one bound event and hand the worker back.
///
/// `bound` and `guard` move into the isolated task, which completes the
/// worker once the handler returns or unwinds.
async fn run_bound<E: Send + 'static>(
    handler: Arc<dyn EventHandler<E>>,
    time_provider: Arc<dyn TimeProvider>,
    mut bound: BoundWorker<E>,
    guard: InFlightGuard,
) -> ExecutionReport {
    let worker = bound.worker();
    let sequence = bound.sequence();
    let started_at_ms = time_provider.now_millis();

    let status = match bound.take_event() {
        Some(event) => {
            debug!(worker_id = %worker, sequence, "Executing event");
            let outcome = run_isolated(async move {
                let _guard = guard;
                // Declared after the guard: a panic releases the worker first
                let bound = bound;
                let result = handler.handle(worker, event).await;
                bound.complete();
                result
            })
            .await;

            match outcome {
                PanicGuardResult::Success(Ok(())) => ExecutionStatus::Success,
                PanicGuardResult::Success(Err(e)) => {
                    warn!(worker_id = %worker, sequence, error = %e, "Event handler failed");
                    ExecutionStatus::Failed(e.to_string())
                }
                PanicGuardResult::Panicked(msg) => ExecutionStatus::Panicked(msg),
            }
        }
        None => {
            bound.complete();
            ExecutionStatus::Failed("event was taken before execution".to_string())
        }
    };

    let finished_at_ms = time_provider.now_millis();

    ExecutionReport {
        worker,
        sequence,
        status,
        started_at_ms,
        finished_at_ms,
    }
}

/// Counts one execution for `wait_idle`
struct InFlightGuard {
    counter: Arc<watch::Sender<usize>>,
}

impl InFlightGuard {
    fn enter(counter: Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|n| *n += 1);
        Self { counter }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.send_modify(|n| *n -= 1);
    }
}
