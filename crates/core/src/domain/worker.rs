// Worker Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

/// Submission sequence number (monotonic per queue, starts at 1)
pub type Sequence = u64;

/// Worker identifier (monotonic per queue, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(u64);

impl WorkerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// One unit of execution capacity.
///
/// The event payload itself is owned by whoever executes it (see
/// `BoundWorker`); the worker only records which submission it is running.
/// `in_flight == None` means idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    id: WorkerId,
    in_flight: Option<Sequence>,
}

impl Worker {
    pub fn new(id: WorkerId) -> Self {
        Self { id, in_flight: None }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    pub fn in_flight(&self) -> Option<Sequence> {
        self.in_flight
    }

    /// idle -> busy
    pub fn assign(&mut self, sequence: Sequence) -> Result<()> {
        if let Some(current) = self.in_flight {
            return Err(DomainError::WorkerBusy {
                worker: self.id,
                sequence: current,
            });
        }
        self.in_flight = Some(sequence);
        Ok(())
    }

    /// busy -> idle, returns the sequence that finished
    pub fn complete(&mut self) -> Result<Sequence> {
        self.in_flight
            .take()
            .ok_or(DomainError::WorkerIdle { worker: self.id })
    }
}
