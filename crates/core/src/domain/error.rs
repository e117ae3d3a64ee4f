// Domain Error Types

use super::worker::{Sequence, WorkerId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Worker {worker} is already busy with submission #{sequence}")]
    WorkerBusy { worker: WorkerId, sequence: Sequence },

    #[error("Worker {worker} has no in-flight submission to complete")]
    WorkerIdle { worker: WorkerId },

    #[error("Invalid queue configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
