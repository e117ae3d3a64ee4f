// dispatchq Core - Dispatch queue domain, use cases & ports
// NO runtime adapters here: execution contexts live in dispatchq-runtime

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{BoundWorker, DispatchQueue, QueueStats, SubmissionHandle};
pub use domain::{QueueConfig, WorkerId};
pub use error::{DispatchError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
