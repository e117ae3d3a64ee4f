// Application Layer - Admission, matching and pool resizing

pub mod dispatch_queue;
pub mod stats;
pub mod submission;

// Re-exports
pub use dispatch_queue::DispatchQueue;
pub use stats::QueueStats;
pub use submission::{BoundWorker, Rejected, SubmissionHandle};
