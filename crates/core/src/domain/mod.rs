// Domain Layer - Pure dispatch primitives

pub mod error;
pub mod queue;
pub mod ring_buffer;
pub mod worker;

// Re-exports
pub use error::DomainError;
pub use queue::{QueueConfig, MAX_CAPACITY, MAX_POOL_SIZE};
pub use ring_buffer::RingBuffer;
pub use worker::{Sequence, Worker, WorkerId};
