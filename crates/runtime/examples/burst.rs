//! Burst demo: push more events than the queue can hold and watch the
//! dispatcher bind, buffer and reject them.
//!
//! ```text
//! DISPATCHQ_CAPACITY=4 DISPATCHQ_POOL_SIZE=2 RUST_LOG=dispatchq=debug \
//!     cargo run -p dispatchq-runtime --example burst
//! ```

use anyhow::Result;
use async_trait::async_trait;
use dispatchq_core::port::{EventHandler, HandlerError};
use dispatchq_core::{DispatchQueue, QueueConfig, WorkerId};
use dispatchq_runtime::{init_tracing, QueueRunner};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

struct SleepHandler;

#[async_trait]
impl EventHandler<u64> for SleepHandler {
    async fn handle(&self, worker: WorkerId, millis: u64) -> Result<(), HandlerError> {
        info!(worker_id = %worker, millis, "Sleeping");
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = QueueConfig::from_env()?;
    info!(capacity = config.capacity, pool_size = config.pool_size, "Starting burst");

    let queue = Arc::new(DispatchQueue::from_config(&config)?);
    let runner = QueueRunner::new(queue.clone(), Arc::new(SleepHandler));

    let mut rejected = 0;
    for i in 0..(config.capacity + config.pool_size) as u64 * 2 {
        if runner.spawn(20 + i).is_err() {
            rejected += 1;
        }
    }
    info!(rejected, "Burst submitted");

    // Grow the pool to drain the backlog faster
    queue.set_pool_size(config.pool_size * 2);

    runner.wait_idle().await;
    println!("{}", serde_json::to_string_pretty(&queue.stats())?);
    Ok(())
}
