// Panic isolation for event handlers
use crate::constants::UNKNOWN_PANIC;
use std::any::Any;
use std::future::Future;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed (the handler's own result is inside)
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Run a future on its own tokio task so a panic cannot unwind into the
/// caller. The worker it runs on must still be completed afterwards.
pub async fn run_isolated<F, T>(future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn(future).await {
        Ok(value) => PanicGuardResult::Success(value),
        Err(join_err) if join_err.is_panic() => {
            let panic_msg = panic_message(join_err.into_panic());
            error!(panic_msg = %panic_msg, "Event handler panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
        Err(join_err) => {
            error!(error = %join_err, "Event handler task cancelled");
            PanicGuardResult::Panicked(join_err.to_string())
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_PANIC.to_string()
    }
}
