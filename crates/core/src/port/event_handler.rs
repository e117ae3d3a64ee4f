// Event Handler Port
// The execution context: runs one event on a bound worker

use crate::domain::WorkerId;
use async_trait::async_trait;
use thiserror::Error;

/// Handler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Event handling failed: {0}")]
    Failed(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

/// Event Handler trait
///
/// Implementations own the event for the duration of the call. The worker
/// becomes eligible for reassignment once the call returns (or panics).
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    /// Execute an event on the given worker
    ///
    /// # Errors
    /// - HandlerError::Failed if execution did not succeed
    /// - HandlerError::InvalidEvent if the payload cannot be processed
    async fn handle(&self, worker: WorkerId, event: E) -> Result<(), HandlerError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Mock handler behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed
        Success,
        /// Always fail with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Sleep, then succeed
        Delay(Duration),
        /// Block until a permit is released on the gate, then succeed
        Gate(Arc<Semaphore>),
    }

    /// Mock Event Handler for testing
    pub struct MockEventHandler<E> {
        behavior: Arc<Mutex<MockBehavior>>,
        handled: Arc<Mutex<Vec<(WorkerId, E)>>>,
    }

    impl<E> MockEventHandler<E> {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                handled: Arc::new(Mutex::new(Vec::new())),
            }
        }
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }
        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }
        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }
        pub fn new_gated(gate: Arc<Semaphore>) -> Self {
            Self::new(MockBehavior::Gate(gate))
        }
        pub fn set_behavior(&self, behavior: MockBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }
        pub fn call_count(&self) -> usize {
            self.handled.lock().unwrap().len()
        }
    }

    impl<E: Clone> MockEventHandler<E> {
        /// Events in the order their handling started
        pub fn handled_events(&self) -> Vec<E> {
            self.handled
                .lock()
                .unwrap()
                .iter()
                .map(|(_, e)| e.clone())
                .collect()
        }
        pub fn handled(&self) -> Vec<(WorkerId, E)> {
            self.handled.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl<E: Send + 'static> EventHandler<E> for MockEventHandler<E> {
        async fn handle(&self, worker: WorkerId, event: E) -> Result<(), HandlerError> {
            self.handled.lock().unwrap().push((worker, event));

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Success => Ok(()),
                MockBehavior::Fail(msg) => Err(HandlerError::Failed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
                MockBehavior::Delay(d) => {
                    tokio::time::sleep(d).await;
                    Ok(())
                }
                MockBehavior::Gate(gate) => {
                    let permit = gate
                        .acquire()
                        .await
                        .map_err(|e| HandlerError::Failed(e.to_string()))?;
                    permit.forget();
                    Ok(())
                }
            }
        }
    }
}
