// dispatchq Runtime - tokio execution context
// Implements the collaborator side of the queue: runs bound events and
// signals completion exactly once per binding

pub mod constants;
mod panic_guard;
pub mod runner;
mod shutdown;
pub mod telemetry;

pub use panic_guard::{run_isolated, PanicGuardResult};
pub use runner::{ExecutionReport, ExecutionStatus, IntakeSummary, QueueRunner, SaturationPolicy};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use telemetry::{init_tracing, LogFormat};
