// Port Layer - Interfaces the dispatch core needs from the outside

pub mod event_handler;
pub mod time_provider;

// Re-exports
pub use event_handler::{EventHandler, HandlerError};
pub use time_provider::TimeProvider;
