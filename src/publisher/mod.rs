//! Event publisher adapters

mod logging;
mod memory;

pub use logging::LoggingEventPublisher;
pub use memory::InMemoryEventBus;
