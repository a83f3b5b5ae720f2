//! Tag-based dispatch for the two kinds of traffic the relay carries: commands from the client, and events from the
//! provider's push stream.
mod commands;
mod events;

pub use commands::CommandDispatcher;
pub use events::{EventDispatcher, EventOutcome};
