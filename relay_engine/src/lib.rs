//! Relay Engine
//!
//! The engine relays traffic between one authenticated client connection and an external Lightning payment provider.
//! For each session it concurrently
//! 1. reads commands from the client, dispatches them to handlers that call the provider, and sends back the results;
//! 2. tails the provider's push-event stream for the user's wallet and forwards the events it understands.
//!
//! Both directions share a single writer to the client. The first terminal condition on either side cancels the other
//! and tears the whole session down exactly once. See [`relay`] for the details.
//!
//! The engine is transport-agnostic. The client connection is abstracted by the [`ClientSource`] and [`ClientSink`]
//! traits, the provider by [`PaymentProvider`], identity by [`Authenticator`] and user lookup by [`UserManagement`].
//! A SQLite implementation of the user directory is provided.
pub mod db_types;
pub mod dispatch;
pub mod messages;
pub mod relay;
pub mod stream;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use dispatch::{CommandDispatcher, EventDispatcher, EventOutcome};
pub use relay::{HandshakeError, RelayConfig, RelayError, RelaySession, SessionReport, SessionState, TerminationReason};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    Authenticator,
    ClientSink,
    ClientSource,
    LnurlInvoice,
    NewInvoice,
    PaymentProvider,
    ProviderError,
    UserDirectoryError,
    UserManagement,
};
