//! # The relay session
//!
//! One [`RelaySession`] serves one client connection. Once the client's token has been validated and a
//! [`Principal`](crate::db_types::Principal) bound, [`RelaySession::run`] drives four pumps concurrently until the
//! first terminal condition:
//!
//! * the inbound pump reads commands from the client and queues them,
//! * the drain pump takes commands off the queue in arrival order and dispatches them,
//! * the upstream pump tails the provider's event stream and dispatches events,
//! * the writer pump is the only thing that ever writes to the client. Both dispatch paths feed it through a single
//!   channel, so frames are never interleaved.
//!
//! A terminal condition (the client going away, a client transport error, the event stream failing or closing, or
//! external cancellation) cancels every pump. Routine conditions, like a read that yields no event, never do. After the
//! pumps have all returned, the event stream and the client connection are each closed exactly once.
mod errors;
mod pumps;
mod session;
mod terminator;

pub use errors::RelayError;
pub use session::{HandshakeError, RelayConfig, RelaySession, SessionReport};
pub use terminator::{SessionState, TerminationReason};
