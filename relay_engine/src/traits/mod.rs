//! # Collaborator contracts
//!
//! The relay core never talks to a concrete payment provider, user store, identity service or client transport.
//! Everything it needs from the outside world goes through the traits defined here.
//!
//! * [`PaymentProvider`] is the opaque REST façade of the external Lightning payment provider. Every call is made on
//!   behalf of a user and carries that user's wallet credential.
//! * [`UserManagement`] resolves usernames into [`Principal`](crate::db_types::Principal)s. It is read-only.
//! * [`Authenticator`] turns the bearer token presented at handshake time into a `Principal`.
//! * [`ClientSource`] and [`ClientSink`] are the two halves of the client's message connection.
mod authenticator;
mod client_transport;
mod payment_provider;
mod user_management;

pub use authenticator::Authenticator;
pub use client_transport::{ClientSink, ClientSource};
pub use payment_provider::{LnurlInvoice, NewInvoice, PaymentProvider, ProviderError};
pub use user_management::{UserDirectoryError, UserManagement};
