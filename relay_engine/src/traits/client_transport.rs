use crate::{
    messages::{CommandEnvelope, Envelope},
    relay::RelayError,
};

/// The receiving half of a client connection. The transport takes care of message framing.
#[allow(async_fn_in_trait)]
pub trait ClientSource {
    /// Waits for the next command. `Ok(None)` means the client disconnected cleanly.
    async fn receive(&mut self) -> Result<Option<CommandEnvelope>, RelayError>;
}

/// The sending half of a client connection.
#[allow(async_fn_in_trait)]
pub trait ClientSink {
    async fn send(&mut self, envelope: &Envelope) -> Result<(), RelayError>;

    /// Closes the connection. Called exactly once, when the session tears down.
    async fn close(&mut self);
}
