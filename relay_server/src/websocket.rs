//! The client side of a relay session, carried over an actix WebSocket.
//!
//! Text frames (and binary frames holding UTF-8) are parsed as commands. Pings are answered here and never reach the
//! session. A close frame or the end of the stream is a clean disconnect.
use actix_ws::{Message, MessageStream, Session};
use futures::StreamExt;
use log::*;
use relay_engine::{
    messages::{CommandEnvelope, Envelope},
    ClientSink,
    ClientSource,
    RelayError,
};

pub struct WsSource {
    stream: MessageStream,
    session: Session,
}

impl WsSource {
    pub fn new(stream: MessageStream, session: Session) -> Self {
        Self { stream, session }
    }
}

impl ClientSource for WsSource {
    async fn receive(&mut self) -> Result<Option<CommandEnvelope>, RelayError> {
        loop {
            let msg = match self.stream.next().await {
                None => return Ok(None),
                Some(Ok(msg)) => msg,
                Some(Err(e)) => return Err(RelayError::ClientTransport(e.to_string())),
            };
            match msg {
                Message::Text(text) => return Ok(Some(CommandEnvelope::from_json(&text))),
                Message::Binary(bytes) => match std::str::from_utf8(&bytes) {
                    Ok(text) => return Ok(Some(CommandEnvelope::from_json(text))),
                    Err(e) => debug!("🔌️ Ignoring a binary frame that is not UTF-8. {e}"),
                },
                Message::Ping(bytes) => {
                    if self.session.pong(&bytes).await.is_err() {
                        return Err(RelayError::ClientClosed);
                    }
                },
                Message::Close(reason) => {
                    debug!("🔌️ Client sent a close frame. {reason:?}");
                    return Ok(None);
                },
                Message::Pong(_) | Message::Continuation(_) | Message::Nop => {},
            }
        }
    }
}

pub struct WsSink {
    session: Option<Session>,
}

impl WsSink {
    pub fn new(session: Session) -> Self {
        Self { session: Some(session) }
    }
}

impl ClientSink for WsSink {
    async fn send(&mut self, envelope: &Envelope) -> Result<(), RelayError> {
        let session = self.session.as_mut().ok_or(RelayError::ClientClosed)?;
        session.text(envelope.to_json()).await.map_err(|_| RelayError::ClientClosed)
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            // The client may already be gone, in which case there's no one to tell.
            let _ = session.close(None).await;
        }
    }
}
