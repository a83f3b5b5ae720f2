use std::time::Duration;

use log::*;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{
    pumps::{drain_pump, inbound_pump, upstream_pump, writer_pump},
    terminator::{SessionState, TerminationReason, Terminator},
};
use crate::{
    db_types::Principal,
    dispatch::{CommandDispatcher, EventDispatcher},
    stream::{EventStreamReader, UpstreamConnector},
    traits::{Authenticator, ClientSink, ClientSource, PaymentProvider, ProviderError},
};

const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// How long the upstream pump waits after a read that produced no event.
    pub retry_interval: Duration,
    /// Whether events without a handler are sent to the client as `unhandled` envelopes.
    pub forward_unhandled_events: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { retry_interval: DEFAULT_RETRY_INTERVAL, forward_unhandled_events: true }
    }
}

/// Reasons a connection never becomes a session.
#[derive(Debug, Error)]
pub enum HandshakeError<E> {
    #[error("No access token was provided")]
    MissingToken,
    #[error("The access token was rejected. {0}")]
    Rejected(E),
    #[error("Could not determine the event stream for this user. {0}")]
    EventStream(ProviderError),
}

/// A summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub reason: TerminationReason,
    pub commands_received: u64,
    pub commands_dispatched: u64,
    pub events_forwarded: u64,
    pub envelopes_written: u64,
}

pub struct RelaySession<P> {
    principal: Principal,
    events_url: Url,
    commands: CommandDispatcher<P>,
    events: EventDispatcher,
    config: RelayConfig,
    terminator: Terminator,
    state: watch::Receiver<SessionState>,
}

impl<P: PaymentProvider> RelaySession<P> {
    /// Validates `token` and binds the resulting principal to a new session.
    ///
    /// Nothing is created unless this succeeds. The session's cancellation token is a child of `shutdown`, so
    /// cancelling `shutdown` ends every session made from it.
    pub async fn authenticate<A: Authenticator>(
        authenticator: &A,
        token: Option<&str>,
        provider: P,
        config: RelayConfig,
        shutdown: &CancellationToken,
    ) -> Result<Self, HandshakeError<A::Error>> {
        let (state_tx, state) = watch::channel(SessionState::Created);
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(HandshakeError::MissingToken)?;
        state_tx.send_replace(SessionState::Authenticating);
        debug!("🔌️ Session state: Created -> Authenticating");
        let principal = authenticator.validate(token).await.map_err(|e| {
            info!("🔌️ Connection refused. {e}");
            HandshakeError::Rejected(e)
        })?;
        let events_url =
            provider.event_stream_url(principal.api_key.reveal()).map_err(HandshakeError::EventStream)?;
        let terminator = Terminator::new(shutdown.child_token(), state_tx);
        terminator.enter(SessionState::Active);
        info!("🔌️ Session established for user #{} ({})", principal.id, principal.username);
        Ok(Self {
            principal,
            events_url,
            commands: CommandDispatcher::new(provider),
            events: EventDispatcher,
            config,
            terminator,
            state,
        })
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Follows the session's state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// A handle that ends the session when cancelled.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.terminator.token().clone()
    }

    /// Relays between the client and the provider until a terminal condition, then tears everything down.
    pub async fn run<S, K, C>(self, mut source: S, mut sink: K, connector: C) -> SessionReport
    where
        S: ClientSource,
        K: ClientSink,
        C: UpstreamConnector,
    {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let mut reader = EventStreamReader::new();
        let term = &self.terminator;
        let (commands_received, commands_dispatched, events_forwarded, envelopes_written) = tokio::join!(
            inbound_pump(&mut source, queue_tx, term),
            drain_pump(&self.commands, &self.principal, queue_rx, outbox_tx.clone(), term),
            upstream_pump(
                &mut reader,
                &connector,
                &self.events_url,
                &self.events,
                self.config.forward_unhandled_events,
                self.config.retry_interval,
                outbox_tx,
                term,
            ),
            writer_pump(&mut sink, outbox_rx, term),
        );
        // Every pump has returned, so nothing else can touch the event stream or the client connection.
        term.enter(SessionState::Terminating);
        reader.close().await;
        sink.close().await;
        term.enter(SessionState::Closed);
        let report = SessionReport {
            reason: term.reason(),
            commands_received,
            commands_dispatched,
            events_forwarded,
            envelopes_written,
        };
        info!(
            "🔌️ Session for user #{} closed ({}). {} commands, {} events, {} messages written",
            self.principal.id, report.reason, report.commands_dispatched, report.events_forwarded,
            report.envelopes_written
        );
        report
    }
}
