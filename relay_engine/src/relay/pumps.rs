use std::time::Duration;

use log::*;
use tokio::{select, sync::mpsc, time::sleep};
use url::Url;

use super::terminator::{Terminator, TerminationReason};
use crate::{
    db_types::Principal,
    dispatch::{CommandDispatcher, EventDispatcher, EventOutcome},
    messages::{CommandEnvelope, Envelope},
    relay::RelayError,
    stream::{EventStreamReader, ReaderState, UpstreamConnector},
    traits::{ClientSink, ClientSource, PaymentProvider},
};

pub(crate) type CommandQueue = mpsc::UnboundedSender<CommandEnvelope>;
pub(crate) type Outbox = mpsc::UnboundedSender<Envelope>;

/// Reads commands off the client connection and queues them. Returns the number of commands received.
pub(crate) async fn inbound_pump<S: ClientSource>(source: &mut S, queue: CommandQueue, term: &Terminator) -> u64 {
    let mut received = 0;
    loop {
        select! {
            biased;
            _ = term.cancelled() => break,
            msg = source.receive() => match msg {
                Ok(Some(cmd)) => {
                    received += 1;
                    if queue.send(cmd).is_err() {
                        break;
                    }
                },
                Ok(None) => {
                    term.terminate(TerminationReason::ClientDisconnected);
                    break;
                },
                Err(RelayError::ClientClosed) => {
                    term.terminate(TerminationReason::ClientDisconnected);
                    break;
                },
                Err(e) => {
                    warn!("🔌️ Could not read from client. {e}");
                    term.terminate(TerminationReason::ClientError(e.to_string()));
                    break;
                },
            }
        }
    }
    trace!("🔌️ Inbound pump finished");
    received
}

/// Takes queued commands in arrival order, dispatches them one at a time and hands the replies to the writer. Returns
/// the number of commands dispatched.
pub(crate) async fn drain_pump<P: PaymentProvider>(
    dispatcher: &CommandDispatcher<P>,
    principal: &Principal,
    mut queue: mpsc::UnboundedReceiver<CommandEnvelope>,
    outbox: Outbox,
    term: &Terminator,
) -> u64 {
    let mut dispatched = 0;
    loop {
        let cmd = select! {
            biased;
            _ = term.cancelled() => break,
            cmd = queue.recv() => match cmd {
                Some(cmd) => cmd,
                None => break,
            },
        };
        let reply = select! {
            biased;
            _ = term.cancelled() => break,
            reply = dispatcher.dispatch(principal, cmd) => reply,
        };
        dispatched += 1;
        if outbox.send(reply).is_err() {
            break;
        }
    }
    trace!("🔌️ Drain pump finished");
    dispatched
}

/// Opens the event stream and forwards dispatched events to the writer until the stream fails or the session is
/// cancelled. Returns the number of events forwarded.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn upstream_pump<C: UpstreamConnector>(
    reader: &mut EventStreamReader,
    connector: &C,
    url: &Url,
    events: &EventDispatcher,
    forward_unhandled: bool,
    retry_interval: Duration,
    outbox: Outbox,
    term: &Terminator,
) -> u64 {
    let state = select! {
        biased;
        _ = term.cancelled() => return 0,
        state = reader.open(connector, url) => state,
    };
    if state != ReaderState::Streaming {
        term.terminate(TerminationReason::UpstreamUnavailable);
        return 0;
    }
    let mut forwarded = 0;
    loop {
        let next = select! {
            biased;
            _ = term.cancelled() => break,
            next = reader.next_event() => next,
        };
        let envelope = match next {
            Ok(Some(event)) => match events.dispatch(event) {
                EventOutcome::Forward(env) => env,
                EventOutcome::Unhandled(env) if forward_unhandled => env,
                EventOutcome::Unhandled(_) | EventOutcome::Suppressed => continue,
            },
            // More lines are already buffered, so there is nothing to wait for
            Ok(None) if reader.has_buffered_data() => continue,
            Ok(None) => {
                select! {
                    biased;
                    _ = term.cancelled() => break,
                    _ = sleep(retry_interval) => continue,
                }
            },
            Err(e) => {
                warn!("📡️ Event stream failed. {e}");
                term.terminate(TerminationReason::UpstreamClosed(e.to_string()));
                break;
            },
        };
        forwarded += 1;
        if outbox.send(envelope).is_err() {
            break;
        }
    }
    trace!("📡️ Upstream pump finished");
    forwarded
}

/// The single writer to the client connection. Returns the number of envelopes written.
pub(crate) async fn writer_pump<K: ClientSink>(
    sink: &mut K,
    mut outbox: mpsc::UnboundedReceiver<Envelope>,
    term: &Terminator,
) -> u64 {
    let mut written = 0;
    loop {
        let envelope = select! {
            biased;
            _ = term.cancelled() => break,
            env = outbox.recv() => match env {
                Some(env) => env,
                None => break,
            },
        };
        // A client that stops reading stalls the send until the session is cancelled
        let sent = select! {
            biased;
            _ = term.cancelled() => break,
            sent = sink.send(&envelope) => sent,
        };
        if let Err(e) = sent {
            match e {
                RelayError::ClientClosed => term.terminate(TerminationReason::ClientDisconnected),
                e => {
                    warn!("🔌️ Could not write to client. {e}");
                    term.terminate(TerminationReason::ClientError(e.to_string()));
                },
            }
            break;
        }
        written += 1;
    }
    trace!("🔌️ Writer pump finished");
    written
}
