use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
    Mutex,
};

use tokio::{
    io::{duplex, DuplexStream},
    sync::mpsc,
};
use url::Url;

use crate::{
    messages::{CommandEnvelope, Envelope},
    relay::RelayError,
    stream::{ByteStream, UpstreamConnector},
    traits::{ClientSink, ClientSource},
};

/// The test's side of an in-memory client connection. Dropping `commands` looks like a client disconnect.
pub struct ClientHandle {
    pub commands: mpsc::UnboundedSender<CommandEnvelope>,
    pub replies: mpsc::UnboundedReceiver<Envelope>,
    pub closed: Arc<AtomicBool>,
    pub writes_after_close: Arc<AtomicU64>,
}

impl ClientHandle {
    pub fn send(&self, cmd: CommandEnvelope) {
        let _ = self.commands.send(cmd);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct ChannelSource {
    commands: mpsc::UnboundedReceiver<CommandEnvelope>,
}

impl ClientSource for ChannelSource {
    async fn receive(&mut self) -> Result<Option<CommandEnvelope>, RelayError> {
        Ok(self.commands.recv().await)
    }
}

pub struct ChannelSink {
    replies: mpsc::UnboundedSender<Envelope>,
    closed: Arc<AtomicBool>,
    writes_after_close: Arc<AtomicU64>,
}

impl ClientSink for ChannelSink {
    async fn send(&mut self, envelope: &Envelope) -> Result<(), RelayError> {
        if self.closed.load(Ordering::SeqCst) {
            self.writes_after_close.fetch_add(1, Ordering::SeqCst);
            return Err(RelayError::ClientClosed);
        }
        self.replies.send(envelope.clone()).map_err(|_| RelayError::ClientClosed)
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub fn client_channel() -> (ClientHandle, ChannelSource, ChannelSink) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    let writes_after_close = Arc::new(AtomicU64::new(0));
    let handle = ClientHandle {
        commands: cmd_tx,
        replies: reply_rx,
        closed: Arc::clone(&closed),
        writes_after_close: Arc::clone(&writes_after_close),
    };
    let source = ChannelSource { commands: cmd_rx };
    let sink = ChannelSink { replies: reply_tx, closed, writes_after_close };
    (handle, source, sink)
}

/// Hands out one end of an in-memory byte pipe the first time it is asked to connect, and fails after that. The other
/// end plays the provider.
pub struct DuplexConnector {
    stream: Mutex<Option<DuplexStream>>,
}

impl DuplexConnector {
    pub fn pair() -> (Self, DuplexStream) {
        let (local, remote) = duplex(8192);
        (Self { stream: Mutex::new(Some(local)) }, remote)
    }

    /// A connector that can never connect.
    pub fn unreachable() -> Self {
        Self { stream: Mutex::new(None) }
    }
}

impl UpstreamConnector for DuplexConnector {
    async fn connect(&self, _url: &Url) -> Result<Box<dyn ByteStream>, RelayError> {
        let stream = self.stream.lock().ok().and_then(|mut s| s.take());
        match stream {
            Some(s) => Ok(Box::new(s)),
            None => Err(RelayError::UpstreamConnect("connection refused".into())),
        }
    }
}
