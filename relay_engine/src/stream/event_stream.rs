use log::*;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use url::Url;

use super::{ByteStream, UpstreamConnector};
use crate::{messages::UpstreamEvent, relay::RelayError};

const EVENT_MARKER: &str = "event:";
const DATA_MARKER: &str = "data:";
/// Longest line the reader accepts, terminator included.
pub const MAX_LINE_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Closed,
    Connecting,
    Streaming,
}

/// Tails the provider's push-event endpoint.
///
/// The reader speaks just enough HTTP to get the stream going: it writes a bare `GET` request and then treats
/// everything that comes back, status line and headers included, as a sequence of lines. Each event is a pair of lines,
/// `event: <name>` followed by `data: <json or text>`. Anything else is skipped.
pub struct EventStreamReader {
    state: ReaderState,
    stream: Option<BufReader<Box<dyn ByteStream>>>,
}

impl Default for EventStreamReader {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStreamReader {
    pub fn new() -> Self {
        Self { state: ReaderState::Closed, stream: None }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Connects to `url` and sends the stream request. Failures are logged rather than returned; check the resulting
    /// state to see whether the reader is streaming.
    pub async fn open<C: UpstreamConnector>(&mut self, connector: &C, url: &Url) -> ReaderState {
        self.state = ReaderState::Connecting;
        let endpoint = describe(url);
        debug!("📡️ Opening event stream at {endpoint}");
        match connector.connect(url).await {
            Ok(stream) => {
                if let Err(e) = self.attach(stream, url).await {
                    error!("📡️ Could not request the event stream from {endpoint}. {e}");
                    self.close().await;
                }
            },
            Err(e) => {
                error!("📡️ Could not connect to the event stream at {endpoint}. {e}");
                self.state = ReaderState::Closed;
            },
        }
        self.state
    }

    /// Sends the stream request for `url` over an already-connected byte stream and starts streaming from it.
    pub async fn attach(&mut self, mut stream: Box<dyn ByteStream>, url: &Url) -> Result<(), RelayError> {
        let request = request_for(url)?;
        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;
        self.stream = Some(BufReader::new(stream));
        self.state = ReaderState::Streaming;
        info!("📡️ Event stream open: {}", describe(url));
        Ok(())
    }

    /// Reads the next frame.
    ///
    /// Returns `Ok(None)` when the lines read do not form an event (a header line, a keep-alive blank line, a data line
    /// without its event line, etc.). This is not terminal; the caller should simply try again. An `Err` means the
    /// stream is gone.
    pub async fn next_event(&mut self) -> Result<Option<UpstreamEvent>, RelayError> {
        let reader = self.stream.as_mut().ok_or(RelayError::UpstreamClosed)?;
        let first = read_line(reader).await?;
        if !first.trim_start().starts_with(EVENT_MARKER) {
            trace!("📡️ Skipping non-event line");
            return Ok(None);
        }
        let second = read_line(reader).await?;
        let event = parse_frame(&first, &second);
        if event.is_none() {
            debug!("📡️ Event line was not followed by a data line. Dropping the frame.");
        }
        Ok(event)
    }

    /// Whether bytes that have already arrived are waiting to be read.
    pub fn has_buffered_data(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| !s.buffer().is_empty())
    }

    /// Closes the underlying connection. Calling this more than once is harmless.
    pub async fn close(&mut self) {
        if let Some(mut reader) = self.stream.take() {
            if let Err(e) = reader.get_mut().shutdown().await {
                debug!("📡️ Error shutting down the event stream connection. {e}");
            }
            info!("📡️ Event stream closed");
        }
        self.state = ReaderState::Closed;
    }
}

async fn read_line(reader: &mut BufReader<Box<dyn ByteStream>>) -> Result<String, RelayError> {
    let mut buf = Vec::with_capacity(128);
    let n = (&mut *reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Err(RelayError::UpstreamClosed);
    }
    if n as u64 == MAX_LINE_BYTES && buf.last() != Some(&b'\n') {
        return Err(RelayError::UpstreamIo(format!("Event stream line is longer than {MAX_LINE_BYTES} bytes")));
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Turns an `event:` line and a `data:` line into an event. Hyphens in the event name become underscores, so
/// `payment-received` arrives as `payment_received`. The data is parsed as JSON if possible and kept as a plain string
/// otherwise.
pub fn parse_frame(event_line: &str, data_line: &str) -> Option<UpstreamEvent> {
    let event = event_line.trim().strip_prefix(EVENT_MARKER)?.trim();
    let data = data_line.trim().strip_prefix(DATA_MARKER)?.trim();
    let data = serde_json::from_str::<Value>(data).unwrap_or_else(|_| Value::String(data.to_string()));
    Some(UpstreamEvent::new(event.replace('-', "_"), data))
}

/// The minimal request line sent to open the stream. Path and query are kept as is.
pub fn request_for(url: &Url) -> Result<String, RelayError> {
    let host = url.host_str().ok_or_else(|| RelayError::InvalidUrl("URL has no host".into()))?;
    let path = match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    };
    Ok(format!("GET {path} HTTP/1.0\r\nHost: {host}\r\n\r\n"))
}

// The query string carries the wallet key, so it never goes in the logs.
fn describe(url: &Url) -> String {
    format!("{}://{}{}", url.scheme(), url.host_str().unwrap_or("<no host>"), url.path())
}
