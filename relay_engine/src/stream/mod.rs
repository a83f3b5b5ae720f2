//! The upstream side of the relay: a long-lived connection to the provider's push-event endpoint, read as a sequence
//! of two-line frames.
mod connector;
mod event_stream;

pub use connector::{ByteStream, TlsConnector, UpstreamConnector};
pub use event_stream::{parse_frame, request_for, EventStreamReader, ReaderState};
