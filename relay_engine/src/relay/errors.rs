use std::io;

use thiserror::Error;

/// Transport-level failures. Any of these ends the session that hit it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("The client closed the connection")]
    ClientClosed,
    #[error("Client transport error. {0}")]
    ClientTransport(String),
    #[error("Could not connect to the event stream. {0}")]
    UpstreamConnect(String),
    #[error("Event stream I/O error. {0}")]
    UpstreamIo(String),
    #[error("The event stream was closed by the remote end")]
    UpstreamClosed,
    #[error("Invalid event stream URL. {0}")]
    InvalidUrl(String),
}

impl From<io::Error> for RelayError {
    fn from(e: io::Error) -> Self {
        RelayError::UpstreamIo(e.to_string())
    }
}
