use std::{fmt::Display, sync::OnceLock};

use log::*;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Authenticating,
    Active,
    Terminating,
    Closed,
}

/// Why a session ended. Only the first terminal condition is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    ClientDisconnected,
    ClientError(String),
    UpstreamUnavailable,
    UpstreamClosed(String),
    Cancelled,
}

impl Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientDisconnected => write!(f, "client disconnected"),
            Self::ClientError(e) => write!(f, "client error: {e}"),
            Self::UpstreamUnavailable => write!(f, "event stream unavailable"),
            Self::UpstreamClosed(e) => write!(f, "event stream closed: {e}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Shared by the pumps of one session. The first pump to hit a terminal condition records why and cancels the rest.
pub(crate) struct Terminator {
    token: CancellationToken,
    reason: OnceLock<TerminationReason>,
    state: watch::Sender<SessionState>,
}

impl Terminator {
    pub fn new(token: CancellationToken, state: watch::Sender<SessionState>) -> Self {
        Self { token, reason: OnceLock::new(), state }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn terminate(&self, reason: TerminationReason) {
        if self.reason.get().is_none() && !self.token.is_cancelled() {
            info!("🔌️ Session terminating: {reason}");
            let _ = self.reason.set(reason);
        }
        self.enter(SessionState::Terminating);
        self.token.cancel();
    }

    /// The recorded reason. A session that was cancelled from outside has no reason of its own.
    pub fn reason(&self) -> TerminationReason {
        self.reason.get().cloned().unwrap_or(TerminationReason::Cancelled)
    }

    pub fn enter(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("🔌️ Session state: {previous:?} -> {state:?}");
        }
    }
}
