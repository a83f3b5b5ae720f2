use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use relay_engine::{stream::TlsConnector, RelayConfig};
use tokio_util::sync::CancellationToken;

use crate::integrations::lnbits::LnbitsProvider;

/// Everything the WebSocket handler needs to start a relay session, shared between the server's workers.
#[derive(Clone)]
pub struct RelayState {
    pub provider: LnbitsProvider,
    pub connector: TlsConnector,
    pub config: RelayConfig,
    /// Cancelling this ends every live session.
    pub shutdown: CancellationToken,
    pub sessions: SessionCounter,
    pub access_token_cookie: String,
}

impl RelayState {
    pub fn new(
        provider: LnbitsProvider,
        connector: TlsConnector,
        config: RelayConfig,
        shutdown: CancellationToken,
        access_token_cookie: &str,
    ) -> Self {
        Self {
            provider,
            connector,
            config,
            shutdown,
            sessions: SessionCounter::default(),
            access_token_cookie: access_token_cookie.to_string(),
        }
    }
}

/// Counts live sessions.
#[derive(Clone, Default)]
pub struct SessionCounter(Arc<AtomicUsize>);

impl SessionCounter {
    /// Registers a session. It stays counted until the returned guard is dropped.
    pub fn open(&self) -> SessionGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        SessionGuard(self.0.clone())
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct SessionGuard(Arc<AtomicUsize>);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn guards_track_live_sessions() {
        let counter = SessionCounter::default();
        let a = counter.open();
        let b = counter.open();
        assert_eq!(counter.count(), 2);
        drop(a);
        assert_eq!(counter.count(), 1);
        drop(b);
        assert_eq!(counter.count(), 0);
    }
}
