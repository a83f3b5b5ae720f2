use std::sync::Arc;

use log::*;
use rustls::{pki_types::ServerName, ClientConfig, RootCertStore};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tokio_rustls::TlsConnector as TokioTlsConnector;
use url::Url;

use crate::relay::RelayError;

/// Any bidirectional byte stream the event stream reader can run over.
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

/// Opens the raw byte connection to the host and port named in an event stream URL.
#[allow(async_fn_in_trait)]
pub trait UpstreamConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn ByteStream>, RelayError>;
}

/// Connects over TCP, wrapping the socket in TLS (rustls, webpki roots) for `https` URLs. Plain `http` URLs get a bare
/// TCP stream, which is handy for a provider instance running on the local network.
#[derive(Clone)]
pub struct TlsConnector {
    tls: TokioTlsConnector,
}

impl TlsConnector {
    pub fn new() -> Result<Self, RelayError> {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|e| RelayError::UpstreamConnect(format!("Invalid TLS configuration. {e}")))?
            .with_root_certificates(root_store)
            .with_no_client_auth();
        Ok(Self { tls: TokioTlsConnector::from(Arc::new(config)) })
    }
}

impl UpstreamConnector for TlsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn ByteStream>, RelayError> {
        let use_tls = match url.scheme() {
            "https" => true,
            "http" => false,
            s => return Err(RelayError::InvalidUrl(format!("Unsupported scheme: {s}"))),
        };
        let host = url.host_str().ok_or_else(|| RelayError::InvalidUrl("URL has no host".into()))?;
        let port = url.port_or_known_default().unwrap_or(if use_tls { 443 } else { 80 });
        // rustls and the resolver both want IPv6 addresses without the brackets
        let host = host.trim_start_matches('[').trim_end_matches(']');
        debug!("📡️ Connecting to {host}:{port} (tls: {use_tls})");
        let socket =
            TcpStream::connect((host, port)).await.map_err(|e| RelayError::UpstreamConnect(format!("{host}: {e}")))?;
        if !use_tls {
            return Ok(Box::new(socket));
        }
        let domain = ServerName::try_from(host.to_string())
            .map_err(|e| RelayError::InvalidUrl(format!("Invalid server name {host}. {e}")))?;
        let stream =
            self.tls.connect(domain, socket).await.map_err(|e| RelayError::UpstreamConnect(format!("TLS: {e}")))?;
        trace!("📡️ TLS handshake with {host} complete");
        Ok(Box::new(stream))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn unsupported_schemes_are_rejected() {
        let connector = TlsConnector::new().unwrap();
        let url = Url::parse("ftp://lnbits.example.com/api/v1/payments/sse").unwrap();
        let err = connector.connect(&url).await.err().unwrap();
        assert!(matches!(err, RelayError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn plain_connection_to_a_closed_port_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let connector = TlsConnector::new().unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/sse")).unwrap();
        let err = connector.connect(&url).await.err().unwrap();
        assert!(matches!(err, RelayError::UpstreamConnect(_)));
    }

    #[tokio::test]
    async fn plain_connection() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connector = TlsConnector::new().unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{port}/sse")).unwrap();
        let (accepted, connected) = tokio::join!(listener.accept(), connector.connect(&url));
        assert!(accepted.is_ok());
        assert!(connected.is_ok());
    }
}
