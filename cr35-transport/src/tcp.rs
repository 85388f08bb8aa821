//! TCP transport

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Read buffer size per `recv` call. Fragmented image streams arrive in
/// 64 KiB blocks, so match that.
const READ_BUF_SIZE: usize = 64 * 1024;

/// How long a graceful shutdown may take before the stream is dropped.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(2000);

/// TCP link to a CR35 scanner.
pub struct TcpTransport {
    host: String,
    port: u16,
    peer: Option<SocketAddr>,
    stream: Option<TcpStream>,
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Create a new TCP transport.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            peer: None,
            stream: None,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Pick the address to dial. Scanners sit on a fixed IPv4 address in
    /// practice, so the first resolution candidate is enough.
    async fn peer_addr(&mut self) -> Result<SocketAddr> {
        if let Some(peer) = self.peer {
            return Ok(peer);
        }

        let target = format!("{}:{}", self.host, self.port);
        let resolved = tokio::net::lookup_host(&target)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", target, e)))?
            .next();
        let peer = resolved.ok_or(Error::InvalidAddress(target))?;

        self.peer = Some(peer);
        Ok(peer)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::AlreadyConnected);
        }

        let peer = self.peer_addr().await?;
        debug!(%peer, "opening scanner connection");

        let stream = match timeout(self.connect_timeout, TcpStream::connect(peer)).await {
            Err(_) => return Err(Error::ConnectionTimeout),
            Ok(connected) => connected?,
        };

        // The session is a 10 ms command/response ping-pong; never let
        // Nagle hold a queued command back.
        stream.set_nodelay(true)?;

        self.stream = Some(stream);
        debug!(%peer, "scanner connection up");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        debug!("closing scanner connection to {}", self.remote_addr());

        // Graceful shutdown; abort by dropping if the peer stalls.
        match timeout(SHUTDOWN_TIMEOUT, stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("shutdown error (ignored): {}", e),
            Err(_) => warn!("graceful shutdown timed out, aborting connection"),
        }

        self.peer = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!(len = data.len(), "tx packet");
        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    async fn recv(&mut self) -> Result<Bytes> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let mut buf = BytesMut::with_capacity(READ_BUF_SIZE);
        if stream.read_buf(&mut buf).await? == 0 {
            return Err(Error::ConnectionClosed);
        }

        trace!(len = buf.len(), "rx bytes");
        Ok(buf.freeze())
    }

    fn remote_addr(&self) -> String {
        match self.peer {
            Some(peer) => peer.to_string(),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.stream.is_some() {
            warn!("transport dropped with the scanner link still open");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_transport_create() {
        let transport = TcpTransport::new("192.168.1.40", 2006);
        assert!(!transport.is_connected());
        assert_eq!(transport.remote_addr(), "192.168.1.40:2006");
    }

    #[tokio::test]
    async fn test_tcp_transport_invalid_address() {
        let mut transport = TcpTransport::new("invalid..address", 2006)
            .with_connect_timeout(Duration::from_millis(100));

        let result = transport.connect().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let mut transport = TcpTransport::new("192.168.1.40", 2006);
        assert!(matches!(
            transport.send(&[0x00]).await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(transport.recv().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_loopback_round_trip() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            sock.read_exact(&mut buf).await.unwrap();
            sock.write_all(&buf).await.unwrap();
        });

        let mut transport = TcpTransport::new(addr.ip().to_string(), addr.port());
        transport.connect().await.unwrap();
        assert!(transport.is_connected());

        transport.send(&[1, 2, 3, 4]).await.unwrap();
        let echoed = transport.recv().await.unwrap();
        assert_eq!(echoed.as_ref(), &[1, 2, 3, 4]);

        transport.disconnect().await.unwrap();
        assert!(!transport.is_connected());

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_double_connect_rejected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut transport = TcpTransport::new(addr.ip().to_string(), addr.port());
        transport.connect().await.unwrap();

        assert!(matches!(
            transport.connect().await,
            Err(Error::AlreadyConnected)
        ));

        transport.disconnect().await.unwrap();
    }
}
