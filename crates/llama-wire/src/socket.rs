//! A thin wrapper around [`tokio::net::UdpSocket`] that knows how to program
//! the IPv4 `IP_TOS` byte.
//!
//! Raw sockets would let us read back the TOS byte of an inbound datagram
//! directly, but raw sockets require elevated privileges. Instead, the TOS
//! byte the sender wants honored travels inside the probe payload (see
//! [`crate::codec`]) and the reflector reprograms its own socket's `IP_TOS`
//! to match before echoing.

use socket2::SockRef;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// Maximum size of a single LLAMA datagram read.
pub const MAX_RECV_LEN: usize = 512;

#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    #[error("timed out waiting for a reply")]
    Timeout,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub struct TosUdpSocket {
    inner: tokio::net::UdpSocket,
}

impl TosUdpSocket {
    /// Binds a new socket. Passing port `0` gives an ephemeral local port,
    /// which is what the [`Sender`](https://docs.rs/llama-probe) uses to
    /// keep one socket per in-flight probe.
    pub async fn bind(addr: impl Into<SocketAddr>) -> io::Result<Self> {
        let inner = tokio::net::UdpSocket::bind(addr.into()).await?;

        Ok(Self { inner })
    }

    /// Programs the 8-bit DSCP+ECN byte on the IPv4 header of outbound
    /// packets. Only the low 8 bits are ever honored.
    pub fn set_tos(&self, tos: u8) -> io::Result<()> {
        SockRef::from(&self.inner).set_tos(u32::from(tos))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Fire-and-forget send. Failure is reported to the caller but never
    /// retried.
    pub async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.inner.send_to(buf, target).await
    }

    /// A single unbounded datagram read. Used by the reflector, which has no
    /// reason to ever time out its receive loop.
    pub async fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }

    /// A single datagram read, bounded by `timeout`. Yields
    /// [`RecvError::Timeout`] rather than blocking forever.
    pub async fn recv_timeout(
        &self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<(usize, SocketAddr), RecvError> {
        match tokio::time::timeout(timeout, self.inner.recv_from(buf)).await {
            Ok(result) => Ok(result?),
            Err(_elapsed) => Err(RecvError::Timeout),
        }
    }
}
