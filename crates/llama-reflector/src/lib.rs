//! The Reflector role: `recv -> validate -> set_tos(payload.tos) -> sendto`.
//!
//! Single-threaded by design; ordering and per-flow fairness are left to the
//! kernel socket buffer.

use llama_wire::{validate_and_peek_tos, TosUdpSocket, MAX_RECV_LEN};
use std::io;
use std::net::SocketAddr;

/// Log a periodic counter roughly this often, to avoid flooding logs under
/// sustained traffic.
const LOG_EVERY: u64 = 512;

pub struct Reflector {
    socket: TosUdpSocket,
    processed: u64,
    malformed: u64,
}

impl Reflector {
    pub async fn bind(addr: impl Into<SocketAddr>) -> io::Result<Self> {
        let socket = TosUdpSocket::bind(addr).await?;

        Ok(Self {
            socket,
            processed: 0,
            malformed: 0,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Runs the receive loop forever.
    pub async fn serve_forever(&mut self) -> io::Result<std::convert::Infallible> {
        loop {
            self.handle_one().await?;
        }
    }

    /// Handles exactly one inbound datagram. Split out from
    /// [`Self::serve_forever`] so tests can drive it deterministically.
    pub async fn handle_one(&mut self) -> io::Result<()> {
        let mut buf = [0u8; MAX_RECV_LEN];
        let (len, peer) = self.socket.recv(&mut buf).await?;
        let payload = &buf[..len];

        let tos = match validate_and_peek_tos(payload) {
            Ok(tos) => tos,
            Err(e) => {
                self.malformed += 1;
                if self.malformed % LOG_EVERY == 1 {
                    tracing::debug!(error = %e, from = %peer, "dropping malformed datagram");
                }
                return Ok(());
            }
        };

        if let Err(e) = self.socket.set_tos(tos) {
            tracing::debug!(error = %e, tos, "failed to program IP_TOS before reflecting");
        }

        if let Err(e) = self.socket.send_to(payload, peer).await {
            tracing::debug!(error = %e, to = %peer, "failed to reflect probe");
            return Ok(());
        }

        self.processed += 1;
        if self.processed % LOG_EVERY == 0 {
            tracing::info!(processed = self.processed, "reflector progress");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llama_wire::Probe;
    use std::time::Duration;

    #[tokio::test]
    async fn echoes_a_valid_probe_preserving_tos() {
        let mut reflector = Reflector::bind(([127, 0, 0, 1], 0)).await.unwrap();
        let reflector_addr = reflector.local_addr().unwrap();

        let sender = TosUdpSocket::bind(([127, 0, 0, 1], 0)).await.unwrap();
        let frame = Probe::encode(0xb8, 42.0);
        sender.send_to(&frame, reflector_addr).await.unwrap();

        reflector.handle_one().await.unwrap();

        let mut buf = [0u8; MAX_RECV_LEN];
        let (len, _from) = sender
            .recv_timeout(&mut buf, Duration::from_millis(500))
            .await
            .unwrap();

        assert_eq!(&buf[..len], &frame);
        assert_eq!(reflector.processed(), 1);
        assert_eq!(reflector.malformed(), 0);
    }

    #[tokio::test]
    async fn drops_a_foreign_datagram_without_replying() {
        let mut reflector = Reflector::bind(([127, 0, 0, 1], 0)).await.unwrap();
        let reflector_addr = reflector.local_addr().unwrap();

        let sender = TosUdpSocket::bind(([127, 0, 0, 1], 0)).await.unwrap();
        sender
            .send_to(&[0u8; 20], reflector_addr)
            .await
            .unwrap();

        reflector.handle_one().await.unwrap();

        let mut buf = [0u8; MAX_RECV_LEN];
        let result = sender
            .recv_timeout(&mut buf, Duration::from_millis(200))
            .await;

        assert!(result.is_err());
        assert_eq!(reflector.processed(), 0);
        assert_eq!(reflector.malformed(), 1);
    }
}
