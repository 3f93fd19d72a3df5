//! Sends `count` independent UDP probes to a target and collects the results.
//!
//! One socket per probe keeps the receive pairing trivial: the reply to
//! probe *i* arrives on socket *i* or not at all, with no correlation ID
//! needed. Sockets are partitioned into batches of up to 50 and dispatched
//! to a bounded pool of up to 50 concurrent workers; each worker processes
//! its batch strictly sequentially.

use crate::result::{self, ProbeResult};
use llama_wire::{Probe, TosUdpSocket};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Upper bound on both the batch size and the number of concurrently
/// running workers. Exposed as a constant rather than a setting for now —
/// see DESIGN.md.
const MAX_BATCH: usize = 50;
const MAX_WORKERS: usize = 50;

pub struct Sender {
    target: SocketAddr,
    count: usize,
    tos: u8,
    timeout: Duration,
}

impl Sender {
    pub fn new(target: SocketAddr, count: usize, tos: u8, timeout: Duration) -> Self {
        Self {
            target,
            count,
            tos,
            timeout,
        }
    }

    /// Sends exactly `count` probes (fewer only if a socket failed to bind)
    /// and returns one [`ProbeResult`] per probe actually issued.
    ///
    /// Total wall time is bounded by roughly
    /// `ceil(count/50) * (batch send latency + timeout)`.
    pub async fn run(&self) -> Vec<ProbeResult> {
        let sockets = self.bind_sockets().await;

        let mut batches = Vec::new();
        let mut current = Vec::with_capacity(MAX_BATCH);
        for socket in sockets {
            current.push(socket);
            if current.len() == MAX_BATCH {
                batches.push(std::mem::replace(&mut current, Vec::with_capacity(MAX_BATCH)));
            }
        }
        if !current.is_empty() {
            batches.push(current);
        }

        let results = Arc::new(Mutex::new(Vec::with_capacity(self.count)));
        let semaphore = Arc::new(Semaphore::new(MAX_WORKERS));
        let mut join_set = JoinSet::new();

        for batch in batches {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let results = Arc::clone(&results);
            let target = self.target;
            let tos = self.tos;
            let timeout = self.timeout;

            join_set.spawn(async move {
                let _permit = permit;
                let batch_results = run_batch(batch, target, tos, timeout).await;
                results
                    .lock()
                    .expect("sender result lock is never poisoned")
                    .extend(batch_results);
            });
        }

        let mut representative_panic = None;
        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                representative_panic.get_or_insert(e);
            }
        }
        if let Some(e) = representative_panic {
            tracing::error!(error = %e, "at least one Sender worker panicked; continuing with partial results");
        }

        Arc::try_unwrap(results)
            .expect("all worker tasks have joined")
            .into_inner()
            .expect("sender result lock is never poisoned")
    }

    async fn bind_sockets(&self) -> Vec<TosUdpSocket> {
        let mut sockets = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            match TosUdpSocket::bind(([0, 0, 0, 0], 0)).await {
                Ok(socket) => sockets.push(socket),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to bind probe socket, target cycle will under-count");
                }
            }
        }
        sockets
    }
}

fn wall_clock_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the Unix epoch")
        .as_secs_f64()
        * 1000.0
}

async fn run_batch(
    batch: Vec<TosUdpSocket>,
    target: SocketAddr,
    tos: u8,
    timeout: Duration,
) -> Vec<ProbeResult> {
    let mut out = Vec::with_capacity(batch.len());

    for socket in batch {
        if let Err(e) = socket.set_tos(tos) {
            tracing::debug!(error = %e, "failed to set IP_TOS on probe socket");
        }

        let sent_ms = wall_clock_ms();
        let frame = Probe::encode(tos, sent_ms);

        if let Err(e) = socket.send_to(&frame, target).await {
            tracing::debug!(error = %e, "probe send failed, counting as loss");
            out.push(result::lost(tos, sent_ms));
            continue;
        }

        let mut buf = [0u8; llama_wire::MAX_RECV_LEN];
        match socket.recv_timeout(&mut buf, timeout).await {
            Ok((len, _peer)) => match Probe::decode(&buf[..len]) {
                Ok(reply) => out.push(result::ok(tos, reply, wall_clock_ms())),
                Err(e) => {
                    tracing::debug!(error = %e, "malformed reply, counting as loss");
                    out.push(result::lost(tos, sent_ms));
                }
            },
            Err(_timeout) => out.push(result::lost(tos, sent_ms)),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use llama_wire::TosUdpSocket as Socket;

    /// A bare-bones reflector loop used only to exercise the Sender in
    /// isolation, without pulling in the `llama-reflector` binary crate.
    async fn reflect_once(socket: &Socket) {
        let mut buf = [0u8; llama_wire::MAX_RECV_LEN];
        if let Ok((len, peer)) = socket.recv_timeout(&mut buf, Duration::from_secs(1)).await {
            let _ = socket.send_to(&buf[..len], peer).await;
        }
    }

    #[tokio::test]
    async fn happy_path_all_probes_succeed() {
        let reflector = Socket::bind(([127, 0, 0, 1], 0)).await.unwrap();
        let reflector_addr = reflector.local_addr().unwrap();

        let reflector_task = tokio::spawn(async move {
            for _ in 0..5 {
                reflect_once(&reflector).await;
            }
        });

        let sender = Sender::new(reflector_addr, 5, 0x2e, Duration::from_millis(200));
        let results = sender.run().await;
        reflector_task.await.unwrap();

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| !r.lost));

        let stats = crate::stats::reduce(&results);
        assert_eq!(stats.sent, 5);
        assert_eq!(stats.lost, 0);
        assert_eq!(stats.loss_pct, 0.0);
        assert!(stats.rtt_min_ms <= stats.rtt_avg_ms);
        assert!(stats.rtt_avg_ms <= stats.rtt_max_ms);
        assert!(stats.rtt_max_ms < 500.0);
    }

    #[tokio::test]
    async fn unreachable_target_yields_total_loss() {
        // Port 1 on loopback: nothing is listening, so every probe times out.
        let unreachable: SocketAddr = "127.0.0.1:1".parse().unwrap();

        let sender = Sender::new(unreachable, 3, 0, Duration::from_millis(200));
        let started = std::time::Instant::now();
        let results = sender.run().await;
        let elapsed = started.elapsed();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.lost));

        let stats = crate::stats::reduce(&results);
        assert_eq!(stats.loss_pct, 100.0);
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn tos_is_preserved_round_trip() {
        let reflector = Socket::bind(([127, 0, 0, 1], 0)).await.unwrap();
        let reflector_addr = reflector.local_addr().unwrap();

        let reflector_task = tokio::spawn(async move {
            reflect_once(&reflector).await;
        });

        let sender = Sender::new(reflector_addr, 1, 0xb8, Duration::from_millis(200));
        let results = sender.run().await;
        reflector_task.await.unwrap();

        assert_eq!(results[0].tos, 0xb8);
    }
}
