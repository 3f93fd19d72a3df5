//! Fans out a [`Sender`] run to every configured target and reduces the
//! results into the per-target [`Metrics`] snapshot exposed over HTTP.

use crate::metrics::Metrics;
use llama_config::TargetTable;
use llama_probe::Sender;
use llama_tsdb::TsdbPoint;
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Cap on concurrently-running per-target `Sender`s, matching the Sender's
/// own worker pool cap.
const MAX_WORKERS: usize = 50;

#[derive(serde::Serialize)]
pub struct LatencyEntry {
    pub tags: BTreeMap<String, String>,
    pub data: Vec<(String, Option<f64>, Option<i64>)>,
}

pub struct Collection {
    targets: TargetTable,
    metrics: BTreeMap<std::net::Ipv4Addr, RwLock<Metrics>>,
    probe_port: u16,
    count: usize,
    tos: u8,
    timeout: Duration,
}

impl Collection {
    pub fn new(targets: TargetTable, probe_port: u16, count: usize, tos: u8, timeout: Duration) -> Self {
        let metrics = targets
            .targets()
            .iter()
            .map(|t| (t.address, RwLock::new(Metrics::new(t.tags.clone()))))
            .collect();

        Self {
            targets,
            metrics,
            probe_port,
            count,
            tos,
            timeout,
        }
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn targets(&self) -> &TargetTable {
        &self.targets
    }

    /// Runs one full collection cycle: a `Sender` against every target,
    /// concurrently up to [`MAX_WORKERS`], with each target's `Metrics`
    /// updated as soon as its results are in. The only externally
    /// observable effect is snapshot replacement — this is idempotent from
    /// the caller's perspective.
    pub async fn collect(&self) {
        let semaphore = Arc::new(Semaphore::new(MAX_WORKERS));
        let mut join_set = JoinSet::new();

        for target in self.targets.targets() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let addr = target.address;
            let probe_target = SocketAddr::new(IpAddr::V4(addr), self.probe_port);
            let count = self.count;
            let tos = self.tos;
            let timeout = self.timeout;

            join_set.spawn(async move {
                let _permit = permit;
                let sender = Sender::new(probe_target, count, tos, timeout);
                let results = sender.run().await;
                let stats = llama_probe::reduce(&results);

                (addr, stats)
            });
        }

        let now_s = now_seconds();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((addr, stats)) => {
                    if let Some(lock) = self.metrics.get(&addr) {
                        lock.write()
                            .expect("metrics lock is never poisoned")
                            .record(stats.rtt_avg_ms, stats.loss_pct, now_s);
                    }
                }
                Err(e) => tracing::error!(error = %e, "a per-target collection task panicked"),
            }
        }
    }

    /// The `/latency` read view: one entry per target, tags plus the
    /// `rtt`/`loss` datapoints.
    pub fn stats(&self) -> Vec<LatencyEntry> {
        self.metrics
            .values()
            .map(|lock| {
                let metrics = lock.read().expect("metrics lock is never poisoned");
                LatencyEntry {
                    tags: metrics.tags().clone(),
                    data: metrics
                        .data()
                        .into_iter()
                        .map(|(name, dp)| (name.to_string(), dp.value, dp.timestamp_s))
                        .collect(),
                }
            })
            .collect()
    }

    /// The `/influxdata` read view: every target's datapoints flattened
    /// into TSDB points.
    pub fn stats_influx(&self) -> Vec<TsdbPoint> {
        self.metrics
            .values()
            .flat_map(|lock| lock.read().expect("metrics lock is never poisoned").as_influx())
            .collect()
    }
}

fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the Unix epoch")
        .as_secs() as i64
}
