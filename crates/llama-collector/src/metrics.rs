//! The descriptor-per-datapoint pattern from the original implementation,
//! re-expressed as a plain `{value, timestamp}` record plus a small
//! enumerated set of known datapoint names (`rtt`, `loss`).

use llama_tsdb::TsdbPoint;
use std::collections::BTreeMap;

/// A single observed value and the wall-clock second it was written.
/// Never written means `None` in both fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Datapoint {
    pub value: Option<f64>,
    pub timestamp_s: Option<i64>,
}

/// Per-target metrics: its tags plus the last-observed `rtt` and `loss`
/// datapoints. One `Metrics` is created per target at startup and lives for
/// the life of the process; only its datapoints are overwritten, atomically
/// per cycle.
#[derive(Debug, Clone)]
pub struct Metrics {
    tags: BTreeMap<String, String>,
    rtt: Datapoint,
    loss: Datapoint,
}

impl Metrics {
    pub fn new(tags: BTreeMap<String, String>) -> Self {
        Self {
            tags,
            rtt: Datapoint::default(),
            loss: Datapoint::default(),
        }
    }

    /// Overwrites both datapoints together, as a single atomic snapshot
    /// update for this target.
    pub fn record(&mut self, rtt_avg_ms: f64, loss_pct: f64, now_s: i64) {
        self.rtt = Datapoint {
            value: Some(rtt_avg_ms),
            timestamp_s: Some(now_s),
        };
        self.loss = Datapoint {
            value: Some(loss_pct),
            timestamp_s: Some(now_s),
        };
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// The known datapoints, in a stable order: `rtt` then `loss`.
    pub fn data(&self) -> [(&'static str, Datapoint); 2] {
        [("rtt", self.rtt), ("loss", self.loss)]
    }

    pub fn as_influx(&self) -> Vec<TsdbPoint> {
        self.data()
            .into_iter()
            .map(|(name, point)| {
                let time_ns = point.timestamp_s.unwrap_or(0) * 1_000_000_000;
                TsdbPoint::new(name, self.tags.clone(), time_ns, point.value)
            })
            .collect()
    }
}
