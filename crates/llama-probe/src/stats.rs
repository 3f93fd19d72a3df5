//! Per-target statistics, reduced on demand from a list of probe results.

use crate::result::ProbeResult;

/// Aggregated loss/latency statistics over one [`Sender`](crate::Sender) run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub sent: usize,
    pub lost: usize,
    pub loss_pct: f64,
    pub rtt_min_ms: f64,
    pub rtt_avg_ms: f64,
    pub rtt_max_ms: f64,
}

impl Stats {
    pub const ZERO: Stats = Stats {
        sent: 0,
        lost: 0,
        loss_pct: 0.0,
        rtt_min_ms: 0.0,
        rtt_avg_ms: 0.0,
        rtt_max_ms: 0.0,
    };
}

/// Reduces a batch of results into [`Stats`].
///
/// `rtt_min`/`rtt_avg`/`rtt_max` are computed over *all* results, including
/// the zeroed `rtt_ms` of lost probes. This matches the upstream behavior
/// (tracked there as bug `#27`): a lossy target's average RTT is skewed
/// toward zero rather than computed only over the probes that returned.
/// Preserved intentionally — see DESIGN.md.
///
/// `loss_pct` is the exact float percentage, not rounded.
pub fn reduce(results: &[ProbeResult]) -> Stats {
    let sent = results.len();
    if sent == 0 {
        return Stats::ZERO;
    }

    let lost = results.iter().filter(|r| r.lost).count();
    let loss_pct = 100.0 * lost as f64 / sent as f64;

    let rtt_min_ms = results
        .iter()
        .map(|r| r.rtt_ms)
        .fold(f64::INFINITY, f64::min);
    let rtt_max_ms = results
        .iter()
        .map(|r| r.rtt_ms)
        .fold(f64::NEG_INFINITY, f64::max);
    let rtt_avg_ms = results.iter().map(|r| r.rtt_ms).sum::<f64>() / sent as f64;

    Stats {
        sent,
        lost,
        loss_pct,
        rtt_min_ms,
        rtt_avg_ms,
        rtt_max_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{lost, ok};
    use llama_wire::Probe;

    #[test]
    fn empty_results_yield_all_zero_stats() {
        assert_eq!(reduce(&[]), Stats::ZERO);
    }

    #[test]
    fn all_successful_probes() {
        let results = vec![
            ok(0, Probe { tos: 0, sent_ms: 0.0, rcvd_ms: 0.0, rtt_ms: 0.0, lost: false }, 5.0),
            ok(0, Probe { tos: 0, sent_ms: 0.0, rcvd_ms: 0.0, rtt_ms: 0.0, lost: false }, 10.0),
        ];

        let stats = reduce(&results);

        assert_eq!(stats.sent, 2);
        assert_eq!(stats.lost, 0);
        assert_eq!(stats.loss_pct, 0.0);
        assert_eq!(stats.rtt_min_ms, 5.0);
        assert_eq!(stats.rtt_max_ms, 10.0);
        assert_eq!(stats.rtt_avg_ms, 7.5);
        assert!(stats.rtt_min_ms <= stats.rtt_avg_ms);
        assert!(stats.rtt_avg_ms <= stats.rtt_max_ms);
    }

    #[test]
    fn total_loss_is_100_percent_with_zeroed_rtt() {
        let results = vec![lost(0, 0.0), lost(0, 0.0), lost(0, 0.0)];

        let stats = reduce(&results);

        assert_eq!(stats.sent, 3);
        assert_eq!(stats.lost, 3);
        assert_eq!(stats.loss_pct, 100.0);
        assert_eq!(stats.rtt_min_ms, 0.0);
        assert_eq!(stats.rtt_avg_ms, 0.0);
        assert_eq!(stats.rtt_max_ms, 0.0);
    }

    #[test]
    fn lost_probes_pull_the_average_toward_zero() {
        let results = vec![
            ok(0, Probe { tos: 0, sent_ms: 0.0, rcvd_ms: 0.0, rtt_ms: 0.0, lost: false }, 100.0),
            lost(0, 0.0),
        ];

        let stats = reduce(&results);

        assert_eq!(stats.loss_pct, 50.0);
        assert_eq!(stats.rtt_avg_ms, 50.0);
        assert_eq!(stats.rtt_min_ms, 0.0);
        assert_eq!(stats.rtt_max_ms, 100.0);
    }
}
