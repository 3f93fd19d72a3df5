//! Fires [`Collection::collect`] on a fixed interval.
//!
//! A `tokio::time::interval` tick is only requested once the previous
//! collection has fully awaited — there is no overlap, so at most one
//! collection runs per target at a time, and a slow cycle simply delays the
//! next tick rather than queuing up.

use crate::collection::Collection;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn spawn(
    collection: Arc<Collection>,
    interval: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("starting collection cycle");
                    collection.collect().await;
                    tracing::debug!(targets = collection.target_count(), "collection cycle complete");
                }
                () = shutdown.cancelled() => {
                    tracing::info!("scheduler stopping, allowing in-flight cycle to drain");
                    return;
                }
            }
        }
    })
}
