use anyhow::{Context, Result};
use clap::Parser;
use llama_scraper::{CollectorClient, InfluxSink};
use std::time::Duration;
use tokio::task::JoinSet;

/// LLAMA scraper: pulls rolling latency snapshots off a set of collectors
/// on a fixed interval and writes them to an InfluxDB-compatible TSDB.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Seconds between scrapes of each collector.
    #[arg(long, env = "LLAMA_INTERVAL", default_value_t = 60)]
    interval: u64,

    /// InfluxDB host to write points to.
    #[arg(long, env = "LLAMA_INFLUX_SERVER")]
    influx_server: String,

    /// InfluxDB HTTP port.
    #[arg(long, env = "LLAMA_INFLUX_PORT", default_value_t = 8086)]
    influx_port: u16,

    /// InfluxDB database name to write into.
    #[arg(long, env = "LLAMA_INFLUX_DB")]
    influx_db: String,

    /// HTTP port every collector's `/influxdata` endpoint listens on.
    #[arg(long, env = "LLAMA_PORT", default_value_t = 8000)]
    port: u16,

    /// Collector hostnames or addresses to scrape.
    #[arg(required = true)]
    collectors: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    llama_logging::init()?;
    let cli = Cli::parse();

    let http = reqwest::Client::new();
    let interval = Duration::from_secs(cli.interval);

    tracing::info!(
        collectors = cli.collectors.len(),
        influx_server = %cli.influx_server,
        influx_db = %cli.influx_db,
        "starting LLAMA scraper"
    );

    let mut jobs = JoinSet::new();
    for host in cli.collectors.clone() {
        let client = CollectorClient::new(http.clone(), &host, cli.port);
        let sink = InfluxSink::new(
            http.clone(),
            &cli.influx_server,
            cli.influx_port,
            &cli.influx_db,
        );
        jobs.spawn(scrape_loop(host, client, sink, interval));
    }

    tokio::select! {
        _ = jobs.join_next() => {
            anyhow::bail!("a collector scrape loop exited unexpectedly");
        }
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for ctrl-c")?;
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

/// Scrapes and writes one collector on its own ticker, forever. Each tick
/// fully awaits the previous one's fetch-then-write before the next fires,
/// so a slow or unreachable collector only delays its own schedule; there
/// is no retry and no cross-collector backpressure.
async fn scrape_loop(
    host: String,
    client: CollectorClient,
    sink: InfluxSink,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let points = match client.fetch().await {
            Ok(points) => points,
            Err(error) => {
                tracing::warn!(%host, %error, "failed to scrape collector, will retry next tick");
                continue;
            }
        };

        if let Err(error) = sink.write(&points).await {
            tracing::warn!(%host, %error, "failed to write points to TSDB, will retry next tick");
        }
    }
}
