use anyhow::{bail, Context, Result};
use clap::Parser;
use llama_collector::collection::Collection;
use llama_collector::http::{self, AppState};
use llama_collector::scheduler;
use llama_config::TargetTable;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// LLAMA collector: probes a configured set of targets on a fixed interval
/// and exposes the rolling results over HTTP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// IPv4 address the HTTP surface binds to.
    #[arg(long, env = "LLAMA_IP", default_value = "0.0.0.0")]
    ip: Ipv4Addr,

    /// TCP port the HTTP surface listens on.
    #[arg(long, env = "LLAMA_PORT", default_value_t = 8000)]
    port: u16,

    /// Seconds between collection cycles.
    #[arg(long, env = "LLAMA_INTERVAL", default_value_t = 60)]
    interval: u64,

    /// Number of probes sent to each target per cycle.
    #[arg(long, env = "LLAMA_COUNT", default_value_t = 10)]
    count: usize,

    /// DSCP+ECN byte to mark on outbound probes.
    #[arg(long, env = "LLAMA_TOS", default_value_t = 0)]
    tos: u8,

    /// Per-probe receive timeout, in (possibly fractional) seconds.
    #[arg(long, env = "LLAMA_TIMEOUT", default_value_t = 1.0)]
    timeout: f64,

    /// UDP port every reflector listens on.
    #[arg(long, env = "LLAMA_PROBE_PORT", default_value_t = 60000)]
    probe_port: u16,

    /// Use UDP/reflector-based probing. This is the default and only
    /// implemented method; the flag is accepted for CLI compatibility.
    #[arg(long)]
    udp: bool,

    /// Present for CLI compatibility; hping3 requires a raw-socket
    /// sub-process and is not implemented here.
    #[arg(long)]
    hping3: bool,

    /// Path to the YAML target configuration file.
    #[arg(long, env = "LLAMA_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    llama_logging::init()?;
    let cli = Cli::parse();

    if cli.hping3 {
        bail!("--hping3 is not supported; this collector only speaks LLAMA's UDP probe protocol");
    }

    let targets = TargetTable::load(&cli.config)
        .with_context(|| format!("failed to load target config from {}", cli.config.display()))?;
    tracing::info!(targets = targets.len(), udp = cli.udp, "loaded target configuration");

    let timeout = Duration::from_secs_f64(cli.timeout);
    let interval = Duration::from_secs(cli.interval);

    let collection = Arc::new(Collection::new(
        targets.clone(),
        cli.probe_port,
        cli.count,
        cli.tos,
        timeout,
    ));

    let shutdown = CancellationToken::new();
    let scheduler_handle = scheduler::spawn(collection.clone(), interval, shutdown.clone());

    let state = Arc::new(AppState {
        collection,
        targets: Arc::new(targets),
        interval,
        started_at: Instant::now(),
        shutdown: shutdown.clone(),
    });

    http::serve((cli.ip, cli.port), state)
        .await
        .context("HTTP surface failed")?;

    shutdown.cancel();
    scheduler_handle
        .await
        .context("scheduler task panicked")?;

    tracing::info!("LLAMA collector shut down cleanly");
    Ok(())
}
