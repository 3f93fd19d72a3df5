//! Process-wide tracing setup shared by all three LLAMA binaries.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// A filter directive that silences crates whose debug logs are rarely
/// useful for diagnosing a LLAMA deployment.
const IRRELEVANT_CRATES: &str = "mio=warn,want=warn,hyper=warn";

/// Installs the global tracing subscriber, honoring `RUST_LOG`.
///
/// Call once, at the very top of `main`, before anything else can log.
pub fn init() -> Result<()> {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = try_filter(&directives).context("failed to parse RUST_LOG directives")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init()
        .context("failed to install global tracing subscriber")?;

    Ok(())
}

fn try_filter(directives: &str) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    EnvFilter::try_new(format!("{IRRELEVANT_CRATES},{directives}"))
}

/// Installs a subscriber scoped to the current test's output, discarded when
/// the returned guard drops.
pub fn test(directives: &str) -> tracing::subscriber::DefaultGuard {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(directives)
        .set_default()
}
