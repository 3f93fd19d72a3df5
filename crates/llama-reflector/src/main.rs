use anyhow::{Context, Result};
use clap::Parser;
use llama_reflector::Reflector;
use std::net::Ipv4Addr;

/// LLAMA reflector: echoes back validated probe datagrams, preserving TOS.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// IPv4 address to listen on.
    #[arg(long, env = "LLAMA_IP", default_value = "0.0.0.0")]
    ip: Ipv4Addr,

    /// UDP port to listen on.
    #[arg(long, env = "LLAMA_PORT", default_value_t = 60000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    llama_logging::init()?;
    let cli = Cli::parse();

    let mut reflector = Reflector::bind((cli.ip, cli.port))
        .await
        .with_context(|| format!("failed to bind reflector socket on {}:{}", cli.ip, cli.port))?;

    tracing::info!(ip = %cli.ip, port = cli.port, "LLAMA reflector listening");

    match reflector.serve_forever().await {
        Ok(_never) => unreachable!("serve_forever never returns Ok"),
        Err(e) => Err(e).context("reflector receive loop failed"),
    }
}
