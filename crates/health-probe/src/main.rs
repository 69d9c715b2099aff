//! Cluster health prober binary.
//!
//! Loads a node list, probes every node's addresses at the configured cadence
//! and prints the reachability snapshot as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use saorsa_health_probe::{
    Node, Prober, ProberConfig, SystemPingTransport, SystemResolver, config::load_document,
    logging,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "health-probe")]
#[command(about = "Probe cluster nodes and report their reachability")]
#[command(version)]
struct Cli {
    /// Node list (JSON or YAML)
    #[arg(long)]
    nodes: PathBuf,

    /// Prober configuration (JSON or YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run a single round, print the snapshot and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => ProberConfig::from_file(path).context("Failed to load prober config")?,
        None => ProberConfig::default(),
    };
    let nodes: Vec<Node> = load_document(&cli.nodes).context("Failed to load node list")?;
    info!(nodes = nodes.len(), "Loaded cluster membership");

    let transport = Arc::new(SystemPingTransport::new(config.ping_command.clone()));
    let prober = Arc::new(Prober::new(config.clone(), transport, Arc::new(SystemResolver))?);
    prober.set_nodes(nodes).await;

    if cli.once {
        if let Err(e) = prober.run_once().await {
            warn!(error = %e, "Probe round failed");
        }
        prober.flush().await;
        print_snapshot(&prober).await?;
        return Ok(());
    }

    let probe_loop = prober.run_loop();
    let mut report = tokio::time::interval(config.interval);
    // The first tick fires immediately; report after the first round instead.
    report.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            _ = report.tick() => print_snapshot(&prober).await?,
        }
    }

    probe_loop.stop();
    probe_loop.stopped().await;
    Ok(())
}

async fn print_snapshot(prober: &Prober) -> Result<()> {
    let mut results = prober.get_results().await;
    results.sort_by(|a, b| a.name.cmp(&b.name));
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
