#![forbid(unsafe_code)]
//! StakeChain node: REST API plus an optional background block producer.

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use stakechain::config::{load_config_from, DEFAULT_CONFIG_PATH};
use stakechain::node::Node;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Missing file means defaults.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override `network.api_port`.
    #[arg(long)]
    port: Option<u16>,

    /// Override `consensus.rng_seed`.
    #[arg(long)]
    seed: Option<u64>,

    /// Force the block producer on.
    #[arg(long)]
    produce_blocks: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = load_config_from(&cli.config)?;
    if let Some(port) = cli.port {
        config.network.api_port = port;
    }
    if cli.seed.is_some() {
        config.consensus.rng_seed = cli.seed;
    }
    if cli.produce_blocks {
        config.block_production.enabled = true;
    }

    println!("{}", "StakeChain Node".bright_cyan().bold());
    println!(
        "  {} {}",
        "network:".bright_white(),
        config.network.network_id.green()
    );
    println!(
        "  {} http://0.0.0.0:{}/api",
        "api:".bright_white(),
        config.network.api_port
    );
    println!(
        "  {} {}",
        "block production:".bright_white(),
        if config.block_production.enabled {
            format!("every {}", config.block_production.interval).green()
        } else {
            "manual (POST /api/blocks/process)".yellow()
        }
    );

    let node = Arc::new(Node::init(config)?);
    node.start().await
}
