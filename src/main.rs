//! Deposit Address Rotator (v1)
//!
//! Serves deterministic, time-rotating deposit addresses over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────┐
//!                     │                 DEPOSIT ROTATOR                  │
//!                     │                                                  │
//!   Client Request    │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!   ──────────────────┼─▶│  http   │───▶│ rotation │───▶│  bucket +  │   │
//!                     │  │ server  │    │ service  │    │  deriver   │   │
//!                     │  └────┬────┘    └──────────┘    └────────────┘   │
//!                     │       │                                          │
//!                     │       ▼                                          │
//!                     │  ┌─────────┐    ┌────────────┐                   │
//!                     │  │ status  │───▶│ blockchain │───────────────────┼──▶ RPC
//!                     │  │ lookup  │    │   client   │                   │
//!                     │  └─────────┘    └────────────┘                   │
//!                     │                                                  │
//!                     │  config (reload) · observability · lifecycle     │
//!                     └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use deposit_rotator::config::load_config;
use deposit_rotator::lifecycle::start;

#[derive(Parser)]
#[command(name = "deposit-rotator")]
#[command(about = "Deterministic deposit address rotation service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "rotator.toml")]
    config: PathBuf,

    /// Override `listener.bind_address`
    #[arg(short, long)]
    bind: Option<String>,

    /// Disable hot reload of the configuration file
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    let watch_path = (!args.no_watch).then_some(args.config.as_path());
    start(config, watch_path).await?;
    Ok(())
}
