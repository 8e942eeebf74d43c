use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use deposit_rotator::rotation::{AddressRotationService, CurrentAddress, RotationResult, TimeBucket};

#[derive(Parser)]
#[command(name = "rotator-cli")]
#[command(about = "Derive deposit addresses offline or query a running rotator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the address in force at an instant (offline)
    Derive {
        #[arg(long)]
        identity: String,
        /// Rotation interval in minutes
        #[arg(long)]
        interval: i64,
        /// RFC 3339 instant; defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// List the addresses for every boundary in [start, end) (offline)
    Range {
        #[arg(long)]
        identity: String,
        #[arg(long)]
        interval: i64,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
    },
    /// Check that an address belongs to an identity and bucket (offline)
    Validate {
        #[arg(long)]
        identity: String,
        #[arg(long)]
        address: String,
        /// Bucket key, e.g. 2024-01-01T00:00
        #[arg(long)]
        bucket: String,
    },
    /// Current address from the running service
    Current,
    /// Next address from the running service
    Next,
    /// Deposit status of an address from the running service
    Status {
        address: String,
        #[arg(long)]
        confirmations: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Derive { identity, interval, at } => {
            let current = derive_offline(&identity, interval, at.unwrap_or_else(Utc::now))?;
            print_json(&serde_json::to_value(current)?)?;
        }
        Commands::Range {
            identity,
            interval,
            start,
            end,
        } => {
            for line in range_lines(&identity, interval, start, end)? {
                println!("{}", line);
            }
        }
        Commands::Validate {
            identity,
            address,
            bucket,
        } => {
            let valid = validate_offline(&identity, &address, &bucket)?;
            print_json(&json!({ "valid": valid }))?;
            if !valid {
                std::process::exit(1);
            }
        }
        Commands::Current => {
            let res = reqwest::get(format!("{}/api/v1/address/current", cli.url)).await?;
            print_response(res).await?;
        }
        Commands::Next => {
            let res = reqwest::get(format!("{}/api/v1/address/next", cli.url)).await?;
            print_response(res).await?;
        }
        Commands::Status {
            address,
            confirmations,
        } => {
            let mut url = format!("{}/api/v1/status/{}", cli.url, address);
            if let Some(confirmations) = confirmations {
                url = format!("{}?confirmations={}", url, confirmations);
            }
            let res = reqwest::get(url).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn derive_offline(
    identity: &str,
    interval_minutes: i64,
    at: DateTime<Utc>,
) -> RotationResult<CurrentAddress> {
    let service = AddressRotationService::from_parts(identity, interval_minutes)?;
    Ok(service.current_address(at))
}

/// One `<bucket>  <address>` line per boundary in `[start, end)`.
fn range_lines(
    identity: &str,
    interval_minutes: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> RotationResult<Vec<String>> {
    let service = AddressRotationService::from_parts(identity, interval_minutes)?;
    Ok(service
        .addresses_for_range_default(start, end)
        .iter()
        .map(|entry| format!("{}  {}", entry.bucket, entry.address))
        .collect())
}

fn validate_offline(identity: &str, address: &str, bucket: &str) -> RotationResult<bool> {
    // Interval plays no part in validation.
    let service = AddressRotationService::from_parts(identity, 1)?;
    let bucket = TimeBucket::parse(bucket)?;
    Ok(service.validate(address, &bucket))
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: rotator returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    print_json(&json)
}
