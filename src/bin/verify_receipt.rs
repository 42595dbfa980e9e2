use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use fractic_iap_receipt::{config::Config, util::DefaultReceiptUtil};
use tracing_subscriber::EnvFilter;

/// Verify an App Store receipt and print its contents.
#[derive(Debug, Parser)]
struct Cli {
    /// Base64-encoded receipt, as sent by the app.
    receipt: String,
    /// Bundle identifier the receipt must have been issued for.
    bundle_id: String,
    /// TOML configuration naming the trust anchor.
    #[arg(long)]
    config: PathBuf,
    /// Print the receipt as JSON instead of the diagnostic rendering.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG takes precedence over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.stdout_log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let receipt_util = DefaultReceiptUtil::from_config(config);
    let receipt = match receipt_util.parse_base64_receipt(&cli.receipt, &cli.bundle_id) {
        Ok(receipt) => receipt,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&receipt) {
            Ok(json) => println!("{json}"),
            Err(error) => {
                eprintln!("error: {error}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{receipt}");
    }
    ExitCode::SUCCESS
}
