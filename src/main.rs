// src/main.rs

//! The main entry point for the node maintenance control plane daemon.

use anyhow::Result;
use mtce::config::{DaemonConfig, HostwdConfig};
use std::env;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("mtce version {VERSION}");
        return Ok(());
    }

    // Check if --hostwd is present to start the host watchdog instead of
    // the node-maintenance FSM daemon. The two run as separate processes,
    // same as the original mtce / hostw split.
    if args.len() > 1 && args[1] == "--hostwd" {
        // --- Host Watchdog Mode ---
        let config_path = args.get(2).map(String::as_str).unwrap_or("hostwd.toml");

        let log_level = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "info,mtce::core::watchdog=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .with_ansi(true)
            .init();

        info!("Starting host watchdog...");

        let config = match HostwdConfig::from_file(config_path).await {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load host watchdog configuration from \"{config_path}\": {e}");
                std::process::exit(1);
            }
        };

        if let Err(e) = mtce::watchdog::run(config).await {
            error!("Host watchdog runtime error: {}", e);
            return Err(e);
        }
    } else {
        // --- Node Maintenance Daemon Mode ---
        let config_path = args
            .iter()
            .position(|arg| arg == "--config")
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
            .unwrap_or("mtce.toml");

        let config = match DaemonConfig::from_file(config_path).await {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from \"{config_path}\": {e}");
                std::process::exit(1);
            }
        };

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .with_ansi(true)
            .init();

        info!("Starting node maintenance control plane...");

        if let Err(e) = mtce::daemon::run(config).await {
            error!("Daemon runtime error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
