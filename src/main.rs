//! Watchpost Server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - WATCHPOST_HOST: Bind address (default: 0.0.0.0)
//! - WATCHPOST_PORT: Port number (default: 3000)
//! - WATCHPOST_DATA_DIR: Directory holding the monitoring artifacts
//!   (default: C:\inetpub\wwwroot on Windows, the working directory elsewhere)
//! - WATCHPOST_RDP_FILE / WATCHPOST_CONTAINER_FILE / WATCHPOST_SQL_FILE:
//!   Artifact path per alert kind, absolute or relative to the data dir
//! - WATCHPOST_RDP_PAUSE / WATCHPOST_CONTAINER_PAUSE / WATCHPOST_SQL_PAUSE:
//!   Who owns the pause clock for the kind, `server` or `client`
//! - WATCHPOST_STATIC_DIR: Directory served for unmatched paths (dashboard bundle)
//! - RUST_LOG: Log level (default: info)

use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watchpost::alerts::AlertDefinition;
use watchpost::api::{default_data_dir, run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watchpost=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("WATCHPOST_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = match std::env::var("WATCHPOST_PORT") {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid WATCHPOST_PORT {:?}, using 3000", raw);
            3000
        }),
        Err(_) => 3000,
    };
    let data_dir = std::env::var("WATCHPOST_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir());
    let static_dir = std::env::var("WATCHPOST_STATIC_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from);

    let config = ServerConfig {
        host,
        port,
        definitions: AlertDefinition::all_from_env(&data_dir),
        static_dir,
    };

    tracing::info!("Watchpost configuration:");
    tracing::info!("  Host: {}:{}", config.host, config.port);
    tracing::info!("  Data dir: {}", data_dir.display());
    for definition in &config.definitions {
        tracing::info!(
            "  {}: {} (pause owned by {:?})",
            definition.kind,
            definition.artifact.display(),
            definition.pause_authority
        );
    }
    match &config.static_dir {
        Some(dir) => tracing::info!("  Static dir: {}", dir.display()),
        None => tracing::info!("  Static dir: DISABLED"),
    }

    println!(
        r#"
 watchpost - artifact threshold alerts
 Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );

    run_server(config).await
}
