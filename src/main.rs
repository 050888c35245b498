mod cleanup;
mod config;
mod engine;
mod render;
mod wall;
mod ws;

use config::{generate_config_template, Config};
use engine::WallEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "mosaic_wall=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "mosaic_wall=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("Mosaic Wall engine v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        server = %config.server_url,
        pools = config.pool_count,
        channels = config.channel_count,
        "connecting to photo broadcast server"
    );

    let wall = WallEngine::spawn(&config);
    let mut status = wall.status();
    let mut tiles = wall.tiles();

    loop {
        tokio::select! {
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                tracing::info!(status = %current, "connection status");
            }
            changed = tiles.changed() => {
                if changed.is_err() {
                    break;
                }
                let count = tiles.borrow_and_update().len();
                tracing::info!(photos = count, "wall updated");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    wall.shutdown().await;
    Ok(())
}
