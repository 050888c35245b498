use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Mosaic Wall display client
#[derive(Parser, Serialize, Deserialize, Clone, Debug)]
#[command(name = "mosaic-wall", version, about = "Mosaic Wall realtime photo-wall engine")]
pub struct Config {
    /// WebSocket base URL of the photo broadcast server
    #[arg(long, env = "MOSAIC_SERVER_URL", default_value = "ws://localhost:8000")]
    pub server_url: String,

    /// Cleanup endpoint notified about evicted photos (disabled when unset;
    /// set via TOML or MOSAIC_CLEANUP_URL)
    #[arg(skip)]
    #[serde(default)]
    pub cleanup_url: Option<String>,

    /// Number of server-side channel shards to balance over
    #[arg(long, env = "MOSAIC_POOL_COUNT", default_value = "1")]
    pub pool_count: usize,

    /// Number of concurrent WebSocket connections to hold open
    #[arg(long, env = "MOSAIC_CHANNEL_COUNT", default_value = "1")]
    pub channel_count: usize,

    /// Initial viewport width in pixels
    #[arg(long, env = "MOSAIC_VIEWPORT_WIDTH", default_value = "1920")]
    pub viewport_width: f64,

    /// Initial viewport height in pixels
    #[arg(long, env = "MOSAIC_VIEWPORT_HEIGHT", default_value = "1080")]
    pub viewport_height: f64,

    /// Cell size as a percentage of the smaller viewport dimension
    #[arg(long, env = "MOSAIC_CELL_FRACTION", default_value = "5.0")]
    pub cell_fraction_percent: f64,

    /// Gap between cells as a percentage of the cell size
    #[arg(long, env = "MOSAIC_GAP_PERCENT", default_value = "0.0")]
    pub gap_percent: f64,

    /// Heartbeat ping interval in seconds
    #[arg(long, env = "MOSAIC_HEARTBEAT_SECS", default_value = "10")]
    pub heartbeat_secs: u64,

    /// Delay before reconnecting a dropped channel, in milliseconds
    #[arg(long, env = "MOSAIC_RECONNECT_DELAY_MS", default_value = "5000")]
    pub reconnect_delay_ms: u64,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "MOSAIC_JSON_LOGS")]
    pub json_logs: bool,

    /// Path to TOML config file
    #[arg(long, default_value = "./mosaic.toml")]
    pub config: String,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8000".to_string(),
            cleanup_url: None,
            pool_count: 1,
            channel_count: 1,
            viewport_width: 1920.0,
            viewport_height: 1080.0,
            cell_fraction_percent: 5.0,
            gap_percent: 0.0,
            heartbeat_secs: 10,
            reconnect_delay_ms: 5000,
            json_logs: false,
            config: "./mosaic.toml".to_string(),
            generate_config: false,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (MOSAIC_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let cli = Config::parse();
        let config_path = cli.config.clone();

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("MOSAIC_"))
            .merge(Serialized::defaults(cli))
            .extract()
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# Mosaic Wall Display Client Configuration
# Place this file at ./mosaic.toml or specify with --config <path>
# All settings can be overridden via environment variables (MOSAIC_SERVER_URL, etc.)
# or CLI flags (--server-url, etc.)

# WebSocket base URL of the photo broadcast server (default: ws://localhost:8000)
# Pool 0 connects to {server_url}/ws, pool n to {server_url}/ws{n}
# server_url = "ws://localhost:8000"

# HTTP endpoint notified with the timestamps of evicted photos so the
# backing store can release them. Disabled when unset.
# cleanup_url = "http://localhost:8000/cleanup"

# Server-side channel shards to load-balance over (default: 1)
# pool_count = 1

# Concurrent WebSocket connections to hold open (default: 1)
# channel_count = 1

# Initial viewport size in pixels; update at runtime via resize events
# viewport_width = 1920
# viewport_height = 1080

# Cell size as a percentage of the smaller viewport dimension (default: 5.0)
# cell_fraction_percent = 5.0

# Gap between cells as a percentage of the cell size (default: 0.0)
# gap_percent = 0.0

# Heartbeat ping interval in seconds (default: 10)
# heartbeat_secs = 10

# Delay before reconnecting a dropped channel in milliseconds (default: 5000)
# reconnect_delay_ms = 5000

# Enable structured JSON logging for Docker/production
# json_logs = false
"#
    .to_string()
}
