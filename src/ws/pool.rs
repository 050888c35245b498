//! Connection pool manager.
//!
//! Owns one reconnecting task per channel slot. Every (re)connect attempt
//! picks a server pool uniformly at random, spreading load across the
//! server's channel shards. While connected, a literal "ping" text frame is
//! sent on a fixed interval to keep the transport from idling out.
//!
//! Reconnects are scheduled in exactly one place, at the bottom of the
//! channel loop: the error path only records the Error state and falls
//! through, so a transport error can never double-schedule a reconnect.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::Config;
use crate::engine::EngineCommand;
use crate::ws::frame::{self, Inbound};
use crate::ws::{ChannelRegistry, ChannelState, WallStatus};

/// Connection parameters shared by every channel task.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub server_url: String,
    pub pool_count: usize,
    pub channel_count: usize,
    pub heartbeat: Duration,
    pub reconnect_delay: Duration,
}

impl PoolConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            server_url: config.server_url.clone(),
            pool_count: config.pool_count.max(1),
            channel_count: config.channel_count.max(1),
            heartbeat: Duration::from_secs(config.heartbeat_secs),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        }
    }
}

/// WebSocket endpoint for a pool shard: pool 0 is the base `/ws` path,
/// pool n appends the pool identifier.
pub fn endpoint_url(server_url: &str, pool: usize) -> String {
    let base = server_url.trim_end_matches('/');
    if pool == 0 {
        format!("{base}/ws")
    } else {
        format!("{base}/ws{pool}")
    }
}

/// How a live connection ended.
enum Closed {
    /// Server closed with a clean code (1000); the channel stays down.
    Clean,
    /// Connection dropped (non-clean close or stream end); reconnect.
    Dropped,
    /// Transport-level error; mark Error, then reconnect.
    TransportError,
    /// Engine teardown; never reconnect.
    Teardown,
}

pub struct PoolManager {
    status_rx: watch::Receiver<WallStatus>,
    tasks: Vec<JoinHandle<()>>,
}

impl PoolManager {
    /// Spawn one reconnecting task per channel slot.
    pub fn spawn(
        config: PoolConfig,
        events: mpsc::UnboundedSender<EngineCommand>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let registry = super::new_channel_registry();
        let (status_tx, status_rx) = watch::channel(WallStatus::Connecting);

        let mut tasks = Vec::with_capacity(config.channel_count);
        for slot in 0..config.channel_count {
            registry.insert(slot, ChannelState::Connecting);
            tasks.push(tokio::spawn(run_channel(
                slot,
                config.clone(),
                events.clone(),
                registry.clone(),
                status_tx.clone(),
                shutdown.clone(),
            )));
        }

        Self { status_rx, tasks }
    }

    pub fn status(&self) -> watch::Receiver<WallStatus> {
        self.status_rx.clone()
    }

    /// Wait for every channel task to observe the shutdown signal and exit;
    /// abort stragglers so no timer or socket outlives teardown.
    pub async fn shutdown(self) {
        for task in self.tasks {
            let abort = task.abort_handle();
            if tokio::time::timeout(Duration::from_secs(2), task).await.is_err() {
                tracing::warn!("channel task did not exit in time, aborting");
                abort.abort();
            }
        }
    }
}

fn set_state(
    registry: &ChannelRegistry,
    status_tx: &watch::Sender<WallStatus>,
    slot: usize,
    state: ChannelState,
) {
    registry.insert(slot, state);
    status_tx.send_replace(WallStatus::aggregate(registry));
}

async fn run_channel(
    slot: usize,
    config: PoolConfig,
    events: mpsc::UnboundedSender<EngineCommand>,
    registry: ChannelRegistry,
    status_tx: watch::Sender<WallStatus>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut rng = StdRng::from_os_rng();

    loop {
        if *shutdown.borrow() {
            set_state(&registry, &status_tx, slot, ChannelState::Disconnected);
            return;
        }

        set_state(&registry, &status_tx, slot, ChannelState::Connecting);
        let pool = rng.random_range(0..config.pool_count.max(1));
        let url = endpoint_url(&config.server_url, pool);
        tracing::info!(slot, pool, url = %url, "connecting channel");

        let connect = tokio::select! {
            result = connect_async(url.as_str()) => result,
            _ = shutdown.changed() => {
                set_state(&registry, &status_tx, slot, ChannelState::Disconnected);
                return;
            }
        };

        let closed = match connect {
            Ok((stream, _)) => {
                set_state(&registry, &status_tx, slot, ChannelState::Connected);
                tracing::info!(slot, pool, "channel connected");
                drive_connection(stream, slot, &config, &events, &mut shutdown).await
            }
            Err(e) => {
                tracing::warn!(slot, pool, error = %e, "connect failed");
                Closed::TransportError
            }
        };

        match closed {
            Closed::Teardown | Closed::Clean => {
                set_state(&registry, &status_tx, slot, ChannelState::Disconnected);
                return;
            }
            Closed::TransportError => {
                set_state(&registry, &status_tx, slot, ChannelState::Error);
            }
            Closed::Dropped => {}
        }

        set_state(&registry, &status_tx, slot, ChannelState::Disconnected);
        tracing::info!(
            slot,
            delay_ms = config.reconnect_delay.as_millis() as u64,
            "scheduling reconnect"
        );
        tokio::select! {
            _ = sleep(config.reconnect_delay) => {}
            _ = shutdown.changed() => {
                set_state(&registry, &status_tx, slot, ChannelState::Disconnected);
                return;
            }
        }
    }
}

/// Pump one live connection: forward photo frames to the engine, send
/// heartbeats, and react to close/error/teardown.
async fn drive_connection(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    slot: usize,
    config: &PoolConfig,
    events: &mpsc::UnboundedSender<EngineCommand>,
    shutdown: &mut watch::Receiver<bool>,
) -> Closed {
    let (mut write, mut read) = stream.split();
    let mut heartbeat = tokio::time::interval(config.heartbeat);
    // Skip the immediate first tick.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => match frame::classify(text.as_str()) {
                    Inbound::Photo(photo) => {
                        tracing::debug!(slot, "photo frame received");
                        if events.send(EngineCommand::Frame(photo)).is_err() {
                            // Engine is gone; treat as teardown.
                            return Closed::Teardown;
                        }
                    }
                    Inbound::Heartbeat => {}
                    Inbound::Irrelevant => {
                        tracing::debug!(slot, "ignoring non-photo frame");
                    }
                },
                Some(Ok(Message::Close(close_frame))) => {
                    let clean = close_frame
                        .as_ref()
                        .is_some_and(|f| f.code == CloseCode::Normal);
                    tracing::info!(slot, frame = ?close_frame, clean, "server closed channel");
                    return if clean { Closed::Clean } else { Closed::Dropped };
                }
                // Binary, ping and pong frames carry nothing for the wall.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(slot, error = %e, "channel transport error");
                    return Closed::TransportError;
                }
                None => {
                    tracing::info!(slot, "channel stream ended");
                    return Closed::Dropped;
                }
            },
            _ = heartbeat.tick() => {
                if let Err(e) = write.send(Message::Text("ping".into())).await {
                    tracing::warn!(slot, error = %e, "heartbeat send failed");
                    return Closed::TransportError;
                }
            }
            _ = shutdown.changed() => {
                let _ = write
                    .send(Message::Close(Some(CloseFrame {
                        code: CloseCode::Normal,
                        reason: "client teardown".into(),
                    })))
                    .await;
                return Closed::Teardown;
            }
        }
    }
}
