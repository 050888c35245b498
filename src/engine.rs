//! The wall engine: a single-consumer drain loop.
//!
//! Every mutation of the wall flows through one task consuming one command
//! channel, which linearizes burst admissions (two frames can never observe
//! the same occupancy). Photo frames land in an explicit bounded pending
//! queue and are admitted at a capped rate; resize and shutdown commands
//! bypass the limiter.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::cleanup::CleanupNotifier;
use crate::config::Config;
use crate::render::{self, PhotoTile};
use crate::wall::grid::Viewport;
use crate::wall::state::{Admission, WallState};
use crate::wall::{PhotoFrame, PhotoRecord};
use crate::ws::pool::{PoolConfig, PoolManager};
use crate::ws::WallStatus;

/// Hard cap on queued frames awaiting admission. Overflow discards the
/// oldest half, favoring recency over completeness.
pub const PENDING_CAP: usize = 50;

/// Minimum spacing between admissions (~50 photos/s).
pub const MIN_ADMIT_INTERVAL: Duration = Duration::from_millis(20);

/// Commands consumed by the engine task.
#[derive(Debug)]
pub enum EngineCommand {
    /// An inbound photo event from a pool channel.
    Frame(PhotoFrame),
    /// The viewport changed; recompute the grid and reconcile.
    Resize { width: f64, height: f64 },
    /// Stop the engine loop.
    Shutdown,
}

/// Handle to a running wall engine and its connection pool.
pub struct WallEngine {
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
    shutdown_tx: watch::Sender<bool>,
    status_rx: watch::Receiver<WallStatus>,
    tiles_rx: watch::Receiver<Vec<PhotoTile>>,
    pool: PoolManager,
    engine_task: JoinHandle<()>,
}

impl WallEngine {
    /// Spawn the engine task and its connection pool.
    pub fn spawn(config: &Config) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (tiles_tx, tiles_rx) = watch::channel(Vec::new());

        let pool = PoolManager::spawn(
            PoolConfig::from_config(config),
            cmd_tx.clone(),
            shutdown_rx,
        );
        let status_rx = pool.status();

        let wall = WallState::new(
            Viewport::new(config.viewport_width, config.viewport_height),
            config.cell_fraction_percent,
            config.gap_percent,
        );
        let notifier = CleanupNotifier::new(config.cleanup_url.clone());
        let engine_task = tokio::spawn(run_engine(wall, notifier, cmd_rx, tiles_tx));

        Self {
            cmd_tx,
            shutdown_tx,
            status_rx,
            tiles_rx,
            pool,
            engine_task,
        }
    }

    /// Aggregate connection status, for the UI status bar.
    pub fn status(&self) -> watch::Receiver<WallStatus> {
        self.status_rx.clone()
    }

    /// Render-ready tile list, republished after every wall mutation.
    pub fn tiles(&self) -> watch::Receiver<Vec<PhotoTile>> {
        self.tiles_rx.clone()
    }

    /// Report a viewport change.
    pub fn resize(&self, width: f64, height: f64) {
        let _ = self.cmd_tx.send(EngineCommand::Resize { width, height });
    }

    /// Deterministic teardown: channels close without reconnecting, every
    /// timer dies with its task, and no callback fires after this returns.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        self.pool.shutdown().await;

        let abort = self.engine_task.abort_handle();
        if tokio::time::timeout(Duration::from_secs(2), self.engine_task)
            .await
            .is_err()
        {
            tracing::warn!("engine task did not exit in time, aborting");
            abort.abort();
        }
    }
}

/// Append a frame to the pending queue, shedding the oldest half on
/// overflow.
pub(crate) fn enqueue(pending: &mut VecDeque<PhotoFrame>, frame: PhotoFrame) {
    if pending.len() >= PENDING_CAP {
        let shed = pending.len() / 2;
        pending.drain(..shed);
        tracing::warn!(shed, "pending queue overflow, discarded oldest frames");
    }
    pending.push_back(frame);
}

fn evicted_timestamps(evicted: Vec<PhotoRecord>) -> Vec<String> {
    evicted.into_iter().map(|r| r.server_timestamp).collect()
}

async fn run_engine(
    mut wall: WallState,
    notifier: CleanupNotifier,
    mut commands: mpsc::UnboundedReceiver<EngineCommand>,
    tiles_tx: watch::Sender<Vec<PhotoTile>>,
) {
    let mut pending: VecDeque<PhotoFrame> = VecDeque::new();
    let mut next_admit = Instant::now();

    loop {
        // With nothing pending, just wait for the next command; otherwise
        // also wake when the rate-limit window opens for the queue head.
        let command = if pending.is_empty() {
            match commands.recv().await {
                Some(command) => Some(command),
                None => break,
            }
        } else {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => Some(command),
                    None => break,
                },
                _ = sleep_until(next_admit) => None,
            }
        };

        match command {
            Some(EngineCommand::Frame(frame)) => enqueue(&mut pending, frame),
            Some(EngineCommand::Resize { width, height }) => {
                let evicted = wall.resize(Viewport::new(width, height));
                notifier.notify(evicted_timestamps(evicted));
                publish(&wall, &tiles_tx);
            }
            Some(EngineCommand::Shutdown) => break,
            None => {
                let Some(frame) = pending.pop_front() else {
                    continue;
                };
                let backlog = pending.len();
                let outcome = wall.admit(frame, backlog);
                if !outcome.evicted.is_empty() {
                    notifier.notify(evicted_timestamps(outcome.evicted));
                }
                match outcome.admission {
                    Admission::Admitted { .. } => publish(&wall, &tiles_tx),
                    // Duplicates and drops leave the wall untouched.
                    Admission::Duplicate | Admission::NoGrid | Admission::Dropped => {}
                }
                next_admit = Instant::now() + MIN_ADMIT_INTERVAL;
            }
        }
    }
    tracing::info!("engine loop stopped");
}

fn publish(wall: &WallState, tiles_tx: &watch::Sender<Vec<PhotoTile>>) {
    let tiles = match wall.grid() {
        Some(grid) => render::tiles(wall.records(), grid),
        None => Vec::new(),
    };
    tiles_tx.send_replace(tiles);
}
