//! WebSocket connection pool: per-channel state machine, inbound frame
//! classification and the reconnecting channel tasks.

pub mod frame;
pub mod pool;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

/// Lifecycle state of one logical channel.
/// `Connecting -> Connected -> Disconnected -> (reconnect) -> Connecting`;
/// a transport error moves `Connected -> Error`, and the subsequent
/// disconnect path owns the reconnect (never the error handler itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// Per-channel state registry, keyed by channel slot.
pub type ChannelRegistry = Arc<DashMap<usize, ChannelState>>;

pub fn new_channel_registry() -> ChannelRegistry {
    Arc::new(DashMap::new())
}

/// Aggregate connection status the UI renders. Connected as soon as at
/// least one channel is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallStatus {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl WallStatus {
    pub fn aggregate(registry: &ChannelRegistry) -> Self {
        let mut status = WallStatus::Disconnected;
        for entry in registry.iter() {
            match *entry.value() {
                ChannelState::Connected => return WallStatus::Connected,
                ChannelState::Connecting => status = WallStatus::Connecting,
                ChannelState::Error if status == WallStatus::Disconnected => {
                    status = WallStatus::Error;
                }
                _ => {}
            }
        }
        status
    }
}

impl fmt::Display for WallStatus {
    /// Status strings as the kiosk UI shows them.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WallStatus::Connecting => "Connecting...",
            WallStatus::Connected => "Connected",
            WallStatus::Disconnected => "Disconnected",
            WallStatus::Error => "Connection Error",
        };
        f.write_str(s)
    }
}
