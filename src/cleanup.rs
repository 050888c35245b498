//! Fire-and-forget eviction notification.
//!
//! When photos fall off the wall, the backing store is told which
//! `server_timestamp`s it may release, via a POST of a JSON array. The
//! request is never awaited by the admission path and its failure is logged
//! and otherwise ignored.

use reqwest::Client;

/// Notifies the cleanup endpoint about evicted photos. With no endpoint
/// configured this is a no-op (and spawns nothing).
#[derive(Debug, Clone)]
pub struct CleanupNotifier {
    client: Client,
    endpoint: Option<String>,
}

impl CleanupNotifier {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Disabled notifier, for tests and standalone walls.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Send the evicted timestamps to the cleanup endpoint, detached from
    /// the caller. Must be called from within a tokio runtime when an
    /// endpoint is configured.
    pub fn notify(&self, timestamps: Vec<String>) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        if timestamps.is_empty() {
            return;
        }
        let client = self.client.clone();
        let count = timestamps.len();
        tokio::spawn(async move {
            match client.post(&endpoint).json(&timestamps).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(count, "cleanup notification delivered");
                }
                Ok(response) => {
                    tracing::warn!(count, status = %response.status(), "cleanup endpoint rejected notification");
                }
                Err(e) => {
                    tracing::warn!(count, error = %e, "cleanup notification failed");
                }
            }
        });
    }
}
