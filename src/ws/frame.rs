//! Inbound frame classification.
//!
//! The broadcast channel carries photo events as JSON text, but also server
//! pongs and other control chatter as bare strings. Anything that is not a
//! photo payload is routine and silently dropped, never an error.

use serde::Deserialize;

use crate::wall::PhotoFrame;

/// What one inbound text frame turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound {
    /// A recognizable photo payload, ready for the admission pipeline.
    Photo(PhotoFrame),
    /// Non-JSON text, e.g. the server echoing a pong. No-op.
    Heartbeat,
    /// Valid JSON lacking the photo payload field. Ignored.
    Irrelevant,
}

/// Wire shape of a broadcast photo event. `image_data` is the payload
/// marker; frames without it are irrelevant control messages.
#[derive(Debug, Deserialize)]
struct WireFrame {
    image_data: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    x: Option<u32>,
    y: Option<u32>,
}

/// Classify one inbound text frame.
pub fn classify(text: &str) -> Inbound {
    let wire: WireFrame = match serde_json::from_str(text) {
        Ok(wire) => wire,
        Err(_) => return Inbound::Heartbeat,
    };
    match wire.image_data {
        Some(image_data) => Inbound::Photo(PhotoFrame {
            image_data,
            timestamp: wire.timestamp.unwrap_or_default(),
            x: wire.x,
            y: wire.y,
        }),
        None => Inbound::Irrelevant,
    }
}
