//! Photo wall domain: grid layout, cell allocation, dedup, eviction and the
//! aggregate wall state that ties them together.

pub mod alloc;
pub mod dedup;
pub mod evict;
pub mod grid;
pub mod state;

use rand::Rng;

/// One inbound photo event, already extracted from a WebSocket frame.
/// `x`/`y` are an optional pinned grid position requested by the sender
/// (popup photos from the name-grid overlay).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFrame {
    pub image_data: String,
    pub timestamp: String,
    pub x: Option<u32>,
    pub y: Option<u32>,
}

/// A photo currently displayed on the wall.
///
/// Owned exclusively by [`state::WallState`]; everything downstream of the
/// engine sees copies (render tiles). Immutable after admission, except for
/// removal and cell reassignment on resize.
#[derive(Debug, Clone)]
pub struct PhotoRecord {
    pub id: String,
    pub image_data: String,
    pub server_timestamp: String,
    /// Server timestamp parsed once at admission; `None` when unparsable.
    pub ts_millis: Option<i64>,
    /// Monotone admission order, the eviction fallback sort key.
    pub seq: u64,
    pub cell_index: usize,
    pub animation: AnimationVariant,
    pub is_popup: bool,
}

/// Entry animation tag attached to each admitted photo. The render layer
/// maps these to CSS classes; the engine only picks one uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationVariant {
    Fade,
    SlideFromLeft,
    SlideFromRight,
    SlideFromTop,
    SlideFromBottom,
    Zoom,
    Flip,
    Rotate,
    Bounce,
    ScaleIn,
    Crossfade,
    Glitch,
}

impl AnimationVariant {
    pub const ALL: [AnimationVariant; 12] = [
        Self::Fade,
        Self::SlideFromLeft,
        Self::SlideFromRight,
        Self::SlideFromTop,
        Self::SlideFromBottom,
        Self::Zoom,
        Self::Flip,
        Self::Rotate,
        Self::Bounce,
        Self::ScaleIn,
        Self::Crossfade,
        Self::Glitch,
    ];

    /// Pick a variant uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// CSS class name used by the kiosk stylesheet.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fade => "fade",
            Self::SlideFromLeft => "slideFromLeft",
            Self::SlideFromRight => "slideFromRight",
            Self::SlideFromTop => "slideFromTop",
            Self::SlideFromBottom => "slideFromBottom",
            Self::Zoom => "zoom",
            Self::Flip => "flip",
            Self::Rotate => "rotate",
            Self::Bounce => "bounce",
            Self::ScaleIn => "scaleIn",
            Self::Crossfade => "crossfade",
            Self::Glitch => "glitch",
        }
    }
}

/// Parse a server timestamp into epoch milliseconds. The backend emits
/// naive ISO-8601 without a UTC offset, but accept RFC 3339 too.
pub fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    raw.parse::<chrono::NaiveDateTime>()
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parses_naive_iso_timestamps() {
        let millis = parse_timestamp_millis("2024-05-01T12:33:00.123456").unwrap();
        assert!(millis > 0);
    }

    #[test]
    fn parses_rfc3339_timestamps() {
        assert!(parse_timestamp_millis("2024-05-01T12:33:00+02:00").is_some());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert_eq!(parse_timestamp_millis("not-a-date"), None);
    }

    #[test]
    fn animation_choice_is_deterministic_under_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(
                AnimationVariant::random(&mut a),
                AnimationVariant::random(&mut b)
            );
        }
    }
}
