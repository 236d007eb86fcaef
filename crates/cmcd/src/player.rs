//! Capability view of the playback engine and its media element.

use serde::{Deserialize, Serialize};

/// `readyState` at which the element has data beyond the current position.
pub const HAVE_FUTURE_DATA: u8 = 3;

/// Point-in-time view of the media element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaSnapshot {
    /// Playback position in seconds.
    pub current_time: f64,
    pub paused: bool,
    pub ended: bool,
    pub seeking: bool,
    pub ready_state: u8,
    pub playback_rate: f64,
    /// Number of ranges in the `played` history.
    pub played_ranges: usize,
    pub muted: bool,
    /// Media error code when the element is in an error state.
    pub error_code: Option<u16>,
    /// Dropped video frame counter, when the element exposes playback quality.
    pub dropped_frames: Option<u64>,
}

impl Default for MediaSnapshot {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            paused: true,
            ended: false,
            seeking: false,
            ready_state: 0,
            playback_rate: 1.0,
            played_ranges: 0,
            muted: false,
            error_code: None,
            dropped_frames: None,
        }
    }
}

/// Everything the report builder reads from the player for one report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    /// `None` until a media element is attached.
    pub media: Option<MediaSnapshot>,
    /// Whether the engine has selected a quality level to load.
    pub level_selected: bool,
    /// Live edge in seconds. Present only for live content.
    pub live_sync_position: Option<f64>,
}

impl PlaybackSnapshot {
    pub fn is_live(&self) -> bool {
        self.live_sync_position.is_some()
    }

    /// Derives the CMCD `sta` state. `None` without a media element.
    pub fn player_state(&self) -> Option<PlayerState> {
        let media = self.media.as_ref()?;

        let state = if media.seeking {
            PlayerState::Seeking
        } else if !self.level_selected && media.ready_state < HAVE_FUTURE_DATA {
            PlayerState::Starting
        } else if media.ended {
            PlayerState::Ended
        } else if media.paused {
            if media.current_time == 0.0 && media.played_ranges == 0 {
                // paused at startup, before anything was ever played
                PlayerState::Playing
            } else {
                PlayerState::Paused
            }
        } else if media.ready_state < HAVE_FUTURE_DATA {
            PlayerState::Rebuffering
        } else {
            PlayerState::Playing
        };
        Some(state)
    }
}

/// Player states reported through the `sta` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Starting,
    Playing,
    Seeking,
    Rebuffering,
    Paused,
    Ended,
}

impl PlayerState {
    pub fn code(self) -> &'static str {
        match self {
            PlayerState::Starting => "r",
            PlayerState::Playing => "p",
            PlayerState::Seeking => "k",
            PlayerState::Rebuffering => "s",
            PlayerState::Paused => "a",
            PlayerState::Ended => "e",
        }
    }
}

/// Read access to the playback engine, implemented by the host.
pub trait PlaybackProbe: Send + Sync {
    /// Current media element state, `None` when no element is attached.
    fn media(&self) -> Option<MediaSnapshot>;

    fn level_selected(&self) -> bool;

    fn live_sync_position(&self) -> Option<f64>;

    fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            media: self.media(),
            level_selected: self.level_selected(),
            live_sync_position: self.live_sync_position(),
        }
    }
}
