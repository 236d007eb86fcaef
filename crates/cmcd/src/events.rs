use serde::{Deserialize, Serialize};

/// Events fed into a reporting session by the host player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// A media element became available.
    MediaAttached,
    /// A fragment or manifest request was issued.
    LoadStarted { url: String, kind: LoadKind },
    /// A fragment or manifest finished loading.
    LoadCompleted(LoadCompletion),
    /// A lifecycle event raised by the media element.
    Media { event: MediaEvent },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadKind {
    Fragment,
    Manifest,
}

/// Request timing, in the engine's millisecond time base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadStats {
    pub request_sent: Option<f64>,
    pub first_byte: Option<f64>,
    pub load_end: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadCompletion {
    pub url: String,
    pub kind: LoadKind,
    #[serde(default)]
    pub stats: LoadStats,
    /// HTTP status of the response, when known.
    #[serde(default)]
    pub status: Option<u16>,
}

/// Media element lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaEvent {
    Play,
    Playing,
    Pause,
    Seeking,
    Waiting,
    Ended,
    VolumeChange,
    Error,
}

impl MediaEvent {
    pub fn name(self) -> &'static str {
        match self {
            MediaEvent::Play => "play",
            MediaEvent::Playing => "playing",
            MediaEvent::Pause => "pause",
            MediaEvent::Seeking => "seeking",
            MediaEvent::Waiting => "waiting",
            MediaEvent::Ended => "ended",
            MediaEvent::VolumeChange => "volumechange",
            MediaEvent::Error => "error",
        }
    }
}
