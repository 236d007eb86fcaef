// Trace replay: feeds recorded player events into a reporting session.

use std::path::Path;
use std::time::Duration;

use cmcd_engine::{
    Clock, ManualClock, MediaSnapshot, PlaybackProbe, PlaybackSnapshot, PlayerEvent,
    ReporterHandle, SystemClock,
};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::error::AppError;

/// One line of a playback trace.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    /// Offset from the start of the trace
    #[serde(default)]
    pub at_ms: f64,
    /// Player state from this point on
    #[serde(default)]
    pub player: Option<PlaybackSnapshot>,
    #[serde(default)]
    pub event: Option<PlayerEvent>,
}

/// Player probe whose state is set by the trace.
#[derive(Debug, Default)]
pub struct ScriptedPlayer {
    snapshot: RwLock<PlaybackSnapshot>,
}

impl ScriptedPlayer {
    pub fn set(&self, snapshot: PlaybackSnapshot) {
        *self.snapshot.write() = snapshot;
    }
}

impl PlaybackProbe for ScriptedPlayer {
    fn media(&self) -> Option<MediaSnapshot> {
        self.snapshot.read().media.clone()
    }

    fn level_selected(&self) -> bool {
        self.snapshot.read().level_selected
    }

    fn live_sync_position(&self) -> Option<f64> {
        self.snapshot.read().live_sync_position
    }

    fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.read().clone()
    }
}

pub fn parse_trace_line(line: &str, line_no: usize) -> Result<Option<TraceEntry>, AppError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| AppError::ParseError(format!("trace line {line_no}: {e}")))
}

/// Replay counters
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayStats {
    pub entries: usize,
    pub events_sent: usize,
    pub events_dropped: usize,
}

/// Drives the trace at `path` into `reporter`.
///
/// The clock follows the trace timeline, anchored at the current wall-clock
/// time. With `realtime` the replay also sleeps between entries.
pub async fn replay_trace(
    path: &Path,
    reporter: &ReporterHandle,
    player: &ScriptedPlayer,
    clock: &ManualClock,
    realtime: bool,
) -> Result<ReplayStats, AppError> {
    let file = tokio::fs::File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let origin = SystemClock.now_ms();
    let mut last_offset = 0.0_f64;
    let mut stats = ReplayStats::default();
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let Some(entry) = parse_trace_line(&line, line_no)? else {
            continue;
        };
        stats.entries += 1;

        if entry.at_ms < last_offset {
            warn!(line = line_no, "Trace entry goes back in time, keeping order as recorded");
        } else if realtime && entry.at_ms > last_offset {
            tokio::time::sleep(Duration::from_secs_f64((entry.at_ms - last_offset) / 1000.0))
                .await;
        }
        last_offset = last_offset.max(entry.at_ms);
        clock.set(origin + entry.at_ms);

        if let Some(snapshot) = entry.player {
            player.set(snapshot);
        }

        if let Some(event) = entry.event {
            debug!(line = line_no, ?event, "Replaying event");
            if reporter.send(event).await {
                stats.events_sent += 1;
            } else {
                stats.events_dropped += 1;
            }
        }
    }

    Ok(stats)
}
