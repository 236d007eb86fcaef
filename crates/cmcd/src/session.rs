// Reporting session: routes player events to the state tracker, the report
// builder and the sender according to the configured reporting mode.

use std::sync::Arc;

use tracing::{debug, trace, warn};
use url::Url;

use crate::config::{CmcdConfig, ReportingMode};
use crate::events::{LoadCompletion, MediaEvent, PlayerEvent};
use crate::player::PlaybackSnapshot;
use crate::report::{EventCode, ReportBuilder, Trigger};
use crate::state::SessionState;
use crate::transmit::{ReportSender, ReportTransport};
use crate::CmcdError;

/// Whether media element listeners are installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaGate {
    Detached,
    Attached { muted: bool },
}

/// All state of one reporting session.
///
/// Every method runs to completion and none of them fails: telemetry
/// problems are logged and the affected report is dropped.
pub struct CmcdSession {
    config: Arc<CmcdConfig>,
    state: SessionState,
    builder: ReportBuilder,
    sender: ReportSender,
    gate: MediaGate,
    reports: u64,
}

impl CmcdSession {
    pub fn new(config: CmcdConfig, transport: Arc<dyn ReportTransport>) -> Result<Self, CmcdError> {
        config.validate()?;
        let config = Arc::new(config);
        let sender = ReportSender::new(&config, transport)?;

        Ok(Self {
            builder: ReportBuilder::new(Arc::clone(&config)),
            config,
            state: SessionState::new(),
            sender,
            gate: MediaGate::Detached,
            reports: 0,
        })
    }

    pub fn config(&self) -> &CmcdConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.gate, MediaGate::Attached { .. })
    }

    /// Number of reports handed to the sender so far.
    pub fn reports_submitted(&self) -> u64 {
        self.reports
    }

    /// Reports waiting in a partially filled JSON batch.
    pub fn buffered(&self) -> usize {
        self.sender.buffered()
    }

    /// Installs media listeners if an element is present. Returns whether
    /// the session is attached afterwards.
    pub fn attach_if_available(&mut self, player: &PlaybackSnapshot) -> bool {
        if let Some(media) = &player.media {
            self.attach(media.muted);
        }
        self.is_attached()
    }

    fn attach(&mut self, muted: bool) {
        if self.is_attached() {
            trace!("Media listeners already installed");
            return;
        }
        debug!(mode = ?self.config.reporting_mode, "Media element attached, installing listeners");
        self.gate = MediaGate::Attached { muted };
    }

    pub fn handle_event(&mut self, event: &PlayerEvent, player: &PlaybackSnapshot, now_ms: f64) {
        match event {
            PlayerEvent::MediaAttached => {
                self.attach(player.media.as_ref().is_some_and(|m| m.muted));
            }
            PlayerEvent::LoadStarted { url, kind } => match canonical_identity(url) {
                Ok(identity) => {
                    trace!(url = %identity, ?kind, "Load started");
                    self.state.on_load_start(identity, now_ms);
                }
                Err(e) => warn!(url = %url, error = %e, "Ignoring load start with invalid URL"),
            },
            PlayerEvent::LoadCompleted(completion) => {
                self.on_load_completed(completion, player, now_ms)
            }
            PlayerEvent::Media { event } => self.on_media_event(*event, player, now_ms),
        }
    }

    /// Timer tick. Reports only in timer mode.
    pub fn on_timer(&mut self, player: &PlaybackSnapshot, now_ms: f64) {
        if self.config.reporting_mode == ReportingMode::Timer {
            self.report(Trigger::TimerTick, player, now_ms);
        }
    }

    /// Ends the session, discarding any partial batch.
    pub fn shutdown(&mut self) -> usize {
        let dropped = self.sender.discard_pending();
        if dropped > 0 {
            debug!(dropped, "Discarding partial CMCD batch on shutdown");
        }
        self.gate = MediaGate::Detached;
        dropped
    }

    fn on_load_completed(
        &mut self,
        completion: &LoadCompletion,
        player: &PlaybackSnapshot,
        now_ms: f64,
    ) {
        if self.config.reporting_mode == ReportingMode::Response {
            self.report(Trigger::LoadCompleted(completion), player, now_ms);
        } else if let Ok(identity) = canonical_identity(&completion.url) {
            // nothing reports this load, release its start entry
            self.state.on_load_complete(&identity);
        }
    }

    fn on_media_event(&mut self, event: MediaEvent, player: &PlaybackSnapshot, now_ms: f64) {
        let MediaGate::Attached { muted } = self.gate else {
            trace!(event = event.name(), "Media event before attach, ignoring");
            return;
        };

        match event {
            MediaEvent::Play => self.state.on_play_started(now_ms),
            MediaEvent::Playing => self.state.on_playing(now_ms),
            _ => {}
        }

        if self.config.reporting_mode != ReportingMode::Event {
            return;
        }

        let code = match event {
            MediaEvent::Play => return,
            MediaEvent::Playing
            | MediaEvent::Pause
            | MediaEvent::Seeking
            | MediaEvent::Waiting
            | MediaEvent::Ended => EventCode::PlayState,
            MediaEvent::VolumeChange => {
                let now_muted = player.media.as_ref().is_some_and(|m| m.muted);
                if now_muted == muted {
                    return;
                }
                self.gate = MediaGate::Attached { muted: now_muted };
                if now_muted {
                    EventCode::Mute
                } else {
                    EventCode::Unmute
                }
            }
            MediaEvent::Error => EventCode::Error,
        };

        let error_code = player.media.as_ref().and_then(|m| m.error_code);
        self.report(
            Trigger::StateChanged {
                event: code,
                error_code,
            },
            player,
            now_ms,
        );
    }

    fn report(&mut self, trigger: Trigger<'_>, player: &PlaybackSnapshot, now_ms: f64) {
        let report = match self.builder.build(&mut self.state, trigger, player, now_ms) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, ?trigger, "Failed to build CMCD report");
                return;
            }
        };

        match self.sender.submit(report) {
            Ok(()) => self.reports += 1,
            Err(e) => warn!(error = %e, "Failed to submit CMCD report"),
        }
    }
}

/// Canonical form of a request URL, used to correlate load start and end.
pub fn canonical_identity(url: &str) -> Result<String, CmcdError> {
    Ok(Url::parse(url)?.into())
}
