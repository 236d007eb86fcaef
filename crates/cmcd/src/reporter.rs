// CMCD Reporter: runs a reporting session on its own task and exposes a
// handle for feeding player events and stopping it.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{CmcdConfig, ReportingMode};
use crate::events::PlayerEvent;
use crate::player::{PlaybackProbe, PlaybackSnapshot};
use crate::session::CmcdSession;
use crate::transmit::ReportTransport;
use crate::CmcdError;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// An event together with the player state observed when it happened.
#[derive(Debug)]
struct Envelope {
    event: PlayerEvent,
    player: PlaybackSnapshot,
    at_ms: f64,
}

/// Totals reported when the session task exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub reports_submitted: u64,
    pub discarded_on_stop: usize,
}

/// Spawns reporting sessions.
pub struct CmcdReporter;

impl CmcdReporter {
    /// Validates `config` and starts the session task on the current runtime.
    ///
    /// Fails with [`CmcdError::RuntimeUnavailable`] outside a tokio runtime.
    pub fn spawn(
        config: CmcdConfig,
        transport: Arc<dyn ReportTransport>,
        probe: Arc<dyn PlaybackProbe>,
        clock: Arc<dyn Clock>,
    ) -> Result<ReporterHandle, CmcdError> {
        let runtime =
            Handle::try_current().map_err(|e| CmcdError::RuntimeUnavailable(e.to_string()))?;
        let mut session = CmcdSession::new(config, transport)?;

        let ticker = match session.config().reporting_mode {
            ReportingMode::Timer => session.config().report_interval().map(|period| {
                let mut interval = tokio::time::interval_at(Instant::now() + period, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                interval
            }),
            _ => None,
        };

        if session.attach_if_available(&probe.snapshot()) {
            debug!("Media element already present at session start");
        }

        info!(
            url = %session.config().url,
            transmission = ?session.config().transmission_mode,
            reporting = ?session.config().reporting_mode,
            "Starting CMCD reporting session"
        );

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let task = runtime.spawn(run_session(
            session,
            events_rx,
            ticker,
            Arc::clone(&probe),
            Arc::clone(&clock),
            cancel.clone(),
        ));

        Ok(ReporterHandle {
            events_tx,
            cancel,
            probe,
            clock,
            task: Some(task),
        })
    }
}

async fn run_session(
    mut session: CmcdSession,
    mut events_rx: mpsc::Receiver<Envelope>,
    mut ticker: Option<Interval>,
    probe: Arc<dyn PlaybackProbe>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
) -> SessionSummary {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("CMCD session stop requested");
                break;
            }
            envelope = events_rx.recv() => match envelope {
                Some(Envelope { event, player, at_ms }) => {
                    session.handle_event(&event, &player, at_ms);
                }
                None => {
                    debug!("All CMCD event senders dropped");
                    break;
                }
            },
            _ = next_tick(&mut ticker) => {
                session.on_timer(&probe.snapshot(), clock.now_ms());
            }
        }
    }

    let discarded_on_stop = session.shutdown();
    let summary = SessionSummary {
        reports_submitted: session.reports_submitted(),
        discarded_on_stop,
    };
    info!(
        reports = summary.reports_submitted,
        discarded = summary.discarded_on_stop,
        "CMCD reporting session ended"
    );
    summary
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Handle to a running reporting session. Dropping it stops the session.
pub struct ReporterHandle {
    events_tx: mpsc::Sender<Envelope>,
    cancel: CancellationToken,
    probe: Arc<dyn PlaybackProbe>,
    clock: Arc<dyn Clock>,
    task: Option<JoinHandle<SessionSummary>>,
}

impl ReporterHandle {
    /// Queues `event`, capturing the player state and time right now.
    ///
    /// Returns `false` when the event was dropped, either because the
    /// session is stopped or because the queue is full.
    pub fn notify(&self, event: PlayerEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        let envelope = Envelope {
            event,
            player: self.probe.snapshot(),
            at_ms: self.clock.now_ms(),
        };

        match self.events_tx.try_send(envelope) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(envelope)) => {
                warn!(event = ?envelope.event, "CMCD event queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Queues `event`, waiting for room in the queue instead of dropping it.
    ///
    /// Returns `false` when the session is stopped.
    pub async fn send(&self, event: PlayerEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }

        let envelope = Envelope {
            event,
            player: self.probe.snapshot(),
            at_ms: self.clock.now_ms(),
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.events_tx.send(envelope) => sent.is_ok(),
        }
    }

    /// Stops the session: no further events are processed and the timer is
    /// cancelled.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Lets queued events drain, then ends the session and waits for it.
    pub async fn finish(mut self) -> Option<SessionSummary> {
        let task = self.task.take()?;
        // closing the channel ends the loop after the backlog is handled
        let (closed_tx, _) = mpsc::channel(1);
        drop(std::mem::replace(&mut self.events_tx, closed_tx));
        match task.await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(error = %e, "CMCD session task failed");
                None
            }
        }
    }

    /// Stops the session and waits for it to exit.
    pub async fn shutdown(mut self) -> Option<SessionSummary> {
        self.stop();
        let task = self.task.take()?;
        task.await.ok()
    }
}

impl Drop for ReporterHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::player::MediaSnapshot;
    use crate::transmit::ReportRequest;

    struct Discard;

    impl ReportTransport for Discard {
        fn dispatch(&self, _request: ReportRequest) {}
    }

    struct NoMedia;

    impl PlaybackProbe for NoMedia {
        fn media(&self) -> Option<MediaSnapshot> {
            None
        }

        fn level_selected(&self) -> bool {
            false
        }

        fn live_sync_position(&self) -> Option<f64> {
            None
        }
    }

    fn config() -> CmcdConfig {
        CmcdConfig::builder()
            .with_url("https://collector.example.com/cmcd")
            .build()
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let result = CmcdReporter::spawn(
            config(),
            Arc::new(Discard),
            Arc::new(NoMedia),
            Arc::new(ManualClock::new(0.0)),
        );
        assert!(matches!(result, Err(CmcdError::RuntimeUnavailable(_))));
    }

    #[tokio::test]
    async fn test_send_after_stop_is_rejected() {
        let handle = CmcdReporter::spawn(
            config(),
            Arc::new(Discard),
            Arc::new(NoMedia),
            Arc::new(ManualClock::new(0.0)),
        )
        .unwrap();

        assert!(handle.send(PlayerEvent::MediaAttached).await);
        handle.stop();
        assert!(!handle.send(PlayerEvent::MediaAttached).await);
        assert!(handle.shutdown().await.is_some());
    }
}
