//! Long-lived per-session metrics used to derive CMCD keys.

use std::collections::HashMap;

use tracing::{debug, trace};

/// Loads that start but never complete are evicted oldest-first past this.
pub const MAX_PENDING_REQUESTS: usize = 512;

/// Session metrics owned by exactly one reporting session.
///
/// Timestamps are wall-clock epoch milliseconds.
#[derive(Debug, Default)]
pub struct SessionState {
    sequence_number: u64,
    time_play: Option<f64>,
    measured_startup_delay: Option<f64>,
    startup_delay_sent: bool,
    pending_request_starts: HashMap<String, f64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the start of a load, replacing any stale entry for the same
    /// request identity.
    pub fn on_load_start(&mut self, request_identity: impl Into<String>, now_ms: f64) {
        let request_identity = request_identity.into();
        if self.pending_request_starts.len() >= MAX_PENDING_REQUESTS
            && !self.pending_request_starts.contains_key(&request_identity)
        {
            self.evict_oldest_request();
        }
        self.pending_request_starts.insert(request_identity, now_ms);
    }

    fn evict_oldest_request(&mut self) {
        let oldest = self
            .pending_request_starts
            .iter()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(identity, _)| identity.clone());

        if let Some(identity) = oldest {
            trace!(url = %identity, "Evicting load that never completed");
            self.pending_request_starts.remove(&identity);
        }
    }

    /// Consumes the start timestamp recorded for `request_identity`.
    pub fn on_load_complete(&mut self, request_identity: &str) -> Option<f64> {
        self.pending_request_starts.remove(request_identity)
    }

    /// Marks the first play request. Later calls are ignored.
    pub fn on_play_started(&mut self, now_ms: f64) {
        if self.time_play.is_none() {
            self.time_play = Some(now_ms);
        }
    }

    /// Measures the startup delay on the first `playing` after a play request.
    pub fn on_playing(&mut self, now_ms: f64) {
        if self.measured_startup_delay.is_some() {
            return;
        }
        if let Some(time_play) = self.time_play {
            let delay = (now_ms - time_play).max(0.0);
            debug!(msd = delay, "Measured startup delay");
            self.measured_startup_delay = Some(delay);
        }
    }

    /// Returns the current sequence number and advances the counter.
    pub fn next_sequence_number(&mut self) -> u64 {
        let current = self.sequence_number;
        self.sequence_number += 1;
        current
    }

    /// Hands out the measured startup delay at most once per session.
    ///
    /// Returns `None` while the delay is still unknown, so an early report
    /// does not use up the single slot.
    pub fn take_startup_delay_if_unsent(&mut self) -> Option<f64> {
        if self.startup_delay_sent {
            return None;
        }
        let delay = self.measured_startup_delay?;
        self.startup_delay_sent = true;
        Some(delay)
    }

    pub fn startup_delay_sent(&self) -> bool {
        self.startup_delay_sent
    }

    /// Used when the startup delay leaves the session through another path,
    /// such as an inbound `msd` token that is forwarded as-is.
    pub fn mark_startup_delay_sent(&mut self) {
        self.startup_delay_sent = true;
    }

    pub fn time_play(&self) -> Option<f64> {
        self.time_play
    }

    pub fn measured_startup_delay(&self) -> Option<f64> {
        self.measured_startup_delay
    }

    pub fn pending_requests(&self) -> usize {
        self.pending_request_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_starts_at_zero() {
        let mut state = SessionState::new();
        assert_eq!(state.next_sequence_number(), 0);
        assert_eq!(state.next_sequence_number(), 1);
        assert_eq!(state.next_sequence_number(), 2);
    }

    #[test]
    fn test_startup_delay_measured_once() {
        let mut state = SessionState::new();

        // playing before play has no reference point
        state.on_playing(500.0);
        assert_eq!(state.measured_startup_delay(), None);

        state.on_play_started(1_000.0);
        state.on_play_started(1_200.0);
        assert_eq!(state.time_play(), Some(1_000.0));

        state.on_playing(1_350.0);
        state.on_playing(9_000.0);
        assert_eq!(state.measured_startup_delay(), Some(350.0));
    }

    #[test]
    fn test_startup_delay_taken_once() {
        let mut state = SessionState::new();
        assert_eq!(state.take_startup_delay_if_unsent(), None);
        assert!(!state.startup_delay_sent());

        state.on_play_started(0.0);
        state.on_playing(120.0);
        assert_eq!(state.take_startup_delay_if_unsent(), Some(120.0));
        assert_eq!(state.take_startup_delay_if_unsent(), None);
        assert_eq!(state.take_startup_delay_if_unsent(), None);
    }

    #[test]
    fn test_pending_request_consumed() {
        let mut state = SessionState::new();
        state.on_load_start("https://cdn.example.com/seg1.ts", 10.0);
        state.on_load_start("https://cdn.example.com/seg1.ts", 20.0);
        assert_eq!(state.pending_requests(), 1);

        assert_eq!(
            state.on_load_complete("https://cdn.example.com/seg1.ts"),
            Some(20.0)
        );
        assert_eq!(state.on_load_complete("https://cdn.example.com/seg1.ts"), None);
        assert_eq!(state.pending_requests(), 0);
    }

    #[test]
    fn test_abandoned_loads_are_evicted_oldest_first() {
        let mut state = SessionState::new();
        for n in 0..MAX_PENDING_REQUESTS {
            state.on_load_start(format!("https://cdn.example.com/{n}.ts"), n as f64);
        }
        assert_eq!(state.pending_requests(), MAX_PENDING_REQUESTS);

        // restarting a tracked load does not evict anything
        state.on_load_start("https://cdn.example.com/5.ts", 1_000.0);
        assert_eq!(state.pending_requests(), MAX_PENDING_REQUESTS);

        state.on_load_start("https://cdn.example.com/new.ts", 2_000.0);
        assert_eq!(state.pending_requests(), MAX_PENDING_REQUESTS);
        assert_eq!(state.on_load_complete("https://cdn.example.com/0.ts"), None);
        assert_eq!(
            state.on_load_complete("https://cdn.example.com/1.ts"),
            Some(1.0)
        );
        assert_eq!(
            state.on_load_complete("https://cdn.example.com/5.ts"),
            Some(1_000.0)
        );
        assert_eq!(
            state.on_load_complete("https://cdn.example.com/new.ts"),
            Some(2_000.0)
        );
    }
}
