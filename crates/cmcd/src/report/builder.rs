// Report Builder: derives the CMCD key set for one trigger.

use std::sync::Arc;

use tracing::trace;
use url::Url;

use crate::codec::parse_cmcd;
use crate::config::CmcdConfig;
use crate::events::LoadCompletion;
use crate::player::PlaybackSnapshot;
use crate::report::{CmcdReport, keys};
use crate::state::SessionState;
use crate::value::{CmcdFields, CmcdValue};
use crate::CmcdError;

/// Short codes carried in the `e` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCode {
    /// Play state change (playing, pause, seeking, waiting, ended)
    PlayState,
    Mute,
    Unmute,
    Error,
    /// Periodic timer report
    TimeInterval,
}

impl EventCode {
    pub fn code(self) -> &'static str {
        match self {
            EventCode::PlayState => "ps",
            EventCode::Mute => "m",
            EventCode::Unmute => "um",
            EventCode::Error => "e",
            EventCode::TimeInterval => "t",
        }
    }
}

/// What caused a report to be built.
#[derive(Debug, Clone, Copy)]
pub enum Trigger<'a> {
    /// A fragment or manifest load completed.
    LoadCompleted(&'a LoadCompletion),
    /// The media element changed state.
    StateChanged {
        event: EventCode,
        error_code: Option<u16>,
    },
    /// The reporting timer fired.
    TimerTick,
}

pub struct ReportBuilder {
    config: Arc<CmcdConfig>,
}

impl ReportBuilder {
    pub fn new(config: Arc<CmcdConfig>) -> Self {
        Self { config }
    }

    /// Builds the report for `trigger`.
    ///
    /// Inbound tokens from the resource's own `CMCD` query parameter are
    /// merged first and computed keys always override them. The key
    /// allow-list is applied to the merged result.
    pub fn build(
        &self,
        state: &mut SessionState,
        trigger: Trigger<'_>,
        player: &PlaybackSnapshot,
        now_ms: f64,
    ) -> Result<CmcdReport, CmcdError> {
        let mut fields = CmcdFields::new();
        let mut request = None;

        match trigger {
            Trigger::LoadCompleted(completion) => {
                let url = Url::parse(&completion.url)?;
                if let Some((_, inbound)) = url
                    .query_pairs()
                    .find(|(name, _)| name == keys::QUERY_PARAM)
                {
                    fields.extend(parse_cmcd(&inbound));
                }
                self.add_response_data(&mut fields, state, completion, &url);
                request = Some(url);
            }
            Trigger::StateChanged { event, error_code } => {
                if player.media.is_none() {
                    return Err(CmcdError::MissingMedia);
                }
                self.add_event_data(&mut fields, event, now_ms);
                if event == EventCode::Error && self.config.includes(keys::EC) {
                    if let Some(code) = error_code {
                        fields.insert(keys::EC.to_string(), code.into());
                    }
                }
            }
            Trigger::TimerTick => {
                self.add_event_data(&mut fields, EventCode::TimeInterval, now_ms);
            }
        }

        self.add_playback_data(&mut fields, player, now_ms);
        self.add_startup_delay(&mut fields, state);

        if self.config.includes(keys::SN) {
            fields.insert(keys::SN.to_string(), state.next_sequence_number().into());
        }

        if self.config.include_keys.is_some() {
            fields.retain(|key, _| self.config.includes(key));
        }

        trace!(keys = fields.len(), "Assembled CMCD report");
        Ok(CmcdReport { fields, request })
    }

    fn include(&self, fields: &mut CmcdFields, key: &str, value: Option<CmcdValue>) {
        if let Some(value) = value {
            if self.config.includes(key) {
                fields.insert(key.to_string(), value);
            }
        }
    }

    fn add_response_data(
        &self,
        fields: &mut CmcdFields,
        state: &mut SessionState,
        completion: &LoadCompletion,
        url: &Url,
    ) {
        let stats = &completion.stats;

        let ttfb = stats
            .request_sent
            .zip(stats.first_byte)
            .and_then(|(sent, first)| CmcdValue::rounded(first - sent));
        self.include(fields, keys::TTFB, ttfb);

        let ttlb = stats
            .request_sent
            .zip(stats.load_end)
            .and_then(|(sent, end)| CmcdValue::rounded(end - sent));
        self.include(fields, keys::TTLB, ttlb);

        let rc = completion.status.filter(|s| *s != 0).map(CmcdValue::from);
        self.include(fields, keys::RC, rc);

        let mut resource = url.clone();
        resource.set_query(None);
        self.include(fields, keys::URL, Some(CmcdValue::String(resource.into())));

        // consumed even when `ts` is filtered out so the entry never lingers
        let started = state
            .on_load_complete(url.as_str())
            .and_then(CmcdValue::rounded);
        self.include(fields, keys::TS, started);
    }

    fn add_event_data(&self, fields: &mut CmcdFields, event: EventCode, now_ms: f64) {
        self.include(fields, keys::TS, CmcdValue::rounded(now_ms));
        self.include(fields, keys::E, Some(event.code().into()));
    }

    fn add_playback_data(&self, fields: &mut CmcdFields, player: &PlaybackSnapshot, now_ms: f64) {
        if let Some(media) = &player.media {
            let pt = if player.is_live() {
                now_ms
            } else {
                media.current_time
            };
            self.include(
                fields,
                keys::PT,
                Some(pt).filter(|v| *v > 0.0).and_then(CmcdValue::number),
            );

            let latency = player
                .live_sync_position
                .map(|edge| edge - media.current_time)
                .filter(|v| *v > 0.0)
                .and_then(|v| CmcdValue::rounded(v * 1000.0));
            self.include(fields, keys::LTC, latency);

            self.include(fields, keys::PR, CmcdValue::number(media.playback_rate));

            let dropped = media.dropped_frames.filter(|d| *d > 0).map(CmcdValue::from);
            self.include(fields, keys::DF, dropped);
        }

        let sta = player.player_state().map(|s| CmcdValue::from(s.code()));
        self.include(fields, keys::STA, sta);
    }

    fn add_startup_delay(&self, fields: &mut CmcdFields, state: &mut SessionState) {
        if !self.config.includes(keys::MSD) {
            return;
        }

        if let Some(delay) = state.take_startup_delay_if_unsent() {
            self.include(fields, keys::MSD, CmcdValue::rounded(delay));
        } else if fields.contains_key(keys::MSD) {
            // an inbound msd counts against the single slot too
            if state.startup_delay_sent() {
                fields.remove(keys::MSD);
            } else {
                state.mark_startup_delay_sent();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LoadKind, LoadStats};
    use crate::player::MediaSnapshot;

    fn builder(config: CmcdConfig) -> ReportBuilder {
        ReportBuilder::new(Arc::new(config))
    }

    fn playing() -> PlaybackSnapshot {
        PlaybackSnapshot {
            media: Some(MediaSnapshot {
                current_time: 12.5,
                paused: false,
                ready_state: 4,
                played_ranges: 1,
                dropped_frames: Some(0),
                ..Default::default()
            }),
            level_selected: true,
            live_sync_position: None,
        }
    }

    fn completion(url: &str) -> LoadCompletion {
        LoadCompletion {
            url: url.to_string(),
            kind: LoadKind::Fragment,
            stats: LoadStats {
                request_sent: Some(1_000.0),
                first_byte: Some(1_120.4),
                load_end: Some(1_480.6),
            },
            status: Some(200),
        }
    }

    #[test]
    fn test_response_report() {
        let builder = builder(CmcdConfig::default());
        let mut state = SessionState::new();
        state.on_load_start("https://cdn.example.com/v/seg-1.m4s?token=abc", 999.6);

        let load = completion("https://cdn.example.com/v/seg-1.m4s?token=abc");
        let report = builder
            .build(&mut state, Trigger::LoadCompleted(&load), &playing(), 5_000.0)
            .unwrap();

        assert_eq!(report.get("ttfb"), Some(&CmcdValue::Integer(120)));
        assert_eq!(report.get("ttlb"), Some(&CmcdValue::Integer(481)));
        assert_eq!(report.get("rc"), Some(&CmcdValue::Integer(200)));
        assert_eq!(
            report.get("url"),
            Some(&CmcdValue::from("https://cdn.example.com/v/seg-1.m4s"))
        );
        assert_eq!(report.get("ts"), Some(&CmcdValue::Integer(1_000)));
        assert_eq!(report.get("pt"), Some(&CmcdValue::Float(12.5)));
        assert_eq!(report.get("pr"), Some(&CmcdValue::Integer(1)));
        assert_eq!(report.get("sta"), Some(&CmcdValue::from("p")));
        assert_eq!(report.get("sn"), Some(&CmcdValue::Integer(0)));
        // zero dropped frames are not reported
        assert_eq!(report.get("df"), None);
        assert_eq!(report.get("ltc"), None);
        assert_eq!(report.get("e"), None);
        assert_eq!(state.pending_requests(), 0);
        assert!(report.request.is_some());
    }

    #[test]
    fn test_computed_keys_override_inbound() {
        let builder = builder(CmcdConfig::default());
        let mut state = SessionState::new();

        let load = completion(
            "https://cdn.example.com/seg.ts?CMCD=sn%3D99%2Cbr%3D3200%2Csid%3D%22abc%22",
        );
        let report = builder
            .build(&mut state, Trigger::LoadCompleted(&load), &playing(), 0.0)
            .unwrap();

        assert_eq!(report.get("sn"), Some(&CmcdValue::Integer(0)));
        assert_eq!(report.get("br"), Some(&CmcdValue::Integer(3200)));
        assert_eq!(report.get("sid"), Some(&CmcdValue::from("abc")));
    }

    #[test]
    fn test_include_keys_filter_everything() {
        let builder = builder(CmcdConfig {
            include_keys: Some(["sn", "sta"].into_iter().map(String::from).collect()),
            ..Default::default()
        });
        let mut state = SessionState::new();

        let load = completion("https://cdn.example.com/seg.ts?CMCD=br%3D3200");
        let report = builder
            .build(&mut state, Trigger::LoadCompleted(&load), &playing(), 0.0)
            .unwrap();

        let keys: Vec<_> = report.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["sn", "sta"]);
    }

    #[test]
    fn test_startup_delay_reported_once() {
        let builder = builder(CmcdConfig::default());
        let mut state = SessionState::new();
        let trigger = Trigger::StateChanged {
            event: EventCode::PlayState,
            error_code: None,
        };

        let report = builder.build(&mut state, trigger, &playing(), 0.0).unwrap();
        assert_eq!(report.get("msd"), None);

        state.on_play_started(1_000.0);
        state.on_playing(1_250.0);

        let report = builder.build(&mut state, trigger, &playing(), 0.0).unwrap();
        assert_eq!(report.get("msd"), Some(&CmcdValue::Integer(250)));

        for _ in 0..3 {
            let report = builder.build(&mut state, trigger, &playing(), 0.0).unwrap();
            assert_eq!(report.get("msd"), None);
        }
    }

    #[test]
    fn test_inbound_msd_uses_the_slot() {
        let builder = builder(CmcdConfig::default());
        let mut state = SessionState::new();

        let load = completion("https://cdn.example.com/a.ts?CMCD=msd%3D300");
        let report = builder
            .build(&mut state, Trigger::LoadCompleted(&load), &playing(), 0.0)
            .unwrap();
        assert_eq!(report.get("msd"), Some(&CmcdValue::Integer(300)));

        let load = completion("https://cdn.example.com/b.ts?CMCD=msd%3D300");
        let report = builder
            .build(&mut state, Trigger::LoadCompleted(&load), &playing(), 0.0)
            .unwrap();
        assert_eq!(report.get("msd"), None);
    }

    #[test]
    fn test_event_and_error_codes() {
        let builder = builder(CmcdConfig::default());
        let mut state = SessionState::new();

        let report = builder
            .build(
                &mut state,
                Trigger::StateChanged {
                    event: EventCode::Error,
                    error_code: Some(3),
                },
                &playing(),
                1_700_000_000_123.4,
            )
            .unwrap();

        assert_eq!(report.get("e"), Some(&CmcdValue::from("e")));
        assert_eq!(report.get("ec"), Some(&CmcdValue::Integer(3)));
        assert_eq!(report.get("ts"), Some(&CmcdValue::Integer(1_700_000_000_123)));
        assert!(report.request.is_none());
    }

    #[test]
    fn test_live_metrics() {
        let builder = builder(CmcdConfig::default());
        let mut state = SessionState::new();
        let mut player = playing();
        player.live_sync_position = Some(15.75);

        let report = builder
            .build(&mut state, Trigger::TimerTick, &player, 1_700_000_000_000.0)
            .unwrap();

        assert_eq!(report.get("pt"), Some(&CmcdValue::Integer(1_700_000_000_000)));
        assert_eq!(report.get("ltc"), Some(&CmcdValue::Integer(3_250)));
        assert_eq!(report.get("e"), Some(&CmcdValue::from("t")));
    }

    #[test]
    fn test_errors_do_not_consume_sequence() {
        let builder = builder(CmcdConfig::default());
        let mut state = SessionState::new();

        let bad = completion("not a url");
        assert!(matches!(
            builder.build(&mut state, Trigger::LoadCompleted(&bad), &playing(), 0.0),
            Err(CmcdError::UrlError(_))
        ));

        let detached = PlaybackSnapshot::default();
        assert!(matches!(
            builder.build(
                &mut state,
                Trigger::StateChanged {
                    event: EventCode::PlayState,
                    error_code: None
                },
                &detached,
                0.0
            ),
            Err(CmcdError::MissingMedia)
        ));

        let report = builder
            .build(&mut state, Trigger::TimerTick, &playing(), 0.0)
            .unwrap();
        assert_eq!(report.get("sn"), Some(&CmcdValue::Integer(0)));
    }
}
