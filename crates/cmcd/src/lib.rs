//! # CMCD Engine
//!
//! Common Media Client Data (CMCD) reporting for media playback sessions.
//! Listens to player and network lifecycle events, derives CMCD key/value
//! reports and delivers them to a collector endpoint.
//!
//! ## Features
//!
//! - CMCD line-protocol parsing and encoding
//! - Per-session metrics (startup delay, sequence numbers, request timing)
//! - Response, event and timer reporting modes
//! - Batched JSON (`POST`) or per-report query (`GET`) transmission
//! - Injectable transport, clock and player probe
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cmcd_engine::{
//!     CmcdConfig, CmcdReporter, HttpTransport, PlaybackProbe, PlayerEvent, SystemClock,
//!     TransportConfig, MediaSnapshot,
//! };
//!
//! struct Player;
//!
//! impl PlaybackProbe for Player {
//!     fn media(&self) -> Option<MediaSnapshot> {
//!         Some(MediaSnapshot::default())
//!     }
//!     fn level_selected(&self) -> bool {
//!         true
//!     }
//!     fn live_sync_position(&self) -> Option<f64> {
//!         None
//!     }
//! }
//!
//! # async fn run() -> Result<(), cmcd_engine::CmcdError> {
//! let config = CmcdConfig::builder()
//!     .with_url("https://collector.example.com/cmcd")
//!     .with_batch_size(5)
//!     .build();
//!
//! let transport = Arc::new(HttpTransport::with_config(&TransportConfig::default())?);
//! let reporter = CmcdReporter::spawn(config, transport, Arc::new(Player), Arc::new(SystemClock))?;
//!
//! reporter.notify(PlayerEvent::MediaAttached);
//! // ... forward player events ...
//! reporter.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod player;
pub mod report;
pub mod reporter;
pub mod session;
pub mod state;
pub mod transmit;
pub mod value;

pub use builder::CmcdConfigBuilder;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{encode_cmcd, parse_cmcd};
pub use config::{CmcdConfig, ReportingMode, TransmissionMode, TransportConfig};
pub use error::CmcdError;
pub use events::{LoadCompletion, LoadKind, LoadStats, MediaEvent, PlayerEvent};
pub use player::{MediaSnapshot, PlaybackProbe, PlaybackSnapshot, PlayerState};
pub use report::{CmcdReport, EventCode, ReportBuilder, Trigger};
pub use reporter::{CmcdReporter, ReporterHandle, SessionSummary};
pub use session::CmcdSession;
pub use state::SessionState;
pub use transmit::{HttpTransport, ReportRequest, ReportSender, ReportTransport, create_client};
pub use value::{CmcdFields, CmcdValue};
