use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cmcd_engine::{Clock, CmcdReporter, HttpTransport, ManualClock, SystemClock};
use error::AppError;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod error;
mod replay;
mod utils;

use cli::CliArgs;
use config::{resolve_cmcd_config, resolve_transport_config};
use replay::{ScriptedPlayer, replay_trace};

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> Result<(), AppError> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_level(verbose))
        .with(filter)
        .try_init()
        .map_err(|e| AppError::Initialization(e.to_string()))
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();
    init_logging(args.verbose)?;

    let cmcd_config = resolve_cmcd_config(&args)?;
    let transport_config = resolve_transport_config(&args);

    info!(
        trace = %args.trace.display(),
        url = %cmcd_config.url,
        "Replaying playback trace"
    );

    let transport = Arc::new(HttpTransport::with_config(&transport_config)?);
    let player = Arc::new(ScriptedPlayer::default());
    let clock = Arc::new(ManualClock::new(SystemClock.now_ms()));

    let reporter = CmcdReporter::spawn(
        cmcd_config,
        transport,
        player.clone(),
        clock.clone(),
    )?;

    let stats = match replay_trace(&args.trace, &reporter, &player, &clock, args.realtime).await
    {
        Ok(stats) => stats,
        Err(e) => {
            reporter.shutdown().await;
            return Err(e);
        }
    };

    info!(
        entries = stats.entries,
        events = stats.events_sent,
        "Trace replay complete"
    );
    if stats.events_dropped > 0 {
        warn!(dropped = stats.events_dropped, "Session stopped before the trace ended");
    }

    match reporter.finish().await {
        Some(summary) => {
            info!(
                reports = summary.reports_submitted,
                discarded = summary.discarded_on_stop,
                "CMCD session finished"
            );
        }
        None => warn!("CMCD session ended without a summary"),
    }

    // report requests run detached; give them time to complete
    if args.drain_ms > 0 {
        tokio::time::sleep(Duration::from_millis(args.drain_ms)).await;
    }

    Ok(())
}
