use clap::Parser;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser)]
#[command(
    author = "hua0512 <https://github.com/hua0512>",
    version,
    about = "Replay playback traces as CMCD reports",
    long_about = "Replays a recorded playback session (JSON lines of player events and\n\
                  media element snapshots) through the CMCD reporting engine and sends\n\
                  the resulting reports to a collector endpoint.\n\
                  \n\
                  Each trace line looks like:\n\
                  {\"atMs\": 1200, \"player\": {...}, \"event\": {\"type\": \"media\", \"event\": \"playing\"}}"
)]
pub struct CliArgs {
    /// Trace file to replay
    #[arg(required = true, help = "Path to a JSON-lines playback trace")]
    pub trace: PathBuf,

    /// Configuration file
    #[arg(
        short,
        long,
        help = "JSON file with CMCD options (transmissionMode, reportingMode, url, batchSize, includeKeys, timeInterval)"
    )]
    pub config: Option<PathBuf>,

    /// Collector endpoint
    #[arg(short, long, help = "Collector URL, overrides the config file")]
    pub url: Option<String>,

    /// Transmission mode
    #[arg(
        short = 't',
        long,
        help = "How reports are sent: batched JSON POST or per-report query GET",
        value_parser = ["json", "query"]
    )]
    pub transmission_mode: Option<String>,

    /// Reporting mode
    #[arg(
        short = 'm',
        long,
        help = "What triggers a report",
        value_parser = ["response", "event", "timer"]
    )]
    pub reporting_mode: Option<String>,

    /// JSON batch size
    #[arg(short, long, help = "Reports per JSON batch")]
    pub batch_size: Option<usize>,

    /// Keys to include
    #[arg(
        short = 'k',
        long,
        value_delimiter = ',',
        help = "Comma separated CMCD keys to include (default: all)"
    )]
    pub include_keys: Option<Vec<String>>,

    /// Timer interval with optional unit (s, m, h)
    #[arg(
        short = 'i',
        long,
        help = "Timer mode reporting interval with optional unit (s, m, h). Examples: \"10s\", \"1m\""
    )]
    pub time_interval: Option<String>,

    /// Replay at recorded pace
    #[arg(
        short,
        long,
        help = "Wait between trace entries as recorded instead of replaying instantly"
    )]
    pub realtime: bool,

    /// Request timeout in seconds
    #[arg(
        long,
        default_value = "10",
        help = "Overall timeout in seconds for each report request"
    )]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        default_value = "5",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    /// Custom HTTP headers for report requests
    #[arg(
        long = "header",
        short = 'H',
        help = "Add custom HTTP header to report requests (can be used multiple times). Format: 'Name: Value'",
        value_name = "HEADER"
    )]
    pub headers: Vec<String>,

    /// Disable all proxy settings
    #[arg(long, help = "Disable all proxy settings (including system proxy)")]
    pub no_proxy: bool,

    /// Grace period for in-flight requests
    #[arg(
        long,
        default_value = "1000",
        help = "Milliseconds to wait for in-flight report requests before exiting"
    )]
    pub drain_ms: u64,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}
