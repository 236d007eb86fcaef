//! CMCD short codes produced by the report builder.

/// Time to first byte, ms
pub const TTFB: &str = "ttfb";
/// Time to last byte, ms
pub const TTLB: &str = "ttlb";
/// Response status code
pub const RC: &str = "rc";
/// Requested resource without its query
pub const URL: &str = "url";
/// Request start (response mode) or event time (event/timer mode)
pub const TS: &str = "ts";
/// Playhead time
pub const PT: &str = "pt";
/// Live latency, ms
pub const LTC: &str = "ltc";
/// Playback rate
pub const PR: &str = "pr";
/// Player state
pub const STA: &str = "sta";
/// Measured startup delay, ms
pub const MSD: &str = "msd";
/// Dropped frames
pub const DF: &str = "df";
/// Sequence number
pub const SN: &str = "sn";
/// Event code
pub const E: &str = "e";
/// Media error code
pub const EC: &str = "ec";

/// Name of the query parameter carrying CMCD data.
pub const QUERY_PARAM: &str = "CMCD";

/// Every key the builder can compute.
pub const ALL: &[&str] = &[TTFB, TTLB, RC, URL, TS, PT, LTC, PR, STA, MSD, DF, SN, E, EC];
