mod headers;
mod time;

pub use self::headers::merge_headers;
pub use self::time::parse_time;
