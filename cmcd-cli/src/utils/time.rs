use std::time::Duration;

use crate::error::AppError;

/// Parse a duration with an optional unit (s, m, h). Bare numbers are seconds.
pub fn parse_time(time_str: &str) -> Result<Duration, AppError> {
    let time_str = time_str.trim();
    if time_str.is_empty() {
        return Err(AppError::ParseError("Invalid format: empty string".to_string()));
    }

    let split_index = time_str
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(time_str.len());

    let value = time_str[..split_index]
        .parse::<f64>()
        .map_err(|_| AppError::ParseError(format!("Invalid number in '{time_str}'")))?;

    let seconds = match time_str[split_index..].trim().to_lowercase().as_str() {
        "" | "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        unit => return Err(AppError::ParseError(format!("Invalid unit '{unit}'"))),
    };

    Ok(Duration::from_secs_f64(seconds))
}
