//! Parsing of token lifetimes written as `<integer><unit>`, e.g. "15m" or "7d".

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub const MAX_DURATION_SECS: i64 = 365 * 24 * 60 * 60;

lazy_static! {
    static ref DURATION_REGEX: Regex = Regex::new(r"^(-?[0-9]+)([smhd])$").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("duration is empty")]
    Empty,
    #[error("invalid duration {0:?}, expected <number><s|m|h|d>")]
    InvalidFormat(String),
    #[error("duration must be greater than zero")]
    NonPositive,
    #[error("duration must not exceed one year")]
    TooLong,
}

/// Parses a duration string into seconds.
pub fn parse_duration_secs(s: &str) -> Result<i64, DurationParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let captures = DURATION_REGEX
        .captures(s)
        .ok_or_else(|| DurationParseError::InvalidFormat(s.to_string()))?;

    let digits = &captures[1];
    let unit_secs: i64 = match &captures[2] {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(DurationParseError::InvalidFormat(s.to_string())),
    };

    let value: i64 = match digits.parse() {
        Ok(value) => value,
        // The capture is an integer literal, failing to parse means overflow.
        Err(_) if digits.starts_with('-') => return Err(DurationParseError::NonPositive),
        Err(_) => return Err(DurationParseError::TooLong),
    };
    if value <= 0 {
        return Err(DurationParseError::NonPositive);
    }

    let secs = value
        .checked_mul(unit_secs)
        .ok_or(DurationParseError::TooLong)?;
    if secs > MAX_DURATION_SECS {
        return Err(DurationParseError::TooLong);
    }
    Ok(secs)
}
