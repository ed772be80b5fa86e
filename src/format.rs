use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Utc};
use std::fmt;
use thiserror::Error;

/// Medium date-time style, e.g. `Jan 5, 2024 3:04:05 PM`
pub const DEFAULT_PATTERN: &str = "%b %-d, %Y %-I:%M:%S %p";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid date format pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid timezone '{0}' (expected local, utc or an offset like +02:00)")]
    InvalidTimeZone(String),
}

/// Which timezone creation timestamps are rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZoneSetting {
    /// The ambient system timezone, looked up on every format
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl TimeZoneSetting {
    /// Parse `local`, `utc` or a `+HH:MM` / `-HH:MM` / `+HHMM` offset
    pub fn parse(value: &str) -> Result<Self, FormatError> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "local" => Ok(TimeZoneSetting::Local),
            "utc" | "z" => Ok(TimeZoneSetting::Utc),
            _ => parse_offset(trimmed)
                .map(TimeZoneSetting::Fixed)
                .ok_or_else(|| FormatError::InvalidTimeZone(value.to_string())),
        }
    }
}

impl fmt::Display for TimeZoneSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZoneSetting::Local => write!(f, "local"),
            TimeZoneSetting::Utc => write!(f, "utc"),
            TimeZoneSetting::Fixed(offset) => {
                let seconds = offset.local_minus_utc();
                let sign = if seconds < 0 { '-' } else { '+' };
                let minutes = seconds.abs() / 60;
                write!(f, "{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
            }
        }
    }
}

fn parse_offset(value: &str) -> Option<FixedOffset> {
    let (sign, rest) = match value.chars().next()? {
        '+' => (1, &value[1..]),
        '-' => (-1, &value[1..]),
        _ => return None,
    };
    if !rest.is_ascii() {
        return None;
    }
    // Exactly HH:MM or HHMM
    let (hh, mm) = match rest.len() {
        5 if rest.as_bytes()[2] == b':' => (&rest[..2], &rest[3..]),
        4 => rest.split_at(2),
        _ => return None,
    };
    if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hh.parse().ok()?;
    let minutes: i32 = mm.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// A validated strftime pattern plus the timezone to render in.
///
/// The pattern is checked when the format is built, so `format_millis` never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
    zone: TimeZoneSetting,
}

impl DateFormat {
    pub fn new(pattern: impl Into<String>, zone: TimeZoneSetting) -> Result<Self, FormatError> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::InvalidPattern(pattern));
        }
        Ok(Self { pattern, zone })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn zone(&self) -> TimeZoneSetting {
        self.zone
    }

    /// Render milliseconds since the epoch.
    /// Instants chrono cannot represent fall back to the raw number.
    pub fn format_millis(&self, millis: i64) -> String {
        let Some(utc) = DateTime::<Utc>::from_timestamp_millis(millis) else {
            return millis.to_string();
        };
        match self.zone {
            TimeZoneSetting::Local => utc.with_timezone(&Local).format(&self.pattern).to_string(),
            TimeZoneSetting::Utc => utc.format(&self.pattern).to_string(),
            TimeZoneSetting::Fixed(offset) => utc.with_timezone(&offset).format(&self.pattern).to_string(),
        }
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            zone: TimeZoneSetting::Local,
        }
    }
}
