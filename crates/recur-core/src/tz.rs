//! Timezone handling utilities.
//!
//! A rule is expanded in the wall-clock time of its start value. The zone
//! only matters when a local date-time has to be placed on the UTC line:
//! when emitting occurrences of a zoned rule and when comparing against a
//! UTC `UNTIL` bound.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{RecurError, Result};
use crate::models::{CalendarValue, DateTimeValue};

/// The zone a rule's start value is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Zone {
    /// Wall-clock time with no zone; values are never converted.
    #[default]
    Floating,
    /// Coordinated Universal Time.
    Utc,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
    /// An IANA zone with daylight saving rules.
    Named(Tz),
}

impl Zone {
    /// True if values in this zone are never shifted.
    pub fn is_floating(&self) -> bool {
        matches!(self, Zone::Floating)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Floating => write!(f, "floating"),
            Zone::Utc => write!(f, "UTC"),
            Zone::Fixed(offset) => write!(f, "{offset}"),
            Zone::Named(tz) => write!(f, "{tz}"),
        }
    }
}

/// Parse an IANA timezone name into a [`chrono_tz::Tz`].
///
/// # Examples
///
/// ```
/// use recur_core::tz::parse_tz;
///
/// let tz = parse_tz("Europe/Berlin").unwrap();
/// assert_eq!(tz.to_string(), "Europe/Berlin");
/// ```
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| RecurError::InvalidTimezone(name.to_string()))
}

/// Parse a zone designation.
///
/// Accepts an empty string (floating), `UTC`/`Z`, a fixed offset such as
/// `+05:30` or `-0800`, or an IANA name.
pub fn parse_zone(name: &str) -> Result<Zone> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("floating") {
        return Ok(Zone::Floating);
    }
    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(Zone::Utc);
    }
    if trimmed.starts_with('+') || trimmed.starts_with('-') {
        return parse_fixed_offset(trimmed).map(Zone::Fixed);
    }
    parse_tz(trimmed).map(Zone::Named)
}

fn parse_fixed_offset(s: &str) -> Result<FixedOffset> {
    let invalid = || RecurError::InvalidTimezone(s.to_string());
    let sign = if s.starts_with('-') { -1 } else { 1 };
    let digits: String = s[1..].chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Convert a local date-time in `zone` to UTC.
///
/// Ambiguous local times (DST fall back) resolve to the earlier instant.
/// Nonexistent local times (DST spring forward) are shifted forward by the
/// length of the gap, so 02:30 in a one-hour gap becomes 03:30 local time.
pub fn local_to_utc(local: DateTimeValue, zone: &Zone) -> DateTimeValue {
    match zone {
        Zone::Floating | Zone::Utc => local,
        Zone::Fixed(offset) => shift(local, -i64::from(offset.local_minus_utc())),
        Zone::Named(tz) => match local.to_naive() {
            Some(naive) => named_local_to_utc(naive, tz),
            None => local,
        },
    }
}

fn named_local_to_utc(naive: NaiveDateTime, tz: &Tz) -> DateTimeValue {
    let resolved = tz.from_local_datetime(&naive);
    if let Some(dt) = resolved.earliest() {
        return dt.with_timezone(&Utc).naive_utc().into();
    }
    // In a gap: read the offset in force just before the transition and
    // apply it, which lands past the gap by exactly the gap length.
    let before = naive - chrono::Duration::hours(24);
    let offset = tz
        .from_local_datetime(&before)
        .earliest()
        .map(|dt| dt.offset().fix().local_minus_utc())
        .unwrap_or_else(|| tz.offset_from_utc_datetime(&naive).fix().local_minus_utc());
    (naive - chrono::Duration::seconds(i64::from(offset))).into()
}

/// Convert a UTC date-time to wall-clock time in `zone`.
pub fn utc_to_local(utc: DateTimeValue, zone: &Zone) -> DateTimeValue {
    match zone {
        Zone::Floating | Zone::Utc => utc,
        Zone::Fixed(offset) => shift(utc, i64::from(offset.local_minus_utc())),
        Zone::Named(tz) => match utc.to_naive() {
            Some(naive) => {
                let instant: DateTime<Utc> = Utc.from_utc_datetime(&naive);
                instant.with_timezone(tz).naive_local().into()
            }
            None => utc,
        },
    }
}

/// Normalize a value to UTC. Dates are whole days and pass through.
pub fn to_utc(value: CalendarValue, zone: &Zone) -> CalendarValue {
    match value {
        CalendarValue::Date(_) => value,
        CalendarValue::DateTime(dt) => local_to_utc(dt, zone).into(),
    }
}

/// Inverse of [`to_utc`].
pub fn from_utc(value: CalendarValue, zone: &Zone) -> CalendarValue {
    match value {
        CalendarValue::Date(_) => value,
        CalendarValue::DateTime(dt) => utc_to_local(dt, zone).into(),
    }
}

fn shift(value: DateTimeValue, seconds: i64) -> DateTimeValue {
    DateTimeValue::from_epoch_seconds(value.epoch_seconds() + seconds)
}
