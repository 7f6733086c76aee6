//! Text parsing for rules, values and recurrence properties.
//!
//! This module reads the RFC 5545 text forms:
//! - `FREQ=WEEKLY;BYDAY=MO,WE` rule values into [`RecurrenceSpec`]
//! - `19970902` and `19970902T090000[Z]` into [`CalendarValue`]
//! - `DTSTART`/`RRULE`/`EXRULE`/`RDATE`/`EXDATE` content lines into
//!   [`RecurrenceLines`]

use std::str::FromStr;

use tracing::debug;

use crate::error::{RecurError, Result};
use crate::models::{CalendarValue, DateTimeValue, DateValue, Weekday};
use crate::recurrence::{Frequency, RecurrenceSpec, RecurrenceSpecBuilder, WeekdayNum};
use crate::tz::{Zone, parse_zone};

impl FromStr for Frequency {
    type Err = RecurError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SECONDLY" => Ok(Frequency::Secondly),
            "MINUTELY" => Ok(Frequency::Minutely),
            "HOURLY" => Ok(Frequency::Hourly),
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            _ => Err(RecurError::ParseError(format!(
                "Unknown frequency: '{}'. Expected SECONDLY, MINUTELY, HOURLY, DAILY, WEEKLY, MONTHLY or YEARLY",
                s
            ))),
        }
    }
}

impl FromStr for Weekday {
    type Err = RecurError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim().to_ascii_uppercase();
        Weekday::ALL
            .into_iter()
            .find(|w| w.token() == token)
            .ok_or_else(|| {
                RecurError::ParseError(format!(
                    "Unknown weekday: '{}'. Expected MO, TU, WE, TH, FR, SA or SU",
                    s
                ))
            })
    }
}

impl FromStr for WeekdayNum {
    type Err = RecurError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() < 2 || !s.is_ascii() {
            return Err(RecurError::ParseError(format!("Invalid BYDAY entry: '{}'", s)));
        }
        let (prefix, token) = s.split_at(s.len() - 2);
        let weekday: Weekday = token.parse()?;
        if prefix.is_empty() {
            return Ok(WeekdayNum::every(weekday));
        }
        match prefix.parse::<i32>() {
            Ok(n) if n != 0 && n.abs() <= 53 => Ok(WeekdayNum::nth(n, weekday)),
            _ => Err(RecurError::ParseError(format!(
                "Invalid BYDAY ordinal in '{}'. Expected -53..-1 or 1..53",
                s
            ))),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        RecurError::ParseError(format!("Invalid {} value: '{}'", key, value))
    })
}

fn parse_list<T: FromStr + PartialOrd + Copy>(
    key: &str,
    value: &str,
    valid: impl Fn(T) -> bool,
) -> Result<Vec<T>> {
    value
        .split(',')
        .map(|item| {
            let n: T = parse_number(key, item)?;
            if valid(n) {
                Ok(n)
            } else {
                Err(RecurError::ParseError(format!(
                    "{} value out of range: '{}'",
                    key, item
                )))
            }
        })
        .collect()
}

fn signed_range(max: i32) -> impl Fn(i32) -> bool {
    move |n| n != 0 && (-max..=max).contains(&n)
}

impl FromStr for RecurrenceSpec {
    type Err = RecurError;

    /// Parses a rule value such as `FREQ=MONTHLY;BYDAY=1FR;COUNT=3`.
    ///
    /// Part names are case-insensitive and may appear in any order. `X-`
    /// parts are preserved; other unknown parts are skipped.
    fn from_str(s: &str) -> Result<Self> {
        let body = s.trim();
        let body = body
            .get(..6)
            .filter(|p| p.eq_ignore_ascii_case("RRULE:") || p.eq_ignore_ascii_case("EXRULE"))
            .and_then(|_| body.split_once(':').map(|(_, rest)| rest))
            .unwrap_or(body);

        let mut frequency = None;
        let mut builder = RecurrenceSpecBuilder::new(Frequency::Yearly);

        for part in body.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                RecurError::ParseError(format!("Invalid rule part: '{}'. Expected NAME=VALUE", part))
            })?;
            let key = key.trim().to_ascii_uppercase();
            builder = match key.as_str() {
                "FREQ" => {
                    let freq: Frequency = value.parse()?;
                    frequency = Some(freq);
                    builder.frequency(freq)
                }
                "INTERVAL" => builder.interval(parse_number(&key, value)?),
                "COUNT" => builder.count(parse_number(&key, value)?),
                "UNTIL" => builder.until(value.parse::<CalendarValue>()?),
                "WKST" => builder.week_start(value.parse()?),
                "BYSECOND" => builder.by_second(parse_list(&key, value, |n: u32| n < 60)?),
                "BYMINUTE" => builder.by_minute(parse_list(&key, value, |n: u32| n < 60)?),
                "BYHOUR" => builder.by_hour(parse_list(&key, value, |n: u32| n < 24)?),
                "BYDAY" => builder.by_day(
                    value
                        .split(',')
                        .map(str::parse)
                        .collect::<Result<Vec<WeekdayNum>>>()?,
                ),
                "BYMONTHDAY" => builder.by_month_day(parse_list(&key, value, signed_range(31))?),
                "BYYEARDAY" => builder.by_year_day(parse_list(&key, value, signed_range(366))?),
                "BYWEEKNO" => builder.by_week_no(parse_list(&key, value, signed_range(53))?),
                "BYMONTH" => builder.by_month(parse_list(&key, value, |n: u32| (1..=12).contains(&n))?),
                "BYSETPOS" => builder.by_set_pos(parse_list(&key, value, signed_range(366))?),
                _ if key.starts_with("X-") => builder.x_rule(
                    part.split_once('=').map_or(key.as_str(), |(k, _)| k.trim()),
                    value.split(',').map(str::to_string),
                ),
                _ => {
                    debug!(part = %part, "ignoring unknown rule part");
                    builder
                }
            };
        }

        if frequency.is_none() {
            return Err(RecurError::InvalidRule(format!("missing FREQ in '{}'", s.trim())));
        }
        Ok(builder.build())
    }
}

/// Parses a date or date-time in basic or extended ISO 8601 form.
///
/// Returns the value and whether it carried a trailing `Z`.
///
/// ```
/// use recur_core::parse::parse_calendar_value;
///
/// let (value, utc) = parse_calendar_value("19970902T090000Z").unwrap();
/// assert_eq!(value.to_string(), "19970902T090000");
/// assert!(utc);
/// ```
pub fn parse_calendar_value(input: &str) -> Result<(CalendarValue, bool)> {
    let trimmed = input.trim();
    let invalid = || {
        RecurError::ParseError(format!(
            "Invalid date or date-time: '{}'. Expected YYYYMMDD or YYYYMMDDTHHMMSS[Z]",
            trimmed
        ))
    };

    let (body, utc) = match trimmed.strip_suffix(['Z', 'z']) {
        Some(rest) => (rest, true),
        None => (trimmed, false),
    };
    let compact: String = body.chars().filter(|c| *c != '-' && *c != ':').collect();
    if !compact.is_ascii() {
        return Err(invalid());
    }

    let digits = |range: std::ops::Range<usize>| -> Result<u32> {
        compact
            .get(range)
            .filter(|s| s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)
    };

    let year = digits(0..4)? as i32;
    let month = digits(4..6)?;
    let day = digits(6..8)?;
    match compact.len() {
        8 if !utc => DateValue::new(year, month, day)
            .map(|d| (d.into(), false))
            .ok_or_else(invalid),
        15 if compact.as_bytes()[8].eq_ignore_ascii_case(&b'T') => {
            DateTimeValue::new(year, month, day, digits(9..11)?, digits(11..13)?, digits(13..15)?)
                .map(|dt| (dt.into(), utc))
                .ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

impl FromStr for CalendarValue {
    type Err = RecurError;

    fn from_str(s: &str) -> Result<Self> {
        parse_calendar_value(s).map(|(value, _)| value)
    }
}

/// The values of one `RDATE` or `EXDATE` line and the zone they are in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateLine {
    pub values: Vec<CalendarValue>,
    pub zone: Zone,
}

/// The recurrence properties of one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceLines {
    pub dtstart: CalendarValue,
    pub zone: Zone,
    pub rrules: Vec<RecurrenceSpec>,
    pub exrules: Vec<RecurrenceSpec>,
    pub rdates: Vec<DateLine>,
    pub exdates: Vec<DateLine>,
}

struct ContentLine<'a> {
    name: String,
    tzid: Option<&'a str>,
    value: &'a str,
}

fn split_content_line(line: &str) -> Result<ContentLine<'_>> {
    let (head, value) = line.split_once(':').ok_or_else(|| {
        RecurError::ParseError(format!("Invalid content line: '{}'. Expected NAME:VALUE", line))
    })?;
    let mut params = head.split(';');
    let name = params.next().unwrap_or_default().trim().to_ascii_uppercase();
    let tzid = params
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("TZID"))
        .map(|(_, v)| v.trim().trim_matches('"'));
    Ok(ContentLine {
        name,
        tzid,
        value: value.trim(),
    })
}

/// Joins folded lines (continuations start with a space or tab).
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.lines() {
        match (raw.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(rest), Some(last)) => last.push_str(rest),
            _ => lines.push(raw.trim_end().to_string()),
        }
    }
    lines
}

/// Parses one value list into dates, noting whether every entry was UTC.
fn parse_date_line(line: &ContentLine<'_>) -> Result<(Vec<CalendarValue>, bool)> {
    let mut values = Vec::new();
    let mut all_utc = true;
    for item in line.value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if item.contains('/') {
            return Err(RecurError::ParseError(format!(
                "{} period values are not supported: '{}'",
                line.name, item
            )));
        }
        let (value, utc) = parse_calendar_value(item)?;
        all_utc &= utc;
        values.push(value);
    }
    let nonempty = !values.is_empty();
    Ok((values, all_utc && nonempty))
}

impl RecurrenceLines {
    /// Parses `DTSTART`, `RRULE`, `EXRULE`, `RDATE` and `EXDATE` lines.
    ///
    /// Blank lines, `#` comments and other properties are skipped. `RDATE`
    /// and `EXDATE` values without their own `TZID` or `Z` are read in the
    /// zone of `DTSTART`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut dtstart: Option<(CalendarValue, Zone)> = None;
        let mut rrules = Vec::new();
        let mut exrules = Vec::new();
        let mut rdates: Vec<(Vec<CalendarValue>, Option<Zone>)> = Vec::new();
        let mut exdates: Vec<(Vec<CalendarValue>, Option<Zone>)> = Vec::new();

        for text_line in unfold(text) {
            let trimmed = text_line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let line = split_content_line(trimmed)?;
            match line.name.as_str() {
                "DTSTART" => {
                    let (value, utc) = parse_calendar_value(line.value)?;
                    let zone = match (utc, line.tzid, value) {
                        (_, _, CalendarValue::Date(_)) => Zone::Floating,
                        (true, _, _) => Zone::Utc,
                        (false, Some(tzid), _) => parse_zone(tzid)?,
                        (false, None, _) => Zone::Floating,
                    };
                    dtstart = Some((value, zone));
                }
                "RRULE" => rrules.push(line.value.parse()?),
                "EXRULE" => exrules.push(line.value.parse()?),
                "RDATE" | "EXDATE" => {
                    let (values, utc) = parse_date_line(&line)?;
                    let zone = match (utc, line.tzid) {
                        (true, _) => Some(Zone::Utc),
                        (false, Some(tzid)) => Some(parse_zone(tzid)?),
                        (false, None) => None,
                    };
                    if line.name == "RDATE" {
                        rdates.push((values, zone));
                    } else {
                        exdates.push((values, zone));
                    }
                }
                other => debug!(property = %other, "skipping property"),
            }
        }

        let (dtstart, zone) =
            dtstart.ok_or_else(|| RecurError::InvalidRule("missing DTSTART".to_string()))?;
        let resolve = |lines: Vec<(Vec<CalendarValue>, Option<Zone>)>| -> Vec<DateLine> {
            lines
                .into_iter()
                .map(|(values, line_zone)| DateLine {
                    values,
                    zone: line_zone.unwrap_or(zone),
                })
                .collect()
        };

        let lines = Self {
            dtstart,
            zone,
            rrules,
            exrules,
            rdates: resolve(rdates),
            exdates: resolve(exdates),
        };
        lines.check_zones()?;
        Ok(lines)
    }

    /// Rejects zoned or UTC date-times in a set whose `DTSTART` is floating.
    ///
    /// A floating set yields wall-clock values, which cannot be ordered
    /// against absolute instants.
    pub fn check_zones(&self) -> Result<()> {
        if !self.zone.is_floating() {
            return Ok(());
        }
        let lines = self.rdates.iter().map(|l| ("RDATE", l));
        let lines = lines.chain(self.exdates.iter().map(|l| ("EXDATE", l)));
        for (name, line) in lines {
            if line.zone.is_floating() {
                continue;
            }
            if let Some(value) = line.values.iter().find(|v| v.is_date_time()) {
                return Err(RecurError::ParseError(format!(
                    "{} value '{}' is in zone {} but DTSTART is floating",
                    name, value, line.zone
                )));
            }
        }
        Ok(())
    }
}

impl FromStr for RecurrenceLines {
    type Err = RecurError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> CalendarValue {
        DateValue::new(y, m, d).unwrap().into()
    }

    fn date_time(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> CalendarValue {
        DateTimeValue::new(y, m, d, h, mi, s).unwrap().into()
    }

    #[test]
    fn parse_monthly_rule() {
        let spec: RecurrenceSpec = "FREQ=MONTHLY;BYDAY=1FR;COUNT=3".parse().unwrap();
        assert_eq!(spec.frequency(), Frequency::Monthly);
        assert_eq!(spec.count(), Some(3));
        assert_eq!(spec.by_day(), &[WeekdayNum::nth(1, Weekday::Friday)]);
    }

    #[test]
    fn parse_is_case_insensitive_and_order_free() {
        let spec: RecurrenceSpec = "interval=2;freq=daily;wkst=su".parse().unwrap();
        assert_eq!(spec.frequency(), Frequency::Daily);
        assert_eq!(spec.interval(), 2);
        assert_eq!(spec.week_start(), Weekday::Sunday);
    }

    #[test]
    fn parse_accepts_property_prefix() {
        let spec: RecurrenceSpec = "RRULE:FREQ=WEEKLY;BYDAY=TU,TH".parse().unwrap();
        assert_eq!(spec.frequency(), Frequency::Weekly);
        assert_eq!(spec.by_day().len(), 2);
    }

    #[test]
    fn parse_until_forms() {
        let spec: RecurrenceSpec = "FREQ=DAILY;UNTIL=19971224T000000Z".parse().unwrap();
        assert_eq!(spec.until(), Some(date_time(1997, 12, 24, 0, 0, 0)));
        let spec: RecurrenceSpec = "FREQ=DAILY;UNTIL=19971224".parse().unwrap();
        assert_eq!(spec.until(), Some(date(1997, 12, 24)));
    }

    #[test]
    fn parse_negative_lists() {
        let spec: RecurrenceSpec =
            "FREQ=MONTHLY;BYMONTHDAY=-1,-3;BYDAY=-2MO;BYSETPOS=-1".parse().unwrap();
        assert_eq!(spec.by_month_day(), &[-1, -3]);
        assert_eq!(spec.by_day(), &[WeekdayNum::nth(-2, Weekday::Monday)]);
        assert_eq!(spec.by_set_pos(), &[-1]);
    }

    #[test]
    fn missing_freq_is_invalid_rule() {
        let err = "COUNT=3;BYDAY=MO".parse::<RecurrenceSpec>().unwrap_err();
        assert!(matches!(err, RecurError::InvalidRule(_)));
    }

    #[test]
    fn malformed_parts_are_parse_errors() {
        for input in [
            "FREQ=FORTNIGHTLY",
            "FREQ=DAILY;COUNT=abc",
            "FREQ=DAILY;BYMONTH=13",
            "FREQ=MONTHLY;BYMONTHDAY=0",
            "FREQ=MONTHLY;BYDAY=0MO",
            "FREQ=MONTHLY;BYDAY=XX",
            "FREQ=DAILY;BYHOUR",
        ] {
            let err = input.parse::<RecurrenceSpec>().unwrap_err();
            assert!(matches!(err, RecurError::ParseError(_)), "{input}: {err:?}");
        }
    }

    #[test]
    fn x_parts_are_kept_and_unknown_parts_dropped() {
        let spec: RecurrenceSpec = "FREQ=DAILY;X-FOO=a,b;RSCALE=GREGORIAN".parse().unwrap();
        assert_eq!(
            spec.x_rules(),
            &[("X-FOO".to_string(), vec!["a".to_string(), "b".to_string()])]
        );
        assert_eq!(spec.to_string(), "FREQ=DAILY;X-FOO=a,b");
    }

    #[test]
    fn display_output_parses_back() {
        let text = "FREQ=YEARLY;COUNT=10;INTERVAL=2;BYHOUR=8;BYDAY=-1SU;BYMONTH=10;WKST=SU";
        let spec: RecurrenceSpec = text.parse().unwrap();
        assert_eq!(spec.to_string(), text);
    }

    #[test]
    fn parse_values() {
        assert_eq!(parse_calendar_value("19970902").unwrap(), (date(1997, 9, 2), false));
        assert_eq!(
            parse_calendar_value("19970902T090000Z").unwrap(),
            (date_time(1997, 9, 2, 9, 0, 0), true)
        );
        assert_eq!(
            "2006-04-11T10:30:00".parse::<CalendarValue>().unwrap(),
            date_time(2006, 4, 11, 10, 30, 0)
        );
        assert!("19970231".parse::<CalendarValue>().is_err());
        assert!("19970902T250000".parse::<CalendarValue>().is_err());
        assert!("19970902Z".parse::<CalendarValue>().is_err());
        assert!("1997090".parse::<CalendarValue>().is_err());
        assert!("tomorrow".parse::<CalendarValue>().is_err());
    }

    #[test]
    fn parse_lines_with_zones() {
        let text = "\
DTSTART;TZID=America/New_York:19970902T090000
RRULE:FREQ=DAILY;COUNT=10
EXDATE:19970903T090000
RDATE;TZID=Europe/Berlin:19970910T150000
RDATE:19970911T120000Z
";
        let lines = RecurrenceLines::parse(text).unwrap();
        assert_eq!(lines.dtstart, date_time(1997, 9, 2, 9, 0, 0));
        assert_eq!(lines.zone, parse_zone("America/New_York").unwrap());
        assert_eq!(lines.rrules.len(), 1);
        assert_eq!(lines.exdates[0].zone, lines.zone);
        assert_eq!(lines.rdates[0].zone, parse_zone("Europe/Berlin").unwrap());
        assert_eq!(lines.rdates[1].zone, Zone::Utc);
    }

    #[test]
    fn utc_date_lines_need_every_value_in_utc() {
        let text = "\
DTSTART;TZID=Europe/Berlin:20260329T000000
RDATE:20260330T120000Z,20260331T120000Z
EXDATE:20260330T120000Z,20260331T140000
";
        let lines = RecurrenceLines::parse(text).unwrap();
        assert_eq!(lines.rdates[0].zone, Zone::Utc);
        assert_eq!(lines.rdates[0].values.len(), 2);
        assert_eq!(lines.exdates[0].zone, lines.zone);
    }

    #[test]
    fn floating_sets_reject_absolute_dates() {
        for extra in [
            "RDATE:19970910T090000Z",
            "EXDATE;TZID=Europe/Berlin:19970903T090000",
        ] {
            let text = format!("DTSTART:19970902T090000\nRRULE:FREQ=DAILY\n{extra}");
            let err = RecurrenceLines::parse(&text).unwrap_err();
            assert!(matches!(err, RecurError::ParseError(_)), "{extra}: {err:?}");
        }

        // Whole days carry no zone.
        let text = "DTSTART:19970902\nRDATE;TZID=Europe/Berlin:19970910";
        assert!(RecurrenceLines::parse(text).is_ok());
    }

    #[test]
    fn parse_lines_skips_comments_and_unfolds() {
        let text = "\
# weekly meeting
BEGIN:VEVENT
DTSTART:20060411
RRULE:FREQ=WEEKLY;
 COUNT=4
EXDATE:20060418,20060425
END:VEVENT
";
        let lines = RecurrenceLines::parse(text).unwrap();
        assert_eq!(lines.zone, Zone::Floating);
        assert_eq!(lines.rrules[0].count(), Some(4));
        assert_eq!(lines.exdates[0].values, vec![date(2006, 4, 18), date(2006, 4, 25)]);
    }

    #[test]
    fn parse_lines_requires_dtstart() {
        let err = RecurrenceLines::parse("RRULE:FREQ=DAILY").unwrap_err();
        assert!(matches!(err, RecurError::InvalidRule(_)));
    }

    #[test]
    fn parse_lines_rejects_periods() {
        let text = "DTSTART:19970101T180000Z\nRDATE;VALUE=PERIOD:19970101T180000Z/PT5H30M";
        assert!(RecurrenceLines::parse(text).is_err());
    }
}
