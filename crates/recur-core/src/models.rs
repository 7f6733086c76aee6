//! Core value types for recur.
//!
//! This module defines the date values the engine consumes and produces:
//! - [`Weekday`] - Day of the week, written with RFC 5545 tokens
//! - [`DateValue`] - A calendar date (a whole day)
//! - [`DateTimeValue`] - A date with a time of day, no leap seconds
//! - [`CalendarValue`] - Either of the two, with a single total order

use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

use crate::calendar;

/// Day of the week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Weekday {
    #[default]
    #[serde(rename = "MO")]
    Monday,
    #[serde(rename = "TU")]
    Tuesday,
    #[serde(rename = "WE")]
    Wednesday,
    #[serde(rename = "TH")]
    Thursday,
    #[serde(rename = "FR")]
    Friday,
    #[serde(rename = "SA")]
    Saturday,
    #[serde(rename = "SU")]
    Sunday,
}

impl Weekday {
    /// All weekdays, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Days since Monday (Monday = 0, Sunday = 6).
    pub fn monday_index(self) -> u32 {
        self as u32
    }

    /// Inverse of [`Weekday::monday_index`], taken modulo 7.
    pub fn from_monday_index(index: u32) -> Self {
        Self::ALL[(index % 7) as usize]
    }

    /// The two-letter RFC 5545 token.
    pub fn token(self) -> &'static str {
        match self {
            Weekday::Monday => "MO",
            Weekday::Tuesday => "TU",
            Weekday::Wednesday => "WE",
            Weekday::Thursday => "TH",
            Weekday::Friday => "FR",
            Weekday::Saturday => "SA",
            Weekday::Sunday => "SU",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(weekday: chrono::Weekday) -> Self {
        Self::from_monday_index(weekday.num_days_from_monday())
    }
}

impl From<Weekday> for chrono::Weekday {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

/// A calendar date. Ordered by year, then month, then day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateValue {
    year: i32,
    month: u32,
    day: u32,
}

impl DateValue {
    /// Creates a date, or `None` if the month or day is out of range.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        (1..=12).contains(&month)
            .then(|| calendar::month_length(year, month))
            .filter(|len| (1..=*len).contains(&day))
            .map(|_| Self { year, month, day })
    }

    /// Builds a date from a day number (days since 1970-01-01).
    pub fn from_fixed_day(fixed: i64) -> Self {
        let (year, month, day) = calendar::civil_from_fixed(fixed);
        Self { year, month, day }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Days since 1970-01-01.
    pub fn fixed_day(&self) -> i64 {
        calendar::fixed_day(self.year, self.month, self.day)
    }

    pub fn weekday(&self) -> Weekday {
        calendar::weekday_of(self.year, self.month, self.day)
    }

    /// 1-based day of the year.
    pub fn day_of_year(&self) -> u32 {
        calendar::day_of_year(self.year, self.month, self.day)
    }

    /// The date `days` days later (or earlier, when negative).
    pub fn add_days(&self, days: i64) -> Self {
        Self::from_fixed_day(self.fixed_day() + days)
    }

    /// Attaches a time of day, or `None` if the time is out of range.
    pub fn and_time(self, hour: u32, minute: u32, second: u32) -> Option<DateTimeValue> {
        (hour < 24 && minute < 60 && second < 60).then_some(DateTimeValue {
            date: self,
            hour,
            minute,
            second,
        })
    }

    /// Midnight at the start of this day.
    pub fn at_midnight(self) -> DateTimeValue {
        DateTimeValue {
            date: self,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    pub fn to_naive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for DateValue {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// A date with a time of day. Ordered by date, then time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateTimeValue {
    date: DateValue,
    hour: u32,
    minute: u32,
    second: u32,
}

impl DateTimeValue {
    /// Creates a date-time, or `None` if any field is out of range.
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Option<Self> {
        DateValue::new(year, month, day)?.and_time(hour, minute, second)
    }

    pub fn date(&self) -> DateValue {
        self.date
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    /// Seconds since 1970-01-01T00:00:00 on the same clock.
    pub fn epoch_seconds(&self) -> i64 {
        self.date.fixed_day() * 86_400
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    /// Inverse of [`DateTimeValue::epoch_seconds`].
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        let date = DateValue::from_fixed_day(seconds.div_euclid(86_400));
        let rem = seconds.rem_euclid(86_400) as u32;
        Self {
            date,
            hour: rem / 3600,
            minute: rem / 60 % 60,
            second: rem % 60,
        }
    }

    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        self.date
            .to_naive()?
            .and_hms_opt(self.hour, self.minute, self.second)
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}T{:02}{:02}{:02}",
            self.date, self.hour, self.minute, self.second
        )
    }
}

impl From<NaiveDateTime> for DateTimeValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            date: dt.date().into(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second().min(59),
        }
    }
}

/// A date or a date-time.
///
/// Values are totally ordered through [`CalendarValue::comparable`]: a date
/// sorts immediately before midnight of the same day and after every
/// date-time of the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarValue {
    Date(DateValue),
    DateTime(DateTimeValue),
}

impl CalendarValue {
    /// Packs the value into a signed 64-bit key whose integer order is the
    /// value order.
    ///
    /// Layout, low bits first: second (6), minute (6), hour (5), a time flag
    /// (1) that is clear for dates, day (5), month (4), then the year.
    pub fn comparable(&self) -> i64 {
        let (date, flag, hour, minute, second) = match self {
            CalendarValue::Date(d) => (*d, 0, 0, 0, 0),
            CalendarValue::DateTime(dt) => (dt.date, 1, dt.hour, dt.minute, dt.second),
        };
        (i64::from(date.year) << 27)
            + (i64::from(date.month) << 23)
            + (i64::from(date.day) << 18)
            + (flag << 17)
            + (i64::from(hour) << 12)
            + (i64::from(minute) << 6)
            + i64::from(second)
    }

    pub fn date(&self) -> DateValue {
        match self {
            CalendarValue::Date(d) => *d,
            CalendarValue::DateTime(dt) => dt.date,
        }
    }

    pub fn is_date_time(&self) -> bool {
        matches!(self, CalendarValue::DateTime(_))
    }

    /// The value as a date-time; dates become midnight.
    pub fn to_date_time(&self) -> DateTimeValue {
        match self {
            CalendarValue::Date(d) => d.at_midnight(),
            CalendarValue::DateTime(dt) => *dt,
        }
    }
}

impl Ord for CalendarValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.comparable().cmp(&other.comparable())
    }
}

impl PartialOrd for CalendarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CalendarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarValue::Date(d) => d.fmt(f),
            CalendarValue::DateTime(dt) => dt.fmt(f),
        }
    }
}

impl Serialize for CalendarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<DateValue> for CalendarValue {
    fn from(date: DateValue) -> Self {
        CalendarValue::Date(date)
    }
}

impl From<DateTimeValue> for CalendarValue {
    fn from(dt: DateTimeValue) -> Self {
        CalendarValue::DateTime(dt)
    }
}

impl From<NaiveDate> for CalendarValue {
    fn from(date: NaiveDate) -> Self {
        CalendarValue::Date(date.into())
    }
}

impl From<NaiveDateTime> for CalendarValue {
    fn from(dt: NaiveDateTime) -> Self {
        CalendarValue::DateTime(dt.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> CalendarValue {
        DateValue::new(y, m, d).unwrap().into()
    }

    fn date_time(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> CalendarValue {
        DateTimeValue::new(y, m, d, h, mi, s).unwrap().into()
    }

    #[test]
    fn weekday_default_is_monday() {
        assert_eq!(Weekday::default(), Weekday::Monday);
    }

    #[test]
    fn weekday_display_and_serialization() {
        assert_eq!(format!("{}", Weekday::Thursday), "TH");
        assert_eq!(serde_json::to_string(&Weekday::Sunday).unwrap(), "\"SU\"");
    }

    #[test]
    fn weekday_chrono_round_trip() {
        for weekday in Weekday::ALL {
            let chrono_day: chrono::Weekday = weekday.into();
            assert_eq!(Weekday::from(chrono_day), weekday);
        }
    }

    #[test]
    fn date_value_validation() {
        assert!(DateValue::new(2024, 2, 29).is_some());
        assert!(DateValue::new(2023, 2, 29).is_none());
        assert!(DateValue::new(2023, 13, 1).is_none());
        assert!(DateValue::new(2023, 4, 0).is_none());
        assert!(DateTimeValue::new(2023, 4, 1, 24, 0, 0).is_none());
        assert!(DateTimeValue::new(2023, 4, 1, 23, 59, 59).is_some());
    }

    #[test]
    fn display_uses_basic_format() {
        assert_eq!(date(1997, 9, 2).to_string(), "19970902");
        assert_eq!(date_time(1997, 9, 2, 9, 5, 0).to_string(), "19970902T090500");
        assert_eq!(
            serde_json::to_string(&date_time(2006, 4, 11, 0, 0, 0)).unwrap(),
            "\"20060411T000000\""
        );
    }

    #[test]
    fn date_sorts_immediately_before_midnight() {
        let day = date(2006, 4, 11);
        let midnight = date_time(2006, 4, 11, 0, 0, 0);
        let previous_evening = date_time(2006, 4, 10, 23, 59, 59);
        assert!(previous_evening < day);
        assert!(day < midnight);
        assert_ne!(day, midnight);
        assert!(midnight < date_time(2006, 4, 11, 0, 0, 1));
        assert!(date_time(2006, 4, 11, 23, 59, 59) < date(2006, 4, 12));
    }

    #[test]
    fn negative_years_keep_order() {
        assert!(date(-1, 12, 31) < date(0, 1, 1));
        assert!(date(-5, 6, 1) < date(-4, 1, 1));
    }

    #[test]
    fn chrono_conversions() {
        let naive = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let day = DateValue::from(naive);
        assert_eq!(day.to_naive(), Some(naive));
        let at_noon = naive.and_hms_opt(12, 30, 0).unwrap();
        assert_eq!(DateTimeValue::from(at_noon).to_naive(), Some(at_noon));
    }

    #[test]
    fn epoch_seconds_round_trip() {
        let dt = DateTimeValue::new(1969, 12, 31, 23, 0, 1).unwrap();
        assert_eq!(dt.epoch_seconds(), -3599);
        assert_eq!(DateTimeValue::from_epoch_seconds(-3599), dt);
    }

    fn arb_value() -> impl Strategy<Value = CalendarValue> {
        (
            1900i32..2100,
            1u32..=12,
            1u32..=28,
            proptest::option::of((0u32..24, 0u32..60, 0u32..60)),
        )
            .prop_map(|(y, m, d, time)| match time {
                Some((h, mi, s)) => date_time(y, m, d, h, mi, s),
                None => date(y, m, d),
            })
    }

    /// Field-wise order: date, then "has time", then time of day.
    fn field_key(v: &CalendarValue) -> (DateValue, bool, u32, u32, u32) {
        match v {
            CalendarValue::Date(d) => (*d, false, 0, 0, 0),
            CalendarValue::DateTime(dt) => (dt.date(), true, dt.hour(), dt.minute(), dt.second()),
        }
    }

    proptest! {
        #[test]
        fn prop_comparable_agrees_with_fields(a in arb_value(), b in arb_value()) {
            prop_assert_eq!(a.cmp(&b), field_key(&a).cmp(&field_key(&b)));
            prop_assert_eq!(a == b, a.comparable() == b.comparable());
        }

        #[test]
        fn prop_order_is_antisymmetric(a in arb_value(), b in arb_value()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }

        #[test]
        fn prop_order_is_transitive(a in arb_value(), b in arb_value(), c in arb_value()) {
            if a <= b && b <= c {
                prop_assert!(a <= c);
            }
        }
    }
}
