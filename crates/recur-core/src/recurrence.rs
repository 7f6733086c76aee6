//! Recurrence specifications.
//!
//! A [`RecurrenceSpec`] is the immutable description of one RRULE or EXRULE.
//! It is assembled with a [`RecurrenceSpecBuilder`] (or parsed from text, see
//! [`crate::parse`]) and can be shared by any number of iterators.

use std::fmt;

use serde::Serialize;

use crate::models::{CalendarValue, Weekday};

/// How often a rule repeats. Variants are ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Frequency::Secondly => "SECONDLY",
            Frequency::Minutely => "MINUTELY",
            Frequency::Hourly => "HOURLY",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        };
        f.write_str(token)
    }
}

/// A BYDAY entry: a weekday, optionally with a signed ordinal
/// (`2TU` is the second Tuesday, `-1FR` the last Friday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WeekdayNum {
    pub ordinal: Option<i32>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Every `weekday` in the period.
    pub fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// The `ordinal`th `weekday` in the period; negative counts from the end.
    pub fn nth(ordinal: i32, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

impl From<Weekday> for WeekdayNum {
    fn from(weekday: Weekday) -> Self {
        Self::every(weekday)
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ordinal {
            Some(n) => write!(f, "{}{}", n, self.weekday),
            None => write!(f, "{}", self.weekday),
        }
    }
}

/// An immutable recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSpec {
    frequency: Frequency,
    interval: u32,
    count: Option<u32>,
    until: Option<CalendarValue>,
    week_start: Weekday,
    by_second: Vec<u32>,
    by_minute: Vec<u32>,
    by_hour: Vec<u32>,
    by_day: Vec<WeekdayNum>,
    by_month_day: Vec<i32>,
    by_year_day: Vec<i32>,
    by_week_no: Vec<i32>,
    by_month: Vec<u32>,
    by_set_pos: Vec<i32>,
    x_rules: Vec<(String, Vec<String>)>,
}

impl RecurrenceSpec {
    /// Starts a builder for a rule repeating at `frequency`.
    pub fn builder(frequency: Frequency) -> RecurrenceSpecBuilder {
        RecurrenceSpecBuilder::new(frequency)
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn count(&self) -> Option<u32> {
        self.count
    }

    pub fn until(&self) -> Option<CalendarValue> {
        self.until
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn by_second(&self) -> &[u32] {
        &self.by_second
    }

    pub fn by_minute(&self) -> &[u32] {
        &self.by_minute
    }

    pub fn by_hour(&self) -> &[u32] {
        &self.by_hour
    }

    pub fn by_day(&self) -> &[WeekdayNum] {
        &self.by_day
    }

    pub fn by_month_day(&self) -> &[i32] {
        &self.by_month_day
    }

    pub fn by_year_day(&self) -> &[i32] {
        &self.by_year_day
    }

    pub fn by_week_no(&self) -> &[i32] {
        &self.by_week_no
    }

    pub fn by_month(&self) -> &[u32] {
        &self.by_month
    }

    pub fn by_set_pos(&self) -> &[i32] {
        &self.by_set_pos
    }

    /// Non-standard `X-` parts, in the order they were given.
    pub fn x_rules(&self) -> &[(String, Vec<String>)] {
        &self.x_rules
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, key: &str, values: &[T]) -> fmt::Result {
    if values.is_empty() {
        return Ok(());
    }
    write!(f, ";{key}=")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl fmt::Display for RecurrenceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.frequency)?;
        match self.until {
            Some(CalendarValue::DateTime(dt)) => write!(f, ";UNTIL={dt}Z")?,
            Some(CalendarValue::Date(d)) => write!(f, ";UNTIL={d}")?,
            None => {}
        }
        if let Some(count) = self.count {
            write!(f, ";COUNT={count}")?;
        }
        if self.interval != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        write_list(f, "BYSECOND", &self.by_second)?;
        write_list(f, "BYMINUTE", &self.by_minute)?;
        write_list(f, "BYHOUR", &self.by_hour)?;
        write_list(f, "BYDAY", &self.by_day)?;
        write_list(f, "BYMONTHDAY", &self.by_month_day)?;
        write_list(f, "BYYEARDAY", &self.by_year_day)?;
        write_list(f, "BYWEEKNO", &self.by_week_no)?;
        write_list(f, "BYMONTH", &self.by_month)?;
        write_list(f, "BYSETPOS", &self.by_set_pos)?;
        if self.week_start != Weekday::Monday {
            write!(f, ";WKST={}", self.week_start)?;
        }
        for (name, values) in &self.x_rules {
            write!(f, ";{name}={}", values.join(","))?;
        }
        Ok(())
    }
}

/// Fluent builder for [`RecurrenceSpec`].
///
/// ```
/// use recur_core::{Frequency, RecurrenceSpec, Weekday, WeekdayNum};
///
/// let spec = RecurrenceSpec::builder(Frequency::Monthly)
///     .by_day([WeekdayNum::nth(1, Weekday::Friday)])
///     .count(3)
///     .build();
/// assert_eq!(spec.to_string(), "FREQ=MONTHLY;COUNT=3;BYDAY=1FR");
/// ```
#[derive(Debug, Clone)]
pub struct RecurrenceSpecBuilder {
    spec: RecurrenceSpec,
}

impl RecurrenceSpecBuilder {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            spec: RecurrenceSpec {
                frequency,
                interval: 1,
                count: None,
                until: None,
                week_start: Weekday::Monday,
                by_second: Vec::new(),
                by_minute: Vec::new(),
                by_hour: Vec::new(),
                by_day: Vec::new(),
                by_month_day: Vec::new(),
                by_year_day: Vec::new(),
                by_week_no: Vec::new(),
                by_month: Vec::new(),
                by_set_pos: Vec::new(),
                x_rules: Vec::new(),
            },
        }
    }

    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.spec.frequency = frequency;
        self
    }

    /// Sets the interval; zero is treated as one.
    pub fn interval(mut self, interval: u32) -> Self {
        self.spec.interval = interval.max(1);
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.spec.count = Some(count);
        self
    }

    pub fn until(mut self, until: impl Into<CalendarValue>) -> Self {
        self.spec.until = Some(until.into());
        self
    }

    pub fn week_start(mut self, week_start: Weekday) -> Self {
        self.spec.week_start = week_start;
        self
    }

    pub fn by_second(mut self, values: impl IntoIterator<Item = u32>) -> Self {
        self.spec.by_second = values.into_iter().collect();
        self
    }

    pub fn by_minute(mut self, values: impl IntoIterator<Item = u32>) -> Self {
        self.spec.by_minute = values.into_iter().collect();
        self
    }

    pub fn by_hour(mut self, values: impl IntoIterator<Item = u32>) -> Self {
        self.spec.by_hour = values.into_iter().collect();
        self
    }

    pub fn by_day(mut self, values: impl IntoIterator<Item = WeekdayNum>) -> Self {
        self.spec.by_day = values.into_iter().collect();
        self
    }

    pub fn by_month_day(mut self, values: impl IntoIterator<Item = i32>) -> Self {
        self.spec.by_month_day = values.into_iter().collect();
        self
    }

    pub fn by_year_day(mut self, values: impl IntoIterator<Item = i32>) -> Self {
        self.spec.by_year_day = values.into_iter().collect();
        self
    }

    pub fn by_week_no(mut self, values: impl IntoIterator<Item = i32>) -> Self {
        self.spec.by_week_no = values.into_iter().collect();
        self
    }

    pub fn by_month(mut self, values: impl IntoIterator<Item = u32>) -> Self {
        self.spec.by_month = values.into_iter().collect();
        self
    }

    pub fn by_set_pos(mut self, values: impl IntoIterator<Item = i32>) -> Self {
        self.spec.by_set_pos = values.into_iter().collect();
        self
    }

    /// Appends a non-standard `X-` part. It is kept but never interpreted.
    pub fn x_rule(mut self, name: impl Into<String>, values: impl IntoIterator<Item = String>) -> Self {
        self.spec
            .x_rules
            .push((name.into(), values.into_iter().collect()));
        self
    }

    pub fn build(self) -> RecurrenceSpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateTimeValue, DateValue};

    #[test]
    fn builder_defaults() {
        let spec = RecurrenceSpec::builder(Frequency::Daily).build();
        assert_eq!(spec.interval(), 1);
        assert_eq!(spec.week_start(), Weekday::Monday);
        assert_eq!(spec.count(), None);
        assert_eq!(spec.until(), None);
        assert!(spec.by_day().is_empty());
        assert_eq!(spec.to_string(), "FREQ=DAILY");
    }

    #[test]
    fn zero_interval_is_clamped() {
        let spec = RecurrenceSpec::builder(Frequency::Weekly).interval(0).build();
        assert_eq!(spec.interval(), 1);
    }

    #[test]
    fn display_orders_parts() {
        let spec = RecurrenceSpec::builder(Frequency::Yearly)
            .interval(2)
            .by_month([1])
            .by_day([WeekdayNum::every(Weekday::Sunday)])
            .by_hour([8, 9])
            .by_minute([30])
            .week_start(Weekday::Sunday)
            .until(DateTimeValue::new(1999, 1, 31, 14, 0, 0).unwrap())
            .x_rule("X-NAME", ["a".to_string(), "b".to_string()])
            .build();
        assert_eq!(
            spec.to_string(),
            "FREQ=YEARLY;UNTIL=19990131T140000Z;INTERVAL=2;BYMINUTE=30;BYHOUR=8,9;\
             BYDAY=SU;BYMONTH=1;WKST=SU;X-NAME=a,b"
        );
    }

    #[test]
    fn date_until_has_no_zone_suffix() {
        let spec = RecurrenceSpec::builder(Frequency::Daily)
            .until(DateValue::new(1997, 12, 24).unwrap())
            .build();
        assert_eq!(spec.to_string(), "FREQ=DAILY;UNTIL=19971224");
    }

    #[test]
    fn weekday_num_display() {
        assert_eq!(WeekdayNum::nth(-1, Weekday::Friday).to_string(), "-1FR");
        assert_eq!(WeekdayNum::nth(20, Weekday::Monday).to_string(), "20MO");
        assert_eq!(WeekdayNum::from(Weekday::Tuesday).to_string(), "TU");
    }

    #[test]
    fn frequency_order_runs_fine_to_coarse() {
        assert!(Frequency::Secondly < Frequency::Daily);
        assert!(Frequency::Weekly < Frequency::Yearly);
        assert_eq!(serde_json::to_string(&Frequency::Monthly).unwrap(), "\"MONTHLY\"");
    }
}
