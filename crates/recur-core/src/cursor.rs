//! The mutable date cursor that generators write into.

use crate::calendar;
use crate::models::{CalendarValue, DateTimeValue, DateValue, Weekday};
use crate::recurrence::Frequency;

/// Calendar fields, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Level {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Level {
    pub(crate) const ALL: [Level; 6] = [
        Level::Year,
        Level::Month,
        Level::Day,
        Level::Hour,
        Level::Minute,
        Level::Second,
    ];

    /// The field a frequency counts in. Weeks are counted in days.
    pub(crate) fn unit_of(frequency: Frequency) -> Level {
        match frequency {
            Frequency::Yearly => Level::Year,
            Frequency::Monthly => Level::Month,
            Frequency::Weekly | Frequency::Daily => Level::Day,
            Frequency::Hourly => Level::Hour,
            Frequency::Minutely => Level::Minute,
            Frequency::Secondly => Level::Second,
        }
    }
}

/// A half-built date-time. Fields are written coarse to fine, so only the
/// fields above the level being generated are meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct DtBuilder {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl DtBuilder {
    pub(crate) fn from_value(value: &CalendarValue) -> Self {
        let dt = value.to_date_time();
        let date = dt.date();
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }

    /// Midnight of a day number.
    pub(crate) fn from_fixed_day(fixed: i64) -> Self {
        let (year, month, day) = calendar::civil_from_fixed(fixed);
        Self {
            year,
            month,
            day,
            ..Self::default()
        }
    }

    pub(crate) fn field(&self, level: Level) -> i64 {
        match level {
            Level::Year => i64::from(self.year),
            Level::Month => i64::from(self.month),
            Level::Day => i64::from(self.day),
            Level::Hour => i64::from(self.hour),
            Level::Minute => i64::from(self.minute),
            Level::Second => i64::from(self.second),
        }
    }

    pub(crate) fn set(&mut self, level: Level, value: u32) {
        match level {
            Level::Year => self.year = value as i32,
            Level::Month => self.month = value,
            Level::Day => self.day = value,
            Level::Hour => self.hour = value,
            Level::Minute => self.minute = value,
            Level::Second => self.second = value,
        }
    }

    pub(crate) fn fixed_day(&self) -> i64 {
        calendar::fixed_day(self.year, self.month, self.day)
    }

    pub(crate) fn weekday(&self) -> Weekday {
        calendar::weekday_of_fixed(self.fixed_day())
    }

    /// Absolute index of the cursor counted in units of `level`
    /// (months since year 0, days since the epoch, hours since the epoch...).
    pub(crate) fn unit_index(&self, level: Level) -> i64 {
        let hours = || self.fixed_day() * 24 + i64::from(self.hour);
        match level {
            Level::Year => i64::from(self.year),
            Level::Month => i64::from(self.year) * 12 + i64::from(self.month) - 1,
            Level::Day => self.fixed_day(),
            Level::Hour => hours(),
            Level::Minute => hours() * 60 + i64::from(self.minute),
            Level::Second => (hours() * 60 + i64::from(self.minute)) * 60 + i64::from(self.second),
        }
    }

    /// Key shared by every cursor in the same `frequency` period.
    pub(crate) fn period_index(&self, frequency: Frequency, week_start: Weekday) -> i64 {
        match frequency {
            Frequency::Weekly => calendar::week_start_of(self.fixed_day(), week_start),
            other => self.unit_index(Level::unit_of(other)),
        }
    }

    /// The first instant of the `frequency` period containing the cursor.
    pub(crate) fn period_start(&self, frequency: Frequency, week_start: Weekday) -> Self {
        let mut start = *self;
        match frequency {
            Frequency::Yearly => {
                start = Self::from_fixed_day(calendar::fixed_day(self.year, 1, 1));
            }
            Frequency::Monthly => {
                start = Self::from_fixed_day(calendar::fixed_day(self.year, self.month, 1));
            }
            Frequency::Weekly => {
                start = Self::from_fixed_day(calendar::week_start_of(self.fixed_day(), week_start));
            }
            Frequency::Daily => {
                start = Self::from_fixed_day(self.fixed_day());
            }
            Frequency::Hourly => {
                start.minute = 0;
                start.second = 0;
            }
            Frequency::Minutely => start.second = 0,
            Frequency::Secondly => {}
        }
        start
    }

    /// Snapshot as a value. Generators only write days that exist in their
    /// month, so every cursor that reaches here is a real date.
    pub(crate) fn to_value(&self, date_only: bool) -> CalendarValue {
        if date_only {
            DateValue::from_fixed_day(self.fixed_day()).into()
        } else {
            DateTimeValue::from_epoch_seconds(self.unit_index(Level::Second)).into()
        }
    }
}
