//! Per-field candidate generators.
//!
//! Each generator owns one calendar field. Whenever a coarser field changes
//! it is [`reset`](Generator::reset) against the cursor and recomputes the
//! ascending candidate values for the new period; [`advance`](Generator::advance)
//! then hands them out one at a time until the period is exhausted.

use tracing::debug;

use crate::calendar;
use crate::cursor::{DtBuilder, Level};
use crate::models::Weekday;
use crate::recurrence::WeekdayNum;

/// Years past this are never generated.
pub(crate) const MAX_YEAR: i64 = 9999;

/// Consecutive years without a single instance before a rule is abandoned.
/// The Gregorian calendar repeats every 400 years, so a year pattern that is
/// empty for 400 steps stays empty.
pub(crate) const MAX_IDLE_YEARS: u32 = 400;

/// The period an ordinal BYDAY entry counts within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DayScope {
    Month,
    Year,
    /// Ordinals are ignored and only the weekday matters.
    Week,
}

/// The closed set of ways a field below the year can be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GeneratorKind {
    /// Every `interval`th unit counted from `anchor` (a [`DtBuilder::unit_index`]).
    Serial { interval: u32, anchor: i64 },
    /// A fixed ascending list of field values.
    List(Vec<u32>),
    /// Signed days of the month.
    MonthDay(Vec<i32>),
    /// Weekdays, optionally with ordinals.
    ByDay { days: Vec<WeekdayNum>, scope: DayScope },
    /// Weekdays of every `interval`th week counted from `anchor_week`.
    Weekly {
        weekdays: Vec<Weekday>,
        interval: u32,
        anchor_week: i64,
        week_start: Weekday,
    },
    /// Signed days of the year.
    YearDay(Vec<i32>),
    /// Every day of the given signed week numbers.
    WeekNo { weeks: Vec<i32>, week_start: Weekday },
}

#[derive(Debug, Clone)]
pub(crate) struct Generator {
    level: Level,
    kind: GeneratorKind,
    values: Vec<u32>,
    next: usize,
}

impl Generator {
    pub(crate) fn new(level: Level, kind: GeneratorKind) -> Self {
        Self {
            level,
            kind,
            values: Vec::new(),
            next: 0,
        }
    }

    pub(crate) fn level(&self) -> Level {
        self.level
    }

    /// Recomputes candidates for the period fixed by the cursor's coarser
    /// fields, dropping values below `min`.
    pub(crate) fn reset(&mut self, cursor: &DtBuilder, min: Option<u32>) {
        self.values = self.candidates(cursor);
        if let Some(min) = min {
            self.values.retain(|v| *v >= min);
        }
        self.next = 0;
    }

    /// The next candidate of the current period.
    pub(crate) fn advance(&mut self) -> Option<u32> {
        let value = self.values.get(self.next).copied()?;
        self.next += 1;
        Some(value)
    }

    fn candidates(&self, cursor: &DtBuilder) -> Vec<u32> {
        let mut values = match &self.kind {
            GeneratorKind::Serial { interval, anchor } => serial(self.level, cursor, *interval, *anchor),
            GeneratorKind::List(values) => values.clone(),
            GeneratorKind::MonthDay(days) => {
                let len = calendar::month_length(cursor.year, cursor.month);
                days.iter()
                    .filter_map(|d| calendar::resolve_ordinal(*d, len))
                    .collect()
            }
            GeneratorKind::ByDay { days, scope } => by_day(cursor, days, *scope),
            GeneratorKind::Weekly {
                weekdays,
                interval,
                anchor_week,
                week_start,
            } => days_of_month(cursor)
                .filter(|(_, fixed)| {
                    let week = calendar::week_start_of(*fixed, *week_start);
                    weekdays.contains(&calendar::weekday_of_fixed(*fixed))
                        && ((week - anchor_week) / 7).rem_euclid(i64::from(*interval)) == 0
                })
                .map(|(day, _)| day)
                .collect(),
            GeneratorKind::YearDay(days) => {
                let len = calendar::year_length(cursor.year);
                days.iter()
                    .filter_map(|d| calendar::resolve_ordinal(*d, len))
                    .filter_map(|doy| calendar::month_day_of(cursor.year, doy))
                    .filter(|(month, _)| *month == cursor.month)
                    .map(|(_, day)| day)
                    .collect()
            }
            GeneratorKind::WeekNo { weeks, week_start } => days_of_month(cursor)
                .filter(|(day, _)| in_weeks(cursor.year, cursor.month, *day, weeks, *week_start))
                .map(|(day, _)| day)
                .collect(),
        };
        values.sort_unstable();
        values.dedup();
        values
    }
}

/// Days of the cursor's month paired with their day numbers.
fn days_of_month(cursor: &DtBuilder) -> impl Iterator<Item = (u32, i64)> {
    let first = calendar::fixed_day(cursor.year, cursor.month, 1);
    let len = calendar::month_length(cursor.year, cursor.month);
    (1..=len).map(move |day| (day, first + i64::from(day) - 1))
}

fn serial(level: Level, cursor: &DtBuilder, interval: u32, anchor: i64) -> Vec<u32> {
    // First unit index of the period and the field value it carries.
    let (base, first_value, len) = match level {
        Level::Year => return Vec::new(),
        Level::Month => (i64::from(cursor.year) * 12, 1, 12),
        Level::Day => (
            calendar::fixed_day(cursor.year, cursor.month, 1),
            1,
            calendar::month_length(cursor.year, cursor.month),
        ),
        Level::Hour => (cursor.fixed_day() * 24, 0, 24),
        Level::Minute => (cursor.unit_index(Level::Hour) * 60, 0, 60),
        Level::Second => (cursor.unit_index(Level::Minute) * 60, 0, 60),
    };
    let step = i64::from(interval.max(1));
    let offset = (anchor - base).rem_euclid(step);
    (offset..i64::from(len))
        .step_by(step as usize)
        .map(|o| first_value + o as u32)
        .collect()
}

fn by_day(cursor: &DtBuilder, days: &[WeekdayNum], scope: DayScope) -> Vec<u32> {
    let month_first = calendar::fixed_day(cursor.year, cursor.month, 1);
    let month_len = calendar::month_length(cursor.year, cursor.month);
    let month_last = month_first + i64::from(month_len) - 1;
    let mut out = Vec::new();
    for entry in days {
        match (entry.ordinal, scope) {
            (Some(n), DayScope::Month) => {
                if let Some(fixed) = calendar::nth_weekday(month_first, month_len, entry.weekday, n) {
                    out.push((fixed - month_first) as u32 + 1);
                }
            }
            (Some(n), DayScope::Year) => {
                let year_first = calendar::fixed_day(cursor.year, 1, 1);
                let year_len = calendar::year_length(cursor.year);
                let nth = calendar::nth_weekday(year_first, year_len, entry.weekday, n)
                    .filter(|fixed| (month_first..=month_last).contains(fixed));
                if let Some(fixed) = nth {
                    out.push((fixed - month_first) as u32 + 1);
                }
            }
            _ => out.extend(
                days_of_month(cursor)
                    .filter(|(_, fixed)| calendar::weekday_of_fixed(*fixed) == entry.weekday)
                    .map(|(day, _)| day),
            ),
        }
    }
    out
}

/// True if the date lies in one of the signed `weeks` of its week-numbering year.
pub(crate) fn in_weeks(year: i32, month: u32, day: u32, weeks: &[i32], week_start: Weekday) -> bool {
    let (week_year, week) = calendar::week_number(year, month, day, week_start);
    let count = calendar::weeks_in_year(week_year, week_start);
    weeks
        .iter()
        .any(|w| calendar::resolve_ordinal(*w, count) == Some(week))
}

/// The serial year counter at the top of every generator chain.
#[derive(Debug, Clone)]
pub(crate) struct YearSerial {
    interval: i64,
    anchor: i64,
    next: i64,
    idle: u32,
}

impl YearSerial {
    pub(crate) fn new(interval: u32, anchor: i32) -> Self {
        Self {
            interval: i64::from(interval.max(1)),
            anchor: i64::from(anchor),
            next: i64::from(anchor),
            idle: 0,
        }
    }

    /// Restarts at the first aligned year on or after `year`.
    pub(crate) fn start_at(&mut self, year: i32) {
        let year = i64::from(year);
        self.next = year + (self.anchor - year).rem_euclid(self.interval);
        self.idle = 0;
    }

    pub(crate) fn advance(&mut self) -> Option<i32> {
        if self.next > MAX_YEAR {
            return None;
        }
        if self.idle >= MAX_IDLE_YEARS {
            if self.idle == MAX_IDLE_YEARS {
                debug!(
                    years = MAX_IDLE_YEARS,
                    last_year = self.next - self.interval,
                    "no instances in consecutive years, giving up"
                );
                self.idle += 1;
            }
            return None;
        }
        let year = self.next;
        self.next += self.interval;
        self.idle += 1;
        Some(year as i32)
    }

    /// Records that the current year produced an instance.
    pub(crate) fn work_done(&mut self) {
        self.idle = 0;
    }
}
