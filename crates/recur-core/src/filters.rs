//! Limiting BYxxx parts.
//!
//! A filter is checked as soon as the finest field it reads has been
//! generated, so a failing month is rejected before any of its days are
//! enumerated.

use crate::calendar;
use crate::cursor::{DtBuilder, Level};
use crate::generators::{DayScope, in_weeks};
use crate::models::Weekday;
use crate::recurrence::WeekdayNum;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Filter {
    ByMonth(Vec<u32>),
    ByMonthDay(Vec<i32>),
    ByDay { days: Vec<WeekdayNum>, scope: DayScope },
    ByYearDay(Vec<i32>),
    ByWeekNo { weeks: Vec<i32>, week_start: Weekday },
    ByHour(Vec<u32>),
    ByMinute(Vec<u32>),
    BySecond(Vec<u32>),
}

impl Filter {
    /// The field after which the filter can be evaluated.
    pub(crate) fn level(&self) -> Level {
        match self {
            Filter::ByMonth(_) => Level::Month,
            Filter::ByMonthDay(_)
            | Filter::ByDay { .. }
            | Filter::ByYearDay(_)
            | Filter::ByWeekNo { .. } => Level::Day,
            Filter::ByHour(_) => Level::Hour,
            Filter::ByMinute(_) => Level::Minute,
            Filter::BySecond(_) => Level::Second,
        }
    }

    pub(crate) fn matches(&self, cursor: &DtBuilder) -> bool {
        match self {
            Filter::ByMonth(months) => months.contains(&cursor.month),
            Filter::ByMonthDay(days) => {
                let len = calendar::month_length(cursor.year, cursor.month);
                days.iter()
                    .any(|d| calendar::resolve_ordinal(*d, len) == Some(cursor.day))
            }
            Filter::ByDay { days, scope } => matches_weekday(cursor, days, *scope),
            Filter::ByYearDay(days) => {
                let len = calendar::year_length(cursor.year);
                let doy = calendar::day_of_year(cursor.year, cursor.month, cursor.day);
                days.iter()
                    .any(|d| calendar::resolve_ordinal(*d, len) == Some(doy))
            }
            Filter::ByWeekNo { weeks, week_start } => {
                in_weeks(cursor.year, cursor.month, cursor.day, weeks, *week_start)
            }
            Filter::ByHour(hours) => hours.contains(&cursor.hour),
            Filter::ByMinute(minutes) => minutes.contains(&cursor.minute),
            Filter::BySecond(seconds) => seconds.contains(&cursor.second),
        }
    }
}

fn matches_weekday(cursor: &DtBuilder, days: &[WeekdayNum], scope: DayScope) -> bool {
    let fixed = cursor.fixed_day();
    let weekday = calendar::weekday_of_fixed(fixed);
    days.iter().filter(|e| e.weekday == weekday).any(|entry| {
        let (first, len) = match scope {
            DayScope::Week => return true,
            DayScope::Month => (
                calendar::fixed_day(cursor.year, cursor.month, 1),
                calendar::month_length(cursor.year, cursor.month),
            ),
            DayScope::Year => (
                calendar::fixed_day(cursor.year, 1, 1),
                calendar::year_length(cursor.year),
            ),
        };
        match entry.ordinal {
            None => true,
            Some(n) => calendar::nth_weekday(first, len, weekday, n) == Some(fixed),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> DtBuilder {
        DtBuilder {
            year,
            month,
            day,
            ..DtBuilder::default()
        }
    }

    #[test]
    fn negative_month_day_tracks_month_length() {
        let last = Filter::ByMonthDay(vec![-1]);
        assert!(last.matches(&day(1997, 2, 28)));
        assert!(!last.matches(&day(2000, 2, 28)));
        assert!(last.matches(&day(2000, 2, 29)));
        assert!(last.matches(&day(1997, 4, 30)));
        assert!(!Filter::ByMonthDay(vec![31]).matches(&day(1997, 4, 30)));
    }

    #[test]
    fn weekday_scopes() {
        // 1997-09-26 is the last Friday of September, not of the year.
        let last_friday = vec![WeekdayNum::nth(-1, Weekday::Friday)];
        let month = Filter::ByDay {
            days: last_friday.clone(),
            scope: DayScope::Month,
        };
        let year = Filter::ByDay {
            days: last_friday.clone(),
            scope: DayScope::Year,
        };
        let week = Filter::ByDay {
            days: last_friday,
            scope: DayScope::Week,
        };
        assert!(month.matches(&day(1997, 9, 26)));
        assert!(!year.matches(&day(1997, 9, 26)));
        assert!(year.matches(&day(1997, 12, 26)));
        assert!(week.matches(&day(1997, 9, 5)));
        assert!(!week.matches(&day(1997, 9, 4)));
    }

    #[test]
    fn year_day_and_week_number() {
        assert!(Filter::ByYearDay(vec![-1]).matches(&day(2000, 12, 31)));
        assert!(Filter::ByYearDay(vec![366]).matches(&day(2000, 12, 31)));
        assert!(!Filter::ByYearDay(vec![366]).matches(&day(1999, 12, 31)));
        let week20 = Filter::ByWeekNo {
            weeks: vec![20],
            week_start: Weekday::Monday,
        };
        assert!(week20.matches(&day(1997, 5, 12)));
        assert!(!week20.matches(&day(1997, 5, 19)));
    }

    #[test]
    fn levels() {
        assert_eq!(Filter::ByMonth(vec![1]).level(), Level::Month);
        assert_eq!(Filter::ByYearDay(vec![1]).level(), Level::Day);
        assert_eq!(Filter::BySecond(vec![0]).level(), Level::Second);
    }
}
