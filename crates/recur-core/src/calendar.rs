//! Calendar arithmetic on top of chrono.
//!
//! Generators work on plain `(year, month, day)` fields and on day numbers
//! ("fixed days", counting from 1970-01-01 = 0); this module converts both
//! through [`NaiveDate`]. Week numbering relative to an arbitrary week start
//! and signed ordinals are RFC 5545 concepts chrono does not cover, so
//! those are computed here.

use chrono::{Datelike, Days, NaiveDate};

use crate::models::Weekday;

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_FROM_CE: i64 = 719_163;

/// The date of a day number, saturating at the ends of chrono's range.
fn naive_of_fixed(fixed: i64) -> NaiveDate {
    i32::try_from(fixed + UNIX_EPOCH_FROM_CE)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .unwrap_or(if fixed < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// The date of civil fields. Days past the end of the month roll over into
/// the next one.
fn naive(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_days(Days::new(u64::from(day.saturating_sub(1)))))
        .unwrap_or(NaiveDate::MAX)
}

/// Returns true if `year` has a February 29th.
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 1, 1).is_some_and(|date| date.leap_year())
}

/// Number of days in `month` (1-12) of `year`, or 0 for any other month.
pub fn month_length(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 0,
    }
}

/// Number of days in `year`.
pub fn year_length(year: i32) -> u32 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// 1-based day of the year.
pub fn day_of_year(year: i32, month: u32, day: u32) -> u32 {
    naive(year, month, day).ordinal()
}

/// Inverse of [`day_of_year`]: month and day for a 1-based day of the year.
///
/// Returns `None` if `doy` is outside the year.
pub fn month_day_of(year: i32, doy: u32) -> Option<(u32, u32)> {
    NaiveDate::from_yo_opt(year, doy).map(|date| (date.month(), date.day()))
}

/// Day number of a civil date.
pub fn fixed_day(year: i32, month: u32, day: u32) -> i64 {
    i64::from(naive(year, month, day).num_days_from_ce()) - UNIX_EPOCH_FROM_CE
}

/// Civil date of a day number.
pub fn civil_from_fixed(fixed: i64) -> (i32, u32, u32) {
    let date = naive_of_fixed(fixed);
    (date.year(), date.month(), date.day())
}

/// Day of the week of a day number.
pub fn weekday_of_fixed(fixed: i64) -> Weekday {
    naive_of_fixed(fixed).weekday().into()
}

/// Day of the week of a civil date.
pub fn weekday_of(year: i32, month: u32, day: u32) -> Weekday {
    naive(year, month, day).weekday().into()
}

/// Number of days from the most recent `week_start` on or before `weekday`.
pub fn days_into_week(weekday: Weekday, week_start: Weekday) -> u32 {
    (7 + weekday.monday_index() - week_start.monday_index()) % 7
}

/// Day number of the week start on or before `fixed`.
pub fn week_start_of(fixed: i64, week_start: Weekday) -> i64 {
    fixed - i64::from(days_into_week(weekday_of_fixed(fixed), week_start))
}

/// Day number on which week 1 of `year` begins.
///
/// Week 1 is the first week with at least four days in the new year, which
/// for any week start is the week containing January 4th.
pub fn first_week_start(year: i32, week_start: Weekday) -> i64 {
    week_start_of(fixed_day(year, 1, 4), week_start)
}

/// Number of numbered weeks (52 or 53) in `year`.
pub fn weeks_in_year(year: i32, week_start: Weekday) -> u32 {
    ((first_week_start(year + 1, week_start) - first_week_start(year, week_start)) / 7) as u32
}

/// Week-numbering year and 1-based week number of a civil date.
///
/// Days before week 1 belong to the last week of the previous year; days on
/// or after the next year's week 1 belong to that year.
pub fn week_number(year: i32, month: u32, day: u32, week_start: Weekday) -> (i32, u32) {
    let fixed = fixed_day(year, month, day);
    let week_year = if fixed < first_week_start(year, week_start) {
        year - 1
    } else if fixed >= first_week_start(year + 1, week_start) {
        year + 1
    } else {
        year
    };
    let week = (fixed - first_week_start(week_year, week_start)) / 7 + 1;
    (week_year, week as u32)
}

/// Resolves a signed 1-based ordinal against a period of `len` items.
///
/// Positive ordinals count from the start, negative ones from the end
/// (`-1` is the last item). Returns the 1-based position, or `None` when the
/// ordinal is zero or falls outside the period.
pub fn resolve_ordinal(ordinal: i32, len: u32) -> Option<u32> {
    let len = i64::from(len);
    let pos = match i64::from(ordinal) {
        0 => return None,
        n if n > 0 => n,
        n => len + 1 + n,
    };
    (1..=len).contains(&pos).then_some(pos as u32)
}

/// Day number of the `ordinal`th `weekday` within the `len` days starting at
/// `first`. Negative ordinals count back from the end of the span.
pub fn nth_weekday(first: i64, len: u32, weekday: Weekday, ordinal: i32) -> Option<i64> {
    let lead = i64::from(days_into_week(weekday, weekday_of_fixed(first)));
    let last = first + i64::from(len) - 1;
    if first + lead > last {
        return None;
    }
    let count = ((last - first - lead) / 7 + 1) as u32;
    let pos = resolve_ordinal(ordinal, count)?;
    Some(first + lead + 7 * i64::from(pos - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn chrono_fixed(date: NaiveDate) -> i64 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        (date - epoch).num_days()
    }

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert_eq!(month_length(2024, 2), 29);
        assert_eq!(month_length(2100, 2), 28);
        assert_eq!(month_length(2023, 4), 30);
        assert_eq!(year_length(2000), 366);
    }

    #[test]
    fn fixed_day_agrees_with_chrono() {
        let mut date = NaiveDate::from_ymd_opt(1595, 12, 20).unwrap();
        let end = NaiveDate::from_ymd_opt(2405, 3, 2).unwrap();
        while date < end {
            let fixed = fixed_day(date.year(), date.month(), date.day());
            assert_eq!(fixed, chrono_fixed(date), "{date}");
            assert_eq!(
                civil_from_fixed(fixed),
                (date.year(), date.month(), date.day())
            );
            assert_eq!(
                weekday_of_fixed(fixed).monday_index(),
                date.weekday().num_days_from_monday()
            );
            date += chrono::Duration::days(37);
        }
    }

    #[test]
    fn day_numbers_past_the_month_roll_over() {
        assert_eq!(fixed_day(1970, 1, 1), 0);
        assert_eq!(fixed_day(1997, 2, 29), fixed_day(1997, 3, 1));
        assert_eq!(month_length(1997, 13), 0);
        assert_eq!(civil_from_fixed(-1), (1969, 12, 31));
    }

    #[test]
    fn day_of_year_round_trips_through_month_day() {
        assert_eq!(day_of_year(2024, 3, 1), 61);
        assert_eq!(day_of_year(2023, 12, 31), 365);
        assert_eq!(month_day_of(2024, 61), Some((3, 1)));
        assert_eq!(month_day_of(2024, 366), Some((12, 31)));
        assert_eq!(month_day_of(2023, 366), None);
        assert_eq!(month_day_of(2023, 0), None);
    }

    #[test]
    fn iso_week_numbers_with_monday_start() {
        // 2009-12-31 is in ISO week 53 of 2009, 2010-01-03 too.
        assert_eq!(week_number(2009, 12, 31, Weekday::Monday), (2009, 53));
        assert_eq!(week_number(2010, 1, 3, Weekday::Monday), (2009, 53));
        assert_eq!(week_number(2010, 1, 4, Weekday::Monday), (2010, 1));
        // 2008-12-29 already belongs to week 1 of 2009.
        assert_eq!(week_number(2008, 12, 29, Weekday::Monday), (2009, 1));
        assert_eq!(weeks_in_year(2009, Weekday::Monday), 53);
        assert_eq!(weeks_in_year(2010, Weekday::Monday), 52);
        assert_eq!(weeks_in_year(2015, Weekday::Monday), 53);
    }

    #[test]
    fn iso_week_numbers_agree_with_chrono() {
        let mut date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2040, 1, 1).unwrap();
        while date < end {
            let iso = date.iso_week();
            assert_eq!(
                week_number(date.year(), date.month(), date.day(), Weekday::Monday),
                (iso.year(), iso.week()),
                "{date}"
            );
            date += chrono::Duration::days(3);
        }
    }

    #[test]
    fn week_numbers_follow_week_start() {
        // 1997-01-01 is a Wednesday. With a Sunday start the first week
        // (Dec 29 - Jan 4) has four days in 1997, so it is week 1.
        assert_eq!(first_week_start(1997, Weekday::Sunday), fixed_day(1996, 12, 29));
        assert_eq!(week_number(1996, 12, 29, Weekday::Sunday), (1997, 1));
        // With a Thursday start the week containing Jan 1 starts Dec 26 and
        // has only one day in 1997.
        assert_eq!(first_week_start(1997, Weekday::Thursday), fixed_day(1997, 1, 2));
        assert_eq!(week_number(1997, 1, 1, Weekday::Thursday), (1996, 52));
        assert_eq!(weeks_in_year(1996, Weekday::Thursday), 52);
    }

    #[test]
    fn ordinals_resolve_from_both_ends() {
        assert_eq!(resolve_ordinal(1, 31), Some(1));
        assert_eq!(resolve_ordinal(-1, 31), Some(31));
        assert_eq!(resolve_ordinal(-1, 30), Some(30));
        assert_eq!(resolve_ordinal(31, 30), None);
        assert_eq!(resolve_ordinal(-31, 30), None);
        assert_eq!(resolve_ordinal(0, 30), None);
    }

    #[test]
    fn nth_weekday_in_month() {
        // September 1997: first Friday is the 5th, last Friday the 26th.
        let first = fixed_day(1997, 9, 1);
        assert_eq!(
            nth_weekday(first, 30, Weekday::Friday, 1),
            Some(fixed_day(1997, 9, 5))
        );
        assert_eq!(
            nth_weekday(first, 30, Weekday::Friday, -1),
            Some(fixed_day(1997, 9, 26))
        );
        assert_eq!(
            nth_weekday(first, 30, Weekday::Friday, -2),
            Some(fixed_day(1997, 9, 19))
        );
        assert_eq!(nth_weekday(first, 30, Weekday::Friday, 5), None);
        // 20th Monday of 1997.
        assert_eq!(
            nth_weekday(fixed_day(1997, 1, 1), 365, Weekday::Monday, 20),
            Some(fixed_day(1997, 5, 19))
        );
    }
}
