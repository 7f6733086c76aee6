//! Generator and filter roles.
//!
//! Which BYxxx parts expand the set and which limit it depends only on the
//! frequency and on which parts are present. [`partition`] is that table;
//! [`build_stages`] turns a partition into the concrete generator chain.

use std::fmt;

use serde::Serialize;

use crate::calendar;
use crate::cursor::{DtBuilder, Level};
use crate::filters::Filter;
use crate::generators::{DayScope, Generator, GeneratorKind};
use crate::models::Weekday;
use crate::recurrence::{Frequency, RecurrenceSpec};

/// A BYxxx rule part, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ByPart {
    ByMonth,
    ByWeekNo,
    ByYearDay,
    ByMonthDay,
    ByDay,
    ByHour,
    ByMinute,
    BySecond,
}

impl fmt::Display for ByPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ByPart::ByMonth => "BYMONTH",
            ByPart::ByWeekNo => "BYWEEKNO",
            ByPart::ByYearDay => "BYYEARDAY",
            ByPart::ByMonthDay => "BYMONTHDAY",
            ByPart::ByDay => "BYDAY",
            ByPart::ByHour => "BYHOUR",
            ByPart::ByMinute => "BYMINUTE",
            ByPart::BySecond => "BYSECOND",
        };
        f.write_str(name)
    }
}

/// The parts a rule sets, coarsest first. BYSETPOS is not a field part and is
/// never listed.
pub fn present_parts(spec: &RecurrenceSpec) -> Vec<ByPart> {
    [
        (ByPart::ByMonth, spec.by_month().is_empty()),
        (ByPart::ByWeekNo, spec.by_week_no().is_empty()),
        (ByPart::ByYearDay, spec.by_year_day().is_empty()),
        (ByPart::ByMonthDay, spec.by_month_day().is_empty()),
        (ByPart::ByDay, spec.by_day().is_empty()),
        (ByPart::ByHour, spec.by_hour().is_empty()),
        (ByPart::ByMinute, spec.by_minute().is_empty()),
        (ByPart::BySecond, spec.by_second().is_empty()),
    ]
    .into_iter()
    .filter(|(_, empty)| !empty)
    .map(|(part, _)| part)
    .collect()
}

/// Present parts split into expanding generators and limiting filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RolePlan {
    pub generators: Vec<ByPart>,
    pub filters: Vec<ByPart>,
}

impl RolePlan {
    pub fn generates(&self, part: ByPart) -> bool {
        self.generators.contains(&part)
    }

    pub fn filters(&self, part: ByPart) -> bool {
        self.filters.contains(&part)
    }
}

/// Assigns every present part a role for `frequency`.
///
/// | FREQ | generators | filters |
/// |---|---|---|
/// | YEARLY | BYMONTH, then the first of BYWEEKNO, BYYEARDAY, BYMONTHDAY, BYDAY | other day parts |
/// | MONTHLY | BYMONTHDAY, else BYDAY | BYMONTH and other day parts |
/// | WEEKLY | BYDAY | BYMONTH and other day parts |
/// | DAILY and finer | none of the date parts | all date parts |
///
/// Time parts finer than the frequency expand; the rest limit.
pub fn partition(frequency: Frequency, present: &[ByPart]) -> RolePlan {
    let has = |part| present.contains(&part);
    let mut generators = Vec::new();

    match frequency {
        Frequency::Yearly => {
            if has(ByPart::ByMonth) {
                generators.push(ByPart::ByMonth);
            }
            let day_part = [ByPart::ByWeekNo, ByPart::ByYearDay, ByPart::ByMonthDay, ByPart::ByDay]
                .into_iter()
                .find(|p| has(*p));
            generators.extend(day_part);
        }
        Frequency::Monthly => {
            if has(ByPart::ByMonthDay) {
                generators.push(ByPart::ByMonthDay);
            } else if has(ByPart::ByDay) {
                generators.push(ByPart::ByDay);
            }
        }
        Frequency::Weekly => {
            if has(ByPart::ByDay) {
                generators.push(ByPart::ByDay);
            }
        }
        _ => {}
    }

    let unit = Level::unit_of(frequency);
    for (part, level) in [
        (ByPart::ByHour, Level::Hour),
        (ByPart::ByMinute, Level::Minute),
        (ByPart::BySecond, Level::Second),
    ] {
        if has(part) && level > unit {
            generators.push(part);
        }
    }

    let filters = present
        .iter()
        .copied()
        .filter(|p| !generators.contains(p))
        .collect();
    RolePlan { generators, filters }
}

/// One field of the chain below the year: its generator and the filters
/// evaluated once it has produced a value.
#[derive(Debug, Clone)]
pub(crate) struct Stage {
    pub generator: Generator,
    pub filters: Vec<Filter>,
}

fn sorted<T: Ord + Copy>(values: &[T]) -> Vec<T> {
    let mut out = values.to_vec();
    out.sort_unstable();
    out.dedup();
    out
}

fn day_scope(frequency: Frequency, plan: &RolePlan) -> DayScope {
    let month_scoped = plan.generates(ByPart::ByMonth) || plan.filters(ByPart::ByMonth);
    match frequency {
        Frequency::Yearly if month_scoped => DayScope::Month,
        Frequency::Yearly => DayScope::Year,
        Frequency::Monthly => DayScope::Month,
        _ => DayScope::Week,
    }
}

/// Builds the month..second stages (month and day only for date rules).
pub(crate) fn build_stages(
    spec: &RecurrenceSpec,
    plan: &RolePlan,
    start: &DtBuilder,
    date_only: bool,
) -> Vec<Stage> {
    let frequency = spec.frequency();
    let interval = spec.interval().max(1);
    let week_start = spec.week_start();
    let unit = Level::unit_of(frequency);
    let scope = day_scope(frequency, plan);
    let has_day_part = [ByPart::ByWeekNo, ByPart::ByYearDay, ByPart::ByMonthDay, ByPart::ByDay]
        .into_iter()
        .any(|p| plan.generates(p) || plan.filters(p));

    let serial = |level: Level, interval: u32| GeneratorKind::Serial {
        interval,
        anchor: start.unit_index(level),
    };

    // Month
    let month_kind = match frequency {
        Frequency::Yearly if plan.generates(ByPart::ByMonth) => GeneratorKind::List(sorted(spec.by_month())),
        Frequency::Yearly if !has_day_part => GeneratorKind::List(vec![start.month]),
        Frequency::Monthly => serial(Level::Month, interval),
        _ => serial(Level::Month, 1),
    };

    // Day
    let day_kind = match frequency {
        Frequency::Yearly | Frequency::Monthly => {
            if plan.generates(ByPart::ByWeekNo) {
                GeneratorKind::WeekNo {
                    weeks: spec.by_week_no().to_vec(),
                    week_start,
                }
            } else if plan.generates(ByPart::ByYearDay) {
                GeneratorKind::YearDay(spec.by_year_day().to_vec())
            } else if plan.generates(ByPart::ByMonthDay) {
                GeneratorKind::MonthDay(spec.by_month_day().to_vec())
            } else if plan.generates(ByPart::ByDay) {
                GeneratorKind::ByDay {
                    days: spec.by_day().to_vec(),
                    scope,
                }
            } else if has_day_part {
                serial(Level::Day, 1)
            } else {
                GeneratorKind::MonthDay(vec![start.day as i32])
            }
        }
        Frequency::Weekly => {
            let weekdays: Vec<Weekday> = if plan.generates(ByPart::ByDay) {
                let mut days: Vec<Weekday> = spec.by_day().iter().map(|d| d.weekday).collect();
                days.sort_unstable();
                days.dedup();
                days
            } else if has_day_part {
                Weekday::ALL.to_vec()
            } else {
                vec![start.weekday()]
            };
            GeneratorKind::Weekly {
                weekdays,
                interval,
                anchor_week: calendar::week_start_of(start.fixed_day(), week_start),
                week_start,
            }
        }
        Frequency::Daily => serial(Level::Day, interval),
        _ => serial(Level::Day, 1),
    };
    let mut filters = Vec::new();
    if plan.filters(ByPart::ByMonth) {
        filters.push(Filter::ByMonth(sorted(spec.by_month())));
    }
    if plan.filters(ByPart::ByWeekNo) {
        filters.push(Filter::ByWeekNo {
            weeks: spec.by_week_no().to_vec(),
            week_start,
        });
    }
    if plan.filters(ByPart::ByYearDay) {
        filters.push(Filter::ByYearDay(spec.by_year_day().to_vec()));
    }
    if plan.filters(ByPart::ByMonthDay) {
        filters.push(Filter::ByMonthDay(spec.by_month_day().to_vec()));
    }
    if plan.filters(ByPart::ByDay) {
        filters.push(Filter::ByDay {
            days: spec.by_day().to_vec(),
            scope,
        });
    }

    let mut stages = vec![
        Stage {
            generator: Generator::new(Level::Month, month_kind),
            filters: Vec::new(),
        },
        Stage {
            generator: Generator::new(Level::Day, day_kind),
            filters: Vec::new(),
        },
    ];

    if !date_only {
        for (part, level, values) in [
            (ByPart::ByHour, Level::Hour, spec.by_hour()),
            (ByPart::ByMinute, Level::Minute, spec.by_minute()),
            (ByPart::BySecond, Level::Second, spec.by_second()),
        ] {
            let kind = if plan.generates(part) {
                GeneratorKind::List(sorted(values))
            } else if level > unit {
                GeneratorKind::List(vec![start.field(level) as u32])
            } else if level == unit {
                serial(level, interval)
            } else {
                serial(level, 1)
            };
            if plan.filters(part) {
                let values = sorted(values);
                filters.push(match level {
                    Level::Hour => Filter::ByHour(values),
                    Level::Minute => Filter::ByMinute(values),
                    _ => Filter::BySecond(values),
                });
            }
            stages.push(Stage {
                generator: Generator::new(level, kind),
                filters: Vec::new(),
            });
        }
    }

    // Each filter runs in the stage that generates the finest field it reads.
    for filter in filters {
        if let Some(stage) = stages
            .iter_mut()
            .find(|stage| stage.generator.level() == filter.level())
        {
            stage.filters.push(filter);
        }
    }
    stages
}

#[cfg(test)]
mod tests {
    use super::*;

    use ByPart::*;

    #[test]
    fn yearly_roles() {
        let plan = partition(Frequency::Yearly, &[ByMonth, ByMonthDay, ByDay, ByHour]);
        assert_eq!(plan.generators, vec![ByMonth, ByMonthDay, ByHour]);
        assert_eq!(plan.filters, vec![ByDay]);

        let plan = partition(Frequency::Yearly, &[ByWeekNo, ByDay]);
        assert_eq!(plan.generators, vec![ByWeekNo]);
        assert_eq!(plan.filters, vec![ByDay]);

        let plan = partition(Frequency::Yearly, &[ByDay]);
        assert_eq!(plan.generators, vec![ByDay]);
        assert!(plan.filters.is_empty());
    }

    #[test]
    fn monthly_roles() {
        let plan = partition(Frequency::Monthly, &[ByMonth, ByMonthDay, ByDay]);
        assert_eq!(plan.generators, vec![ByMonthDay]);
        assert_eq!(plan.filters, vec![ByMonth, ByDay]);

        let plan = partition(Frequency::Monthly, &[ByDay]);
        assert_eq!(plan.generators, vec![ByDay]);
    }

    #[test]
    fn weekly_and_finer_roles() {
        let plan = partition(Frequency::Weekly, &[ByMonth, ByDay]);
        assert_eq!(plan.generators, vec![ByDay]);
        assert_eq!(plan.filters, vec![ByMonth]);

        let plan = partition(Frequency::Daily, &[ByMonth, ByDay, ByHour, ByMinute]);
        assert_eq!(plan.generators, vec![ByHour, ByMinute]);
        assert_eq!(plan.filters, vec![ByMonth, ByDay]);

        let plan = partition(Frequency::Hourly, &[ByHour, ByMinute]);
        assert_eq!(plan.generators, vec![ByMinute]);
        assert_eq!(plan.filters, vec![ByHour]);

        let plan = partition(Frequency::Secondly, &[ByHour, BySecond]);
        assert!(plan.generators.is_empty());
        assert_eq!(plan.filters, vec![ByHour, BySecond]);
    }

    #[test]
    fn present_parts_skip_empty_lists() {
        let spec = RecurrenceSpec::builder(Frequency::Monthly)
            .by_month_day([1, -1])
            .by_hour([9])
            .by_set_pos([1])
            .build();
        assert_eq!(present_parts(&spec), vec![ByMonthDay, ByHour]);
    }

    #[test]
    fn date_rules_build_two_stages() {
        let spec = RecurrenceSpec::builder(Frequency::Daily).build();
        let plan = partition(spec.frequency(), &present_parts(&spec));
        let start = DtBuilder {
            year: 1997,
            month: 9,
            day: 2,
            ..DtBuilder::default()
        };
        assert_eq!(build_stages(&spec, &plan, &start, true).len(), 2);
        assert_eq!(build_stages(&spec, &plan, &start, false).len(), 5);
    }

    #[test]
    fn yearly_without_day_parts_repeats_start_date() {
        let spec = RecurrenceSpec::builder(Frequency::Yearly).by_hour([9]).build();
        let plan = partition(spec.frequency(), &present_parts(&spec));
        let start = DtBuilder {
            year: 1997,
            month: 9,
            day: 2,
            hour: 9,
            ..DtBuilder::default()
        };
        let mut stages = build_stages(&spec, &plan, &start, false);
        let first = |stage: &mut Stage| {
            stage.generator.reset(&start, None);
            let values: Vec<u32> = std::iter::from_fn(|| stage.generator.advance()).collect();
            values
        };
        assert_eq!(first(&mut stages[0]), [9]);
        assert_eq!(first(&mut stages[1]), [2]);
        assert_eq!(first(&mut stages[2]), [9]);
    }

    #[test]
    fn filters_run_where_their_field_is_generated() {
        let spec: RecurrenceSpec = "FREQ=HOURLY;BYMONTH=1;BYDAY=MO;BYHOUR=9,17".parse().unwrap();
        let plan = partition(spec.frequency(), &present_parts(&spec));
        let start = DtBuilder {
            year: 1997,
            month: 1,
            day: 6,
            ..DtBuilder::default()
        };
        let stages = build_stages(&spec, &plan, &start, false);
        let placed: Vec<(Level, usize)> = stages
            .iter()
            .map(|stage| (stage.generator.level(), stage.filters.len()))
            .collect();
        assert_eq!(
            placed,
            [
                (Level::Month, 1),
                (Level::Day, 1),
                (Level::Hour, 1),
                (Level::Minute, 0),
                (Level::Second, 0),
            ]
        );
        assert!(matches!(stages[1].filters[0], Filter::ByDay { .. }));
    }
}
