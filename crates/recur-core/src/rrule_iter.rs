//! Iteration over a single RRULE or EXRULE.
//!
//! Candidates come out of a [`Cascade`]: an odometer over the year counter
//! and one [`Stage`] per finer field. The iterator then applies BYSETPOS,
//! drops anything before the start value, converts to the output zone and
//! runs the COUNT/UNTIL conditions.
//!
//! Converting to UTC is not monotonic across a DST gap: a nonexistent local
//! time is pushed forward past the gap and can overtake the real times that
//! follow it. Converted values are therefore held until no later candidate
//! can sort before them.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::calendar;
use crate::conditions::Condition;
use crate::cursor::{DtBuilder, Level};
use crate::generators::YearSerial;
use crate::iter::RecurrenceIterator;
use crate::models::{CalendarValue, Weekday};
use crate::plan::{self, Stage};
use crate::recurrence::{Frequency, RecurrenceSpec};
use crate::tz::{self, Zone};

/// Consecutive BYSETPOS periods that had candidates but selected none before
/// the rule is treated as exhausted.
const MAX_IDLE_SETS: u32 = 1000;

/// Enumerates local candidates in ascending order, never below `origin`.
#[derive(Debug, Clone)]
struct Cascade {
    year: YearSerial,
    stages: Vec<Stage>,
    cursor: DtBuilder,
    origin: DtBuilder,
    /// `tight[l]`: every field above level `l` equals the origin's.
    tight: [bool; 6],
    /// Level to advance on the next call; 0 is the year.
    resume: usize,
}

impl Cascade {
    fn new(year: YearSerial, stages: Vec<Stage>, origin: DtBuilder) -> Self {
        let mut cascade = Self {
            year,
            stages,
            cursor: origin,
            origin,
            tight: [true; 6],
            resume: 0,
        };
        cascade.restart(origin);
        cascade
    }

    /// Starts over, producing only candidates at or after `origin`.
    fn restart(&mut self, origin: DtBuilder) {
        self.origin = origin;
        self.cursor = origin;
        self.year.start_at(origin.year);
        self.tight = [true; 6];
        self.resume = 0;
    }

    fn next_candidate(&mut self) -> Option<DtBuilder> {
        let depth = self.stages.len();
        let mut level = self.resume;
        loop {
            if level == 0 {
                self.cursor.year = self.year.advance()?;
            } else {
                let stage = &mut self.stages[level - 1];
                match stage.generator.advance() {
                    None => {
                        level -= 1;
                        continue;
                    }
                    Some(value) => {
                        self.cursor.set(stage.generator.level(), value);
                        if !stage.filters.iter().all(|f| f.matches(&self.cursor)) {
                            continue;
                        }
                    }
                }
            }

            if level == depth {
                self.resume = level;
                self.year.work_done();
                return Some(self.cursor);
            }

            let field = Level::ALL[level];
            let tight = self.tight[level] && self.cursor.field(field) == self.origin.field(field);
            self.tight[level + 1] = tight;
            let min = tight.then(|| self.origin.field(Level::ALL[level + 1]) as u32);
            self.stages[level].generator.reset(&self.cursor, min);
            level += 1;
        }
    }
}

/// A converted candidate waiting for its turn.
#[derive(Debug, Clone, Copy)]
struct Held {
    output: CalendarValue,
    local: CalendarValue,
    /// Wall-clock time of `output`. Candidates at or after it convert to
    /// instants at or after `output`.
    settled: CalendarValue,
}

/// Iterator over the instances of one recurrence rule.
///
/// Rules with a date start value yield dates. Rules with a date-time start
/// yield date-times: in UTC when the start value has a zone, as wall-clock
/// time when it is floating.
#[derive(Debug, Clone)]
pub struct RRuleIterator {
    cascade: Cascade,
    frequency: Frequency,
    week_start: Weekday,
    set_pos: Vec<i32>,
    batch: VecDeque<DtBuilder>,
    carry: Option<DtBuilder>,
    idle_sets: u32,
    start: DtBuilder,
    date_only: bool,
    zone: Zone,
    conditions: Vec<Condition>,
    counted: bool,
    last_generated: Option<DtBuilder>,
    /// Converted candidates in output order.
    held: Vec<Held>,
    /// Wall-clock time of the latest candidate taken from the cascade.
    frontier: Option<CalendarValue>,
    exhausted: bool,
    last_emitted: Option<CalendarValue>,
    pending: Option<CalendarValue>,
    done: bool,
}

impl RRuleIterator {
    /// Builds the iterator for `spec` starting at `dtstart`, which is
    /// wall-clock time in `zone`.
    pub fn new(spec: &RecurrenceSpec, dtstart: CalendarValue, zone: &Zone) -> Self {
        let date_only = !dtstart.is_date_time();
        let start = DtBuilder::from_value(&dtstart);
        let frequency = spec.frequency();
        let week_start = spec.week_start();

        let roles = plan::partition(frequency, &plan::present_parts(spec));
        let stages = plan::build_stages(spec, &roles, &start, date_only);
        debug!(
            rule = %spec,
            dtstart = %dtstart,
            zone = %zone,
            generators = ?roles.generators,
            filters = ?roles.filters,
            "built rule iterator"
        );

        let set_pos = spec.by_set_pos().to_vec();
        // BYSETPOS needs every candidate of the first period, including
        // those before the start value.
        let origin = if set_pos.is_empty() {
            start
        } else {
            start.period_start(frequency, week_start)
        };
        let year = YearSerial::new(
            if frequency == Frequency::Yearly {
                spec.interval()
            } else {
                1
            },
            start.year,
        );

        let mut conditions = Vec::new();
        if let Some(bound) = spec.until() {
            conditions.push(Condition::Until { bound });
        }
        if let Some(remaining) = spec.count() {
            conditions.push(Condition::Count { remaining });
        }

        Self {
            cascade: Cascade::new(year, stages, origin),
            frequency,
            week_start,
            set_pos,
            batch: VecDeque::new(),
            carry: None,
            idle_sets: 0,
            start,
            date_only,
            zone: *zone,
            conditions,
            counted: spec.count().is_some(),
            last_generated: None,
            held: Vec::new(),
            frontier: None,
            exhausted: false,
            last_emitted: None,
            pending: None,
            done: false,
        }
    }

    fn generate(&mut self) -> Option<DtBuilder> {
        let candidate = self.cascade.next_candidate();
        if candidate.is_some() {
            self.last_generated = candidate;
        }
        candidate
    }

    /// Next local instance, after BYSETPOS selection.
    fn next_instance(&mut self) -> Option<DtBuilder> {
        if self.set_pos.is_empty() {
            return self.generate();
        }
        loop {
            if let Some(instance) = self.batch.pop_front() {
                return Some(instance);
            }
            let first = match self.carry.take() {
                Some(carried) => carried,
                None => self.generate()?,
            };
            let key = first.period_index(self.frequency, self.week_start);
            let mut period = vec![first];
            while let Some(candidate) = self.generate() {
                if candidate.period_index(self.frequency, self.week_start) != key {
                    self.carry = Some(candidate);
                    break;
                }
                period.push(candidate);
            }

            self.batch = select_positions(&period, &self.set_pos).into();
            if self.batch.is_empty() {
                self.idle_sets += 1;
                if self.idle_sets >= MAX_IDLE_SETS {
                    debug!(periods = MAX_IDLE_SETS, "BYSETPOS selected nothing, giving up");
                    return None;
                }
            } else {
                self.idle_sets = 0;
            }
        }
    }

    fn fetch(&mut self) -> Option<CalendarValue> {
        loop {
            let ready = self.held.first().is_some_and(|first| {
                self.exhausted || self.frontier.is_some_and(|frontier| frontier >= first.settled)
            });
            if ready {
                let held = self.held.remove(0);
                if !self.conditions.iter_mut().all(|c| c.check(&held.local, &held.output)) {
                    return None;
                }
                self.last_emitted = Some(held.output);
                return Some(held.output);
            }
            if self.exhausted {
                return None;
            }

            let Some(local) = self.next_instance() else {
                self.exhausted = true;
                continue;
            };
            if local < self.start {
                continue;
            }
            let local = local.to_value(self.date_only);
            self.frontier = Some(local);
            let output = tz::to_utc(local, &self.zone);
            // A time in a DST gap and the real time one gap length later
            // are the same instant.
            if self.last_emitted == Some(output) {
                continue;
            }
            if let Err(at) = self.held.binary_search_by(|held| held.output.cmp(&output)) {
                let settled = tz::from_utc(output, &self.zone);
                self.held.insert(at, Held { output, local, settled });
            }
        }
    }

    fn fill(&mut self) -> Option<CalendarValue> {
        if self.pending.is_none() && !self.done {
            self.pending = self.fetch();
            self.done = self.pending.is_none();
        }
        self.pending
    }

    /// Restarts generation close to `target` instead of stepping through
    /// every earlier candidate. Only valid without COUNT, which has to see
    /// each instance.
    fn skip_ahead(&mut self, target: CalendarValue) {
        let local_day = match target {
            CalendarValue::Date(day) => day,
            CalendarValue::DateTime(dt) => tz::utc_to_local(dt, &self.zone).date(),
        };
        // One day of slack covers any UTC offset.
        let mut bound = DtBuilder::from_fixed_day(local_day.fixed_day() - 1);
        if !self.set_pos.is_empty() {
            bound = bound.period_start(self.frequency, self.week_start);
        }
        let floor = self
            .last_generated
            .map_or(self.cascade.origin, |last| last.max(self.cascade.origin));
        if bound <= floor {
            return;
        }
        trace!(target = %target, year = bound.year, "skipping ahead");
        self.cascade.restart(bound);
        self.batch.clear();
        self.carry = None;
        self.idle_sets = 0;
        self.held.retain(|held| held.output >= target);
        self.frontier = None;
        self.exhausted = false;
    }
}

/// Picks 1-based (or negative, from the end) positions out of one period.
fn select_positions(period: &[DtBuilder], positions: &[i32]) -> Vec<DtBuilder> {
    let len = period.len() as u32;
    let mut picked: Vec<DtBuilder> = positions
        .iter()
        .filter_map(|p| calendar::resolve_ordinal(*p, len))
        .map(|i| period[(i - 1) as usize])
        .collect();
    picked.sort_unstable();
    picked.dedup();
    picked
}

impl Iterator for RRuleIterator {
    type Item = CalendarValue;

    fn next(&mut self) -> Option<CalendarValue> {
        let value = self.fill();
        self.pending = None;
        value
    }
}

impl RecurrenceIterator for RRuleIterator {
    fn peek(&mut self) -> Option<CalendarValue> {
        self.fill()
    }

    fn advance_to(&mut self, target: CalendarValue) {
        if let Some(pending) = self.pending {
            if pending >= target {
                return;
            }
            self.pending = None;
        }
        if self.done {
            return;
        }
        if !self.counted {
            self.skip_ahead(target);
        }
        while let Some(value) = self.fill() {
            if value >= target {
                break;
            }
            self.pending = None;
        }
    }
}
