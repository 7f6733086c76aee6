//! Iteration over explicit dates (RDATE and EXDATE).

use crate::iter::RecurrenceIterator;
use crate::models::CalendarValue;
use crate::tz::{self, Zone};

/// A fixed, sorted, duplicate-free list of values.
#[derive(Debug, Clone, Default)]
pub struct DateListIterator {
    values: Vec<CalendarValue>,
    pos: usize,
}

impl DateListIterator {
    /// Sorts and deduplicates `values` up front.
    pub fn new(values: impl IntoIterator<Item = CalendarValue>) -> Self {
        let mut values: Vec<CalendarValue> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();
        Self { values, pos: 0 }
    }

    /// Like [`DateListIterator::new`], with date-times read as wall-clock
    /// time in `zone` and converted to UTC.
    pub fn in_zone(values: impl IntoIterator<Item = CalendarValue>, zone: &Zone) -> Self {
        Self::new(values.into_iter().map(|v| tz::to_utc(v, zone)))
    }

    /// Values not yet returned.
    pub fn remaining(&self) -> &[CalendarValue] {
        &self.values[self.pos..]
    }
}

impl Iterator for DateListIterator {
    type Item = CalendarValue;

    fn next(&mut self) -> Option<CalendarValue> {
        let value = self.values.get(self.pos).copied()?;
        self.pos += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.values.len() - self.pos;
        (n, Some(n))
    }
}

impl RecurrenceIterator for DateListIterator {
    fn peek(&mut self) -> Option<CalendarValue> {
        self.values.get(self.pos).copied()
    }

    fn advance_to(&mut self, target: CalendarValue) {
        let skip = self.values[self.pos..].partition_point(|v| *v < target);
        self.pos += skip;
    }
}
