//! Termination conditions (COUNT and UNTIL).

use crate::models::CalendarValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Condition {
    /// Passes for the first `remaining` instances.
    Count { remaining: u32 },
    /// Passes while the instance is at or before `bound`.
    Until { bound: CalendarValue },
}

impl Condition {
    /// Tests the next instance. `local` is its wall-clock value and `output`
    /// the value the iterator emits (UTC for zoned rules).
    ///
    /// A date bound compares calendar dates; a date-time bound is compared
    /// with the emitted value.
    pub(crate) fn check(&mut self, local: &CalendarValue, output: &CalendarValue) -> bool {
        match self {
            Condition::Count { remaining } => {
                if *remaining == 0 {
                    return false;
                }
                *remaining -= 1;
                true
            }
            Condition::Until { bound } => match (*bound, local) {
                (CalendarValue::Date(until), _) => local.date() <= until,
                (CalendarValue::DateTime(until), CalendarValue::Date(day)) => *day <= until.date(),
                (CalendarValue::DateTime(_), CalendarValue::DateTime(_)) => *output <= *bound,
            },
        }
    }
}
