//! The iterator interface shared by every occurrence source.

use crate::models::CalendarValue;

/// A forward-only, strictly ascending stream of occurrences.
///
/// Every implementation is an [`Iterator`]; `next` returning `None` marks
/// exhaustion and keeps returning `None` afterwards. On top of that a source
/// can be inspected without consuming it and fast-forwarded.
pub trait RecurrenceIterator: Iterator<Item = CalendarValue> {
    /// The value the next call to `next` will return, computing it if needed.
    fn peek(&mut self) -> Option<CalendarValue>;

    /// True while another value is available. Repeated calls do not advance.
    fn has_next(&mut self) -> bool {
        self.peek().is_some()
    }

    /// Skips every value strictly before `target`.
    ///
    /// Calling it repeatedly with non-decreasing targets is idempotent and it
    /// may be called before the first value is read.
    fn advance_to(&mut self, target: CalendarValue);
}

impl<I: RecurrenceIterator + ?Sized> RecurrenceIterator for Box<I> {
    fn peek(&mut self) -> Option<CalendarValue> {
        (**self).peek()
    }

    fn has_next(&mut self) -> bool {
        (**self).has_next()
    }

    fn advance_to(&mut self, target: CalendarValue) {
        (**self).advance_to(target)
    }
}
