//! Merging and subtracting occurrence streams.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use crate::iter::RecurrenceIterator;
use crate::models::CalendarValue;

/// A boxed occurrence source.
pub type BoxedIterator = Box<dyn RecurrenceIterator>;

/// K-way merge of several sources with duplicates collapsed.
///
/// Sources are only read as far as needed, so infinite rules can be merged
/// with finite lists.
pub struct MergedStream {
    sources: Vec<BoxedIterator>,
    heap: BinaryHeap<Reverse<(CalendarValue, usize)>>,
    primed: bool,
}

impl MergedStream {
    pub fn new(sources: Vec<BoxedIterator>) -> Self {
        Self {
            sources,
            heap: BinaryHeap::new(),
            primed: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn prime(&mut self) {
        if self.primed {
            return;
        }
        self.primed = true;
        for (index, source) in self.sources.iter_mut().enumerate() {
            if let Some(head) = source.next() {
                self.heap.push(Reverse((head, index)));
            }
        }
    }

    fn refill(&mut self, index: usize) {
        if let Some(head) = self.sources[index].next() {
            self.heap.push(Reverse((head, index)));
        }
    }
}

impl fmt::Debug for MergedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergedStream")
            .field("sources", &self.sources.len())
            .field("heads", &self.heap.len())
            .finish()
    }
}

impl Iterator for MergedStream {
    type Item = CalendarValue;

    fn next(&mut self) -> Option<CalendarValue> {
        self.prime();
        let Reverse((value, index)) = self.heap.pop()?;
        self.refill(index);
        while let Some(Reverse((head, other))) = self.heap.peek().copied() {
            if head != value {
                break;
            }
            self.heap.pop();
            self.refill(other);
        }
        Some(value)
    }
}

impl RecurrenceIterator for MergedStream {
    fn peek(&mut self) -> Option<CalendarValue> {
        self.prime();
        self.heap.peek().map(|Reverse((value, _))| *value)
    }

    fn advance_to(&mut self, target: CalendarValue) {
        if !self.primed {
            for source in &mut self.sources {
                source.advance_to(target);
            }
            return;
        }
        let behind: Vec<usize> = self
            .heap
            .iter()
            .filter(|Reverse((head, _))| *head < target)
            .map(|Reverse((_, index))| *index)
            .collect();
        if behind.is_empty() {
            return;
        }
        self.heap.retain(|Reverse((head, _))| *head >= target);
        for index in behind {
            self.sources[index].advance_to(target);
            self.refill(index);
        }
    }
}

/// Inclusions minus exclusions.
///
/// An inclusion value is dropped when an exclusion produces exactly the same
/// value; nothing else is affected.
#[derive(Debug)]
pub struct CompoundIterator {
    inclusions: MergedStream,
    exclusions: MergedStream,
}

impl CompoundIterator {
    pub fn new(inclusions: Vec<BoxedIterator>, exclusions: Vec<BoxedIterator>) -> Self {
        Self {
            inclusions: MergedStream::new(inclusions),
            exclusions: MergedStream::new(exclusions),
        }
    }
}

impl Iterator for CompoundIterator {
    type Item = CalendarValue;

    fn next(&mut self) -> Option<CalendarValue> {
        let value = self.peek()?;
        self.inclusions.next();
        Some(value)
    }
}

impl RecurrenceIterator for CompoundIterator {
    fn peek(&mut self) -> Option<CalendarValue> {
        loop {
            let candidate = self.inclusions.peek()?;
            self.exclusions.advance_to(candidate);
            if self.exclusions.peek() != Some(candidate) {
                return Some(candidate);
            }
            self.inclusions.next();
        }
    }

    fn advance_to(&mut self, target: CalendarValue) {
        self.inclusions.advance_to(target);
        self.exclusions.advance_to(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_list::DateListIterator;
    use crate::models::DateValue;

    fn date(y: i32, m: u32, d: u32) -> CalendarValue {
        DateValue::new(y, m, d).unwrap().into()
    }

    fn list(days: &[u32]) -> BoxedIterator {
        Box::new(DateListIterator::new(days.iter().map(|d| date(2006, 4, *d))))
    }

    fn days(iter: impl Iterator<Item = CalendarValue>) -> Vec<u32> {
        iter.map(|v| v.date().day()).collect()
    }

    #[test]
    fn merge_collapses_duplicates() {
        let merged = MergedStream::new(vec![list(&[1, 3, 5]), list(&[2, 3, 6]), list(&[])]);
        assert_eq!(days(merged), vec![1, 2, 3, 5, 6]);
    }

    #[test]
    fn merge_advance_before_first_read() {
        let mut merged = MergedStream::new(vec![list(&[1, 3, 5]), list(&[2, 4])]);
        merged.advance_to(date(2006, 4, 3));
        assert_eq!(days(merged), vec![3, 4, 5]);
    }

    #[test]
    fn merge_advance_after_reading() {
        let mut merged = MergedStream::new(vec![list(&[1, 3, 5]), list(&[2, 4])]);
        assert_eq!(merged.next(), Some(date(2006, 4, 1)));
        merged.advance_to(date(2006, 4, 4));
        merged.advance_to(date(2006, 4, 4));
        assert_eq!(days(merged), vec![4, 5]);
    }

    #[test]
    fn exclusion_removes_exact_matches_only() {
        let compound = CompoundIterator::new(
            vec![list(&[11, 12, 13])],
            vec![list(&[10, 12, 20])],
        );
        assert_eq!(days(compound), vec![11, 13]);
    }

    #[test]
    fn repeated_peek_does_not_advance() {
        let mut compound = CompoundIterator::new(vec![list(&[1, 2])], vec![list(&[1])]);
        assert!(compound.has_next());
        assert!(compound.has_next());
        assert_eq!(compound.peek(), Some(date(2006, 4, 2)));
        assert_eq!(compound.next(), Some(date(2006, 4, 2)));
        assert!(!compound.has_next());
    }

    #[test]
    fn empty_compound() {
        let mut compound = CompoundIterator::new(Vec::new(), vec![list(&[1])]);
        assert_eq!(compound.next(), None);
    }
}
