//! Constructors that assemble iterators from rules, dates and parsed text.

use tracing::debug;

use crate::compound::{BoxedIterator, CompoundIterator, MergedStream};
use crate::date_list::DateListIterator;
use crate::error::Result;
use crate::models::CalendarValue;
use crate::parse::RecurrenceLines;
use crate::recurrence::RecurrenceSpec;
use crate::rrule_iter::RRuleIterator;
use crate::tz::Zone;

/// Iterator over one rule. The generator/filter roles are resolved here,
/// once.
pub fn rrule_iterator(spec: &RecurrenceSpec, dtstart: CalendarValue, zone: &Zone) -> RRuleIterator {
    RRuleIterator::new(spec, dtstart, zone)
}

/// Iterator over explicit values given as wall-clock time in `zone`.
pub fn date_list_iterator(values: impl IntoIterator<Item = CalendarValue>, zone: &Zone) -> DateListIterator {
    DateListIterator::in_zone(values, zone)
}

/// Union of several sources.
pub fn join(sources: Vec<BoxedIterator>) -> MergedStream {
    MergedStream::new(sources)
}

/// `inclusion` without the values of `exclusion`.
pub fn except(inclusion: BoxedIterator, exclusion: BoxedIterator) -> CompoundIterator {
    CompoundIterator::new(vec![inclusion], vec![exclusion])
}

/// Union of `inclusions` without the union of `exclusions`.
pub fn compound(inclusions: Vec<BoxedIterator>, exclusions: Vec<BoxedIterator>) -> CompoundIterator {
    CompoundIterator::new(inclusions, exclusions)
}

/// The full recurrence set described by parsed content lines.
///
/// RRULEs and RDATEs include, EXRULEs and EXDATEs exclude. The start value
/// is an instance only when a rule or an RDATE produces it.
pub fn from_lines(lines: &RecurrenceLines) -> CompoundIterator {
    let rule = |spec: &RecurrenceSpec| -> BoxedIterator {
        Box::new(rrule_iterator(spec, lines.dtstart, &lines.zone))
    };

    let mut inclusions: Vec<BoxedIterator> = lines.rrules.iter().map(rule).collect();
    inclusions.extend(lines.rdates.iter().map(|line| -> BoxedIterator {
        Box::new(date_list_iterator(line.values.iter().copied(), &line.zone))
    }));

    let mut exclusions: Vec<BoxedIterator> = lines.exrules.iter().map(rule).collect();
    exclusions.extend(lines.exdates.iter().map(|line| -> BoxedIterator {
        Box::new(date_list_iterator(line.values.iter().copied(), &line.zone))
    }));

    debug!(
        dtstart = %lines.dtstart,
        zone = %lines.zone,
        inclusions = inclusions.len(),
        exclusions = exclusions.len(),
        "built recurrence set"
    );
    compound(inclusions, exclusions)
}

/// Parses content lines and builds their recurrence set.
///
/// ```
/// use recur_core::factory::parse_set;
///
/// let set = parse_set("DTSTART:20060411\nRRULE:FREQ=DAILY;COUNT=3\nEXDATE:20060412").unwrap();
/// let days: Vec<String> = set.map(|v| v.to_string()).collect();
/// assert_eq!(days, ["20060411", "20060413"]);
/// ```
pub fn parse_set(text: &str) -> Result<CompoundIterator> {
    Ok(from_lines(&RecurrenceLines::parse(text)?))
}
