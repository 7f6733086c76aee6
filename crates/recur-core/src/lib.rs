//! # recur-core
//!
//! An RFC 5545 recurrence expansion engine.
//!
//! Given a recurrence rule (`RRULE`/`EXRULE`), a start value and an optional
//! zone, this library lazily enumerates the instances the rule describes and
//! combines them with explicit dates (`RDATE`/`EXDATE`) into a recurrence set.
//!
//! ## Features
//!
//! - **Lazy**: every iterator is pull-based, so unbounded rules cost nothing
//!   until read.
//! - **Fast-forward**: [`RecurrenceIterator::advance_to`] skips ahead without
//!   losing COUNT accounting.
//! - **Full BYxxx support**: BYMONTH, BYWEEKNO, BYYEARDAY, BYMONTHDAY, BYDAY,
//!   BYHOUR, BYMINUTE, BYSECOND and BYSETPOS, with negative ordinals and a
//!   configurable week start.
//! - **Zones**: start values in IANA zones or fixed offsets expand in local
//!   time and are emitted in UTC.
//!
//! ## Example
//!
//! ```rust
//! use recur_core::prelude::*;
//!
//! let spec: RecurrenceSpec = "FREQ=MONTHLY;BYDAY=1FR;COUNT=3".parse().unwrap();
//! let start: CalendarValue = "19970905".parse().unwrap();
//!
//! let days: Vec<String> = rrule_iterator(&spec, start, &Zone::Floating)
//!     .map(|v| v.to_string())
//!     .collect();
//! assert_eq!(days, ["19970905", "19971003", "19971107"]);
//! ```

pub mod calendar;
pub mod compound;
mod conditions;
mod cursor;
pub mod date_list;
pub mod error;
pub mod factory;
mod filters;
mod generators;
pub mod iter;
pub mod models;
pub mod parse;
pub mod plan;
pub mod recurrence;
pub mod rrule_iter;
pub mod tz;

// Re-export commonly used types at the crate root
pub use compound::{BoxedIterator, CompoundIterator, MergedStream};
pub use date_list::DateListIterator;
pub use error::{RecurError, Result};
pub use factory::{compound, date_list_iterator, except, from_lines, join, parse_set, rrule_iterator};
pub use iter::RecurrenceIterator;
pub use models::{CalendarValue, DateTimeValue, DateValue, Weekday};
pub use parse::{DateLine, RecurrenceLines, parse_calendar_value};
pub use plan::{ByPart, RolePlan, partition, present_parts};
pub use recurrence::{Frequency, RecurrenceSpec, RecurrenceSpecBuilder, WeekdayNum};
pub use rrule_iter::RRuleIterator;
pub use tz::{Zone, parse_zone};

/// Prelude module for convenient imports.
///
/// ```
/// use recur_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::compound::{BoxedIterator, CompoundIterator, MergedStream};
    pub use crate::error::{RecurError, Result};
    pub use crate::factory::*;
    pub use crate::iter::RecurrenceIterator;
    pub use crate::models::*;
    pub use crate::parse::{RecurrenceLines, parse_calendar_value};
    pub use crate::recurrence::*;
    pub use crate::rrule_iter::RRuleIterator;
    pub use crate::tz::{Zone, parse_zone};
}
