//! Plan text handling: splitting raw text into weeks and grouping weeks
//! into months.

pub mod months;
pub mod week_parser;

pub use months::{MonthBucket, group_by_month};
pub use week_parser::{WeekFragment, parse_weeks};
