//! Calendar month arithmetic for lagged effects.
//!
//! Adding months rolls over into following years and clamps the day of month
//! to the length of the target month (Jan 31 + 1 month is Feb 28 or 29).

use chrono::{Datelike, Months, NaiveDate};

/// `date + months`, clamped to the last day of the target month.
///
/// Returns `None` only when the result falls outside chrono's representable
/// range.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
  date.checked_add_months(Months::new(months))
}

/// The calendar year in which an effect lagged by `months` lands.
pub fn effective_year(date: NaiveDate, months: u32) -> Option<i32> {
  add_months(date, months).map(|d| d.year())
}
