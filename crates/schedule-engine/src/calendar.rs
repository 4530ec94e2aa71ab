//! Calendar primitives shared by the next-date generators.
//!
//! chrono numbers weekdays `1 = Monday .. 7 = Sunday` (ISO) and months
//! `1 = January .. 12 = December`, while patterns use the wire convention
//! `0 = Sunday .. 6 = Saturday` and `0 = January .. 11 = December`. The four
//! adapters below are the only place either convention is translated.

use chrono::{Datelike, Months, NaiveDate};

use crate::pattern::Occurrence;

// ── Numbering adapters ──────────────────────────────────────────────────────

/// ISO weekday (`1 = Monday .. 7 = Sunday`) to wire weekday (`0 = Sunday .. 6 = Saturday`).
pub fn library_weekday_to_wire(weekday: u32) -> u32 {
    weekday % 7
}

/// Wire weekday (`0 = Sunday .. 6 = Saturday`) to ISO weekday (`1 = Monday .. 7 = Sunday`).
pub fn wire_weekday_to_library(weekday: u32) -> u32 {
    if weekday == 0 {
        7
    } else {
        weekday
    }
}

/// Calendar month (`1 = January`) to wire month (`0 = January`).
pub fn library_month_to_wire(month: u32) -> u32 {
    debug_assert!((1..=12).contains(&month), "calendar month out of range: {month}");
    month - 1
}

/// Wire month (`0 = January`) to calendar month (`1 = January`).
pub fn wire_month_to_library(month: u32) -> u32 {
    month + 1
}

/// The wire weekday of a date.
pub fn wire_weekday(date: NaiveDate) -> u32 {
    library_weekday_to_wire(date.weekday().number_from_monday())
}

// ── Month arithmetic ────────────────────────────────────────────────────────

/// Number of days in the given month, or `None` for an invalid year/month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// The date `day` in the given month, clipped to the month's last day.
pub fn clip_to_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.day0()))
}

/// First day of the month `months` after the month containing `date`.
pub fn add_months_to_month_start(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    month_start(date).checked_add_months(Months::new(months))
}

// ── Occurrence translator ───────────────────────────────────────────────────

/// Find the `occurrence`-th `week_day` (wire numbering) in the month of `reference`.
///
/// Scans the month day by day from the 1st. For `first..fourth` the match with
/// that rank is taken; for `last` the final match of the month. Returns `None`
/// when the month has no such match, or when the match lies before `reference`
/// (the caller then moves on to a later month).
pub fn find_occurrence(
    occurrence: Occurrence,
    week_day: u32,
    reference: NaiveDate,
) -> Option<NaiveDate> {
    let first = month_start(reference);
    let mut matches = first
        .iter_days()
        .take_while(|day| day.month() == first.month())
        .filter(|day| wire_weekday(*day) == week_day);

    let found = match occurrence.rank() {
        Some(rank) => matches.nth(rank - 1),
        None => matches.last(),
    }?;

    (found >= reference).then_some(found)
}

// ── Tests ───────────────────────────────────────────────────────────────────
