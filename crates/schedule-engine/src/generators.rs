//! Per-kind next-date generators.
//!
//! Each generator maps "the last emitted local date, if any" to the next local
//! date of the schedule. Generators work on calendar dates only; the expander
//! attaches the send time and timezone afterwards, so the wall-clock time never
//! drifts across DST changes.
//!
//! Searches for a weekday or weekday-in-month match are bounded: a generator
//! that inspects `max_search_periods` candidate periods without a match fails
//! with [`ScheduleError::SearchExhausted`] instead of spinning.

use chrono::{Datelike, Days, NaiveDate};

use crate::calendar::{
    add_months_to_month_start, clip_to_month, find_occurrence, wire_month_to_library,
    wire_weekday,
};
use crate::error::{Result, ScheduleError};
use crate::pattern::{DayOfMonthRule, MonthDayRule, MonthWeekDayRule, ScheduleKind, WeekDayRule};

/// A recurring pattern resolved to the generator that expands it.
///
/// Built from a [`ScheduleKind`] by [`Recurrence::from_kind`], which is where
/// the monthly/yearly "exactly one sub-payload" rule is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence<'a> {
    Daily {
        every: u32,
    },
    Weekly {
        every: u32,
        days: &'a [bool; 7],
    },
    MonthlyByDayOfMonth(&'a DayOfMonthRule),
    MonthlyByWeekDay(&'a WeekDayRule),
    YearlyByMonthDay {
        every: u32,
        rule: &'a MonthDayRule,
    },
    YearlyByMonthWeekDay {
        every: u32,
        rule: &'a MonthWeekDayRule,
    },
}

impl<'a> Recurrence<'a> {
    /// Resolve a kind to its generator; `None` for a one-time pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidPattern`] when a monthly or yearly kind
    /// has neither or both of its sub-payloads.
    pub fn from_kind(kind: &'a ScheduleKind) -> Result<Option<Self>> {
        let recurrence = match kind {
            ScheduleKind::OneTime => return Ok(None),
            ScheduleKind::Daily {
                day_recurrence_count,
            } => Recurrence::Daily {
                every: *day_recurrence_count,
            },
            ScheduleKind::Weekly {
                week_recurrence_count,
                day_of_week,
            } => Recurrence::Weekly {
                every: *week_recurrence_count,
                days: day_of_week,
            },
            ScheduleKind::Monthly {
                by_day_of_month,
                by_week_day,
            } => match (by_day_of_month, by_week_day) {
                (Some(rule), None) => Recurrence::MonthlyByDayOfMonth(rule),
                (None, Some(rule)) => Recurrence::MonthlyByWeekDay(rule),
                (None, None) => {
                    return Err(ScheduleError::InvalidPattern(
                        "monthly pattern needs byDayOfMonth or byWeekDay".to_string(),
                    ))
                }
                (Some(_), Some(_)) => {
                    return Err(ScheduleError::InvalidPattern(
                        "monthly pattern has both byDayOfMonth and byWeekDay".to_string(),
                    ))
                }
            },
            ScheduleKind::Yearly {
                year_recurrence_count,
                by_month_day,
                by_month_week_day,
            } => {
                let every = *year_recurrence_count;
                match (by_month_day, by_month_week_day) {
                    (Some(rule), None) => Recurrence::YearlyByMonthDay { every, rule },
                    (None, Some(rule)) => Recurrence::YearlyByMonthWeekDay { every, rule },
                    (None, None) => {
                        return Err(ScheduleError::InvalidPattern(
                            "yearly pattern needs byMonthDay or byMonthWeekDay".to_string(),
                        ))
                    }
                    (Some(_), Some(_)) => {
                        return Err(ScheduleError::InvalidPattern(
                            "yearly pattern has both byMonthDay and byMonthWeekDay".to_string(),
                        ))
                    }
                }
            }
        };
        Ok(Some(recurrence))
    }

    /// Generator name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Recurrence::Daily { .. } => "daily",
            Recurrence::Weekly { .. } => "weekly",
            Recurrence::MonthlyByDayOfMonth(_) => "monthly byDayOfMonth",
            Recurrence::MonthlyByWeekDay(_) => "monthly byWeekDay",
            Recurrence::YearlyByMonthDay { .. } => "yearly byMonthDay",
            Recurrence::YearlyByMonthWeekDay { .. } => "yearly byMonthWeekDay",
        }
    }

    /// The date following `last`, or the first date of the run when `last` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::SearchExhausted`] when no qualifying date is
    /// found within `max_search_periods` candidate periods, and
    /// [`ScheduleError::InvalidDatetime`] if the date range overflows.
    pub fn next(
        &self,
        start: NaiveDate,
        last: Option<NaiveDate>,
        max_search_periods: u32,
    ) -> Result<NaiveDate> {
        match *self {
            Recurrence::Daily { every } => next_daily(start, every, last),
            Recurrence::Weekly { every, days } => {
                next_weekly(start, every, days, last, max_search_periods)
            }
            Recurrence::MonthlyByDayOfMonth(rule) => next_monthly_by_day_of_month(start, rule, last),
            Recurrence::MonthlyByWeekDay(rule) => {
                next_monthly_by_week_day(start, rule, last, max_search_periods)
            }
            Recurrence::YearlyByMonthDay { every, rule } => {
                next_yearly_by_month_day(start, every, rule, last)
            }
            Recurrence::YearlyByMonthWeekDay { every, rule } => {
                next_yearly_by_month_week_day(start, every, rule, last, max_search_periods)
            }
        }
    }
}

// ── Daily ───────────────────────────────────────────────────────────────────

/// Every `every` days, starting on `start`.
pub fn next_daily(start: NaiveDate, every: u32, last: Option<NaiveDate>) -> Result<NaiveDate> {
    match last {
        None => Ok(start),
        Some(last) => add_days(last, u64::from(every)),
    }
}

// ── Weekly ──────────────────────────────────────────────────────────────────

/// Every flagged weekday (Sunday-first weeks) of every `every`-th week.
///
/// The first date is the first flagged weekday on or after `start`. After
/// that, the remaining flagged days of the current week are emitted in order,
/// then the search jumps to the Sunday `every` weeks after the current week's
/// Sunday. Each seven-day window inspected counts as one candidate period.
pub fn next_weekly(
    start: NaiveDate,
    every: u32,
    days: &[bool; 7],
    last: Option<NaiveDate>,
    max_search_periods: u32,
) -> Result<NaiveDate> {
    let first_flagged = |from: u32| (from..7).find(|wd| days[*wd as usize]);

    let Some(last) = last else {
        let mut window = start;
        for _ in 0..max_search_periods {
            for offset in 0..7 {
                let candidate = add_days(window, offset)?;
                if days[wire_weekday(candidate) as usize] {
                    return Ok(candidate);
                }
            }
            window = add_days(window, 7)?;
        }
        return Err(exhausted("weekly", max_search_periods));
    };

    let last_week_day = wire_weekday(last);
    let mut week_start = sub_days(last, u64::from(last_week_day))?;

    if let Some(week_day) = first_flagged(last_week_day + 1) {
        return add_days(week_start, u64::from(week_day));
    }

    for _ in 0..max_search_periods {
        week_start = add_days(week_start, 7 * u64::from(every))?;
        if let Some(week_day) = first_flagged(0) {
            return add_days(week_start, u64::from(week_day));
        }
    }
    Err(exhausted("weekly", max_search_periods))
}

// ── Monthly ─────────────────────────────────────────────────────────────────

/// A fixed day of the month, clipped to short months.
///
/// The first date falls in the start month if its target day has not passed,
/// otherwise in the following month.
pub fn next_monthly_by_day_of_month(
    start: NaiveDate,
    rule: &DayOfMonthRule,
    last: Option<NaiveDate>,
) -> Result<NaiveDate> {
    let month = match last {
        None if start.day() <= rule.day_of_month => add_months(start, 0)?,
        None => add_months(start, 1)?,
        Some(last) => add_months(last, rule.month_recurrence_count)?,
    };
    clip(month.year(), month.month(), rule.day_of_month)
}

/// The nth (or last) weekday of every `monthRecurrenceCount`-th month.
///
/// The first search starts at `start` itself and steps one month at a time
/// until the ordinal resolves on or after `start`. Later searches start
/// `monthRecurrenceCount` months after the last emitted month and step by
/// that interval.
pub fn next_monthly_by_week_day(
    start: NaiveDate,
    rule: &WeekDayRule,
    last: Option<NaiveDate>,
    max_search_periods: u32,
) -> Result<NaiveDate> {
    let (mut reference, step) = match last {
        None => (start, 1),
        Some(last) => (
            add_months(last, rule.month_recurrence_count)?,
            rule.month_recurrence_count,
        ),
    };

    for _ in 0..max_search_periods {
        if let Some(found) = find_occurrence(rule.occurrence, rule.week_day, reference) {
            return Ok(found);
        }
        reference = add_months(reference, step)?;
    }
    Err(exhausted("monthly byWeekDay", max_search_periods))
}

// ── Yearly ──────────────────────────────────────────────────────────────────

/// A fixed month and day every `every` years, clipped to short months.
///
/// The day is re-clipped for each year, so a Feb 29 target lands on Feb 28 in
/// common years and back on Feb 29 in leap years.
pub fn next_yearly_by_month_day(
    start: NaiveDate,
    every: u32,
    rule: &MonthDayRule,
    last: Option<NaiveDate>,
) -> Result<NaiveDate> {
    let month = wire_month_to_library(rule.month);
    let year = match last {
        None => {
            let candidate = clip(start.year(), month, rule.day)?;
            if candidate < start {
                add_years(start.year(), 1)?
            } else {
                start.year()
            }
        }
        Some(last) => add_years(last.year(), every)?,
    };
    clip(year, month, rule.day)
}

/// The nth (or last) weekday of a fixed month every `every` years.
///
/// Matches that fall before `start` are discarded, which only matters for the
/// first year searched.
pub fn next_yearly_by_month_week_day(
    start: NaiveDate,
    every: u32,
    rule: &MonthWeekDayRule,
    last: Option<NaiveDate>,
    max_search_periods: u32,
) -> Result<NaiveDate> {
    let month = wire_month_to_library(rule.month);
    let (mut year, step) = match last {
        None => (start.year(), 1),
        Some(last) => (add_years(last.year(), every)?, every),
    };

    for _ in 0..max_search_periods {
        let reference = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| out_of_range(format!("month {month} of year {year}")))?;
        let found = find_occurrence(rule.occurrence, rule.week_day, reference)
            .filter(|found| *found >= start);
        if let Some(found) = found {
            return Ok(found);
        }
        year = add_years(year, step)?;
    }
    Err(exhausted("yearly byMonthWeekDay", max_search_periods))
}

// ── Internal helpers ────────────────────────────────────────────────────────

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| out_of_range(format!("{date} + {days} days")))
}

fn sub_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(days))
        .ok_or_else(|| out_of_range(format!("{date} - {days} days")))
}

/// First day of the month `months` after the month of `date`.
fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    add_months_to_month_start(date, months)
        .ok_or_else(|| out_of_range(format!("{date} + {months} months")))
}

fn add_years(year: i32, years: u32) -> Result<i32> {
    i32::try_from(years)
        .ok()
        .and_then(|years| year.checked_add(years))
        .ok_or_else(|| out_of_range(format!("year {year} + {years}")))
}

fn clip(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    clip_to_month(year, month, day)
        .ok_or_else(|| out_of_range(format!("{year}-{month:02}-{day:02}")))
}

fn out_of_range(what: String) -> ScheduleError {
    ScheduleError::InvalidDatetime(format!("date out of range: {what}"))
}

fn exhausted(generator: &str, periods: u32) -> ScheduleError {
    tracing::warn!(generator, periods, "next-date search exhausted");
    ScheduleError::SearchExhausted(format!(
        "{generator} generator found no date within {periods} candidate period(s)"
    ))
}

// ── Tests ───────────────────────────────────────────────────────────────────
