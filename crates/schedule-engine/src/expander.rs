//! Schedule expansion: [`SchedulePattern`] → ordered list of send instants.
//!
//! The expander resolves the start anchor, picks the generator for the
//! pattern's kind and feeds each generated date back into it until the stop
//! rule is met:
//!
//! - `endAfterOccurrenceCount` caps the number of generator calls;
//! - `endDate` (resolved at `sendTime`) ends the run at the first date past it;
//! - with neither, the run ends at the no-end-date horizon (start + 5 years).
//!
//! Expansion is a pure function of the pattern and options. Calling it twice on
//! the same pattern yields the same instants, which lets callers re-derive a
//! schedule and compare it with what they stored earlier.

use chrono::{DateTime, Months, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::anchor::{localize, parse_send_time, parse_timezone};
use crate::error::{Result, ScheduleError};
use crate::generators::Recurrence;
use crate::pattern::{ScheduleKind, SchedulePattern};

/// Years added to the start anchor when a recurring pattern has no stop condition.
pub const NO_END_DATE_HORIZON_YEARS: u32 = 5;

/// Default number of candidate periods a generator may inspect before giving up.
pub const DEFAULT_MAX_SEARCH_PERIODS: u32 = 120;

/// Occurrence cap applied by [`preview_schedule`] to open-ended patterns.
pub const PREVIEW_OCCURRENCE_LIMIT: u32 = 24;

/// Options for [`generate_schedule_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScheduleOptions {
    /// No-end-date horizon in years.
    pub horizon_years: u32,
    /// Candidate weeks/months/years a generator may inspect per call.
    pub max_search_periods: u32,
}

impl ScheduleOptions {
    /// Reject a zero search bound, which would fail every search unseen.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidOptions`] when `max_search_periods` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.max_search_periods == 0 {
            return Err(ScheduleError::InvalidOptions(
                "maxSearchPeriods must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            horizon_years: NO_END_DATE_HORIZON_YEARS,
            max_search_periods: DEFAULT_MAX_SEARCH_PERIODS,
        }
    }
}

// ── determine_end_date ──────────────────────────────────────────────────────

/// The effective end anchor of a pattern, using default options.
///
/// See [`determine_end_date_with_options`].
pub fn determine_end_date(pattern: &SchedulePattern) -> Result<Option<DateTime<Tz>>> {
    determine_end_date_with_options(pattern, &ScheduleOptions::default())
}

/// The effective end anchor of a pattern.
///
/// - one-time patterns have none;
/// - an explicit `endDate` resolves at `sendTime` in the pattern's timezone;
/// - with neither `endDate` nor `endAfterOccurrenceCount`, the start anchor plus
///   `horizon_years` (Feb 29 clips to Feb 28);
/// - with only `endAfterOccurrenceCount`, none: the count bounds the run.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTimezone`] or [`ScheduleError::InvalidSendTime`]
/// for a malformed pattern.
pub fn determine_end_date_with_options(
    pattern: &SchedulePattern,
    options: &ScheduleOptions,
) -> Result<Option<DateTime<Tz>>> {
    if pattern.kind == ScheduleKind::OneTime {
        return Ok(None);
    }

    if let Some(end) = pattern.end_date_in_time_zone(true)? {
        return Ok(Some(end));
    }

    if pattern.end_after_occurrence_count.is_some() {
        return Ok(None);
    }

    let tz = parse_timezone(&pattern.time_zone)?;
    let send_time = parse_send_time(&pattern.send_time)?;
    let horizon = add_years(pattern.start_date, options.horizon_years)?;
    localize(&tz, horizon, send_time).map(Some)
}

// ── generate_schedule ───────────────────────────────────────────────────────

/// Expand a pattern into its send instants, using default options.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use schedule_engine::{generate_schedule, ScheduleKind, SchedulePattern};
///
/// let pattern = SchedulePattern::new(
///     "Europe/Berlin",
///     NaiveDate::from_ymd_opt(2020, 12, 1).unwrap(),
///     "10:35",
///     ScheduleKind::Daily { day_recurrence_count: 2 },
/// )
/// .with_occurrence_count(5);
///
/// let dates = generate_schedule(&pattern).unwrap();
/// let days: Vec<String> = dates.iter().map(|d| d.format("%m-%d %H:%M").to_string()).collect();
/// assert_eq!(days, ["12-01 10:35", "12-03 10:35", "12-05 10:35", "12-07 10:35", "12-09 10:35"]);
/// ```
pub fn generate_schedule(pattern: &SchedulePattern) -> Result<Vec<DateTime<Tz>>> {
    generate_schedule_with_options(pattern, &ScheduleOptions::default())
}

/// Expand a pattern into its send instants.
///
/// The result is strictly ascending, every instant is at `sendTime` local time
/// in the pattern's timezone, and none lies after the effective end anchor.
///
/// The run stops as soon as either `endAfterOccurrenceCount` generator calls
/// have been made or a generated date falls past the end anchor. The date that
/// crosses the end anchor is counted as an attempt but not emitted. When both
/// are set the count is honoured too, so `endDate` does not extend a run past
/// its occurrence count.
///
/// # Errors
///
/// - any error reported by [`SchedulePattern::validate`]
/// - [`ScheduleError::InvalidOptions`] if `max_search_periods` is 0
/// - [`ScheduleError::SearchExhausted`] if a generator stalls
/// - [`ScheduleError::InvalidDatetime`] if a date leaves chrono's range
pub fn generate_schedule_with_options(
    pattern: &SchedulePattern,
    options: &ScheduleOptions,
) -> Result<Vec<DateTime<Tz>>> {
    pattern.validate()?;
    options.validate()?;

    let tz = parse_timezone(&pattern.time_zone)?;
    let send_time = parse_send_time(&pattern.send_time)?;

    let Some(recurrence) = Recurrence::from_kind(&pattern.kind)? else {
        let start = localize(&tz, pattern.start_date, send_time)?;
        tracing::debug!(schedule_type = "oneTime", %start, "expanded schedule");
        return Ok(vec![start]);
    };

    let end = determine_end_date_with_options(pattern, options)?;
    let limit = pattern.end_after_occurrence_count;

    let mut dates = Vec::new();
    let mut last: Option<NaiveDate> = None;
    let mut attempts: u32 = 0;

    while limit.is_none_or(|limit| attempts < limit) {
        let next = recurrence.next(pattern.start_date, last, options.max_search_periods)?;
        attempts += 1;

        let instant = localize(&tz, next, send_time)?;
        if end.is_some_and(|end| instant > end) {
            break;
        }
        dates.push(instant);
        last = Some(next);
    }

    tracing::debug!(
        schedule_type = pattern.kind.name(),
        generator = recurrence.name(),
        occurrences = dates.len(),
        attempts,
        "expanded schedule"
    );
    Ok(dates)
}

// ── preview_schedule ────────────────────────────────────────────────────────

/// Expand a pattern for display before it is saved.
///
/// Identical to [`generate_schedule`] except that a recurring pattern with no
/// stop condition is cut at [`PREVIEW_OCCURRENCE_LIMIT`] occurrences rather
/// than run to the five-year horizon. The input pattern is left untouched.
pub fn preview_schedule(pattern: &SchedulePattern) -> Result<Vec<DateTime<Tz>>> {
    preview_schedule_with_options(pattern, &ScheduleOptions::default())
}

/// [`preview_schedule`] with explicit options.
pub fn preview_schedule_with_options(
    pattern: &SchedulePattern,
    options: &ScheduleOptions,
) -> Result<Vec<DateTime<Tz>>> {
    let open_ended = pattern.kind != ScheduleKind::OneTime
        && pattern.end_date.is_none()
        && pattern.end_after_occurrence_count.is_none();

    if open_ended {
        let capped = pattern
            .clone()
            .with_occurrence_count(PREVIEW_OCCURRENCE_LIMIT);
        generate_schedule_with_options(&capped, options)
    } else {
        generate_schedule_with_options(pattern, options)
    }
}

// ── Internal helpers ────────────────────────────────────────────────────────

fn add_years(date: NaiveDate, years: u32) -> Result<NaiveDate> {
    years
        .checked_mul(12)
        .and_then(|months| date.checked_add_months(Months::new(months)))
        .ok_or_else(|| {
            ScheduleError::InvalidDatetime(format!("date out of range: {date} + {years} years"))
        })
}

// ── Tests ───────────────────────────────────────────────────────────────────
