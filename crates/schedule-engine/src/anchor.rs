//! Anchor resolution: calendar date + IANA timezone + `HH:MM` → instant.
//!
//! The wall-clock time is pinned in the target zone, so a schedule keeps
//! firing at `10:35` local time across DST changes and only the UTC offset
//! moves.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::error::{Result, ScheduleError};

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone(format!("'{}'", s)))
}

/// Parse a send time in strict 24-hour `HH:MM` form.
pub fn parse_send_time(s: &str) -> Result<NaiveTime> {
    let well_formed = s.len() == 5
        && s.as_bytes()[2] == b':'
        && s.bytes()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit());
    if !well_formed {
        return Err(ScheduleError::InvalidSendTime(format!(
            "'{s}': expected HH:MM"
        )));
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| ScheduleError::InvalidSendTime(format!("'{s}': {e}")))
}

/// Resolve a calendar date in `time_zone` to an instant.
///
/// With `time` (`HH:MM`) the instant is at that local wall-clock time; without
/// it, at local midnight.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTimezone`] for an unknown timezone or
/// [`ScheduleError::InvalidSendTime`] for a malformed time.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, Timelike};
/// use schedule_engine::resolve_anchor;
///
/// let date = NaiveDate::from_ymd_opt(2020, 12, 1).unwrap();
/// let anchor = resolve_anchor(date, "Europe/Berlin", Some("10:35")).unwrap();
/// assert_eq!((anchor.hour(), anchor.minute()), (10, 35));
/// // Berlin is UTC+1 in December.
/// assert_eq!(anchor.naive_utc().hour(), 9);
/// ```
pub fn resolve_anchor(date: NaiveDate, time_zone: &str, time: Option<&str>) -> Result<DateTime<Tz>> {
    let tz = parse_timezone(time_zone)?;
    let time = match time {
        Some(t) => parse_send_time(t)?,
        None => NaiveTime::MIN,
    };
    localize(&tz, date, time)
}

/// Place a local date and wall-clock time in `tz`.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// spring-forward gap are read with the offset in force before the gap, which
/// lands them just after it (02:30 becomes 03:30 in Europe/Berlin).
pub(crate) fn localize(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>> {
    let naive = date.and_time(time);
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Ok(dt);
    }
    localize_in_gap(tz, naive).ok_or_else(|| {
        ScheduleError::InvalidDatetime(format!("{naive} does not exist in {}", tz.name()))
    })
}

fn localize_in_gap(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    let before = tz
        .from_local_datetime(&(naive - Duration::hours(3)))
        .earliest()?;
    let offset = before.offset().fix();
    let utc = naive - Duration::seconds(i64::from(offset.local_minus_utc()));
    Some(tz.from_utc_datetime(&utc))
}

// ── Tests ───────────────────────────────────────────────────────────────────
