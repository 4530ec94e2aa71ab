//! The schedule pattern data model.
//!
//! A [`SchedulePattern`] is the value a campaign embeds to describe when its
//! messages are sent: a shared base (timezone, start date, send time, optional
//! stop condition) plus one [`ScheduleKind`] payload. Every numeric field uses
//! the wire convention of the campaign document: weekdays are `0 = Sunday ..
//! 6 = Saturday` and months are `0 = January .. 11 = December`.
//!
//! The JSON shape is internally tagged by `scheduleType`:
//!
//! ```json
//! {
//!   "scheduleType": "monthly",
//!   "timeZone": "Europe/Berlin",
//!   "startDate": "2020-12-01",
//!   "sendTime": "10:35",
//!   "endAfterOccurrenceCount": 3,
//!   "byWeekDay": { "occurrence": "first", "weekDay": 2, "monthRecurrenceCount": 2 }
//! }
//! ```

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::anchor::{parse_send_time, parse_timezone, resolve_anchor};
use crate::error::{Result, ScheduleError};
use crate::generators::Recurrence;

// ── Ordinals ────────────────────────────────────────────────────────────────

/// Which weekday-in-month match to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occurrence {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl Occurrence {
    /// 1-based rank of the ordinal, or `None` for [`Occurrence::Last`].
    pub fn rank(self) -> Option<usize> {
        match self {
            Occurrence::First => Some(1),
            Occurrence::Second => Some(2),
            Occurrence::Third => Some(3),
            Occurrence::Fourth => Some(4),
            Occurrence::Last => None,
        }
    }
}

// ── Kind-specific payloads ──────────────────────────────────────────────────

/// Monthly on a fixed day of the month (clipped to short months).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOfMonthRule {
    /// Target day, `1..=31`.
    pub day_of_month: u32,
    /// Interval in months.
    pub month_recurrence_count: u32,
}

/// Monthly on the nth (or last) given weekday of the month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDayRule {
    #[serde(alias = "occurence")]
    pub occurrence: Occurrence,
    /// Wire weekday, `0 = Sunday .. 6 = Saturday`.
    pub week_day: u32,
    /// Interval in months.
    pub month_recurrence_count: u32,
}

/// Yearly on a fixed month and day (clipped to short months).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthDayRule {
    /// Wire month, `0 = January .. 11 = December`.
    pub month: u32,
    /// Target day, `1..=31`.
    pub day: u32,
}

/// Yearly on the nth (or last) given weekday of a fixed month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthWeekDayRule {
    /// Wire month, `0 = January .. 11 = December`.
    pub month: u32,
    #[serde(alias = "occurence")]
    pub occurrence: Occurrence,
    /// Wire weekday, `0 = Sunday .. 6 = Saturday`.
    pub week_day: u32,
}

/// The recurrence kind of a pattern and its payload.
///
/// `Monthly` and `Yearly` carry two optional sub-payloads because that is how
/// the campaign document stores them; exactly one must be present, which
/// [`SchedulePattern::validate`] enforces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "scheduleType",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ScheduleKind {
    OneTime,
    Daily {
        day_recurrence_count: u32,
    },
    Weekly {
        week_recurrence_count: u32,
        /// Indexed by wire weekday, Sunday first.
        day_of_week: [bool; 7],
    },
    Monthly {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        by_day_of_month: Option<DayOfMonthRule>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        by_week_day: Option<WeekDayRule>,
    },
    Yearly {
        year_recurrence_count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        by_month_day: Option<MonthDayRule>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        by_month_week_day: Option<MonthWeekDayRule>,
    },
}

impl ScheduleKind {
    /// The `scheduleType` discriminant as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ScheduleKind::OneTime => "oneTime",
            ScheduleKind::Daily { .. } => "daily",
            ScheduleKind::Weekly { .. } => "weekly",
            ScheduleKind::Monthly { .. } => "monthly",
            ScheduleKind::Yearly { .. } => "yearly",
        }
    }
}

// ── SchedulePattern ─────────────────────────────────────────────────────────

/// A complete schedule pattern: shared run duration plus a recurrence kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePattern {
    /// IANA timezone the pattern is anchored to.
    pub time_zone: String,
    /// First calendar date of the run (no time component).
    pub start_date: NaiveDate,
    /// Local time of day, `HH:MM` in 24-hour form, applied to every occurrence.
    pub send_time: String,
    /// Last calendar date of the run, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Stop after this many occurrences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_after_occurrence_count: Option<u32>,
    #[serde(flatten)]
    pub kind: ScheduleKind,
}

impl SchedulePattern {
    /// Create an open-ended pattern; use the `with_*` builders to bound it.
    pub fn new(
        time_zone: impl Into<String>,
        start_date: NaiveDate,
        send_time: impl Into<String>,
        kind: ScheduleKind,
    ) -> Self {
        Self {
            time_zone: time_zone.into(),
            start_date,
            send_time: send_time.into(),
            end_date: None,
            end_after_occurrence_count: None,
            kind,
        }
    }

    /// Stop the run after `end_date` (inclusive).
    #[must_use]
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Stop the run after `count` occurrences.
    #[must_use]
    pub fn with_occurrence_count(mut self, count: u32) -> Self {
        self.end_after_occurrence_count = Some(count);
        self
    }

    /// Deserialize a pattern from its JSON document form and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidPattern`] if the document does not match
    /// the pattern shape, plus any error [`SchedulePattern::validate`] reports.
    pub fn from_json(json: &str) -> Result<Self> {
        let pattern: SchedulePattern = serde_json::from_str(json)
            .map_err(|e| ScheduleError::InvalidPattern(e.to_string()))?;
        pattern.validate()?;
        Ok(pattern)
    }

    /// Check the construction-time constraints of the pattern.
    ///
    /// # Errors
    ///
    /// - [`ScheduleError::InvalidTimezone`] for an unknown IANA timezone
    /// - [`ScheduleError::InvalidSendTime`] if `sendTime` is not `HH:MM`
    /// - [`ScheduleError::InvalidPattern`] for a zero count, an out-of-range
    ///   day/month/weekday, or a monthly/yearly pattern without exactly one
    ///   sub-payload
    pub fn validate(&self) -> Result<()> {
        parse_timezone(&self.time_zone)?;
        parse_send_time(&self.send_time)?;

        if let Some(count) = self.end_after_occurrence_count {
            require_positive("endAfterOccurrenceCount", count)?;
        }

        let Some(recurrence) = Recurrence::from_kind(&self.kind)? else {
            return Ok(());
        };

        match recurrence {
            Recurrence::Daily { every } => require_positive("dayRecurrenceCount", every),
            Recurrence::Weekly { every, .. } => require_positive("weekRecurrenceCount", every),
            Recurrence::MonthlyByDayOfMonth(rule) => {
                require_day("dayOfMonth", rule.day_of_month)?;
                require_positive("monthRecurrenceCount", rule.month_recurrence_count)
            }
            Recurrence::MonthlyByWeekDay(rule) => {
                require_week_day(rule.week_day)?;
                require_positive("monthRecurrenceCount", rule.month_recurrence_count)
            }
            Recurrence::YearlyByMonthDay { every, rule } => {
                require_month(rule.month)?;
                require_day("day", rule.day)?;
                require_positive("yearRecurrenceCount", every)
            }
            Recurrence::YearlyByMonthWeekDay { every, rule } => {
                require_month(rule.month)?;
                require_week_day(rule.week_day)?;
                require_positive("yearRecurrenceCount", every)
            }
        }
    }

    /// The start anchor: `startDate` in the pattern's timezone, at `sendTime`
    /// when `include_time` is set and at local midnight otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidTimezone`] or
    /// [`ScheduleError::InvalidSendTime`] for a malformed pattern.
    pub fn start_date_in_time_zone(&self, include_time: bool) -> Result<DateTime<Tz>> {
        let time = include_time.then_some(self.send_time.as_str());
        resolve_anchor(self.start_date, &self.time_zone, time)
    }

    /// The end anchor, or `None` when the pattern has no `endDate`.
    ///
    /// # Errors
    ///
    /// Same as [`SchedulePattern::start_date_in_time_zone`].
    pub fn end_date_in_time_zone(&self, include_time: bool) -> Result<Option<DateTime<Tz>>> {
        let time = include_time.then_some(self.send_time.as_str());
        self.end_date
            .map(|end| resolve_anchor(end, &self.time_zone, time))
            .transpose()
    }
}

fn require_positive(field: &str, value: u32) -> Result<()> {
    if value == 0 {
        return Err(ScheduleError::InvalidPattern(format!(
            "{field} must be at least 1"
        )));
    }
    Ok(())
}

fn require_day(field: &str, value: u32) -> Result<()> {
    if !(1..=31).contains(&value) {
        return Err(ScheduleError::InvalidPattern(format!(
            "{field} must be in 1..=31, got {value}"
        )));
    }
    Ok(())
}

fn require_month(value: u32) -> Result<()> {
    if value > 11 {
        return Err(ScheduleError::InvalidPattern(format!(
            "month must be in 0..=11, got {value}"
        )));
    }
    Ok(())
}

fn require_week_day(value: u32) -> Result<()> {
    if value > 6 {
        return Err(ScheduleError::InvalidPattern(format!(
            "weekDay must be in 0..=6, got {value}"
        )));
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(every: u32) -> SchedulePattern {
        SchedulePattern::new(
            "Europe/Berlin",
            date(2020, 12, 1),
            "10:35",
            ScheduleKind::Daily {
                day_recurrence_count: every,
            },
        )
    }

    #[test]
    fn test_deserialize_monthly_by_week_day() {
        let json = r#"{
            "scheduleType": "monthly",
            "timeZone": "Europe/Berlin",
            "startDate": "2020-12-01",
            "sendTime": "10:35",
            "endAfterOccurrenceCount": 3,
            "byWeekDay": { "occurrence": "first", "weekDay": 2, "monthRecurrenceCount": 2 }
        }"#;
        let pattern = SchedulePattern::from_json(json).unwrap();
        assert_eq!(pattern.end_after_occurrence_count, Some(3));
        assert_eq!(
            pattern.kind,
            ScheduleKind::Monthly {
                by_day_of_month: None,
                by_week_day: Some(WeekDayRule {
                    occurrence: Occurrence::First,
                    week_day: 2,
                    month_recurrence_count: 2,
                }),
            }
        );
    }

    #[test]
    fn test_deserialize_accepts_legacy_occurence_spelling() {
        let json = r#"{
            "scheduleType": "yearly",
            "timeZone": "Europe/Berlin",
            "startDate": "2020-01-06",
            "sendTime": "10:35",
            "yearRecurrenceCount": 3,
            "byMonthWeekDay": { "month": 11, "weekDay": 1, "occurence": "last" }
        }"#;
        let pattern = SchedulePattern::from_json(json).unwrap();
        match pattern.kind {
            ScheduleKind::Yearly {
                by_month_week_day: Some(rule),
                ..
            } => assert_eq!(rule.occurrence, Occurrence::Last),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let pattern = SchedulePattern::new(
            "Europe/Berlin",
            date(2020, 12, 1),
            "10:35",
            ScheduleKind::Weekly {
                week_recurrence_count: 3,
                day_of_week: [false, true, false, false, false, false, false],
            },
        )
        .with_occurrence_count(5);
        let value = serde_json::to_value(&pattern).unwrap();
        assert_eq!(value["scheduleType"], "weekly");
        assert_eq!(value["startDate"], "2020-12-01");
        assert_eq!(value["weekRecurrenceCount"], 3);
        assert_eq!(value["endAfterOccurrenceCount"], 5);
        assert!(value.get("endDate").is_none());
    }

    #[test]
    fn test_one_time_has_no_payload() {
        let json = r#"{"scheduleType":"oneTime","timeZone":"UTC","startDate":"2021-03-04","sendTime":"08:00"}"#;
        let pattern = SchedulePattern::from_json(json).unwrap();
        assert_eq!(pattern.kind, ScheduleKind::OneTime);
        assert_eq!(pattern.kind.name(), "oneTime");
    }

    #[test]
    fn test_unknown_schedule_type_is_rejected() {
        let json = r#"{"scheduleType":"hourly","timeZone":"UTC","startDate":"2021-03-04","sendTime":"08:00"}"#;
        let err = SchedulePattern::from_json(json).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidPattern(_)), "got: {err}");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let err = daily(0).validate().unwrap_err();
        assert!(err.to_string().contains("dayRecurrenceCount"), "got: {err}");
    }

    #[test]
    fn test_validate_rejects_zero_occurrence_count() {
        let err = daily(1).with_occurrence_count(0).validate().unwrap_err();
        assert!(
            err.to_string().contains("endAfterOccurrenceCount"),
            "got: {err}"
        );
    }

    #[test]
    fn test_validate_rejects_bad_timezone_and_send_time() {
        let mut pattern = daily(1);
        pattern.time_zone = "Mars/Olympus".to_string();
        assert!(matches!(
            pattern.validate(),
            Err(ScheduleError::InvalidTimezone(_))
        ));

        let mut pattern = daily(1);
        pattern.send_time = "1035".to_string();
        assert!(matches!(
            pattern.validate(),
            Err(ScheduleError::InvalidSendTime(_))
        ));
    }

    #[test]
    fn test_validate_rejects_monthly_without_payload() {
        let pattern = SchedulePattern::new(
            "Europe/Berlin",
            date(2020, 12, 1),
            "10:35",
            ScheduleKind::Monthly {
                by_day_of_month: None,
                by_week_day: None,
            },
        );
        let err = pattern.validate().unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidPattern(_)), "got: {err}");
    }

    #[test]
    fn test_validate_rejects_yearly_with_both_payloads() {
        let pattern = SchedulePattern::new(
            "Europe/Berlin",
            date(2020, 12, 1),
            "10:35",
            ScheduleKind::Yearly {
                year_recurrence_count: 1,
                by_month_day: Some(MonthDayRule { month: 1, day: 3 }),
                by_month_week_day: Some(MonthWeekDayRule {
                    month: 1,
                    occurrence: Occurrence::First,
                    week_day: 1,
                }),
            },
        );
        let err = pattern.validate().unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidPattern(_)), "got: {err}");
    }

    #[test]
    fn test_validate_rejects_out_of_range_fields() {
        let pattern = SchedulePattern::new(
            "Europe/Berlin",
            date(2020, 12, 1),
            "10:35",
            ScheduleKind::Yearly {
                year_recurrence_count: 1,
                by_month_day: Some(MonthDayRule { month: 12, day: 3 }),
                by_month_week_day: None,
            },
        );
        assert!(pattern.validate().unwrap_err().to_string().contains("month"));

        let pattern = SchedulePattern::new(
            "Europe/Berlin",
            date(2020, 12, 1),
            "10:35",
            ScheduleKind::Monthly {
                by_day_of_month: None,
                by_week_day: Some(WeekDayRule {
                    occurrence: Occurrence::Second,
                    week_day: 7,
                    month_recurrence_count: 1,
                }),
            },
        );
        assert!(pattern.validate().unwrap_err().to_string().contains("weekDay"));
    }

    #[test]
    fn test_start_date_with_and_without_time() {
        let pattern = daily(1);
        let with_time = pattern.start_date_in_time_zone(true).unwrap();
        assert_eq!((with_time.hour(), with_time.minute()), (10, 35));

        let midnight = pattern.start_date_in_time_zone(false).unwrap();
        assert_eq!(
            midnight,
            chrono_tz::Europe::Berlin
                .with_ymd_and_hms(2020, 12, 1, 0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_end_date_absent_is_none() {
        assert_eq!(daily(1).end_date_in_time_zone(true).unwrap(), None);
        let bounded = daily(1).with_end_date(date(2021, 1, 10));
        let end = bounded.end_date_in_time_zone(true).unwrap().unwrap();
        assert_eq!(end.date_naive(), date(2021, 1, 10));
    }
}
