//! Property tests for the invariants every expanded schedule must satisfy.

use chrono::{NaiveDate, Timelike};
use proptest::prelude::*;
use schedule_engine::{
    generate_schedule, DayOfMonthRule, MonthDayRule, MonthWeekDayRule, Occurrence, ScheduleKind,
    SchedulePattern, WeekDayRule,
};

// Send hours stay clear of 02:00-03:59, where DST gaps shift the wall clock.
const TIMEZONES: &[&str] = &[
    "UTC",
    "Europe/Berlin",
    "America/New_York",
    "Asia/Tokyo",
    "Australia/Sydney",
];

fn arb_occurrence() -> impl Strategy<Value = Occurrence> {
    prop_oneof![
        Just(Occurrence::First),
        Just(Occurrence::Second),
        Just(Occurrence::Third),
        Just(Occurrence::Fourth),
        Just(Occurrence::Last),
    ]
}

fn arb_kind() -> impl Strategy<Value = ScheduleKind> {
    prop_oneof![
        (1u32..=30).prop_map(|n| ScheduleKind::Daily {
            day_recurrence_count: n
        }),
        (1u32..=4, any::<[bool; 7]>())
            .prop_filter("at least one weekday", |(_, days)| days.iter().any(|d| *d))
            .prop_map(|(n, days)| ScheduleKind::Weekly {
                week_recurrence_count: n,
                day_of_week: days,
            }),
        (1u32..=31, 1u32..=6).prop_map(|(day, n)| ScheduleKind::Monthly {
            by_day_of_month: Some(DayOfMonthRule {
                day_of_month: day,
                month_recurrence_count: n,
            }),
            by_week_day: None,
        }),
        (arb_occurrence(), 0u32..=6, 1u32..=6).prop_map(|(occurrence, week_day, n)| {
            ScheduleKind::Monthly {
                by_day_of_month: None,
                by_week_day: Some(WeekDayRule {
                    occurrence,
                    week_day,
                    month_recurrence_count: n,
                }),
            }
        }),
        (0u32..=11, 1u32..=31, 1u32..=3).prop_map(|(month, day, n)| ScheduleKind::Yearly {
            year_recurrence_count: n,
            by_month_day: Some(MonthDayRule { month, day }),
            by_month_week_day: None,
        }),
        (0u32..=11, arb_occurrence(), 0u32..=6, 1u32..=3).prop_map(
            |(month, occurrence, week_day, n)| ScheduleKind::Yearly {
                year_recurrence_count: n,
                by_month_day: None,
                by_month_week_day: Some(MonthWeekDayRule {
                    month,
                    occurrence,
                    week_day,
                }),
            }
        ),
    ]
}

fn arb_start() -> impl Strategy<Value = NaiveDate> {
    (2000i32..=2030, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_pattern() -> impl Strategy<Value = SchedulePattern> {
    (
        prop::sample::select(TIMEZONES),
        arb_start(),
        4u32..=23,
        0u32..=59,
        arb_kind(),
    )
        .prop_map(|(tz, start, hour, minute, kind)| {
            SchedulePattern::new(tz, start, format!("{hour:02}:{minute:02}"), kind)
        })
}

proptest! {
    #[test]
    fn count_bounded_schedule_has_exact_length(pattern in arb_pattern(), count in 1u32..=20) {
        let pattern = pattern.with_occurrence_count(count);
        let dates = generate_schedule(&pattern).unwrap();
        prop_assert_eq!(dates.len(), count as usize);
    }

    #[test]
    fn dates_are_strictly_ascending(pattern in arb_pattern(), count in 1u32..=20) {
        let dates = generate_schedule(&pattern.with_occurrence_count(count)).unwrap();
        for pair in dates.windows(2) {
            prop_assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn every_date_is_at_send_time(pattern in arb_pattern(), count in 1u32..=20) {
        let pattern = pattern.with_occurrence_count(count);
        let dates = generate_schedule(&pattern).unwrap();
        let expected = pattern.send_time.clone();
        for date in &dates {
            prop_assert_eq!(format!("{:02}:{:02}", date.hour(), date.minute()), expected.clone());
        }
    }

    #[test]
    fn no_date_after_end_date(pattern in arb_pattern(), days in 0i64..=800) {
        let end = pattern.start_date + chrono::Duration::days(days);
        let pattern = pattern.with_end_date(end);
        let end_anchor = pattern.end_date_in_time_zone(true).unwrap().unwrap();
        let dates = generate_schedule(&pattern).unwrap();
        for date in &dates {
            prop_assert!(*date <= end_anchor);
            prop_assert!(date.date_naive() >= pattern.start_date);
        }
    }

    #[test]
    fn one_time_is_the_start_anchor(pattern in arb_pattern()) {
        let mut pattern = pattern;
        pattern.kind = ScheduleKind::OneTime;
        let dates = generate_schedule(&pattern).unwrap();
        prop_assert_eq!(dates, vec![pattern.start_date_in_time_zone(true).unwrap()]);
    }

    #[test]
    fn expansion_is_idempotent(pattern in arb_pattern(), count in 1u32..=10) {
        let pattern = pattern.with_occurrence_count(count);
        prop_assert_eq!(generate_schedule(&pattern).unwrap(), generate_schedule(&pattern).unwrap());
    }
}
