//! # schedule-engine
//!
//! Deterministic send-schedule expansion for campaigns.
//!
//! A [`SchedulePattern`] describes when a campaign sends: once, or every N
//! days, weeks, months or years, anchored to an IANA timezone, a start date and
//! a local send time. The engine turns it into the ordered list of concrete
//! instants, handling month-length clipping, leap years, "nth/last weekday of
//! month" searches and DST. It is a pure function of its input: no clock, no
//! I/O, no shared state.
//!
//! ## Modules
//!
//! - [`pattern`]: the schedule pattern data model, JSON form and validation
//! - [`anchor`]: date + timezone + `HH:MM` to timezone-aware instant
//! - [`calendar`]: weekday/month numbering adapters, clipping, occurrence search
//! - [`generators`]: per-kind next-date generators
//! - [`expander`]: end-condition resolution and the schedule driver
//! - [`events`]: event drafts for the persistence layer
//! - [`error`]: Error types

pub mod anchor;
pub mod calendar;
pub mod error;
pub mod events;
pub mod expander;
pub mod generators;
pub mod pattern;

pub use anchor::{parse_send_time, parse_timezone, resolve_anchor};
pub use calendar::find_occurrence;
pub use error::ScheduleError;
pub use events::{
    generate_schedule_events, generate_schedule_events_with_options, summarize_events,
    EventContext, EventDraft, EventType, ScheduleSummary,
};
pub use expander::{
    determine_end_date, determine_end_date_with_options, generate_schedule,
    generate_schedule_with_options, preview_schedule, preview_schedule_with_options,
    ScheduleOptions, DEFAULT_MAX_SEARCH_PERIODS, NO_END_DATE_HORIZON_YEARS,
    PREVIEW_OCCURRENCE_LIMIT,
};
pub use generators::Recurrence;
pub use pattern::{
    DayOfMonthRule, MonthDayRule, MonthWeekDayRule, Occurrence, ScheduleKind, SchedulePattern,
    WeekDayRule,
};
