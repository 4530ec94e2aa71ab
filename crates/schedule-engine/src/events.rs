//! Event drafts: the seam between schedule expansion and event persistence.
//!
//! [`generate_schedule_events`] expands a pattern, drops every instant that is
//! not strictly after the caller's `now`, and pairs the rest with the owner's
//! identifiers. Storing the drafts is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expander::{generate_schedule_with_options, ScheduleOptions};
use crate::pattern::SchedulePattern;

/// Kind of message event a draft creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    Campaign,
}

/// Identifiers of the campaign version a schedule belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    pub campaign_id: String,
    pub campaign_code: String,
    pub campaign_version_id: String,
    pub data_domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holding_org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_org: Option<String>,
}

/// A message event ready to be inserted by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub date: DateTime<Utc>,
    pub event_type: EventType,
    #[serde(flatten)]
    pub context: EventContext,
}

/// Totals a campaign records after its events are inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub total_events: usize,
    pub last_event_date: DateTime<Utc>,
}

/// Expand `pattern` into event drafts for `context`, keeping only instants
/// strictly after `now`.
///
/// # Errors
///
/// Propagates any error from [`crate::generate_schedule`].
pub fn generate_schedule_events(
    context: &EventContext,
    pattern: &SchedulePattern,
    now: DateTime<Utc>,
) -> Result<Vec<EventDraft>> {
    generate_schedule_events_with_options(context, pattern, now, &ScheduleOptions::default())
}

/// [`generate_schedule_events`] with explicit options.
pub fn generate_schedule_events_with_options(
    context: &EventContext,
    pattern: &SchedulePattern,
    now: DateTime<Utc>,
    options: &ScheduleOptions,
) -> Result<Vec<EventDraft>> {
    tracing::info!(
        campaign = %context.campaign_id,
        version = %context.campaign_version_id,
        "generating schedule events"
    );

    let events: Vec<EventDraft> = generate_schedule_with_options(pattern, options)?
        .into_iter()
        .map(|date| date.with_timezone(&Utc))
        .filter(|date| *date > now)
        .map(|date| EventDraft {
            date,
            event_type: EventType::Campaign,
            context: context.clone(),
        })
        .collect();

    tracing::debug!(
        campaign = %context.campaign_id,
        events = events.len(),
        "schedule events generated"
    );
    Ok(events)
}

/// Count the drafts and find the latest date; `None` for an empty slice.
pub fn summarize_events(events: &[EventDraft]) -> Option<ScheduleSummary> {
    let last_event_date = events.iter().map(|event| event.date).max()?;
    Some(ScheduleSummary {
        total_events: events.len(),
        last_event_date,
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────
