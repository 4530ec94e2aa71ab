//! Error types for schedule-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid send time: {0}")]
    InvalidSendTime(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid schedule pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid schedule options: {0}")]
    InvalidOptions(String),

    #[error("Search exhausted: {0}")]
    SearchExhausted(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
