//! Blocking schedule model and time-window arithmetic.
//!
//! A schedule is a named recurring time window plus a weekday set.
//! Windows whose end is at or before their start are interpreted as
//! crossing midnight, so `23:00 -> 06:00` is a 420-minute window.

pub mod store;

pub use store::ScheduleStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Minimum accepted window length, in minutes. Shorter schedules are
/// rejected at creation/edit time and by the enforcement collaborator.
pub const MIN_WINDOW_MINUTES: u32 = 15;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// One recurring blocking window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub id: Uuid,
    pub name: String,
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
    /// Active weekdays, 1=Sunday .. 7=Saturday.
    pub days: Vec<u8>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ScheduleConfig {
    /// Build a new inactive schedule with a fresh id.
    ///
    /// # Errors
    /// Returns a validation error for out-of-range time components,
    /// invalid weekdays, or a window shorter than [`MIN_WINDOW_MINUTES`].
    pub fn new(
        name: impl Into<String>,
        start: (u8, u8),
        end: (u8, u8),
        days: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        validate_window(start, end)?;
        for &day in &days {
            if !(1..=7).contains(&day) {
                return Err(ValidationError::InvalidWeekday(day));
            }
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_hour: start.0,
            start_minute: start.1,
            end_hour: end.0,
            end_minute: end.1,
            days,
            is_active: false,
            created_at: Utc::now(),
        })
    }

    pub fn start(&self) -> (u8, u8) {
        (self.start_hour, self.start_minute)
    }

    pub fn end(&self) -> (u8, u8) {
        (self.end_hour, self.end_minute)
    }

    /// Window length in minutes, accounting for midnight crossing.
    pub fn duration_minutes(&self) -> u32 {
        duration_minutes(self.start(), self.end())
    }

    /// "HH:MM - HH:MM" for display.
    pub fn formatted_time_range(&self) -> String {
        format!(
            "{:02}:{:02} - {:02}:{:02}",
            self.start_hour, self.start_minute, self.end_hour, self.end_minute
        )
    }

    /// Human-readable weekday summary: "Every day", "Weekdays",
    /// "Weekends", or a comma-separated list.
    pub fn formatted_days(&self) -> String {
        const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        let mut sorted: Vec<u8> = self
            .days
            .iter()
            .copied()
            .filter(|d| (1..=7).contains(d))
            .collect();
        sorted.sort_unstable();
        sorted.dedup();

        let names: Vec<&str> = sorted.iter().map(|&d| DAY_NAMES[d as usize - 1]).collect();
        match names.as_slice() {
            n if n.len() == 7 => "Every day".to_string(),
            ["Mon", "Tue", "Wed", "Thu", "Fri"] => "Weekdays".to_string(),
            ["Sun", "Sat"] => "Weekends".to_string(),
            n => n.join(", "),
        }
    }
}

/// Window length in minutes for two time-of-day values.
///
/// `end <= start` (as minutes since midnight) means the window crosses
/// midnight: `(1440 - start) + end`. Equal start and end therefore
/// yields a full 1440-minute day.
pub fn duration_minutes(start: (u8, u8), end: (u8, u8)) -> u32 {
    let start_min = start.0 as u32 * 60 + start.1 as u32;
    let end_min = end.0 as u32 * 60 + end.1 as u32;
    if end_min <= start_min {
        (MINUTES_PER_DAY - start_min) + end_min
    } else {
        end_min - start_min
    }
}

/// True iff the window is at least [`MIN_WINDOW_MINUTES`] long.
pub fn is_valid_window(start: (u8, u8), end: (u8, u8)) -> bool {
    duration_minutes(start, end) >= MIN_WINDOW_MINUTES
}

/// Range-check both time-of-day values and enforce the minimum length.
pub fn validate_window(start: (u8, u8), end: (u8, u8)) -> Result<u32, ValidationError> {
    for (field, value, max) in [
        ("start_hour", start.0, 23),
        ("start_minute", start.1, 59),
        ("end_hour", end.0, 23),
        ("end_minute", end.1, 59),
    ] {
        if value > max {
            return Err(ValidationError::InvalidTime { field, value });
        }
    }
    let minutes = duration_minutes(start, end);
    if minutes < MIN_WINDOW_MINUTES {
        return Err(ValidationError::IntervalTooShort {
            minutes,
            minimum: MIN_WINDOW_MINUTES,
        });
    }
    Ok(minutes)
}
