//! Time-bucketed aggregation of confirmed sessions for charting.
//!
//! Pure functions: each call recomputes the buckets from the session
//! slice it is given and never mutates the input.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::FocusSession;

/// Charting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartPeriod {
    /// Current calendar day, 24 hourly buckets.
    Day,
    /// Last 7 calendar days including today, one bucket per day.
    Week,
}

/// A fixed time-aligned aggregation slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBucket {
    /// Start of the hour (Day) or day (Week) this bucket covers.
    pub starts_at: DateTime<Utc>,
    /// Sum of session durations ending in this slot; 0 if none.
    pub minutes: u32,
}

/// Roll confirmed sessions up into chart buckets relative to `now`.
///
/// Sessions are assigned by their end timestamp truncated to the bucket
/// boundary. Sessions outside the period are ignored.
pub fn bucket(sessions: &[FocusSession], period: ChartPeriod, now: DateTime<Utc>) -> Vec<ChartBucket> {
    let day_start = start_of_day(now);
    match period {
        ChartPeriod::Day => bucketize(sessions, day_start, 24, Duration::hours(1)),
        ChartPeriod::Week => bucketize(
            sessions,
            day_start - Duration::days(6),
            7,
            Duration::days(1),
        ),
    }
}

fn bucketize(
    sessions: &[FocusSession],
    range_start: DateTime<Utc>,
    count: usize,
    width: Duration,
) -> Vec<ChartBucket> {
    let mut buckets: Vec<ChartBucket> = (0..count)
        .map(|i| ChartBucket {
            starts_at: range_start + width * i as i32,
            minutes: 0,
        })
        .collect();

    let width_secs = width.num_seconds();
    for session in sessions {
        let offset_secs = (session.ended_at - range_start).num_seconds();
        if offset_secs < 0 {
            continue;
        }
        let index = (offset_secs / width_secs) as usize;
        if let Some(slot) = buckets.get_mut(index) {
            slot.minutes += session.duration_minutes;
        }
    }
    buckets
}

fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}
