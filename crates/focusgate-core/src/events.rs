use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::Provenance;

/// Observable monitoring and session state changes, returned by the
/// controller's transition methods. The UI layer polls for events;
/// notification delivery subscribes to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ScheduleDeleted {
        schedule_id: Uuid,
        at: DateTime<Utc>,
    },
    /// Enforcement started for a schedule; a blocking interval is underway.
    MonitoringStarted {
        schedule_id: Uuid,
        at: DateTime<Utc>,
    },
    /// Enforcement stopped. `recorded_minutes` is the whole-minute
    /// duration appended to the ledger, or 0 if the interval was too
    /// short to record.
    MonitoringStopped {
        schedule_id: Uuid,
        recorded_minutes: u32,
        at: DateTime<Utc>,
    },
    /// A schedule persisted as active was re-activated after restart.
    MonitoringRestored {
        schedule_id: Uuid,
        at: DateTime<Utc>,
    },
    /// Restart recovery could not re-activate a schedule; it was
    /// reverted to inactive.
    MonitoringRestoreFailed {
        schedule_id: Uuid,
        reason: String,
        at: DateTime<Utc>,
    },
    /// A session fact was appended to a writer's outbox.
    SessionRecorded {
        duration_minutes: u32,
        provenance: Provenance,
        at: DateTime<Utc>,
    },
}
