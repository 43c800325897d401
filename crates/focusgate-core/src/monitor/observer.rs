//! Background writer: interval start/end callbacks delivered by the OS
//! scheduler.
//!
//! These callbacks run in a separate process that shares nothing with
//! the foreground app except the durable store. The observer records
//! interval boundaries and stages session facts in the background
//! outbox; it never touches the confirmed ledger.
//!
//! Delivery is re-entrant safe: the start timestamp is consumed when an
//! interval ends, so a duplicate `on_interval_end` finds no timestamp
//! and is a no-op.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StorageError;
use crate::ledger::{append_pending, session_key, FocusSession, PendingSession, Provenance};
use crate::storage::{keys, SharedStore};

/// Callback surface invoked by the enforcement collaborator.
#[derive(Debug, Clone)]
pub struct IntervalObserver {
    store: SharedStore,
}

impl IntervalObserver {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// A blocking interval began: record its wall-clock start.
    pub fn on_interval_start(&self, schedule_id: Uuid) -> Result<(), StorageError> {
        self.store
            .set(&keys::activity_start_time(schedule_id), &Utc::now())?;
        tracing::info!(%schedule_id, "blocking interval started");
        Ok(())
    }

    /// A blocking interval ended: consume the start timestamp and stage
    /// a session fact in the background outbox.
    ///
    /// Returns the recorded session, or `None` when there is no start
    /// timestamp on record (duplicate or out-of-order delivery) or the
    /// elapsed time floors to zero minutes.
    pub fn on_interval_end(&self, schedule_id: Uuid) -> Result<Option<FocusSession>, StorageError> {
        let start_key = keys::activity_start_time(schedule_id);
        let Some(started_at) = self.store.get::<DateTime<Utc>>(&start_key)? else {
            tracing::debug!(%schedule_id, "interval end with no start on record, ignoring");
            return Ok(None);
        };

        let ended_at = Utc::now();
        let minutes = (ended_at - started_at).num_minutes().max(0) as u32;
        if minutes == 0 {
            self.store.remove(&start_key)?;
            tracing::debug!(%schedule_id, "interval shorter than a minute, skipping record");
            return Ok(None);
        }

        let session = PendingSession {
            session_key: session_key(schedule_id, started_at),
            ended_at,
            duration_minutes: minutes,
            provenance: Provenance::Background,
        };
        append_pending(&self.store, &session)?;
        self.store.remove(&start_key)?;
        tracing::info!(%schedule_id, minutes, "blocking interval ended, session staged");

        Ok(Some(FocusSession {
            ended_at,
            duration_minutes: minutes,
        }))
    }
}
