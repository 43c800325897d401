//! Append-only session ledger with dual-writer reconciliation.
//!
//! Two independent processes record completed blocking intervals: the
//! foreground controller (explicit stop) and the background monitor
//! (interval end observed by the OS scheduler). Neither may mutate the
//! confirmed ledger directly -- each appends to its own outbox, and the
//! foreground ledger alone drains both outboxes into the confirmed
//! sequence, discarding near-duplicates.
//!
//! The running total is incremented at append time so it is visible
//! before a merge runs. It is never decremented when a pending session
//! turns out to be a duplicate, so the total is an upper bound on
//! confirmed minutes rather than an exact sum.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::{keys, DataResetSummary, SharedStore};

/// Which process produced a session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Foreground controller (explicit stop or app-driven end).
    Foreground,
    /// Background monitor (interval end observed without the app running).
    Background,
}

impl Provenance {
    /// The outbox key this writer appends to.
    pub fn outbox_key(self) -> &'static str {
        match self {
            Provenance::Foreground => keys::PENDING_FOREGROUND,
            Provenance::Background => keys::PENDING_BACKGROUND,
        }
    }
}

/// A confirmed record of one completed blocking interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: u32,
}

/// A session fact staged in a writer's outbox, awaiting merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSession {
    /// Deterministic identity: `<schedule-id>_<start-epoch-seconds>`.
    pub session_key: String,
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub provenance: Provenance,
}

/// Deterministic session identity derived from the schedule and the
/// interval's wall-clock start, so both writers produce the same key
/// for the same interval.
pub fn session_key(schedule_id: Uuid, started_at: DateTime<Utc>) -> String {
    format!("{}_{}", schedule_id, started_at.timestamp())
}

/// Result of draining the pending outboxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Sessions appended to the confirmed ledger.
    pub merged: usize,
    /// Near-duplicates discarded (already recorded by the other writer).
    pub discarded: usize,
}

/// Append a session fact to the writer's own outbox and bump the
/// running total, in one atomic store write.
///
/// Safe to call from either process: each provenance owns its outbox,
/// so concurrent appends from the two writers never clobber each other.
pub fn append_pending(store: &SharedStore, session: &PendingSession) -> Result<(), StorageError> {
    let minutes = session.duration_minutes as u64;
    let encoded = serde_json::to_value(session).map_err(|e| StorageError::Decode {
        key: session.provenance.outbox_key().to_string(),
        message: e.to_string(),
    })?;
    store.update(|map| {
        let outbox = map
            .entry(session.provenance.outbox_key().to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match outbox {
            Value::Array(entries) => entries.push(encoded),
            other => *other = Value::Array(vec![encoded]),
        }

        let total = map
            .get(keys::TOTAL_FOCUS_MINUTES)
            .and_then(Value::as_u64)
            .unwrap_or(0);
        map.insert(
            keys::TOTAL_FOCUS_MINUTES.to_string(),
            Value::from(total + minutes),
        );
        map.insert(keys::HAS_PENDING_FOCUS_DATA.to_string(), Value::from(true));
        map.insert(
            keys::LAST_FOCUS_UPDATE_TIME.to_string(),
            Value::from(Utc::now().to_rfc3339()),
        );
    })
}

/// Owner of the confirmed session sequence and the running total.
///
/// Constructed once in the foreground process; the background writer
/// only ever touches its outbox via [`append_pending`].
#[derive(Debug)]
pub struct SessionLedger {
    store: SharedStore,
    confirmed: Vec<FocusSession>,
    total_minutes: u64,
}

impl SessionLedger {
    /// Load the confirmed ledger and total from the shared store.
    pub fn open(store: SharedStore) -> Result<Self, StorageError> {
        let confirmed = store.get_or_default(keys::CONFIRMED_FOCUS_SESSIONS)?;
        let total_minutes = store.get_or_default(keys::TOTAL_FOCUS_MINUTES)?;
        Ok(Self {
            store,
            confirmed,
            total_minutes,
        })
    }

    /// Confirmed sessions, oldest first.
    pub fn sessions(&self) -> &[FocusSession] {
        &self.confirmed
    }

    /// All-time recorded focus minutes, including not-yet-merged
    /// pending sessions.
    pub fn total_minutes(&self) -> u64 {
        self.total_minutes
    }

    /// Whether any writer has appended since the last merge.
    pub fn has_pending(&self) -> Result<bool, StorageError> {
        self.store.get_or_default(keys::HAS_PENDING_FOCUS_DATA)
    }

    /// Record a foreground session through the outbox path.
    pub fn record(&mut self, session: &PendingSession) -> Result<(), StorageError> {
        append_pending(&self.store, session)?;
        self.total_minutes += session.duration_minutes as u64;
        Ok(())
    }

    /// Drain both outboxes into the confirmed ledger.
    ///
    /// A pending session is discarded as a near-duplicate when a
    /// confirmed session ends within one second of it with an equal
    /// minute count. Outboxes and the pending flag are cleared in the
    /// same store write that lands the new confirmed sequence, so a
    /// failed write leaves everything staged for the next refresh.
    /// The running total is not re-adjusted here.
    pub fn merge_pending(&mut self) -> Result<MergeOutcome, StorageError> {
        let mut outcome = MergeOutcome::default();
        let mut confirmed_after = Vec::new();

        self.store.update(|map| {
            let mut confirmed: Vec<FocusSession> =
                decode_list(map.get(keys::CONFIRMED_FOCUS_SESSIONS), keys::CONFIRMED_FOCUS_SESSIONS);

            for outbox_key in [keys::PENDING_FOREGROUND, keys::PENDING_BACKGROUND] {
                let pending: Vec<PendingSession> =
                    decode_list(map.remove(outbox_key).as_ref(), outbox_key);
                for session in pending {
                    let duplicate = confirmed.iter().any(|existing| {
                        near_duplicate(existing, session.ended_at, session.duration_minutes)
                    });
                    if duplicate {
                        outcome.discarded += 1;
                    } else {
                        confirmed.push(FocusSession {
                            ended_at: session.ended_at,
                            duration_minutes: session.duration_minutes,
                        });
                        outcome.merged += 1;
                    }
                }
            }

            let encoded = serde_json::to_value(&confirmed).unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to encode confirmed sessions");
                Value::Array(Vec::new())
            });
            map.insert(keys::CONFIRMED_FOCUS_SESSIONS.to_string(), encoded);
            map.insert(keys::HAS_PENDING_FOCUS_DATA.to_string(), Value::from(false));
            confirmed_after = confirmed;
        })?;

        self.confirmed = confirmed_after;
        self.total_minutes = self.store.get_or_default(keys::TOTAL_FOCUS_MINUTES)?;
        if outcome.merged > 0 {
            tracing::info!(merged = outcome.merged, discarded = outcome.discarded, "merged pending focus sessions");
        }
        Ok(outcome)
    }

    /// Re-read persisted state and drain any pending outboxes. Driven
    /// on foregrounding, on a data-changed signal, and by the periodic
    /// refresh timer.
    pub fn refresh(&mut self) -> Result<MergeOutcome, StorageError> {
        self.confirmed = self.store.get_or_default(keys::CONFIRMED_FOCUS_SESSIONS)?;
        self.total_minutes = self.store.get_or_default(keys::TOTAL_FOCUS_MINUTES)?;
        self.merge_pending()
    }

    /// Remove every stored key and reset in-memory state.
    pub fn clear_all(&mut self) -> Result<DataResetSummary, StorageError> {
        let summary = self.store.clear_all()?;
        self.confirmed.clear();
        self.total_minutes = 0;
        Ok(summary)
    }
}

/// Near-duplicate rule: end timestamps within one second and equal
/// whole-minute durations.
fn near_duplicate(existing: &FocusSession, ended_at: DateTime<Utc>, duration_minutes: u32) -> bool {
    let delta_ms = (existing.ended_at - ended_at).num_milliseconds().abs();
    delta_ms < 1000 && existing.duration_minutes == duration_minutes
}

fn decode_list<T: serde::de::DeserializeOwned>(value: Option<&Value>, key: &str) -> Vec<T> {
    let Some(value) = value else {
        return Vec::new();
    };
    match serde_json::from_value(value.clone()) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding undecodable session list");
            Vec::new()
        }
    }
}
