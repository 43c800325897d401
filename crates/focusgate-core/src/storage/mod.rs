//! Durable key-value storage shared by the foreground and background
//! processes.
//!
//! Both processes read and write the same JSON-backed store; there is
//! no cross-process locking primitive, so every mutation is a
//! read-modify-write of the whole file, written atomically via a
//! temp-file rename. Multi-key mutations go through [`SharedStore::update`]
//! so they land in a single write.

mod shared;

pub use shared::{DataResetSummary, SharedStore};

use std::path::PathBuf;

use crate::error::StorageError;

/// Well-known keys in the shared store.
pub mod keys {
    /// Serialized `Vec<ScheduleConfig>`.
    pub const SCHEDULES: &str = "schedules";
    /// Opaque blob describing the apps/categories/web domains targeted
    /// for enforcement. Pass-through; this crate never inspects it.
    pub const ACTIVITY_SELECTION: &str = "activity_selection";
    /// Foreground writer's session outbox.
    pub const PENDING_FOREGROUND: &str = "pending_foreground";
    /// Background writer's session outbox.
    pub const PENDING_BACKGROUND: &str = "pending_background";
    /// Set by any writer on append, cleared by the ledger after merge.
    pub const HAS_PENDING_FOCUS_DATA: &str = "has_pending_focus_data";
    /// Running all-time counter of recorded focus minutes.
    pub const TOTAL_FOCUS_MINUTES: &str = "total_focus_minutes";
    /// Serialized `Vec<FocusSession>` -- the confirmed ledger.
    pub const CONFIRMED_FOCUS_SESSIONS: &str = "confirmed_focus_sessions";
    /// Mapping schedule-id -> bool, informational mirror of enforcement
    /// status for display.
    pub const MONITORING_STATE: &str = "monitoring_state";
    /// Timestamp of the most recent outbox append.
    pub const LAST_FOCUS_UPDATE_TIME: &str = "last_focus_update_time";

    /// Transient per-schedule key holding the wall-clock start of the
    /// current blocking interval. Present only while enforcement is
    /// active; consumed and cleared when the interval ends.
    pub fn activity_start_time(schedule_id: uuid::Uuid) -> String {
        format!("activity_start_time_{schedule_id}")
    }
}

/// Returns `~/.config/focusgate[-dev]/` based on FOCUSGATE_ENV.
///
/// Set FOCUSGATE_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSGATE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focusgate-dev")
    } else {
        base_dir.join("focusgate")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}
