//! Core error types for focusgate-core.
//!
//! This module defines the error hierarchy using thiserror. Validation
//! errors are returned synchronously to the caller; storage and
//! enforcement failures during automatic recovery are handled locally
//! (state reverted and logged) because there is no interactive caller.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Core error type for focusgate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Enforcement-related errors
    #[error("Enforcement error: {0}")]
    Enforcement(#[from] EnforcementError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Blocking window shorter than the 15-minute minimum.
    #[error("Blocking window is {minutes} minutes; the minimum is {minimum} minutes")]
    IntervalTooShort { minutes: u32, minimum: u32 },

    /// Time-of-day component out of range.
    #[error("Invalid value for '{field}': {value}")]
    InvalidTime { field: &'static str, value: u8 },

    /// Weekday outside 1..=7.
    #[error("Invalid weekday: {0} (expected 1-7)")]
    InvalidWeekday(u8),
}

/// Errors raised by the enforcement collaborator.
#[derive(Error, Debug)]
pub enum EnforcementError {
    /// The platform refused to start enforcement for this schedule.
    #[error("Failed to start enforcement for schedule {schedule_id}: {reason}")]
    StartFailed { schedule_id: Uuid, reason: String },
}

/// Shared-store storage errors.
///
/// Decode failures of individual records degrade to defaults rather
/// than failing the operation; they surface here only when the caller
/// asked for a strict read.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read the shared store file
    #[error("Failed to read shared store at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the shared store file
    #[error("Failed to write shared store at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored record could not be decoded
    #[error("Failed to decode stored value for '{key}': {message}")]
    Decode { key: String, message: String },

    /// The data directory could not be resolved or created
    #[error("Failed to prepare data directory: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
