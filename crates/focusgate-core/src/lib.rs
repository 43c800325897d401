//! # Focusgate Core Library
//!
//! Core business logic for Focusgate, a personal app-usage-blocking and
//! focus-tracking tool. Users define recurring blocking schedules; while
//! a schedule's enforcement is active, elapsed time is recorded as focus
//! minutes and rolled up into charts.
//!
//! ## Architecture
//!
//! - **Schedules**: recurring time windows with midnight-crossing
//!   arithmetic and a persisted single-active invariant
//! - **Monitoring**: a start/stop state machine over an [`Enforcement`]
//!   seam, with debounced toggles and restart recovery
//! - **Ledger**: a dual-writer session ledger -- the foreground
//!   controller and the background interval observer each append to
//!   their own outbox, and one merger reconciles them without
//!   double-counting
//! - **Stats**: pure hourly/daily bucketing for charting
//!
//! All durable state lives in a JSON-backed key-value store shared
//! between the two processes; there is no cross-process lock, so every
//! mutation is an atomic whole-file replacement.
//!
//! ## Key Components
//!
//! - [`ScheduleStore`]: schedule collection with synchronous persistence
//! - [`MonitoringController`]: enforcement state machine
//! - [`SessionLedger`]: confirmed sessions and the running total
//! - [`IntervalObserver`]: background writer callback surface

pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod monitor;
pub mod schedule;
pub mod stats;
pub mod storage;

pub use config::Config;
pub use error::{CoreError, EnforcementError, StorageError, ValidationError};
pub use events::Event;
pub use ledger::{
    session_key, FocusSession, MergeOutcome, PendingSession, Provenance, SessionLedger,
};
pub use monitor::{
    Enforcement, IntervalObserver, MonitorPhase, MonitoringController, NullEnforcement,
};
pub use schedule::{
    duration_minutes, is_valid_window, validate_window, ScheduleConfig, ScheduleStore,
    MIN_WINDOW_MINUTES,
};
pub use stats::{bucket, ChartBucket, ChartPeriod};
pub use storage::{data_dir, DataResetSummary, SharedStore};
