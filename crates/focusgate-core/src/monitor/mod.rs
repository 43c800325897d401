//! Monitoring controller: the start/stop state machine for schedule
//! enforcement.
//!
//! ## State transitions
//!
//! ```text
//! Inactive -> Starting -> Active -> Stopping -> Inactive
//! ```
//!
//! `Starting` falls back to `Inactive` when the enforcement collaborator
//! rejects the request; the schedule's `is_active` flag is reverted so
//! it never claims an enforcement that does not exist.
//!
//! At most one schedule is Active at a time. Activating a schedule
//! while another is Active stops the old one completely (enforcement
//! stopped, flag persisted, session recorded) before the new one starts.

pub mod observer;

pub use observer::IntervalObserver;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CoreError, EnforcementError, StorageError};
use crate::events::Event;
use crate::ledger::{session_key, PendingSession, Provenance, SessionLedger};
use crate::schedule::{validate_window, ScheduleConfig, ScheduleStore};
use crate::storage::{keys, SharedStore};

/// Default debounce window for rapid toggle requests.
pub const DEFAULT_DEBOUNCE_MS: i64 = 300;

/// Per-schedule enforcement lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorPhase {
    Inactive,
    Starting,
    Active,
    Stopping,
}

/// Seam to the external mechanism that actually restricts app access
/// during an active interval.
pub trait Enforcement {
    /// Begin enforcing the schedule's window. The selection blob is
    /// passed through opaquely.
    fn start(
        &mut self,
        schedule: &ScheduleConfig,
        selection: Option<&Value>,
    ) -> Result<(), EnforcementError>;

    /// Stop enforcement for one schedule.
    fn stop(&mut self, schedule_id: Uuid);

    /// Stop enforcement for every schedule.
    fn stop_all(&mut self);
}

/// Enforcement stub that only logs. Used by the CLI, where the real
/// shield lives in a platform process outside this crate.
#[derive(Debug, Default)]
pub struct NullEnforcement;

impl Enforcement for NullEnforcement {
    fn start(
        &mut self,
        schedule: &ScheduleConfig,
        _selection: Option<&Value>,
    ) -> Result<(), EnforcementError> {
        tracing::debug!(schedule_id = %schedule.id, window = %schedule.formatted_time_range(), "enforcement start");
        Ok(())
    }

    fn stop(&mut self, schedule_id: Uuid) {
        tracing::debug!(%schedule_id, "enforcement stop");
    }

    fn stop_all(&mut self) {
        tracing::debug!("enforcement stop all");
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingToggle {
    desired: bool,
    settle_at: DateTime<Utc>,
}

/// Start/stop state machine for schedule enforcement.
///
/// Constructed once at process start. All mutations flow through
/// `&mut self`, so within a process they are naturally serialized;
/// cross-process coordination happens only through the shared store.
pub struct MonitoringController<E: Enforcement> {
    enforcement: E,
    store: SharedStore,
    phases: HashMap<Uuid, MonitorPhase>,
    pending_toggles: HashMap<Uuid, PendingToggle>,
    debounce_window: Duration,
}

impl<E: Enforcement> MonitoringController<E> {
    pub fn new(enforcement: E, store: SharedStore) -> Self {
        Self {
            enforcement,
            store,
            phases: HashMap::new(),
            pending_toggles: HashMap::new(),
            debounce_window: Duration::milliseconds(DEFAULT_DEBOUNCE_MS),
        }
    }

    /// Override the toggle debounce window.
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    pub fn phase(&self, schedule_id: Uuid) -> MonitorPhase {
        self.phases
            .get(&schedule_id)
            .copied()
            .unwrap_or(MonitorPhase::Inactive)
    }

    /// Informational enforcement status mirror, as persisted for display.
    pub fn monitoring_state(&self) -> Result<HashMap<String, bool>, StorageError> {
        self.store.get_or_default(keys::MONITORING_STATE)
    }

    /// Start enforcement for `schedule_id`.
    ///
    /// Any other Active schedule is deactivated first -- fully, in
    /// sequence -- so exactly one schedule is ever active. Unknown ids
    /// are a no-op.
    ///
    /// # Errors
    /// `ValidationError::IntervalTooShort` for sub-15-minute windows,
    /// `EnforcementError::StartFailed` when the platform refuses. In
    /// both cases the schedule is left inactive.
    pub fn activate(
        &mut self,
        schedule_id: Uuid,
        schedules: &mut ScheduleStore,
        ledger: &mut SessionLedger,
    ) -> Result<Vec<Event>, CoreError> {
        let mut events = Vec::new();
        let Some(schedule) = schedules.get(schedule_id).cloned() else {
            return Ok(events);
        };

        if let Some(other) = schedules
            .active_schedule()
            .map(|s| s.id)
            .filter(|&other| other != schedule_id)
        {
            events.extend(self.deactivate(other, schedules, ledger)?);
        }

        if self.phase(schedule_id) == MonitorPhase::Active {
            return Ok(events);
        }

        self.phases.insert(schedule_id, MonitorPhase::Starting);
        if let Err(e) = self.start_enforcement(&schedule) {
            self.phases.insert(schedule_id, MonitorPhase::Inactive);
            schedules.set_active(schedule_id, false)?;
            self.set_monitoring_state(schedule_id, false)?;
            return Err(e);
        }

        self.store
            .set(&keys::activity_start_time(schedule_id), &Utc::now())?;
        self.set_monitoring_state(schedule_id, true)?;
        schedules.set_active(schedule_id, true)?;
        self.phases.insert(schedule_id, MonitorPhase::Active);
        events.push(Event::MonitoringStarted {
            schedule_id,
            at: Utc::now(),
        });
        Ok(events)
    }

    fn start_enforcement(&mut self, schedule: &ScheduleConfig) -> Result<(), CoreError> {
        validate_window(schedule.start(), schedule.end())?;
        let selection: Option<Value> = self.store.get(keys::ACTIVITY_SELECTION)?;
        self.enforcement.start(schedule, selection.as_ref())?;
        Ok(())
    }

    /// Stop enforcement for `schedule_id` and record the elapsed
    /// session, if any.
    ///
    /// Idempotent: stopping a schedule with no start timestamp on
    /// record stops enforcement and persists the inactive flag but
    /// records nothing.
    pub fn deactivate(
        &mut self,
        schedule_id: Uuid,
        schedules: &mut ScheduleStore,
        ledger: &mut SessionLedger,
    ) -> Result<Vec<Event>, CoreError> {
        let mut events = Vec::new();
        if schedules.get(schedule_id).is_none() && self.phase(schedule_id) == MonitorPhase::Inactive
        {
            return Ok(events);
        }
        self.phases.insert(schedule_id, MonitorPhase::Stopping);
        self.enforcement.stop(schedule_id);
        self.set_monitoring_state(schedule_id, false)?;

        let start_key = keys::activity_start_time(schedule_id);
        let started_at: Option<DateTime<Utc>> = self.store.get(&start_key)?;
        let mut recorded_minutes = 0;
        if let Some(started_at) = started_at {
            let ended_at = Utc::now();
            self.store.remove(&start_key)?;
            let minutes = (ended_at - started_at).num_minutes().max(0) as u32;
            if minutes > 0 {
                ledger.record(&PendingSession {
                    session_key: session_key(schedule_id, started_at),
                    ended_at,
                    duration_minutes: minutes,
                    provenance: Provenance::Foreground,
                })?;
                recorded_minutes = minutes;
                events.push(Event::SessionRecorded {
                    duration_minutes: minutes,
                    provenance: Provenance::Foreground,
                    at: ended_at,
                });
            }
        }

        schedules.set_active(schedule_id, false)?;
        self.phases.insert(schedule_id, MonitorPhase::Inactive);
        events.push(Event::MonitoringStopped {
            schedule_id,
            recorded_minutes,
            at: Utc::now(),
        });
        Ok(events)
    }

    /// Queue a toggle request. Rapid requests for the same schedule
    /// collapse to the last desired state; nothing executes until
    /// [`flush_debounced`](Self::flush_debounced) runs after the
    /// debounce window.
    pub fn request_toggle(&mut self, schedule_id: Uuid, desired: bool) {
        self.pending_toggles.insert(
            schedule_id,
            PendingToggle {
                desired,
                settle_at: Utc::now() + self.debounce_window,
            },
        );
    }

    /// Execute settled toggle requests. A request whose desired state
    /// already matches the schedule's current state is discarded
    /// without touching enforcement. Failures are handled locally
    /// (state reverted, logged) since there is no interactive caller
    /// on this path.
    pub fn flush_debounced(
        &mut self,
        schedules: &mut ScheduleStore,
        ledger: &mut SessionLedger,
    ) -> Vec<Event> {
        let now = Utc::now();
        let ready: Vec<(Uuid, bool)> = self
            .pending_toggles
            .iter()
            .filter(|(_, toggle)| toggle.settle_at <= now)
            .map(|(&id, toggle)| (id, toggle.desired))
            .collect();

        let mut events = Vec::new();
        for (schedule_id, desired) in ready {
            self.pending_toggles.remove(&schedule_id);
            // Phases only cover transitions this controller performed;
            // the persisted flag is authoritative for ones done by an
            // earlier process.
            let currently_active = self.phase(schedule_id) == MonitorPhase::Active
                || schedules.get(schedule_id).is_some_and(|s| s.is_active);
            if desired == currently_active {
                continue;
            }
            let result = if desired {
                self.activate(schedule_id, schedules, ledger)
            } else {
                self.deactivate(schedule_id, schedules, ledger)
            };
            match result {
                Ok(transition_events) => events.extend(transition_events),
                Err(e) => {
                    tracing::warn!(%schedule_id, error = %e, "debounced toggle failed");
                }
            }
        }
        events
    }

    /// Number of queued toggle requests not yet settled.
    pub fn pending_toggle_count(&self) -> usize {
        self.pending_toggles.len()
    }

    /// Re-activate every schedule persisted as active, typically after
    /// a process restart.
    ///
    /// A stale start timestamp left by a crashed session is closed out
    /// first so its elapsed time is recorded. A schedule that fails to
    /// re-activate is persisted inactive -- it must never stay marked
    /// active with no real enforcement underneath.
    pub fn restore_active_schedules(
        &mut self,
        schedules: &mut ScheduleStore,
        ledger: &mut SessionLedger,
    ) -> Vec<Event> {
        let active_ids: Vec<Uuid> = schedules
            .list()
            .iter()
            .filter(|s| s.is_active)
            .map(|s| s.id)
            .collect();

        let mut events = Vec::new();
        for schedule_id in active_ids {
            let stale_start: Result<Option<DateTime<Utc>>, _> =
                self.store.get(&keys::activity_start_time(schedule_id));
            if let Ok(Some(_)) = stale_start {
                match self.deactivate(schedule_id, schedules, ledger) {
                    Ok(stop_events) => events.extend(stop_events),
                    Err(e) => {
                        tracing::warn!(%schedule_id, error = %e, "failed to close stale session during recovery");
                    }
                }
            }

            match self.activate(schedule_id, schedules, ledger) {
                Ok(start_events) => {
                    events.extend(start_events);
                    events.push(Event::MonitoringRestored {
                        schedule_id,
                        at: Utc::now(),
                    });
                }
                Err(e) => {
                    tracing::warn!(%schedule_id, error = %e, "failed to restore schedule, reverting to inactive");
                    if let Err(persist_err) = schedules.set_active(schedule_id, false) {
                        tracing::error!(%schedule_id, error = %persist_err, "failed to persist reverted schedule");
                    }
                    events.push(Event::MonitoringRestoreFailed {
                        schedule_id,
                        reason: e.to_string(),
                        at: Utc::now(),
                    });
                }
            }
        }
        events
    }

    /// Stop enforcement for every schedule, recording sessions for any
    /// that were active.
    pub fn stop_all(
        &mut self,
        schedules: &mut ScheduleStore,
        ledger: &mut SessionLedger,
    ) -> Result<Vec<Event>, CoreError> {
        let active_ids: Vec<Uuid> = self
            .phases
            .iter()
            .filter(|(_, &phase)| phase == MonitorPhase::Active)
            .map(|(&id, _)| id)
            .chain(
                schedules
                    .list()
                    .iter()
                    .filter(|s| s.is_active)
                    .map(|s| s.id),
            )
            .collect();

        let mut events = Vec::new();
        for schedule_id in active_ids {
            if self.phase(schedule_id) == MonitorPhase::Inactive
                && !schedules.get(schedule_id).is_some_and(|s| s.is_active)
            {
                continue;
            }
            events.extend(self.deactivate(schedule_id, schedules, ledger)?);
        }
        self.enforcement.stop_all();
        Ok(events)
    }

    /// Delete a schedule, stopping its enforcement first if active.
    pub fn delete_schedule(
        &mut self,
        schedule_id: Uuid,
        schedules: &mut ScheduleStore,
        ledger: &mut SessionLedger,
    ) -> Result<Vec<Event>, CoreError> {
        let mut events = Vec::new();
        if schedules.get(schedule_id).is_none() {
            return Ok(events);
        }
        let is_running = self.phase(schedule_id) == MonitorPhase::Active
            || schedules.get(schedule_id).is_some_and(|s| s.is_active);
        if is_running {
            events.extend(self.deactivate(schedule_id, schedules, ledger)?);
        }
        schedules.delete(schedule_id)?;
        self.phases.remove(&schedule_id);
        self.pending_toggles.remove(&schedule_id);
        events.push(Event::ScheduleDeleted {
            schedule_id,
            at: Utc::now(),
        });
        Ok(events)
    }

    fn set_monitoring_state(&self, schedule_id: Uuid, active: bool) -> Result<(), StorageError> {
        self.store.update(|map| {
            let entry = map
                .entry(keys::MONITORING_STATE.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
            match entry {
                Value::Object(states) => {
                    states.insert(schedule_id.to_string(), Value::from(active));
                }
                other => {
                    let mut states = serde_json::Map::new();
                    states.insert(schedule_id.to_string(), Value::from(active));
                    *other = Value::Object(states);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Test double that records every enforcement call.
    #[derive(Debug, Default)]
    struct RecordingEnforcement {
        starts: Vec<Uuid>,
        stops: Vec<Uuid>,
        fail_starts: bool,
    }

    impl Enforcement for RecordingEnforcement {
        fn start(
            &mut self,
            schedule: &ScheduleConfig,
            _selection: Option<&Value>,
        ) -> Result<(), EnforcementError> {
            if self.fail_starts {
                return Err(EnforcementError::StartFailed {
                    schedule_id: schedule.id,
                    reason: "denied".into(),
                });
            }
            self.starts.push(schedule.id);
            Ok(())
        }

        fn stop(&mut self, schedule_id: Uuid) {
            self.stops.push(schedule_id);
        }

        fn stop_all(&mut self) {}
    }

    struct Fixture {
        controller: MonitoringController<RecordingEnforcement>,
        schedules: ScheduleStore,
        ledger: SessionLedger,
        store: SharedStore,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let store = SharedStore::open(dir.path());
        Fixture {
            controller: MonitoringController::new(RecordingEnforcement::default(), store.clone())
                .with_debounce_window(Duration::zero()),
            schedules: ScheduleStore::open(store.clone()).unwrap(),
            ledger: SessionLedger::open(store.clone()).unwrap(),
            store,
            _dir: dir,
        }
    }

    fn add_schedule(fx: &mut Fixture, name: &str) -> Uuid {
        let config = ScheduleConfig::new(name, (9, 0), (17, 0), vec![2, 3, 4, 5, 6]).unwrap();
        let id = config.id;
        fx.schedules.create(config).unwrap();
        id
    }

    #[test]
    fn activate_starts_enforcement_and_persists_flag() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Work");

        let events = fx
            .controller
            .activate(id, &mut fx.schedules, &mut fx.ledger)
            .unwrap();

        assert_eq!(fx.controller.phase(id), MonitorPhase::Active);
        assert!(fx.schedules.get(id).unwrap().is_active);
        assert_eq!(fx.controller.enforcement.starts, vec![id]);
        assert!(matches!(
            events.last(),
            Some(Event::MonitoringStarted { schedule_id, .. }) if *schedule_id == id
        ));
        assert_eq!(
            fx.controller.monitoring_state().unwrap().get(&id.to_string()),
            Some(&true)
        );
    }

    #[test]
    fn activating_second_schedule_stops_first() {
        let mut fx = fixture();
        let a = add_schedule(&mut fx, "A");
        let b = add_schedule(&mut fx, "B");

        fx.controller
            .activate(a, &mut fx.schedules, &mut fx.ledger)
            .unwrap();
        fx.controller
            .activate(b, &mut fx.schedules, &mut fx.ledger)
            .unwrap();

        // Exactly one active, never zero, never two.
        let active: Vec<Uuid> = fx
            .schedules
            .list()
            .iter()
            .filter(|s| s.is_active)
            .map(|s| s.id)
            .collect();
        assert_eq!(active, vec![b]);
        assert_eq!(fx.controller.phase(a), MonitorPhase::Inactive);
        assert_eq!(fx.controller.phase(b), MonitorPhase::Active);
        // A was stopped before B started.
        assert_eq!(fx.controller.enforcement.stops, vec![a]);
        assert_eq!(fx.controller.enforcement.starts, vec![a, b]);
    }

    #[test]
    fn too_short_window_fails_and_reverts() {
        let mut fx = fixture();
        let config = ScheduleConfig {
            end_hour: 9,
            end_minute: 10,
            ..ScheduleConfig::new("Short", (9, 0), (17, 0), vec![2]).unwrap()
        };
        let id = config.id;
        fx.schedules.create(config).unwrap();

        let result = fx.controller.activate(id, &mut fx.schedules, &mut fx.ledger);
        assert!(matches!(
            result,
            Err(CoreError::Validation(
                crate::error::ValidationError::IntervalTooShort { minutes: 10, .. }
            ))
        ));
        assert_eq!(fx.controller.phase(id), MonitorPhase::Inactive);
        assert!(!fx.schedules.get(id).unwrap().is_active);
        assert!(fx.controller.enforcement.starts.is_empty());
    }

    #[test]
    fn enforcement_denial_reverts_flag() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Denied");
        fx.controller.enforcement.fail_starts = true;

        let result = fx.controller.activate(id, &mut fx.schedules, &mut fx.ledger);
        assert!(matches!(result, Err(CoreError::Enforcement(_))));
        assert_eq!(fx.controller.phase(id), MonitorPhase::Inactive);
        assert!(!fx.schedules.get(id).unwrap().is_active);
    }

    #[test]
    fn deactivate_records_elapsed_session() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Work");
        fx.controller
            .activate(id, &mut fx.schedules, &mut fx.ledger)
            .unwrap();

        // Backdate the interval start to get a measurable duration.
        fx.store
            .set(
                &keys::activity_start_time(id),
                &(Utc::now() - Duration::minutes(30)),
            )
            .unwrap();

        let events = fx
            .controller
            .deactivate(id, &mut fx.schedules, &mut fx.ledger)
            .unwrap();

        assert!(events.iter().any(|e| matches!(
            e,
            Event::SessionRecorded {
                duration_minutes: 30,
                provenance: Provenance::Foreground,
                ..
            }
        )));
        assert_eq!(fx.ledger.total_minutes(), 30);
        assert!(!fx.schedules.get(id).unwrap().is_active);
        // Start timestamp consumed.
        assert_eq!(
            fx.store
                .get::<DateTime<Utc>>(&keys::activity_start_time(id))
                .unwrap(),
            None
        );
    }

    #[test]
    fn zero_minute_session_is_not_recorded() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Blink");
        fx.controller
            .activate(id, &mut fx.schedules, &mut fx.ledger)
            .unwrap();
        let events = fx
            .controller
            .deactivate(id, &mut fx.schedules, &mut fx.ledger)
            .unwrap();

        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::SessionRecorded { .. })));
        assert_eq!(fx.ledger.total_minutes(), 0);
    }

    #[test]
    fn rapid_toggles_collapse_to_one_transition() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Flappy");

        fx.controller.request_toggle(id, true);
        fx.controller.request_toggle(id, false);
        fx.controller.request_toggle(id, true);
        assert_eq!(fx.controller.pending_toggle_count(), 1);

        fx.controller.flush_debounced(&mut fx.schedules, &mut fx.ledger);

        assert_eq!(fx.controller.enforcement.starts, vec![id]);
        assert!(fx.controller.enforcement.stops.is_empty());
        assert_eq!(fx.controller.phase(id), MonitorPhase::Active);
    }

    #[test]
    fn toggle_matching_current_state_is_discarded() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Steady");
        fx.controller
            .activate(id, &mut fx.schedules, &mut fx.ledger)
            .unwrap();

        fx.controller.request_toggle(id, true);
        fx.controller.flush_debounced(&mut fx.schedules, &mut fx.ledger);

        // No second start, no stop.
        assert_eq!(fx.controller.enforcement.starts, vec![id]);
        assert!(fx.controller.enforcement.stops.is_empty());
    }

    #[test]
    fn toggle_off_from_fresh_controller_uses_persisted_flag() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Holdover");
        fx.controller
            .activate(id, &mut fx.schedules, &mut fx.ledger)
            .unwrap();

        // A new process builds its own controller; its phase map knows
        // nothing about the transition above.
        let mut controller =
            MonitoringController::new(RecordingEnforcement::default(), fx.store.clone())
                .with_debounce_window(Duration::zero());
        controller.request_toggle(id, false);
        let events = controller.flush_debounced(&mut fx.schedules, &mut fx.ledger);

        assert!(!fx.schedules.get(id).unwrap().is_active);
        assert_eq!(controller.enforcement.stops, vec![id]);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::MonitoringStopped { schedule_id, .. } if *schedule_id == id)));

        // And a toggle-on for a schedule already flagged active is
        // discarded, not double-started.
        let mut another =
            MonitoringController::new(RecordingEnforcement::default(), fx.store.clone())
                .with_debounce_window(Duration::zero());
        fx.schedules.set_active(id, true).unwrap();
        another.request_toggle(id, true);
        another.flush_debounced(&mut fx.schedules, &mut fx.ledger);
        assert!(another.enforcement.starts.is_empty());
    }

    #[test]
    fn restore_reactivates_persisted_active_schedules() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Survivor");
        fx.schedules.set_active(id, true).unwrap();

        let events = fx
            .controller
            .restore_active_schedules(&mut fx.schedules, &mut fx.ledger);

        assert_eq!(fx.controller.phase(id), MonitorPhase::Active);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::MonitoringRestored { schedule_id, .. } if *schedule_id == id)));
    }

    #[test]
    fn restore_closes_stale_session_before_reactivating() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Crashed");
        fx.schedules.set_active(id, true).unwrap();
        fx.store
            .set(
                &keys::activity_start_time(id),
                &(Utc::now() - Duration::minutes(45)),
            )
            .unwrap();

        let events = fx
            .controller
            .restore_active_schedules(&mut fx.schedules, &mut fx.ledger);

        assert!(events.iter().any(|e| matches!(
            e,
            Event::SessionRecorded {
                duration_minutes: 45,
                ..
            }
        )));
        assert_eq!(fx.controller.phase(id), MonitorPhase::Active);
        assert_eq!(fx.ledger.total_minutes(), 45);
    }

    #[test]
    fn failed_restore_reverts_schedule_to_inactive() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Unrestorable");
        fx.schedules.set_active(id, true).unwrap();
        fx.controller.enforcement.fail_starts = true;

        let events = fx
            .controller
            .restore_active_schedules(&mut fx.schedules, &mut fx.ledger);

        assert!(!fx.schedules.get(id).unwrap().is_active);
        assert_eq!(fx.controller.phase(id), MonitorPhase::Inactive);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::MonitoringRestoreFailed { .. })));
    }

    #[test]
    fn stop_all_records_the_active_session() {
        let mut fx = fixture();
        let a = add_schedule(&mut fx, "A");
        let b = add_schedule(&mut fx, "B");
        fx.controller
            .activate(a, &mut fx.schedules, &mut fx.ledger)
            .unwrap();
        fx.store
            .set(
                &keys::activity_start_time(a),
                &(Utc::now() - Duration::minutes(10)),
            )
            .unwrap();

        let events = fx
            .controller
            .stop_all(&mut fx.schedules, &mut fx.ledger)
            .unwrap();

        assert_eq!(fx.controller.phase(a), MonitorPhase::Inactive);
        assert_eq!(fx.controller.phase(b), MonitorPhase::Inactive);
        assert!(fx.schedules.active_schedule().is_none());
        assert!(events.iter().any(|e| matches!(
            e,
            Event::SessionRecorded {
                duration_minutes: 10,
                ..
            }
        )));
        // Only the schedule that was running emits a stop.
        let stops = events
            .iter()
            .filter(|e| matches!(e, Event::MonitoringStopped { .. }))
            .count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn deleting_active_schedule_stops_enforcement_first() {
        let mut fx = fixture();
        let id = add_schedule(&mut fx, "Condemned");
        fx.controller
            .activate(id, &mut fx.schedules, &mut fx.ledger)
            .unwrap();

        let events = fx
            .controller
            .delete_schedule(id, &mut fx.schedules, &mut fx.ledger)
            .unwrap();

        assert_eq!(fx.controller.enforcement.stops, vec![id]);
        assert!(fx.schedules.get(id).is_none());
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ScheduleDeleted { .. })));

        // Toggling the deleted id afterwards is a no-op.
        fx.controller.request_toggle(id, true);
        fx.controller.flush_debounced(&mut fx.schedules, &mut fx.ledger);
        assert_eq!(fx.controller.enforcement.starts, vec![id]);
    }
}
