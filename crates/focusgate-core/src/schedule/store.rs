//! CRUD over the persisted schedule collection.
//!
//! Every mutation writes the full collection through the shared store
//! before returning. A failed write rolls the in-memory collection back
//! and surfaces the storage error, so memory and disk never diverge
//! silently.

use uuid::Uuid;

use super::ScheduleConfig;
use crate::error::StorageError;
use crate::storage::{keys, SharedStore};

/// Owner of all [`ScheduleConfig`] entities.
///
/// Invariant: at most one stored schedule has `is_active == true`.
/// Activation sequencing (stop the old one before starting the new one)
/// is the monitoring controller's job; this store only flips and
/// persists the flags it is told to.
#[derive(Debug)]
pub struct ScheduleStore {
    store: SharedStore,
    schedules: Vec<ScheduleConfig>,
}

impl ScheduleStore {
    /// Load the schedule collection from the shared store.
    pub fn open(store: SharedStore) -> Result<Self, StorageError> {
        let schedules = store.get_or_default(keys::SCHEDULES)?;
        Ok(Self { store, schedules })
    }

    /// Re-read the collection from disk, picking up writes from the
    /// other process.
    pub fn reload(&mut self) -> Result<(), StorageError> {
        self.schedules = self.store.get_or_default(keys::SCHEDULES)?;
        Ok(())
    }

    pub fn list(&self) -> &[ScheduleConfig] {
        &self.schedules
    }

    pub fn get(&self, id: Uuid) -> Option<&ScheduleConfig> {
        self.schedules.iter().find(|s| s.id == id)
    }

    /// The single active schedule, if any.
    pub fn active_schedule(&self) -> Option<&ScheduleConfig> {
        self.schedules.iter().find(|s| s.is_active)
    }

    /// Append a new schedule and persist.
    pub fn create(&mut self, config: ScheduleConfig) -> Result<(), StorageError> {
        self.mutate(|schedules| schedules.push(config))
    }

    /// Replace the schedule with a matching id. No-op if absent.
    pub fn update(&mut self, config: ScheduleConfig) -> Result<(), StorageError> {
        self.mutate(|schedules| {
            if let Some(existing) = schedules.iter_mut().find(|s| s.id == config.id) {
                *existing = config;
            }
        })
    }

    /// Remove the schedule with `id`. No-op if absent. The caller must
    /// stop any active monitoring for it first.
    pub fn delete(&mut self, id: Uuid) -> Result<(), StorageError> {
        self.mutate(|schedules| schedules.retain(|s| s.id != id))
    }

    /// Flip the `is_active` flag of the schedule with `id` and persist.
    /// No-op (including no write) if the id is absent.
    pub fn toggle_active(&mut self, id: Uuid) -> Result<(), StorageError> {
        if self.get(id).is_none() {
            return Ok(());
        }
        self.mutate(|schedules| {
            if let Some(schedule) = schedules.iter_mut().find(|s| s.id == id) {
                schedule.is_active = !schedule.is_active;
            }
        })
    }

    /// Set the `is_active` flag of the schedule with `id` and persist.
    /// No-op if absent.
    pub fn set_active(&mut self, id: Uuid, active: bool) -> Result<(), StorageError> {
        if self.get(id).is_none() {
            return Ok(());
        }
        self.mutate(|schedules| {
            if let Some(schedule) = schedules.iter_mut().find(|s| s.id == id) {
                schedule.is_active = active;
            }
        })
    }

    /// Apply `f` in memory, then persist. Rolls back on write failure.
    fn mutate<F>(&mut self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Vec<ScheduleConfig>),
    {
        let previous = self.schedules.clone();
        f(&mut self.schedules);
        if let Err(e) = self.store.set(keys::SCHEDULES, &self.schedules) {
            self.schedules = previous;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn schedule(name: &str) -> ScheduleConfig {
        ScheduleConfig::new(name, (9, 0), (17, 0), vec![2, 3, 4, 5, 6]).unwrap()
    }

    #[test]
    fn create_persists_and_survives_reopen() {
        let dir = tempdir().unwrap();
        let shared = SharedStore::open(dir.path());

        let mut store = ScheduleStore::open(shared.clone()).unwrap();
        let config = schedule("Work hours");
        let id = config.id;
        store.create(config).unwrap();

        let reopened = ScheduleStore::open(shared).unwrap();
        assert_eq!(reopened.list().len(), 1);
        assert_eq!(reopened.get(id).unwrap().name, "Work hours");
    }

    #[test]
    fn update_replaces_by_id_and_ignores_unknown() {
        let dir = tempdir().unwrap();
        let mut store = ScheduleStore::open(SharedStore::open(dir.path())).unwrap();
        let mut config = schedule("Before");
        store.create(config.clone()).unwrap();

        config.name = "After".into();
        store.update(config).unwrap();
        assert_eq!(store.list()[0].name, "After");

        let unknown = schedule("Ghost");
        store.update(unknown).unwrap();
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn delete_then_toggle_is_noop() {
        let dir = tempdir().unwrap();
        let mut store = ScheduleStore::open(SharedStore::open(dir.path())).unwrap();
        let config = schedule("Doomed");
        let id = config.id;
        store.create(config).unwrap();
        store.delete(id).unwrap();
        assert!(store.list().is_empty());

        store.toggle_active(id).unwrap();
        assert!(store.list().is_empty());
        assert!(store.active_schedule().is_none());
    }

    #[test]
    fn failed_persist_rolls_back_memory() {
        let dir = tempdir().unwrap();
        // A store rooted in a directory that does not exist cannot
        // write its backing file.
        let broken = SharedStore::open(&dir.path().join("missing"));
        let mut store = ScheduleStore::open(broken).unwrap();

        let result = store.create(schedule("Unsaved"));
        assert!(matches!(result, Err(StorageError::WriteFailed { .. })));
        assert!(store.list().is_empty());
    }

    #[test]
    fn toggle_flips_active_flag() {
        let dir = tempdir().unwrap();
        let mut store = ScheduleStore::open(SharedStore::open(dir.path())).unwrap();
        let config = schedule("Evenings");
        let id = config.id;
        store.create(config).unwrap();

        store.toggle_active(id).unwrap();
        assert!(store.get(id).unwrap().is_active);
        assert_eq!(store.active_schedule().unwrap().id, id);

        store.toggle_active(id).unwrap();
        assert!(!store.get(id).unwrap().is_active);
    }
}
