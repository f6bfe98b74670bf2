//! The task collection and its persisted slot.
//!
//! [`TaskStore`] is the single writer of the task list. Every mutation goes
//! through [`TaskStore::replace`], which writes the whole collection back to
//! the slot. Storage trouble never reaches the caller: a bad read yields an
//! empty list and a failed write is logged while the session carries on in
//! memory.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::error::{ClarityError, PersistenceError};
use crate::task::{Task, TaskPatch, TaskState, lifecycle, order};

/// Key of the slot holding the task list.
pub const STORAGE_KEY: &str = "clarity-list-tasks";

/// A string-valued key-value location.
pub trait SlotBackend: Send + Sync {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replaces the value under `key`. Readers never observe a partial value.
    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SlotBackend for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // Write a sibling temp file, then rename over the target.
    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

/// In-memory slots. Clones share the same storage, so a test can keep a
/// handle to inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let slot = Self::default();
        slot.lock().insert(key.to_string(), value.to_string());
        slot
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SlotBackend for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The in-memory task list plus the slot it is mirrored to.
pub struct TaskStore {
    backend: Box<dyn SlotBackend>,
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Opens the store and loads whatever the slot holds.
    pub fn open(backend: impl SlotBackend + 'static) -> Self {
        let mut store = Self {
            backend: Box::new(backend),
            tasks: Vec::new(),
        };
        store.tasks = store.load();
        info!(count = store.tasks.len(), "task store opened");
        store
    }

    /// Reads the slot. Missing or malformed data yields an empty list.
    pub fn load(&self) -> Vec<Task> {
        let raw = match self.backend.read(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = STORAGE_KEY, "no stored tasks yet");
                return Vec::new();
            }
            Err(e) => {
                warn!(key = STORAGE_KEY, error = %e, "failed to read stored tasks");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(key = STORAGE_KEY, error = %e, "stored tasks are malformed, starting empty");
                Vec::new()
            }
        }
    }

    /// Serializes and writes the full collection.
    pub fn save(&self, tasks: &[Task]) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(tasks)?;
        self.backend.write(STORAGE_KEY, &json)
    }

    /// Swaps in a new collection and persists it. A failed write is logged
    /// and otherwise ignored; the in-memory list stays authoritative.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        if let Err(e) = self.save(&self.tasks) {
            error!(
                key = STORAGE_KEY,
                error = %e,
                "failed to save tasks, changes kept in memory only"
            );
        }
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks in display order.
    pub fn sorted(&self) -> Vec<&Task> {
        order::sorted(&self.tasks)
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Looks a task up by full id or unique id prefix.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<&Task, ClarityError> {
        if let Some(task) = self.find(id_or_prefix) {
            return Ok(task);
        }
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(ClarityError::TaskNotFound(id_or_prefix.to_string()));
        }
        let mut matches = self.tasks.iter().filter(|task| task.id.starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(task),
            (Some(_), Some(_)) => Err(ClarityError::AmbiguousId(needle.to_string())),
            (None, _) => Err(ClarityError::TaskNotFound(needle.to_string())),
        }
    }

    pub fn insert(&mut self, task: Task) {
        let mut tasks = self.tasks.clone();
        tasks.push(task);
        self.replace(tasks);
    }

    pub fn toggle(&mut self, id: &str, now: DateTime<Utc>) -> Result<Task, ClarityError> {
        self.update(id, |task| {
            let state = lifecycle::toggle(task, now);
            if state == TaskState::Completed {
                debug!(id = %task.id, minutes = ?task.completion_time_minutes, "task completed");
            }
            Ok(())
        })
    }

    pub fn edit(&mut self, id: &str, patch: &TaskPatch) -> Result<Task, ClarityError> {
        self.update(id, |task| lifecycle::edit(task, patch).map_err(ClarityError::from))
    }

    pub fn remove(&mut self, id: &str) -> Result<Task, ClarityError> {
        let mut tasks = self.tasks.clone();
        let removed = lifecycle::delete(&mut tasks, id)
            .ok_or_else(|| ClarityError::TaskNotFound(id.to_string()))?;
        self.replace(tasks);
        Ok(removed)
    }

    /// Records an estimate on a task. Returns `None` if the task no longer
    /// exists, in which case the estimate is dropped.
    pub fn attach_estimate(&mut self, id: &str, minutes: u64) -> Option<Task> {
        self.update(id, |task| {
            task.estimated_time = Some(minutes);
            Ok(())
        })
        .ok()
    }

    fn update<F>(&mut self, id: &str, apply: F) -> Result<Task, ClarityError>
    where
        F: FnOnce(&mut Task) -> Result<(), ClarityError>,
    {
        let mut tasks = self.tasks.clone();
        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| ClarityError::TaskNotFound(id.to_string()))?;
        apply(task)?;
        let updated = task.clone();
        self.replace(tasks);
        Ok(updated)
    }
}
