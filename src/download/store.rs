//! Shared task map.
//!
//! Every operation takes the single lock, does its work on in-memory data and
//! releases it before returning. Callers only ever receive owned copies, so no
//! reference into the map can be held across an `.await`.

use super::task::Task;
use crate::error::{Error, Result};

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// A point-in-time copy of every task, keyed by id.
pub type Snapshot = HashMap<String, Task>;

/// Thread-safe mapping of task identifier to task record.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Task>> {
        // Records are plain data; a poisoned lock still holds usable state.
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts a fresh queued record for `url` and returns its identifier.
    pub fn create(&self, url: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.lock().insert(id.clone(), Task::new(id.clone(), url));
        id
    }

    /// Returns a copy of every record.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }

    /// Returns a copy of one record.
    pub fn get(&self, id: &str) -> Option<Task> {
        self.lock().get(id).cloned()
    }

    /// Applies `f` to the record while holding the lock.
    pub fn mutate<R>(&self, id: &str, f: impl FnOnce(&mut Task) -> R) -> Result<R> {
        let mut tasks = self.lock();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| Error::UnknownTask(id.to_string()))?;
        Ok(f(task))
    }

    /// Deletes every record matching `predicate` and returns their ids.
    pub fn remove_if(&self, mut predicate: impl FnMut(&Task) -> bool) -> Vec<String> {
        let mut tasks = self.lock();
        let doomed: Vec<String> = tasks
            .values()
            .filter(|task| predicate(task))
            .map(|task| task.id.clone())
            .collect();
        for id in &doomed {
            tasks.remove(id);
        }
        doomed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
