//! In-memory task and reminder store.
//!
//! Tasks live for the process lifetime. The store's mutex is independent of
//! the actuator guard and no operation holds both.

pub mod mirror;

use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;

use crate::error::TaskError;
use crate::types::Task;

/// Sequence of tasks guarded by its own mutex.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Task>>, TaskError> {
        self.tasks.lock().map_err(|_| TaskError::LockPoisoned)
    }

    /// Append a task.
    pub fn add(&self, task: Task) -> Result<Task, TaskError> {
        self.lock()?.push(task.clone());
        Ok(task)
    }

    /// All tasks, closest to `now` first.
    pub fn list_by_proximity(&self, now: NaiveDateTime) -> Result<Vec<Task>, TaskError> {
        let mut tasks = self.lock()?.clone();
        sort_by_proximity(&mut tasks, now);
        Ok(tasks)
    }

    /// Remove the task at `index` of the proximity-sorted listing.
    ///
    /// The index is checked while the lock is held, so a concurrent removal
    /// cannot shift it between validation and removal.
    pub fn remove(&self, index: usize, now: NaiveDateTime) -> Result<Task, TaskError> {
        let mut tasks = self.lock()?;
        let len = tasks.len();
        if index >= len {
            return Err(TaskError::IndexOutOfRange { index, len });
        }
        sort_by_proximity(&mut tasks, now);
        Ok(tasks.remove(index))
    }

    /// Remove every task, returning what was removed.
    pub fn clear(&self) -> Result<Vec<Task>, TaskError> {
        Ok(std::mem::take(&mut *self.lock()?))
    }

    pub fn len(&self) -> Result<usize, TaskError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, TaskError> {
        Ok(self.lock()?.is_empty())
    }
}

/// Closest due moment first, past or future alike; ties by creation order.
fn sort_by_proximity(tasks: &mut [Task], now: NaiveDateTime) {
    tasks.sort_by_key(|t| ((t.due() - now).num_seconds().unsigned_abs(), t.created));
}
