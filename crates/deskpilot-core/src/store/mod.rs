//! Task state store
//!
//! A single in-process store shared between the HTTP layer and the
//! executor. One coarse mutex guards both the task map and the session
//! index so a registration updates both atomically. All operations are
//! short map reads and writes; the lock is never held across an await.

use crate::types::{SessionId, Task, TaskId, TaskSnapshot, TaskStatus};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task already registered: {0}")]
    DuplicateTask(String),
    #[error("internal store error: {0}")]
    Internal(String),
}

#[derive(Default)]
struct Inner {
    tasks: HashMap<TaskId, Task>,
    sessions: HashMap<SessionId, Vec<TaskId>>,
}

/// Concurrency-safe store for tasks and their session grouping.
#[derive(Default)]
pub struct TaskStore {
    inner: Mutex<Inner>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Internal(format!("store lock poisoned: {e}")))
    }

    /// Register a new task under a session.
    ///
    /// The task record and the session index entry are created under one
    /// lock acquisition, so no observer can see one without the other.
    pub fn register_task(
        &self,
        task_id: impl Into<TaskId>,
        session_id: impl Into<SessionId>,
    ) -> Result<(), StoreError> {
        let task_id = task_id.into();
        let session_id = session_id.into();
        let mut inner = self.lock()?;
        if inner.tasks.contains_key(&task_id) {
            return Err(StoreError::DuplicateTask(task_id));
        }
        inner
            .tasks
            .insert(task_id.clone(), Task::new(task_id.clone(), session_id.clone()));
        inner.sessions.entry(session_id).or_default().push(task_id);
        Ok(())
    }

    /// Update a task's status and message.
    ///
    /// Updates for unknown tasks are dropped; the executor may outlive a
    /// task that was never registered in a test harness.
    pub fn update_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        message: impl Into<String>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        match inner.tasks.get_mut(task_id) {
            Some(task) => task.set_status(status, message),
            None => debug!(task_id, "status update for unknown task dropped"),
        }
        Ok(())
    }

    /// Snapshot a task's queryable state
    pub fn get_status(&self, task_id: &str) -> Result<Option<TaskSnapshot>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.tasks.get(task_id).map(Task::snapshot))
    }

    /// Write a per-task scratch value
    pub fn set_scratch(
        &self,
        task_id: &str,
        key: impl Into<String>,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        match inner.tasks.get_mut(task_id) {
            Some(task) => {
                task.scratch.insert(key.into(), value);
            }
            None => debug!(task_id, "scratch write for unknown task dropped"),
        }
        Ok(())
    }

    /// Read a per-task scratch value
    pub fn get_scratch(&self, task_id: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .tasks
            .get(task_id)
            .and_then(|task| task.scratch.get(key).cloned()))
    }

    /// Task ids registered under a session, in registration order.
    /// Unknown sessions yield an empty list.
    pub fn get_session_tasks(&self, session_id: &str) -> Result<Vec<TaskId>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.sessions.get(session_id).cloned().unwrap_or_default())
    }

    /// Number of tasks currently held
    pub fn task_count(&self) -> Result<usize, StoreError> {
        let inner = self.lock()?;
        Ok(inner.tasks.len())
    }
}
