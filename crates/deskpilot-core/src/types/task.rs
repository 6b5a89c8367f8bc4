//! Task type definitions
//!
//! A Task tracks one execution of a Plan, from registration through
//! completion or failure. Tasks are owned by the [`crate::store::TaskStore`]
//! and mutated only through its API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Type alias for Task ID
pub type TaskId = String;

/// Type alias for Session ID
pub type SessionId = String;

/// Task lifecycle status.
///
/// Transitions run created -> planning -> executing -> completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Created,
    Planning,
    Executing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Check if the task reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Check if the task is actively progressing
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Planning | TaskStatus::Executing)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskStatus::Created => "created",
            TaskStatus::Planning => "planning",
            TaskStatus::Executing => "executing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One tracked execution of a plan.
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique identifier for this task
    pub id: TaskId,
    /// Session this task belongs to
    pub session_id: SessionId,
    /// Current lifecycle status
    pub status: TaskStatus,
    /// Latest human-readable status line
    pub message: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Per-task keyed artifact exchange between sequential steps.
    /// Never visible to other tasks.
    pub scratch: HashMap<String, Value>,
}

impl Task {
    /// Create a new task in the `created` state
    pub fn new(id: impl Into<TaskId>, session_id: impl Into<SessionId>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            session_id: session_id.into(),
            status: TaskStatus::Created,
            message: "task created".to_string(),
            created_at: now,
            updated_at: now,
            scratch: HashMap::new(),
        }
    }

    /// Update status and message, bumping `updated_at`
    pub fn set_status(&mut self, status: TaskStatus, message: impl Into<String>) {
        self.status = status;
        self.message = message.into();
        self.updated_at = Utc::now();
    }

    /// Immutable copy of the queryable task fields
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            status: self.status,
            message: self.message.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Immutable view of a task returned by status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification_flags() {
        assert!(TaskStatus::Planning.is_active());
        assert!(TaskStatus::Executing.is_active());
        assert!(!TaskStatus::Created.is_active());

        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Executing.is_terminal());
    }

    #[test]
    fn test_set_status_bumps_updated_at() {
        let mut task = Task::new("t1", "s1");
        assert_eq!(task.status, TaskStatus::Created);
        let before = task.updated_at;

        task.set_status(TaskStatus::Planning, "creating automation plan");
        assert_eq!(task.status, TaskStatus::Planning);
        assert_eq!(task.message, "creating automation plan");
        assert!(task.updated_at >= before);
    }

    #[test]
    fn test_snapshot_copies_queryable_fields() {
        let mut task = Task::new("t1", "s1");
        task.set_status(TaskStatus::Failed, "automation failed: boom");
        let snapshot = task.snapshot();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert_eq!(snapshot.message, "automation failed: boom");
    }
}
