//! Core type definitions
//!
//! - Step / Plan: the immutable step-plan model
//! - Task: the tracked execution of one plan
//! - ElementLocation: a located UI element

mod element;
mod step;
mod task;

pub use element::{BoundingBox, Coordinates, ElementLocation};
pub use step::{Plan, Step, StepKind};
pub use task::{SessionId, Task, TaskId, TaskSnapshot, TaskStatus};
