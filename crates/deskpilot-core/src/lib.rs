//! # Deskpilot Core
//!
//! Core logic for the deskpilot automation engine.
//!
//! This crate contains:
//! - Step / Plan / Task / ElementLocation definitions
//! - Command parsing, validation and dispatch
//! - The concurrency-safe task state store
//! - The sequential plan executor
//!
//! This crate does NOT contain:
//! - Any network or model-calling code (see deskpilot-agents)
//! - The HTTP service layer (see deskpilot-server)
//! - Real input-injection or screen-capture backends; those sit behind
//!   the [`driver::InputDriver`] and [`agent::ScreenCapture`] traits

pub mod agent;
pub mod command;
pub mod driver;
pub mod executor;
pub mod planner;
pub mod store;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::{
        element_context, CaptureError, ElementLocator, GenerationError, LocateError,
        OperationGenerator, ScreenCapture,
    };
    pub use crate::command::{
        parser, ArgValue, ArityError, Command, CommandKind, DispatchError, Dispatcher, ParseError,
    };
    pub use crate::driver::{DriverError, InputDriver, PointerButton};
    pub use crate::executor::{PlanExecutor, StepError, StepRecord, StepStatus};
    pub use crate::planner::{fallback_plan, parse_plan_json, PlanError, Planner};
    pub use crate::store::{StoreError, TaskStore};
    pub use crate::types::{
        BoundingBox, Coordinates, ElementLocation, Plan, SessionId, Step, StepKind, Task, TaskId,
        TaskSnapshot, TaskStatus,
    };
}

// Re-export key types at crate root
pub use command::{Command, Dispatcher};
pub use executor::{PlanExecutor, StepRecord};
pub use planner::Planner;
pub use store::TaskStore;
pub use types::{ElementLocation, Plan, Step, Task, TaskStatus};
