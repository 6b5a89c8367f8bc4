//! Sequential plan executor
//!
//! Runs one task end to end: acquire a plan, execute its steps in order,
//! and record the outcome in the task store. Step failures are isolated;
//! a failed step is recorded and execution moves on to the next step.
//! Only plan-level failures mark the task failed.

use crate::agent::{
    CaptureError, ElementLocator, GenerationError, LocateError, OperationGenerator, ScreenCapture,
};
use crate::command::{parser, DispatchError, Dispatcher, ParseError};
use crate::planner::{fallback_plan, PlanError, Planner};
use crate::store::TaskStore;
use crate::types::{ElementLocation, Plan, StepKind, TaskStatus};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Scratch key for the most recent screenshot path
pub const LAST_SCREENSHOT_KEY: &str = "last_screenshot";
/// Scratch key for the most recently located element
pub const LAST_ELEMENT_KEY: &str = "last_element";

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
}

/// Record of one executed step.
///
/// Exactly one record exists per plan step, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub description: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub executed_commands: Vec<String>,
}

impl StepRecord {
    fn new(index: usize, description: &str) -> Self {
        Self {
            index,
            description: description.to_string(),
            status: StepStatus::Success,
            error: None,
            screenshot: None,
            element: None,
            executed_commands: Vec::new(),
        }
    }

    fn fail(&mut self, error: String) {
        self.status = StepStatus::Failed;
        self.error = Some(error);
    }
}

/// Errors from executing a single step
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("command '{command}' rejected: {source}")]
    Parse {
        command: String,
        #[source]
        source: ParseError,
    },
    #[error("command '{command}' failed: {source}")]
    Dispatch {
        command: String,
        #[source]
        source: DispatchError,
    },
}

/// Drives plans to completion for one task at a time.
pub struct PlanExecutor {
    planner: Arc<dyn Planner>,
    capture: Arc<dyn ScreenCapture>,
    locator: Arc<dyn ElementLocator>,
    generator: Arc<dyn OperationGenerator>,
    dispatcher: Dispatcher,
    store: Arc<TaskStore>,
}

impl PlanExecutor {
    pub fn new(
        planner: Arc<dyn Planner>,
        capture: Arc<dyn ScreenCapture>,
        locator: Arc<dyn ElementLocator>,
        generator: Arc<dyn OperationGenerator>,
        dispatcher: Dispatcher,
        store: Arc<TaskStore>,
    ) -> Self {
        Self {
            planner,
            capture,
            locator,
            generator,
            dispatcher,
            store,
        }
    }

    /// Run a task from intent to terminal status.
    ///
    /// Intended to be spawned; all outcomes are reported through the
    /// store rather than a return value.
    pub async fn run_task(&self, task_id: &str, intent: &str) {
        info!(task_id, intent, "starting automation task");
        self.set_status(task_id, TaskStatus::Planning, "creating automation plan");

        let plan = match self.acquire_plan(intent).await {
            Ok(plan) => plan,
            Err(err) => {
                error!(task_id, error = %err, "planning failed");
                self.set_status(
                    task_id,
                    TaskStatus::Failed,
                    format!("automation failed: {err}"),
                );
                return;
            }
        };

        let records = self.execute_plan(task_id, &plan).await;

        let failed = records
            .iter()
            .filter(|r| r.status == StepStatus::Failed)
            .count();
        let message = if failed == 0 {
            "automation task completed successfully".to_string()
        } else {
            format!(
                "automation task completed, {failed} of {} steps failed",
                records.len()
            )
        };
        info!(task_id, steps = records.len(), failed, "automation task finished");
        self.set_status(task_id, TaskStatus::Completed, message);
    }

    /// Ask the planner for a plan, falling back to the generic
    /// three-step plan when the output is unusable. Model transport
    /// errors are not recoverable and propagate.
    async fn acquire_plan(&self, intent: &str) -> Result<Plan, PlanError> {
        match self.planner.plan(intent).await {
            Ok(plan) if !plan.is_empty() => Ok(plan),
            Ok(_) => {
                warn!(intent, "planner produced an empty plan, using fallback");
                Ok(fallback_plan(intent))
            }
            Err(err @ PlanError::Llm(_)) => Err(err),
            Err(err) => {
                warn!(intent, error = %err, "unusable planner output, using fallback");
                Ok(fallback_plan(intent))
            }
        }
    }

    /// Execute every step of the plan in order, one record per step.
    pub async fn execute_plan(&self, task_id: &str, plan: &Plan) -> Vec<StepRecord> {
        let total = plan.len();
        let mut records: Vec<StepRecord> = Vec::with_capacity(total);

        for (index, step) in plan.steps.iter().enumerate() {
            self.set_status(
                task_id,
                TaskStatus::Executing,
                format!("executing step {}/{}: {}", index + 1, total, step.description),
            );
            info!(task_id, step = index + 1, total, description = %step.description, "executing step");

            let mut record = StepRecord::new(index, &step.description);
            if let Err(err) = self.execute_step(task_id, step.kind.clone(), &mut record, &records).await
            {
                error!(task_id, step = index + 1, error = %err, "step failed");
                record.fail(err.to_string());
            }
            records.push(record);
        }
        records
    }

    async fn execute_step(
        &self,
        task_id: &str,
        kind: StepKind,
        record: &mut StepRecord,
        prior: &[StepRecord],
    ) -> Result<(), StepError> {
        match kind {
            StepKind::Capture => {
                let path = self.capture.capture().await?;
                self.remember_screenshot(task_id, &path);
                record.screenshot = Some(path);
            }
            StepKind::Locate { prompt } => {
                let screenshot = match latest_screenshot(prior) {
                    Some(path) => path,
                    None => {
                        // locate with no prior capture takes its own screenshot
                        let path = self.capture.capture().await?;
                        self.remember_screenshot(task_id, &path);
                        record.screenshot = Some(path.clone());
                        path
                    }
                };
                let element = self.locator.locate(&screenshot, &prompt).await?;
                self.remember_element(task_id, &element);
                record.element = Some(element);
            }
            StepKind::Operate { instruction } => {
                let element = latest_element(prior);
                let commands = self
                    .generator
                    .generate(&instruction, element.as_ref())
                    .await?;
                for text in commands {
                    let command = parser::parse(&text).map_err(|source| StepError::Parse {
                        command: text.clone(),
                        source,
                    })?;
                    self.dispatcher
                        .dispatch(&command)
                        .await
                        .map_err(|source| StepError::Dispatch {
                            command: text.clone(),
                            source,
                        })?;
                    record.executed_commands.push(text);
                }
            }
        }
        Ok(())
    }

    fn set_status(&self, task_id: &str, status: TaskStatus, message: impl Into<String>) {
        if let Err(err) = self.store.update_status(task_id, status, message) {
            error!(task_id, error = %err, "failed to update task status");
        }
    }

    fn remember_screenshot(&self, task_id: &str, path: &PathBuf) {
        let value = serde_json::Value::String(path.to_string_lossy().into_owned());
        if let Err(err) = self.store.set_scratch(task_id, LAST_SCREENSHOT_KEY, value) {
            error!(task_id, error = %err, "failed to record screenshot path");
        }
    }

    fn remember_element(&self, task_id: &str, element: &ElementLocation) {
        match serde_json::to_value(element) {
            Ok(value) => {
                if let Err(err) = self.store.set_scratch(task_id, LAST_ELEMENT_KEY, value) {
                    error!(task_id, error = %err, "failed to record located element");
                }
            }
            Err(err) => error!(task_id, error = %err, "failed to serialize located element"),
        }
    }
}

/// Most recent screenshot among prior step records
fn latest_screenshot(records: &[StepRecord]) -> Option<PathBuf> {
    records.iter().rev().find_map(|r| r.screenshot.clone())
}

/// Most recent located element among prior step records
fn latest_element(records: &[StepRecord]) -> Option<ElementLocation> {
    records.iter().rev().find_map(|r| r.element.clone())
}
