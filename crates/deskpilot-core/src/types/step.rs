//! Step and Plan definitions
//!
//! A Plan is the ordered step sequence produced once per task. Steps are
//! immutable once the plan exists; the kind-specific payload lives inside
//! the kind variant so a locate or operate step cannot be constructed
//! without it.

use serde::{Deserialize, Serialize};

/// Step kind with its kind-specific payload.
///
/// Wire format is internally tagged, e.g.
/// `{"type": "locate", "description": "...", "prompt": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Take a screenshot of the current screen
    Capture,
    /// Analyze the latest screenshot to find a UI element
    Locate {
        /// Prompt sent to the vision model
        prompt: String,
    },
    /// Perform mouse/keyboard operations
    Operate {
        /// Instruction for the operation model
        instruction: String,
    },
}

/// A single step in an automation plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Human-readable description of the step
    pub description: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    /// Create a capture step
    pub fn capture(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kind: StepKind::Capture,
        }
    }

    /// Create a locate step
    pub fn locate(description: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kind: StepKind::Locate {
                prompt: prompt.into(),
            },
        }
    }

    /// Create an operate step
    pub fn operate(description: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kind: StepKind::Operate {
                instruction: instruction.into(),
            },
        }
    }
}

/// An ordered sequence of steps, produced once per task and never
/// mutated during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    /// Create a plan from a step sequence
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Number of steps in the plan
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true when the plan has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_wire_format_round_trips() {
        let plan = Plan::new(vec![
            Step::capture("take a screenshot"),
            Step::locate("find the button", "Find the submit button"),
            Step::operate("click it", "Click the submit button"),
        ]);

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            value,
            json!([
                {"type": "capture", "description": "take a screenshot"},
                {"type": "locate", "description": "find the button", "prompt": "Find the submit button"},
                {"type": "operate", "description": "click it", "instruction": "Click the submit button"},
            ])
        );

        let back: Plan = serde_json::from_value(value).unwrap();
        assert_eq!(back, plan);
    }

    #[test]
    fn test_locate_step_without_prompt_is_rejected() {
        let result: Result<Step, _> = serde_json::from_value(json!({
            "type": "locate",
            "description": "find something"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_operate_step_without_instruction_is_rejected() {
        let result: Result<Step, _> = serde_json::from_value(json!({
            "type": "operate",
            "description": "do something"
        }));
        assert!(result.is_err());
    }
}
