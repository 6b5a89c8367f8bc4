//! Planning interface and plan-text parsing
//!
//! The planner turns a natural-language intent into a [`Plan`]. Model
//! output arrives as JSON, often wrapped in a fenced code block; parsing
//! helpers live here so every planner implementation shares the same
//! acceptance rules, and so the executor can fall back to a generic
//! three-step plan when the output is unusable.

use crate::types::{Plan, Step};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors from producing a plan
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("unparseable plan ({detail}): {raw}")]
    Unparseable { detail: String, raw: String },
    #[error("invalid plan: {0}")]
    Invalid(String),
    #[error("plan has no steps")]
    Empty,
    #[error("planner model error: {0}")]
    Llm(String),
}

/// Produces a plan for a natural-language intent.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, intent: &str) -> Result<Plan, PlanError>;
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence regex is valid")
    })
}

/// Extract the body of the first fenced code block, if any.
pub fn extract_json_block(text: &str) -> Option<&str> {
    fence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse planner model output into a plan.
///
/// Accepts either a bare JSON array of steps or one wrapped in a fenced
/// code block. Empty step lists are rejected so the caller can fall back.
pub fn parse_plan_json(text: &str) -> Result<Plan, PlanError> {
    let body = extract_json_block(text).unwrap_or(text).trim();
    let steps: Vec<Step> = serde_json::from_str(body).map_err(|e| PlanError::Unparseable {
        detail: e.to_string(),
        raw: text.to_string(),
    })?;
    if steps.is_empty() {
        return Err(PlanError::Empty);
    }
    Ok(Plan::new(steps))
}

/// Generic capture / locate / operate plan used when the planner output
/// is unusable.
pub fn fallback_plan(intent: &str) -> Plan {
    Plan::new(vec![
        Step::capture("Take a screenshot of the current screen"),
        Step::locate(
            "Identify the target element",
            format!("Find the element needed to accomplish: {intent}"),
        ),
        Step::operate(
            "Perform the required operation",
            format!("Execute operations to accomplish: {intent}"),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepKind;

    #[test]
    fn test_parse_bare_json_array() {
        let plan = parse_plan_json(
            r#"[{"type": "capture", "description": "take a screenshot"}]"#,
        )
        .unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_parse_fenced_json_block() {
        let text = "Here is the plan:\n```json\n[\n  {\"type\": \"locate\", \"description\": \"find it\", \"prompt\": \"Find the OK button\"}\n]\n```\nDone.";
        let plan = parse_plan_json(text).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(matches!(plan.steps[0].kind, StepKind::Locate { .. }));
    }

    #[test]
    fn test_unfenced_prose_is_unparseable() {
        let err = parse_plan_json("I think you should click the button").unwrap_err();
        assert!(matches!(err, PlanError::Unparseable { .. }));
    }

    #[test]
    fn test_missing_payload_is_unparseable() {
        let err =
            parse_plan_json(r#"[{"type": "locate", "description": "find it"}]"#).unwrap_err();
        assert!(matches!(err, PlanError::Unparseable { .. }));
    }

    #[test]
    fn test_empty_step_list_is_rejected() {
        assert!(matches!(parse_plan_json("[]"), Err(PlanError::Empty)));
    }

    #[test]
    fn test_fallback_plan_shape() {
        let plan = fallback_plan("open the settings menu");
        assert_eq!(plan.len(), 3);
        assert!(matches!(plan.steps[0].kind, StepKind::Capture));
        match &plan.steps[1].kind {
            StepKind::Locate { prompt } => assert!(prompt.contains("open the settings menu")),
            other => panic!("unexpected step kind: {other:?}"),
        }
        match &plan.steps[2].kind {
            StepKind::Operate { instruction } => {
                assert!(instruction.contains("open the settings menu"))
            }
            other => panic!("unexpected step kind: {other:?}"),
        }
    }
}
