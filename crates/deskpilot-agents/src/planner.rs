//! LLM-backed planner

use crate::client::{ChatClient, ChatMessage, ChatRequest};
use async_trait::async_trait;
use deskpilot_core::planner::{parse_plan_json, PlanError, Planner};
use deskpilot_core::types::Plan;
use tracing::debug;

const SYSTEM_PROMPT: &str = r#"You are a desktop automation planner. Given a user intent, produce a JSON array of steps. Each step is an object with:
- "type": one of "capture", "locate", "operate"
- "description": a short human-readable summary
- "prompt" (locate steps only): what UI element to find
- "instruction" (operate steps only): what mouse/keyboard operations to perform

A capture step takes a screenshot. A locate step finds a UI element in the latest screenshot. An operate step performs mouse and keyboard actions, usually against the most recently located element.

Respond with ONLY the JSON array, no commentary."#;

/// Planner that asks a chat model for a step plan.
pub struct LlmPlanner<C: ChatClient> {
    client: C,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl<C: ChatClient> LlmPlanner<C> {
    pub fn new(client: C, model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl<C: ChatClient> Planner for LlmPlanner<C> {
    async fn plan(&self, intent: &str) -> Result<Plan, PlanError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Create a plan to accomplish this intent: {intent}"
                )),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| PlanError::Llm(e.to_string()))?;

        debug!(intent, response_len = response.len(), "planner response received");
        parse_plan_json(&response)
    }
}
