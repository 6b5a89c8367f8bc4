//! # Deskpilot Agents
//!
//! Model-backed implementations of the deskpilot-core collaborator
//! traits: a chat-completions client, an LLM planner, a vision-model
//! element locator and an LLM operation generator.

pub mod client;
pub mod operation;
pub mod planner;
pub mod vision;

pub use client::{ChatClient, ChatMessage, ChatRequest, LlmError, OpenAiChatClient};
pub use operation::LlmOperationAgent;
pub use planner::LlmPlanner;
pub use vision::VisionLocator;
