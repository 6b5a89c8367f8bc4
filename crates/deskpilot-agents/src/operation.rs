//! LLM-backed operation generator
//!
//! Turns an operate instruction (plus the most recently located element)
//! into a list of command strings from the dispatch vocabulary. The model
//! is asked for a JSON array; a line-extraction fallback salvages
//! responses where the commands are right but the wrapping is not.

use crate::client::{ChatClient, ChatMessage, ChatRequest};
use async_trait::async_trait;
use deskpilot_core::agent::{element_context, GenerationError, OperationGenerator};
use deskpilot_core::planner::extract_json_block;
use deskpilot_core::types::ElementLocation;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const SYSTEM_PROMPT: &str = r#"You are a desktop automation operator. Produce the mouse/keyboard commands that carry out the given instruction. Available commands:
- mouse_move(x, y)
- mouse_left_click() or mouse_left_click(x, y)
- mouse_right_click() or mouse_right_click(x, y)
- mouse_double_click() or mouse_double_click(x, y)
- keyboard_type("text")
- keyboard_press("key")
- keyboard_hotkey("key1", "key2", ...)
- wait(seconds)

When element context is provided, use its center point for coordinates.
Respond with ONLY a JSON array of command strings, for example:
["mouse_move(100, 200)", "mouse_left_click()"]"#;

fn command_shape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+\(.*\)$").expect("command shape regex is valid"))
}

fn line_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // list markers and numbering in front of a command line
    RE.get_or_init(|| Regex::new(r"^[\s\d\-\*\.]+").expect("line prefix regex is valid"))
}

/// Parse a model response into a list of command strings.
///
/// Prefers a JSON array (fenced or bare). When that fails, falls back to
/// extracting call-shaped lines so a list-formatted response still works.
pub fn parse_command_list(response: &str) -> Result<Vec<String>, GenerationError> {
    let body = extract_json_block(response).unwrap_or(response).trim();

    match serde_json::from_str::<Vec<String>>(body) {
        Ok(commands) => {
            for command in &commands {
                if !command_shape_regex().is_match(command.trim()) {
                    return Err(GenerationError::Malformed {
                        detail: format!("not a command call: {command}"),
                        raw: response.to_string(),
                    });
                }
            }
            if commands.is_empty() {
                return Err(GenerationError::Empty {
                    raw: response.to_string(),
                });
            }
            Ok(commands.into_iter().map(|c| c.trim().to_string()).collect())
        }
        Err(_) => {
            let commands: Vec<String> = response
                .lines()
                .map(|line| line_prefix_regex().replace(line, "").trim().to_string())
                .filter(|line| command_shape_regex().is_match(line))
                .collect();
            if commands.is_empty() {
                return Err(GenerationError::Empty {
                    raw: response.to_string(),
                });
            }
            Ok(commands)
        }
    }
}

/// Operation generator backed by a chat model.
pub struct LlmOperationAgent<C: ChatClient> {
    client: C,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl<C: ChatClient> LlmOperationAgent<C> {
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
impl<C: ChatClient> OperationGenerator for LlmOperationAgent<C> {
    async fn generate(
        &self,
        instruction: &str,
        element: Option<&ElementLocation>,
    ) -> Result<Vec<String>, GenerationError> {
        let user = match element {
            Some(element) => format!(
                "{}\n\nInstruction: {instruction}",
                element_context(element)
            ),
            None => format!("Instruction: {instruction}"),
        };

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| GenerationError::Llm(e.to_string()))?;

        debug!(instruction, response = %response, "operation response received");
        parse_command_list(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmError;
    use deskpilot_core::types::{BoundingBox, Coordinates};
    use std::sync::Mutex;

    #[test]
    fn test_parse_json_array() {
        let commands =
            parse_command_list(r#"["mouse_move(100, 200)", "mouse_left_click()"]"#).unwrap();
        assert_eq!(commands, vec!["mouse_move(100, 200)", "mouse_left_click()"]);
    }

    #[test]
    fn test_parse_fenced_json_array() {
        let commands = parse_command_list(
            "```json\n[\"keyboard_type(\\\"hello\\\")\"]\n```",
        )
        .unwrap();
        assert_eq!(commands, vec![r#"keyboard_type("hello")"#]);
    }

    #[test]
    fn test_line_extraction_fallback() {
        let response = "Here is what to do:\n1. mouse_move(50, 60)\n2. mouse_left_click()\nThat should work.";
        let commands = parse_command_list(response).unwrap();
        assert_eq!(commands, vec!["mouse_move(50, 60)", "mouse_left_click()"]);
    }

    #[test]
    fn test_non_call_entry_is_malformed() {
        let err = parse_command_list(r#"["click the button"]"#).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed { .. }));
    }

    #[test]
    fn test_no_commands_is_empty() {
        let err = parse_command_list("I would not recommend doing that.").unwrap_err();
        assert!(matches!(err, GenerationError::Empty { .. }));
        let err = parse_command_list("[]").unwrap_err();
        assert!(matches!(err, GenerationError::Empty { .. }));
    }

    struct StaticClient {
        response: String,
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ChatClient for StaticClient {
        async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    #[test]
    fn test_generate_includes_element_context() {
        tokio_test::block_on(async {
            let client = StaticClient {
                response: r#"["mouse_left_click(20, 30)"]"#.to_string(),
                requests: Mutex::new(Vec::new()),
            };
            let agent = LlmOperationAgent::new(client, "operation-model", 0.7, 512);

            let element = ElementLocation {
                element_type: "ui_element".to_string(),
                coordinates: Coordinates::Single(BoundingBox(10, 20, 30, 40)),
                raw_response: String::new(),
            };
            let commands = agent
                .generate("Click the submit button", Some(&element))
                .await
                .unwrap();
            assert_eq!(commands, vec!["mouse_left_click(20, 30)"]);

            let requests = agent.client.requests.lock().unwrap();
            match &requests[0].messages[1].content {
                crate::client::MessageContent::Text(text) => {
                    assert!(text.contains("[x=20, y=30]"));
                    assert!(text.contains("Instruction: Click the submit button"));
                }
                other => panic!("unexpected content: {other:?}"),
            }
        });
    }
}
