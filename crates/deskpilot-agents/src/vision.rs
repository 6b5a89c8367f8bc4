//! Vision-model element locator
//!
//! Sends a screenshot plus a referring prompt to a grounding-capable
//! vision model and parses the detection markup it returns:
//! `<|det|>[[x1,y1,x2,y2]]<|/det|>`.

use crate::client::{ChatClient, ChatMessage, ChatRequest};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use deskpilot_core::agent::{ElementLocator, LocateError};
use deskpilot_core::types::{Coordinates, ElementLocation};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

fn detection_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<\|det\|>(.*?)<\|/det\|>").expect("detection regex is valid"))
}

/// Parse the detection markup from a vision model response.
pub fn parse_detection(response: &str) -> Result<ElementLocation, LocateError> {
    let capture = detection_regex()
        .captures(response)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| LocateError::NoElement {
            raw: response.to_string(),
        })?;

    let coordinates: Coordinates =
        serde_json::from_str(capture.as_str()).map_err(|e| LocateError::Unparseable {
            detail: e.to_string(),
            raw: response.to_string(),
        })?;

    Ok(ElementLocation {
        element_type: "ui_element".to_string(),
        coordinates,
        raw_response: response.to_string(),
    })
}

/// Locator backed by a grounding vision model.
pub struct VisionLocator<C: ChatClient> {
    client: C,
    model: String,
    max_tokens: u32,
}

impl<C: ChatClient> VisionLocator<C> {
    pub fn new(client: C, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl<C: ChatClient> ElementLocator for VisionLocator<C> {
    async fn locate(&self, image: &Path, prompt: &str) -> Result<ElementLocation, LocateError> {
        let bytes = tokio::fs::read(image)
            .await
            .map_err(|e| LocateError::Read(format!("{}: {e}", image.display())))?;
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(bytes));

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user_with_image(
                format!("<image>\n<|ref|>{prompt}<|/ref|>."),
                data_url,
            )],
            // grounding output must be deterministic
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| LocateError::Llm(e.to_string()))?;

        debug!(prompt, response = %response, "vision response received");
        parse_detection(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmError;
    use deskpilot_core::types::BoundingBox;
    use std::io::Write;

    #[test]
    fn test_parse_single_detection() {
        let element =
            parse_detection("<|ref|>submit button<|/ref|><|det|>[[10,20,30,40]]<|/det|>").unwrap();
        assert_eq!(
            element.coordinates.primary(),
            Some(&BoundingBox(10, 20, 30, 40))
        );
        assert_eq!(element.element_type, "ui_element");
    }

    #[test]
    fn test_missing_detection_is_no_element() {
        let err = parse_detection("I cannot see a submit button.").unwrap_err();
        assert!(matches!(err, LocateError::NoElement { .. }));
    }

    #[test]
    fn test_garbled_detection_is_unparseable() {
        let err = parse_detection("<|det|>somewhere top left<|/det|>").unwrap_err();
        assert!(matches!(err, LocateError::Unparseable { .. }));
    }

    struct StaticClient(String);

    #[async_trait]
    impl ChatClient for StaticClient {
        async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
            assert_eq!(request.temperature, 0.0);
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_locate_reads_image_and_parses_detection() {
        tokio_test::block_on(async {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(b"not really a png").unwrap();

            let locator = VisionLocator::new(
                StaticClient("<|det|>[[1,2,3,4]]<|/det|>".to_string()),
                "vision-model",
                256,
            );
            let element = locator.locate(file.path(), "the OK button").await.unwrap();
            assert_eq!(element.coordinates.primary(), Some(&BoundingBox(1, 2, 3, 4)));
        });
    }

    #[test]
    fn test_missing_image_is_read_error() {
        tokio_test::block_on(async {
            let locator = VisionLocator::new(
                StaticClient(String::new()),
                "vision-model",
                256,
            );
            let err = locator
                .locate(Path::new("/nonexistent/shot.png"), "anything")
                .await
                .unwrap_err();
            assert!(matches!(err, LocateError::Read(_)));
        });
    }
}
