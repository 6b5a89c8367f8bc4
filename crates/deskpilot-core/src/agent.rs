//! Collaborator traits for the plan executor
//!
//! The executor drives three capabilities it does not implement itself:
//! capturing the screen, locating a UI element in a screenshot, and
//! generating the command list for an operate step. Production
//! implementations live in deskpilot-agents and the server crate; tests
//! use in-memory fakes.

use crate::types::ElementLocation;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from capturing a screenshot
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("screen capture failed: {0}")]
    Failed(String),
    #[error("screenshot io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from locating an element
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("failed to read screenshot: {0}")]
    Read(String),
    #[error("no element detected in model response: {raw}")]
    NoElement { raw: String },
    #[error("unparseable detection ({detail}): {raw}")]
    Unparseable { detail: String, raw: String },
    #[error("vision model error: {0}")]
    Llm(String),
}

/// Errors from generating an operation command list
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("malformed command list ({detail}): {raw}")]
    Malformed { detail: String, raw: String },
    #[error("model returned no commands: {raw}")]
    Empty { raw: String },
    #[error("operation model error: {0}")]
    Llm(String),
}

/// Takes a screenshot of the current screen and returns its path.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    async fn capture(&self) -> Result<PathBuf, CaptureError>;
}

/// Finds a UI element in a screenshot from a natural-language prompt.
#[async_trait]
pub trait ElementLocator: Send + Sync {
    async fn locate(&self, image: &Path, prompt: &str) -> Result<ElementLocation, LocateError>;
}

/// Produces the textual command list for an operate instruction.
///
/// The element, when present, is the most recently located one; its
/// geometry is the anchor for coordinate-bearing commands.
#[async_trait]
pub trait OperationGenerator: Send + Sync {
    async fn generate(
        &self,
        instruction: &str,
        element: Option<&ElementLocation>,
    ) -> Result<Vec<String>, GenerationError>;
}

/// Render a located element as context text for the operation model.
pub fn element_context(element: &ElementLocation) -> String {
    match element.coordinates.primary() {
        Some(bbox) => {
            let (cx, cy) = bbox.center();
            format!(
                "Element type: {}\nBounding box: [x1={}, y1={}, x2={}, y2={}]\nCenter point: [x={}, y={}]",
                element.element_type, bbox.0, bbox.1, bbox.2, bbox.3, cx, cy
            )
        }
        None => format!("Element type: {}\nBounding box: unknown", element.element_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Coordinates};

    #[test]
    fn test_element_context_includes_center() {
        let element = ElementLocation {
            element_type: "ui_element".to_string(),
            coordinates: Coordinates::Single(BoundingBox(10, 20, 30, 40)),
            raw_response: String::new(),
        };
        let context = element_context(&element);
        assert!(context.contains("[x1=10, y1=20, x2=30, y2=40]"));
        assert!(context.contains("[x=20, y=30]"));
    }
}
