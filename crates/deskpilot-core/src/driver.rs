//! Input driver abstraction
//!
//! The dispatcher never touches the desktop directly; it calls through
//! this trait. Production backends shell out to an injection tool, tests
//! use recording fakes.

use async_trait::async_trait;
use thiserror::Error;

/// Which pointer button a click refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Errors from an input backend
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("input action failed: {0}")]
    Action(String),
    #[error("input backend unavailable: {0}")]
    Unavailable(String),
}

/// Low-level mouse and keyboard injection.
#[async_trait]
pub trait InputDriver: Send + Sync {
    /// Move the pointer to absolute screen coordinates
    async fn move_pointer(&self, x: i32, y: i32) -> Result<(), DriverError>;

    /// Click a button, optionally moving to `position` first
    async fn click(
        &self,
        button: PointerButton,
        position: Option<(i32, i32)>,
    ) -> Result<(), DriverError>;

    /// Double-click the primary button, optionally moving first
    async fn double_click(&self, position: Option<(i32, i32)>) -> Result<(), DriverError>;

    /// Type a text string
    async fn type_text(&self, text: &str) -> Result<(), DriverError>;

    /// Press a single named key
    async fn press_key(&self, key: &str) -> Result<(), DriverError>;

    /// Press a key combination, e.g. ["ctrl", "c"]
    async fn hotkey(&self, keys: &[String]) -> Result<(), DriverError>;
}
