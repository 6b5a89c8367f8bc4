//! Process-backed capture and input backends
//!
//! Both backends shell out to external tools: a screenshot command that
//! takes an output path (scrot-style) and an xdotool-compatible input
//! command. Keeping these as subprocesses means the server needs no
//! display libraries of its own.

use async_trait::async_trait;
use chrono::Utc;
use deskpilot_core::agent::{CaptureError, ScreenCapture};
use deskpilot_core::driver::{DriverError, InputDriver, PointerButton};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Screenshot backend that invokes an external capture tool.
pub struct CommandCapture {
    command: String,
    dir: PathBuf,
}

impl CommandCapture {
    pub fn new(command: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            dir: dir.into(),
        }
    }
}

fn screenshot_filename() -> String {
    Utc::now().format("screenshot_%Y%m%d_%H%M%S%3f.png").to_string()
}

#[async_trait]
impl ScreenCapture for CommandCapture {
    async fn capture(&self) -> Result<PathBuf, CaptureError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(screenshot_filename());

        debug!(command = %self.command, path = %path.display(), "capturing screenshot");
        let output = Command::new(&self.command)
            .arg(&path)
            .output()
            .await
            .map_err(|e| CaptureError::Failed(format!("{}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::Failed(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }
        Ok(path)
    }
}

/// Input backend that invokes an xdotool-compatible command.
pub struct ProcessInputDriver {
    command: String,
}

impl ProcessInputDriver {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn run(&self, args: &[String]) -> Result<(), DriverError> {
        debug!(command = %self.command, ?args, "injecting input");
        let output = Command::new(&self.command)
            .args(args)
            .output()
            .await
            .map_err(|e| DriverError::Unavailable(format!("{}: {e}", self.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DriverError::Action(format!(
                "{} {} exited with {}: {}",
                self.command,
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

fn button_number(button: PointerButton) -> &'static str {
    match button {
        PointerButton::Primary => "1",
        PointerButton::Secondary => "3",
    }
}

pub(crate) fn move_args(x: i32, y: i32) -> Vec<String> {
    vec!["mousemove".to_string(), x.to_string(), y.to_string()]
}

pub(crate) fn click_args(button: PointerButton) -> Vec<String> {
    vec!["click".to_string(), button_number(button).to_string()]
}

pub(crate) fn double_click_args() -> Vec<String> {
    vec![
        "click".to_string(),
        "--repeat".to_string(),
        "2".to_string(),
        "1".to_string(),
    ]
}

pub(crate) fn type_args(text: &str) -> Vec<String> {
    vec!["type".to_string(), "--".to_string(), text.to_string()]
}

pub(crate) fn key_args(key: &str) -> Vec<String> {
    vec!["key".to_string(), key.to_string()]
}

pub(crate) fn hotkey_args(keys: &[String]) -> Vec<String> {
    vec!["key".to_string(), keys.join("+")]
}

#[async_trait]
impl InputDriver for ProcessInputDriver {
    async fn move_pointer(&self, x: i32, y: i32) -> Result<(), DriverError> {
        self.run(&move_args(x, y)).await
    }

    async fn click(
        &self,
        button: PointerButton,
        position: Option<(i32, i32)>,
    ) -> Result<(), DriverError> {
        if let Some((x, y)) = position {
            self.run(&move_args(x, y)).await?;
        }
        self.run(&click_args(button)).await
    }

    async fn double_click(&self, position: Option<(i32, i32)>) -> Result<(), DriverError> {
        if let Some((x, y)) = position {
            self.run(&move_args(x, y)).await?;
        }
        self.run(&double_click_args()).await
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.run(&type_args(text)).await
    }

    async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        self.run(&key_args(key)).await
    }

    async fn hotkey(&self, keys: &[String]) -> Result<(), DriverError> {
        self.run(&hotkey_args(keys)).await
    }
}
