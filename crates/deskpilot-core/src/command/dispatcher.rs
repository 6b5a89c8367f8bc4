//! Command dispatcher
//!
//! Routes validated commands to an [`InputDriver`], with a short settle
//! delay after each action so the desktop can catch up before the next
//! command fires.

use super::parser::{self, ArityError};
use super::{ArgValue, Command, CommandKind};
use crate::driver::{DriverError, InputDriver, PointerButton};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default pause after each dispatched command
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Errors from dispatching a command
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("invalid arguments for {name}: {reason}")]
    InvalidArguments { name: String, reason: String },
    #[error(transparent)]
    Arity(ArityError),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Routes commands from the closed vocabulary to an input driver.
#[derive(Clone)]
pub struct Dispatcher {
    driver: Arc<dyn InputDriver>,
    settle_delay: Duration,
}

impl Dispatcher {
    pub fn new(driver: Arc<dyn InputDriver>) -> Self {
        Self {
            driver,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Validate and execute one command.
    ///
    /// All argument checks happen before any driver call, so a rejected
    /// command performs no action at all.
    pub async fn dispatch(&self, command: &Command) -> Result<(), DispatchError> {
        let kind = parser::validate(command).map_err(|err| match err {
            ArityError::UnknownCommand(name) => DispatchError::UnknownCommand(name),
            other => DispatchError::Arity(other),
        })?;

        if !command.kwargs.is_empty() {
            debug!(
                command = %command.name,
                kwargs = command.kwargs.len(),
                "ignoring keyword arguments"
            );
        }

        match kind {
            CommandKind::MovePointer => {
                let x = self.pixel(command, 0)?;
                let y = self.pixel(command, 1)?;
                self.driver.move_pointer(x, y).await?;
            }
            CommandKind::PrimaryClick => {
                let position = self.optional_point(command)?;
                self.driver.click(PointerButton::Primary, position).await?;
            }
            CommandKind::SecondaryClick => {
                let position = self.optional_point(command)?;
                self.driver
                    .click(PointerButton::Secondary, position)
                    .await?;
            }
            CommandKind::DoubleClick => {
                let position = self.optional_point(command)?;
                self.driver.double_click(position).await?;
            }
            CommandKind::TypeText => {
                let text = self.string(command, 0)?;
                self.driver.type_text(&text).await?;
            }
            CommandKind::PressKey => {
                let key = self.string(command, 0)?;
                self.driver.press_key(&key).await?;
            }
            CommandKind::HotkeyCombo => {
                let keys = command
                    .args
                    .iter()
                    .enumerate()
                    .map(|(i, _)| self.string(command, i))
                    .collect::<Result<Vec<_>, _>>()?;
                self.driver.hotkey(&keys).await?;
            }
            CommandKind::Wait => {
                let seconds = command.args[0].as_f64().ok_or_else(|| {
                    self.invalid(command, "duration must be a number")
                })?;
                if seconds < 0.0 {
                    return Err(self.invalid(command, "duration must be non-negative"));
                }
                // try_from rejects values a Duration cannot hold, so an
                // absurd model-emitted duration is an error, not a panic
                let duration = Duration::try_from_secs_f64(seconds)
                    .map_err(|_| self.invalid(command, "duration out of range"))?;
                tokio::time::sleep(duration).await;
            }
        }

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        Ok(())
    }

    fn invalid(&self, command: &Command, reason: &str) -> DispatchError {
        DispatchError::InvalidArguments {
            name: command.name.clone(),
            reason: reason.to_string(),
        }
    }

    fn pixel(&self, command: &Command, index: usize) -> Result<i32, DispatchError> {
        match &command.args[index] {
            ArgValue::Int(v) => i32::try_from(*v)
                .map_err(|_| self.invalid(command, "coordinate out of range")),
            ArgValue::Float(v) => Ok(*v as i32),
            _ => Err(self.invalid(command, "coordinate must be a number")),
        }
    }

    fn optional_point(&self, command: &Command) -> Result<Option<(i32, i32)>, DispatchError> {
        match command.args.len() {
            0 => Ok(None),
            2 => Ok(Some((self.pixel(command, 0)?, self.pixel(command, 1)?))),
            _ => Err(self.invalid(command, "expected no coordinates or an x,y pair")),
        }
    }

    fn string(&self, command: &Command, index: usize) -> Result<String, DispatchError> {
        command.args[index]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(command, "argument must be a string"))
    }
}
