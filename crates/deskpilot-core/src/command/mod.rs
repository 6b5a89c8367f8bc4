//! Command model, parsing and dispatch
//!
//! Operate steps produce textual commands such as `mouse_move(100, 200)`.
//! This module defines the structured [`Command`] form, the closed
//! vocabulary of [`CommandKind`]s with their arity rules, the literal-only
//! [`parser`], and the [`Dispatcher`] that routes validated commands to an
//! input driver.

mod dispatcher;
pub mod parser;

pub use dispatcher::{DispatchError, Dispatcher};
pub use parser::{ArityError, ParseError};

use std::collections::BTreeMap;
use std::fmt::{self, Write};

/// A literal argument value.
///
/// Only scalar literals are representable. There is deliberately no
/// variant for expressions or identifiers; anything else is a parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl ArgValue {
    /// Numeric view, widening integers to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Int(v) => Some(*v as f64),
            ArgValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// String view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(v) => write!(f, "{v}"),
            // {:?} keeps the decimal point on whole floats, so 2.0
            // renders as "2.0" and re-parses as a float
            ArgValue::Float(v) => write!(f, "{v:?}"),
            // only the escape forms the parser decodes; everything else,
            // control characters included, passes through literally
            ArgValue::Str(s) => {
                f.write_char('"')?;
                for c in s.chars() {
                    match c {
                        '\\' => f.write_str("\\\\")?,
                        '"' => f.write_str("\\\"")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        other => f.write_char(other)?,
                    }
                }
                f.write_char('"')
            }
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::Null => f.write_str("none"),
        }
    }
}

/// A parsed command: name, positional arguments and keyword arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Vec<ArgValue>,
    pub kwargs: BTreeMap<String, ArgValue>,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut first = true;
        for arg in &self.args {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
            first = false;
        }
        for (key, value) in &self.kwargs {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        f.write_str(")")
    }
}

/// The closed vocabulary of dispatchable commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    MovePointer,
    PrimaryClick,
    SecondaryClick,
    DoubleClick,
    TypeText,
    PressKey,
    HotkeyCombo,
    Wait,
}

impl CommandKind {
    /// Resolve a wire-format command name
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "mouse_move" => Some(CommandKind::MovePointer),
            "mouse_left_click" => Some(CommandKind::PrimaryClick),
            "mouse_right_click" => Some(CommandKind::SecondaryClick),
            "mouse_double_click" => Some(CommandKind::DoubleClick),
            "keyboard_type" => Some(CommandKind::TypeText),
            "keyboard_press" => Some(CommandKind::PressKey),
            "keyboard_hotkey" => Some(CommandKind::HotkeyCombo),
            "wait" => Some(CommandKind::Wait),
            _ => None,
        }
    }

    /// Wire-format name for this kind
    pub fn wire_name(&self) -> &'static str {
        match self {
            CommandKind::MovePointer => "mouse_move",
            CommandKind::PrimaryClick => "mouse_left_click",
            CommandKind::SecondaryClick => "mouse_right_click",
            CommandKind::DoubleClick => "mouse_double_click",
            CommandKind::TypeText => "keyboard_type",
            CommandKind::PressKey => "keyboard_press",
            CommandKind::HotkeyCombo => "keyboard_hotkey",
            CommandKind::Wait => "wait",
        }
    }

    /// Positional argument bounds as (min, max); `None` max is unbounded.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            CommandKind::MovePointer => (2, Some(2)),
            // clicks accept either no coordinates (click in place) or an x,y pair
            CommandKind::PrimaryClick
            | CommandKind::SecondaryClick
            | CommandKind::DoubleClick => (0, Some(2)),
            CommandKind::TypeText | CommandKind::PressKey | CommandKind::Wait => (1, Some(1)),
            CommandKind::HotkeyCombo => (1, None),
        }
    }
}
