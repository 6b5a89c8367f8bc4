//! Literal-only command parser
//!
//! Grammar: `name(arg, ..., key=value, ...)` where every value is a
//! scalar literal (integer, decimal, quoted string, boolean, none).
//! There is no expression evaluation and no identifier lookup; model
//! output that does not fit the grammar is rejected.

use super::{ArgValue, Command, CommandKind};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

/// Errors from parsing a command string
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid command format: {0}")]
    InvalidFormat(String),
    #[error("invalid command name: {0}")]
    InvalidName(String),
    #[error("unsupported argument literal: {argument}")]
    UnsupportedLiteral { argument: String },
    #[error("empty argument in: {0}")]
    EmptyArgument(String),
}

/// Errors from checking a command against the vocabulary
#[derive(Debug, Error)]
pub enum ArityError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("{name} expects at least {min} argument(s), got {actual}")]
    TooFew {
        name: String,
        min: usize,
        actual: usize,
    },
    #[error("{name} expects at most {max} argument(s), got {actual}")]
    TooMany {
        name: String,
        max: usize,
        actual: usize,
    },
}

/// Parse one command string into its structured form.
///
/// Parsing does not consult the vocabulary; any well-formed call with
/// literal arguments parses. Use [`validate`] to check the name and arity.
pub fn parse(action_text: &str) -> Result<Command, ParseError> {
    let text = action_text.trim();

    let open = text
        .find('(')
        .ok_or_else(|| ParseError::InvalidFormat(text.to_string()))?;
    if !text.ends_with(')') || open == 0 {
        return Err(ParseError::InvalidFormat(text.to_string()));
    }

    let name = &text[..open];
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ParseError::InvalidName(name.to_string()));
    }

    let mut args = Vec::new();
    let mut kwargs = BTreeMap::new();

    let args_str = &text[open + 1..text.len() - 1];
    if !args_str.trim().is_empty() {
        for segment in split_arguments(args_str) {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(ParseError::EmptyArgument(text.to_string()));
            }
            match split_keyword(segment) {
                Some((key, value)) => {
                    kwargs.insert(key.to_string(), parse_literal(value.trim())?);
                }
                None => args.push(parse_literal(segment)?),
            }
        }
    }

    Ok(Command {
        name: name.to_string(),
        args,
        kwargs,
    })
}

/// Check a parsed command against the vocabulary and its arity bounds.
pub fn validate(command: &Command) -> Result<CommandKind, ArityError> {
    let kind = CommandKind::from_wire(&command.name)
        .ok_or_else(|| ArityError::UnknownCommand(command.name.clone()))?;

    let (min, max) = kind.arity();
    let actual = command.args.len();
    if actual < min {
        return Err(ArityError::TooFew {
            name: command.name.clone(),
            min,
            actual,
        });
    }
    if let Some(max) = max {
        if actual > max {
            return Err(ArityError::TooMany {
                name: command.name.clone(),
                max,
                actual,
            });
        }
    }
    Ok(kind)
}

/// Split the argument list on top-level commas, ignoring commas inside
/// quoted strings.
fn split_arguments(args_str: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in args_str.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if quote.is_some() => {
                current.push(c);
                escaped = true;
            }
            '\'' | '"' => {
                match quote {
                    Some(open) if open == c => quote = None,
                    Some(_) => {}
                    None => quote = Some(c),
                }
                current.push(c);
            }
            ',' if quote.is_none() => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        segments.push(current);
    }
    segments
}

/// Detect `key=value`, ignoring '=' inside quoted strings. Returns None
/// for plain positional arguments.
fn split_keyword(segment: &str) -> Option<(&str, &str)> {
    if segment.starts_with('\'') || segment.starts_with('"') {
        return None;
    }
    let mut quote: Option<char> = None;
    for (i, c) in segment.char_indices() {
        match c {
            '\'' | '"' => match quote {
                Some(open) if open == c => quote = None,
                Some(_) => {}
                None => quote = Some(c),
            },
            '=' if quote.is_none() => {
                let key = segment[..i].trim();
                if !key.is_empty()
                    && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Some((key, &segment[i + 1..]));
                }
                return None;
            }
            _ => {}
        }
    }
    None
}

/// Parse one literal value.
fn parse_literal(segment: &str) -> Result<ArgValue, ParseError> {
    if is_integer(segment) {
        if let Ok(v) = segment.parse::<i64>() {
            return Ok(ArgValue::Int(v));
        }
    }
    if is_decimal(segment) {
        if let Ok(v) = segment.parse::<f64>() {
            return Ok(ArgValue::Float(v));
        }
    }
    if segment.starts_with('\'') || segment.starts_with('"') {
        return Ok(match unquote(segment) {
            Some(s) => ArgValue::Str(s),
            None => {
                // malformed quoting; keep the raw text rather than dropping
                // the whole command
                warn!(argument = segment, "unterminated string literal, keeping raw text");
                ArgValue::Str(segment.to_string())
            }
        });
    }
    if segment.eq_ignore_ascii_case("true") {
        return Ok(ArgValue::Bool(true));
    }
    if segment.eq_ignore_ascii_case("false") {
        return Ok(ArgValue::Bool(false));
    }
    if segment.eq_ignore_ascii_case("none") || segment.eq_ignore_ascii_case("null") {
        return Ok(ArgValue::Null);
    }
    Err(ParseError::UnsupportedLiteral {
        argument: segment.to_string(),
    })
}

fn is_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    match body.split_once('.') {
        Some((whole, frac)) => {
            !(whole.is_empty() && frac.is_empty())
                && whole.chars().all(|c| c.is_ascii_digit())
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Strip matching quotes and process escape sequences. Returns None when
/// the literal is not a complete same-quote delimited string.
fn unquote(segment: &str) -> Option<String> {
    let mut chars = segment.chars();
    let open = chars.next()?;

    let mut out = String::new();
    let mut escaped = false;
    let mut closed = false;
    for c in chars {
        if closed {
            // trailing junk after the closing quote
            return None;
        }
        if escaped {
            match c {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                '\\' => out.push('\\'),
                '\'' => out.push('\''),
                '"' => out.push('"'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == open {
            closed = true;
        } else {
            out.push(c);
        }
    }
    if closed {
        Some(out)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_integers() {
        let command = parse("mouse_move(100, 200)").unwrap();
        assert_eq!(command.name, "mouse_move");
        assert_eq!(command.args, vec![ArgValue::Int(100), ArgValue::Int(200)]);
        assert!(command.kwargs.is_empty());
        assert_eq!(validate(&command).unwrap(), CommandKind::MovePointer);
    }

    #[test]
    fn test_comma_inside_quotes_is_one_argument() {
        let command = parse(r#"keyboard_type("hello, world")"#).unwrap();
        assert_eq!(command.name, "keyboard_type");
        assert_eq!(
            command.args,
            vec![ArgValue::Str("hello, world".to_string())]
        );
    }

    #[test]
    fn test_keyword_arguments() {
        let command = parse("mouse_move(100, 200, duration=0.5)").unwrap();
        assert_eq!(command.args.len(), 2);
        assert_eq!(command.kwargs.get("duration"), Some(&ArgValue::Float(0.5)));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for text in [
            "mouse_move(100, 200)",
            r#"keyboard_type("hello, world")"#,
            "wait(1.5)",
            "mouse_left_click()",
            r#"keyboard_hotkey("ctrl", "c")"#,
            "mouse_move(100, 200, duration=0.5)",
        ] {
            let command = parse(text).unwrap();
            let reparsed = parse(&command.to_string()).unwrap();
            assert_eq!(reparsed, command);
        }
    }

    #[test]
    fn test_round_trip_preserves_control_characters() {
        let command = Command {
            name: "keyboard_type".to_string(),
            args: vec![ArgValue::Str("line1\rline2\u{1}\\end\"q\"\n\tok".to_string())],
            kwargs: BTreeMap::new(),
        };
        let reparsed = parse(&command.to_string()).unwrap();
        assert_eq!(reparsed, command);
    }

    #[test]
    fn test_expression_is_rejected() {
        let err = parse("wait(1+1)").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedLiteral { .. }));
    }

    #[test]
    fn test_identifier_argument_is_rejected() {
        let err = parse("keyboard_press(enter)").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedLiteral { .. }));
    }

    #[test]
    fn test_missing_parens_is_invalid_format() {
        assert!(matches!(
            parse("mouse_move"),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse("mouse_move(100, 200"),
            Err(ParseError::InvalidFormat(_))
        ));
        assert!(matches!(parse("(100)"), Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_bad_name_is_rejected() {
        assert!(matches!(
            parse("mouse move(1, 2)"),
            Err(ParseError::InvalidName(_))
        ));
    }

    #[test]
    fn test_empty_interior_argument_is_rejected() {
        assert!(matches!(
            parse("mouse_move(100, , 200)"),
            Err(ParseError::EmptyArgument(_))
        ));
    }

    #[test]
    fn test_unterminated_quote_keeps_raw_text() {
        let command = parse(r#"keyboard_type("oops)"#).unwrap();
        assert_eq!(
            command.args,
            vec![ArgValue::Str(r#""oops"#.to_string())]
        );
    }

    #[test]
    fn test_escape_sequences() {
        let command = parse(r#"keyboard_type("line1\nline2\t\"quoted\"")"#).unwrap();
        assert_eq!(
            command.args,
            vec![ArgValue::Str("line1\nline2\t\"quoted\"".to_string())]
        );
    }

    #[test]
    fn test_boolean_and_null_literals() {
        let command = parse("wait(none)").unwrap();
        assert_eq!(command.args, vec![ArgValue::Null]);
        let command = parse("wait(True)").unwrap();
        assert_eq!(command.args, vec![ArgValue::Bool(true)]);
    }

    #[test]
    fn test_negative_numbers() {
        let command = parse("mouse_move(-5, -0.5)").unwrap();
        assert_eq!(
            command.args,
            vec![ArgValue::Int(-5), ArgValue::Float(-0.5)]
        );
    }

    #[test]
    fn test_validate_unknown_command() {
        let command = parse("launch_missiles()").unwrap();
        assert!(matches!(
            validate(&command),
            Err(ArityError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_validate_arity_bounds() {
        let command = parse("mouse_move(100)").unwrap();
        assert!(matches!(validate(&command), Err(ArityError::TooFew { .. })));

        let command = parse("wait(1, 2)").unwrap();
        assert!(matches!(validate(&command), Err(ArityError::TooMany { .. })));

        let command = parse(r#"keyboard_hotkey("ctrl", "shift", "t")"#).unwrap();
        assert_eq!(validate(&command).unwrap(), CommandKind::HotkeyCombo);
    }

    #[test]
    fn test_click_accepts_zero_or_two_args() {
        let bare = parse("mouse_left_click()").unwrap();
        assert_eq!(validate(&bare).unwrap(), CommandKind::PrimaryClick);

        let at = parse("mouse_left_click(10, 20)").unwrap();
        assert_eq!(validate(&at).unwrap(), CommandKind::PrimaryClick);
    }
}
