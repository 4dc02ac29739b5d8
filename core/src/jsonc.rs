//! JSON-with-comments handling.
//!
//! Prompts and schemas are authored by hand and annotated with `//` and
//! `/* */` comments. [`strip_comments`] removes those with a small
//! tokenizer that tracks string-literal state, so a `//` inside a URL or
//! a `/*` inside a description survives untouched.

use serde_json::Value;

use crate::errors::{LabError, LabResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Str { escaped: bool },
    LineComment,
    BlockComment,
}

/// Removes `//` line comments and `/* */` block comments that appear
/// outside string literals.
///
/// Line comments end before their newline, which is kept. Newlines inside
/// block comments are kept too so parser line numbers still point at the
/// original text. An unterminated block comment swallows the rest.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = State::Code;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '"' => {
                    out.push(c);
                    state = State::Str { escaped: false };
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                _ => out.push(c),
            },
            State::Str { escaped } => {
                out.push(c);
                state = match (escaped, c) {
                    (true, _) => State::Str { escaped: false },
                    (false, '\\') => State::Str { escaped: true },
                    (false, '"') => State::Code,
                    _ => State::Str { escaped: false },
                };
            }
            State::LineComment => {
                if c == '\n' {
                    out.push(c);
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                } else if c == '\n' {
                    out.push(c);
                }
            }
        }
    }

    out
}

/// Strips comments and parses the result as strict JSON.
pub fn parse(text: &str) -> LabResult<Value> {
    let stripped = strip_comments(text);
    serde_json::from_str(&stripped).map_err(|e| LabError::InvalidSyntax(e.to_string()))
}

/// Live-validation helper for an editor buffer. Blank text is not an error.
pub fn check(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    match parse(text) {
        Ok(_) => None,
        Err(LabError::InvalidSyntax(details)) => Some(format!(
            "Invalid JSON. Check for missing commas, brackets, or quotes. Details: {}",
            details
        )),
        Err(e) => Some(e.to_string()),
    }
}

/// Pretty-prints `text` when it is valid JSON, otherwise returns it unchanged.
pub fn format_for_display(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_line_and_block_comments() {
        let input = r#"
// leading note
{
  "style": "cinematic", // trailing note
  /* block
     spanning lines */
  "scenes": [1, 2]
}
"#;
        let value = parse(input).unwrap();
        assert_eq!(value, json!({"style": "cinematic", "scenes": [1, 2]}));
    }

    #[test]
    fn test_comment_markers_inside_strings_survive() {
        let input = r#"{"url": "https://example.com/a", "note": "keep /* this */ too"} // gone"#;
        let value = parse(input).unwrap();
        assert_eq!(value["url"], "https://example.com/a");
        assert_eq!(value["note"], "keep /* this */ too");
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let input = r#"{"quote": "she said \"// not a comment\""}"#;
        let value = parse(input).unwrap();
        assert_eq!(value["quote"], "she said \"// not a comment\"");
    }

    #[test]
    fn test_block_comment_keeps_line_numbers() {
        let stripped = strip_comments("/* a\nb\nc */{}");
        assert_eq!(stripped, "\n\n{}");
    }

    #[test]
    fn test_unterminated_block_comment_swallows_rest() {
        assert_eq!(strip_comments("{} /* open"), "{} ");
    }

    #[test]
    fn test_invalid_json_is_syntax_error() {
        let err = parse("{\"a\": 1,, }").unwrap_err();
        assert!(matches!(err, LabError::InvalidSyntax(_)));
    }

    #[test]
    fn test_check_messages() {
        assert_eq!(check("   "), None);
        assert_eq!(check("// only a comment\n{}"), None);
        let message = check("{ \"a\": }").unwrap();
        assert!(message.starts_with("Invalid JSON. Check for missing commas"));
        assert!(message.contains("Details:"));
    }

    #[test]
    fn test_format_for_display() {
        assert_eq!(format_for_display("[1,2]"), "[\n  1,\n  2\n]");
        assert_eq!(format_for_display("not json"), "not json");
    }

    #[test]
    fn test_key_order_is_preserved() {
        let value = parse("{\"zeta\": 1, \"alpha\": 2}").unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }
}
