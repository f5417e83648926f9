//! Source-text parsing: markdown-fence extraction plus the Python-subset
//! grammar (§3.1, §6.1).

use rustpython_ast::{Mod, Suite};
use rustpython_parser::{parse, Mode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("expected a module body, got an expression")]
    NotAModule,
}

/// Pull the first fenced code block out of `text`, stripping an optional
/// language tag (``` python ``` `, ```` ```tool_code ```` , or bare ```` ``` ````).
/// Falls back to the input unchanged when no fence is present.
#[must_use]
pub fn extract_code_block(text: &str) -> String {
    let Some(start) = text.find("```") else {
        return text.to_string();
    };
    let after_open = &text[start + 3..];
    let body_start = after_open.find('\n').map_or(0, |i| i + 1);
    let body = &after_open[body_start..];
    let Some(end) = body.find("```") else {
        return text.to_string();
    };
    body[..end].trim_end_matches('\n').to_string()
}

/// Parse a program body, rejecting anything that is not a plain module.
pub fn parse_program(source: &str) -> Result<Suite, ParseError> {
    let module = parse(source, Mode::Module, "<string>").map_err(|e| ParseError::Syntax(e.to_string()))?;
    match module {
        Mod::Module(m) => Ok(m.body),
        _ => Err(ParseError::NotAModule),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fence_with_language_tag() {
        let text = "Some text.\n```python\nx = 1\n```\nMore text.";
        assert_eq!(extract_code_block(text), "x = 1");
    }

    #[test]
    fn extracts_fence_with_tool_code_tag() {
        let text = "Some text.\n```tool_code\nx = 1\n```\nMore text.";
        assert_eq!(extract_code_block(text), "x = 1");
    }

    #[test]
    fn extracts_bare_fence() {
        let text = "Some text.\n```\nx = 1\n```\nMore text.";
        assert_eq!(extract_code_block(text), "x = 1");
    }

    #[test]
    fn falls_back_to_raw_text_without_a_fence() {
        let text = "x = 1";
        assert_eq!(extract_code_block(text), "x = 1");
    }
}
