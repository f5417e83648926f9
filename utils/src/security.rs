//! Terminal-safe text handling for interpreter output.
//!
//! Tool results and exception messages can carry content from untrusted
//! sources. Before any such text reaches a terminal or log, escape
//! sequences that could manipulate the display are stripped, and callers
//! that know a value is not publicly readable can replace it outright.

use std::borrow::Cow;

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Strip ANSI/C0/C1 control sequences from untrusted text before display.
///
/// Preserves printable characters, newlines, tabs, and carriage returns.
/// Returns `Cow::Borrowed` when the input needed no changes.
#[must_use]
pub fn sanitize_terminal_text(input: &str) -> Cow<'_, str> {
    if !needs_sanitization(input) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ESC {
            skip_escape_sequence(&mut chars);
        } else if is_allowed_control(c) {
            result.push(c);
        } else if is_c0_control(c) || is_c1_control(c) || c == '\x7f' {
            if is_c1_csi(c) {
                skip_csi_params(&mut chars);
            }
        } else {
            result.push(c);
        }
    }

    Cow::Owned(result)
}

/// Replace text with a redaction placeholder, for values a traceback
/// audience is not permitted to read.
#[must_use]
pub fn redact(_input: &str) -> String {
    "<redacted>".to_string()
}

fn needs_sanitization(input: &str) -> bool {
    input.chars().any(|c| {
        c == ESC
            || c == BEL
            || (is_c0_control(c) && !is_allowed_control(c))
            || is_c1_control(c)
            || c == '\x7f'
    })
}

fn is_c0_control(c: char) -> bool {
    c <= '\x1f'
}

fn is_allowed_control(c: char) -> bool {
    matches!(c, '\n' | '\t' | '\r')
}

fn is_c1_control(c: char) -> bool {
    ('\u{0080}'..='\u{009f}').contains(&c)
}

fn is_c1_csi(c: char) -> bool {
    c == '\u{009b}'
}

fn skip_escape_sequence<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    let Some(&next) = chars.peek() else {
        return;
    };

    match next {
        '[' => {
            chars.next();
            skip_csi_params(chars);
        }
        ']' => {
            chars.next();
            skip_osc_sequence(chars);
        }
        'P' | '^' | '_' => {
            chars.next();
            skip_until_st(chars);
        }
        '(' | ')' | '*' | '+' | '#' | ' ' => {
            chars.next();
            chars.next();
        }
        '7' | '8' | 'c' | 'D' | 'E' | 'H' | 'M' | 'N' | 'O' | 'Z' | '=' | '>' | '<' => {
            chars.next();
        }
        _ => {}
    }
}

fn skip_csi_params<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    while let Some(&c) = chars.peek() {
        if ('\x40'..='\x7e').contains(&c) {
            chars.next();
            return;
        } else if ('\x20'..='\x3f').contains(&c) {
            chars.next();
        } else {
            return;
        }
    }
}

fn skip_osc_sequence<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == BEL {
            return;
        }
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}

fn skip_until_st<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_no_allocation() {
        let input = "Hello, world!";
        match sanitize_terminal_text(input) {
            Cow::Borrowed(s) => assert_eq!(s, input),
            Cow::Owned(_) => panic!("should not allocate for clean input"),
        }
    }

    #[test]
    fn preserves_newlines_tabs_cr() {
        let input = "Line 1\nLine 2\tTabbed\r\nCRLF";
        assert_eq!(sanitize_terminal_text(input), input);
    }

    #[test]
    fn strips_csi_clear_screen() {
        let input = "Before\x1b[2JAfter";
        assert_eq!(sanitize_terminal_text(input), "BeforeAfter");
    }

    #[test]
    fn strips_csi_color_codes() {
        let input = "\x1b[31mRed\x1b[0m Normal";
        assert_eq!(sanitize_terminal_text(input), "Red Normal");
    }

    #[test]
    fn redact_always_replaces() {
        assert_eq!(redact("anything at all"), "<redacted>");
    }
}
