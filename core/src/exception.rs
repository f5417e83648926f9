//! Exception values and traceback rendering (§4.7).
//!
//! An exception is a first-class [`Value`] like any other, so it carries
//! capabilities and dependencies: whether the driver may show its message
//! text verbatim depends on whether the exception (and the values that
//! produced it) is trusted, exactly like any other read.

use camel_types::{Capabilities, ExceptionKind};

use crate::value::{Raw, Value};

#[derive(Debug)]
pub struct ExceptionData {
    pub kind: ExceptionKind,
    /// 1-indexed line in the source text the failing node started at, if known.
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl std::fmt::Display for ExceptionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Wrap an [`ExceptionKind`] into a runtime [`Value`], with the dependency
/// chain of whatever values produced it (so trust is inherited, not reset).
#[must_use]
pub fn make(kind: ExceptionKind, line: Option<usize>, column: Option<usize>, dependencies: Vec<Value>) -> Value {
    Value::new(
        Raw::Exception(std::rc::Rc::new(ExceptionData { kind, line, column })),
        Capabilities::camel(),
        dependencies,
    )
}

/// Render a traceback line for `exc`. Message text is shown verbatim only
/// when the exception value (and everything it depends on) is trusted;
/// otherwise only a redaction placeholder and source span are shown (§4.7).
#[must_use]
pub fn render_traceback(exc: &Value, source: &str) -> String {
    let Raw::Exception(data) = exc.raw() else {
        return String::new();
    };
    let span = match (data.line, data.column) {
        (Some(line), Some(col)) => source
            .lines()
            .nth(line - 1)
            .map(|text| format!("  line {line}, column {col}:\n    {text}\n"))
            .unwrap_or_default(),
        (Some(line), None) => source
            .lines()
            .nth(line - 1)
            .map(|text| format!("  line {line}:\n    {text}\n"))
            .unwrap_or_default(),
        _ => String::new(),
    };
    if exc.is_trusted() {
        format!("{span}{}", data.kind)
    } else {
        format!("{span}{}", camel_utils::redact(&data.kind.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camel_types::Readers;
    use std::collections::BTreeSet;

    #[test]
    fn trusted_exception_shows_message_verbatim() {
        let exc = make(ExceptionKind::ZeroDivisionError, Some(1), None, vec![]);
        let out = render_traceback(&exc, "1 / 0");
        assert!(out.contains("division"));
    }

    #[test]
    fn untrusted_exception_is_redacted() {
        let tainted = Value::new(
            Raw::Int(1),
            Capabilities::with_readers(BTreeSet::new(), Readers::identified(["someone"])),
            vec![],
        );
        let exc = make(ExceptionKind::ValueError("secret leak".to_string()), None, None, vec![tainted]);
        let out = render_traceback(&exc, "");
        assert!(!out.contains("secret leak"));
        assert!(out.contains("redacted"));
    }
}
