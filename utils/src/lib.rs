//! Shared infrastructure utilities for the camel interpreter.
//!
//! - **`security`**: terminal-safe sanitization and redaction for untrusted
//!   text reaching tracebacks, logs, or tool output.

pub mod security;

pub use security::{redact, sanitize_terminal_text};
