//! Tool-adapter errors that abort a run outright rather than surfacing as an
//! interpreter `Exception` value (§6.2).
//!
//! These are crate-boundary failures — a malformed call never reaches a
//! point where a capability-tracked value could represent it — so they are
//! plain `thiserror` enums, not part of [`camel_types::ExceptionKind`].

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("tool '{tool}' called with unknown keyword argument '{argument}'")]
    UnknownArgument { tool: String, argument: String },

    #[error("tool '{tool}' missing required argument '{argument}'")]
    MissingArgument { tool: String, argument: String },

    #[error("no tool named '{0}' is registered")]
    UnknownTool(String),
}
