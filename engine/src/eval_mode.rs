//! Evaluation-mode selection (§6.4).
//!
//! `Strict` is a superset of `Normal`'s dependency tracking: it still reaches
//! the same `Ok`/`Error` outcome as `Normal` on every program, but widens
//! the recorded dependency chain so that auditing a strict trace can reveal
//! more of *why* a value carries the capabilities it does.

/// Metadata-propagation strength for a single `run()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    #[default]
    Normal,
    /// Synthesized values additionally depend on their receiver/operands
    /// even when those operands are already public, widening traces without
    /// changing outcomes.
    Strict,
}

impl EvalMode {
    #[must_use]
    pub fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

/// Arguments controlling a single evaluation of a program (§6.1, §6.4).
#[derive(Debug, Clone, Default)]
pub struct EvalArgs {
    pub mode: EvalMode,
}

impl EvalArgs {
    #[must_use]
    pub fn strict() -> Self {
        Self {
            mode: EvalMode::Strict,
        }
    }
}
