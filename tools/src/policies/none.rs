//! The trusted-environment demo engine: every call is allowed (§4.5).
//!
//! Grounded on the source project's `NoSecurityPolicyEngine`, used when a
//! run's tool suite needs no gating at all, e.g. local development or a
//! test harness that exercises the interpreter without a real tool suite.

use crate::policy::{CallArgs, PolicyDecision, SecurityPolicyEngine};

#[must_use]
pub fn engine() -> SecurityPolicyEngine {
    SecurityPolicyEngine::new("none").with_rule("*", Box::new(|_args: &CallArgs<'_>| PolicyDecision::Allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_is_allowed() {
        let engine = engine();
        let args = CallArgs { positional: &[], keyword: &[] };
        assert!(engine.check("send_money", &args, &[]).is_allowed());
        assert!(engine.check("anything_at_all", &args, &[]).is_allowed());
    }
}
