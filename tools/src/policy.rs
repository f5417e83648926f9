//! The pluggable security-policy contract gating every tool call (§4.5, §4.8).
//!
//! Grounded on the source project's `security_policy.py`: an engine names the
//! tools it considers side-effect-free (those skip the rule match entirely),
//! then matches the remaining calls against an ordered list of glob-pattern
//! rules. A call matching no rule is denied — the engine is default-deny,
//! not default-allow, since an unreviewed new tool must not silently gain
//! unrestricted access.

use std::collections::BTreeSet;

use camel_core::Value;
use globset::Glob;

/// The outcome of evaluating a tool call against a [`SecurityPolicyEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allowed,
    Denied(String),
}

impl PolicyDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// A single named argument passed to a tool call, as seen by a policy rule.
pub struct CallArgs<'a> {
    pub positional: &'a [Value],
    pub keyword: &'a [(String, Value)],
}

impl<'a> CallArgs<'a> {
    #[must_use]
    pub fn get(&self, name: &str, index: usize) -> Option<&Value> {
        self.keyword
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .or_else(|| self.positional.get(index))
    }
}

pub type RuleFn = Box<dyn Fn(&CallArgs<'_>) -> PolicyDecision>;

/// One ordered `(tool name glob, rule)` entry; the first matching glob wins.
pub struct Rule {
    pub pattern: Glob,
    pub check: RuleFn,
}

/// A security-policy engine: the contract every tool call is checked
/// against before dispatch (§4.5). Default-deny: a call matching no
/// `no_side_effect_tools` entry and no rule is [`PolicyDecision::Denied`].
pub struct SecurityPolicyEngine {
    pub name: String,
    pub no_side_effect_tools: BTreeSet<String>,
    pub rules: Vec<Rule>,
}

impl SecurityPolicyEngine {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            no_side_effect_tools: BTreeSet::new(),
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_no_side_effect_tools(mut self, tools: impl IntoIterator<Item = &'static str>) -> Self {
        self.no_side_effect_tools
            .extend(tools.into_iter().map(str::to_string));
        self
    }

    #[must_use]
    pub fn with_rule(mut self, pattern: &str, check: RuleFn) -> Self {
        self.rules.push(Rule {
            pattern: Glob::new(pattern).expect("rule pattern is a valid glob"),
            check,
        });
        self
    }

    /// Evaluate `tool_name(args)` against this engine's rules. `dependencies`
    /// is the run's aggregated dependency trace at this call site (§4.5):
    /// once a tool is state-changing (it already cleared the no-side-effect
    /// bypass above), any value it transitively depends on must be public,
    /// or the call is denied outright before a rule even gets to run.
    #[must_use]
    pub fn check(&self, tool_name: &str, args: &CallArgs<'_>, dependencies: &[Value]) -> PolicyDecision {
        if self.no_side_effect_tools.contains(tool_name) {
            return PolicyDecision::Allowed;
        }
        if dependencies.iter().any(|v| !v.is_public()) {
            return PolicyDecision::Denied(format!(
                "tool '{tool_name}' depends on private values; state-changing tools may only act on public data"
            ));
        }
        for rule in &self.rules {
            if rule.pattern.compile_matcher().is_match(tool_name) {
                return (rule.check)(args);
            }
        }
        PolicyDecision::Denied(format!(
            "no policy rule matches tool '{tool_name}'; denying by default"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camel_types::Capabilities;

    #[test]
    fn no_side_effect_tool_is_allowed_without_rules() {
        let engine = SecurityPolicyEngine::new("test").with_no_side_effect_tools(["get_balance"]);
        let args = CallArgs { positional: &[], keyword: &[] };
        assert_eq!(engine.check("get_balance", &args, &[]), PolicyDecision::Allowed);
    }

    #[test]
    fn unmatched_tool_is_denied_by_default() {
        let engine = SecurityPolicyEngine::new("test");
        let args = CallArgs { positional: &[], keyword: &[] };
        assert!(!engine.check("send_money", &args, &[]).is_allowed());
    }

    #[test]
    fn matching_rule_is_consulted() {
        let engine = SecurityPolicyEngine::new("test").with_rule(
            "send_*",
            Box::new(|_args| PolicyDecision::Denied("recipient not trusted".to_string())),
        );
        let args = CallArgs { positional: &[], keyword: &[] };
        let decision = engine.check("send_money", &args, &[]);
        assert_eq!(
            decision,
            PolicyDecision::Denied("recipient not trusted".to_string())
        );
        let _ = Capabilities::camel();
    }

    #[test]
    fn dependency_on_a_private_value_is_denied_before_rules_run() {
        let engine = SecurityPolicyEngine::new("test").with_rule(
            "send_*",
            Box::new(|_args| PolicyDecision::Allowed),
        );
        let args = CallArgs { positional: &[], keyword: &[] };
        let private = Value::int(
            1,
            Capabilities::with_readers(
                BTreeSet::from([camel_types::Source::User]),
                camel_types::Readers::Identified(BTreeSet::from(["alice".to_string()])),
            ),
            vec![],
        );
        let decision = engine.check("send_money", &args, std::slice::from_ref(&private));
        assert!(!decision.is_allowed());
    }
}
