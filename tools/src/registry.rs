//! Adapts externally-registered tool functions into interpreter [`Callable`]s
//! and gates their invocation through a [`SecurityPolicyEngine`] (§4.5, §4.6).
//!
//! Adapted from the teacher's tool-execution dispatch shape (`tool_gate.rs`'s
//! fail-closed latch, generalized here to a per-call policy check instead of
//! a session-wide switch) and grounded on `run_code.py`'s tool-injection call
//! site, which pre-populates the namespace with every registered tool before
//! a program runs.

use std::collections::BTreeMap;

use camel_core::value::callable::{Callable, NativeFn, ProvenanceFn};
use camel_core::{Namespace, Raw, Value};
use camel_types::{Capabilities, ExceptionKind};

use crate::errors::ToolError;
use crate::policy::{CallArgs, PolicyDecision, SecurityPolicyEngine};

/// One registered tool: its native implementation, declared parameter names
/// (the `param_schema` of §6.2), and how to classify its output's
/// capabilities (§4.6).
pub struct ToolSpec {
    pub name: String,
    pub params: Vec<String>,
    pub func: NativeFn,
    pub no_side_effect: bool,
    pub classify: Option<ProvenanceFn>,
}

impl ToolSpec {
    /// Reject keyword arguments outside the declared schema before the call
    /// reaches the policy engine (§6.2) — never a silent pass-through.
    pub fn validate_kwargs(&self, kwargs: &[(String, camel_core::Value)]) -> Result<(), ToolError> {
        for (key, _) in kwargs {
            if !self.params.contains(key) {
                return Err(ToolError::UnknownArgument {
                    tool: self.name.clone(),
                    argument: key.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The set of tools available to a run, injected into the namespace at
/// startup and checked against a policy engine on every call.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolSpec>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ToolSpec) {
        self.tools.insert(spec.name.clone(), spec);
    }

    /// Look up a tool's declared schema, e.g. so the engine's call-dispatch
    /// site can validate keyword arguments before invoking it (§6.2).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.get(name)
    }

    /// Bind every registered tool into `namespace`, wrapping each as a
    /// policy-gated [`Callable::Tool`].
    pub fn install(&self, namespace: &Namespace, policy: &'static SecurityPolicyEngine) {
        for spec in self.tools.values() {
            let name = spec.name.clone();
            let inner = spec.func.clone();
            let gated: NativeFn = std::rc::Rc::new(move |args, kwargs, ns| {
                let call_args = CallArgs {
                    positional: args,
                    keyword: kwargs,
                };
                let dependencies = ns.dependency_trace();
                match policy.check(&name, &call_args, &dependencies) {
                    PolicyDecision::Allowed => inner(args, kwargs, ns),
                    PolicyDecision::Denied(reason) => Err(ExceptionKind::SecurityPolicyDenied(reason)),
                }
            });
            let value = Value::new(
                Raw::Callable(Callable::Tool {
                    name: spec.name.clone(),
                    func: gated,
                    no_side_effect: spec.no_side_effect,
                    classify: spec.classify.clone(),
                }),
                Capabilities::camel(),
                vec![],
            );
            namespace.set_variable(&spec.name, value);
        }
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SecurityPolicyEngine;
    use std::rc::Rc;

    #[test]
    fn denied_call_raises_security_policy_denied() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolSpec {
            name: "send_money".to_string(),
            params: vec!["recipient".to_string(), "amount".to_string()],
            func: Rc::new(|_args, _kwargs, _ns| Ok(Value::none(Capabilities::camel(), vec![]))),
            no_side_effect: false,
            classify: None,
        });
        let ns = Namespace::with_builtins();
        let policy: &'static SecurityPolicyEngine = Box::leak(Box::new(SecurityPolicyEngine::new("test")));
        registry.install(&ns, policy);
        let Raw::Callable(callable) = ns.get("send_money").unwrap().raw() else {
            panic!("expected callable")
        };
        let err = callable.call(&[], &[], &ns).unwrap_err();
        assert_eq!(
            err,
            ExceptionKind::SecurityPolicyDenied(
                "no policy rule matches tool 'send_money'; denying by default".to_string()
            )
        );
    }

    #[test]
    fn allowed_call_executes_and_wraps_output() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolSpec {
            name: "get_balance".to_string(),
            params: vec![],
            func: Rc::new(|_args, _kwargs, _ns| {
                Ok(Value::int(100, Capabilities::camel(), vec![]))
            }),
            no_side_effect: true,
            classify: None,
        });
        let ns = Namespace::with_builtins();
        let policy: &'static SecurityPolicyEngine = Box::leak(Box::new(SecurityPolicyEngine::new("test")));
        registry.install(&ns, policy);
        let Raw::Callable(callable) = ns.get("get_balance").unwrap().raw() else {
            panic!("expected callable")
        };
        let out = callable.call(&[], &[], &ns).unwrap();
        assert!(matches!(out.raw(), Raw::Int(100)));
    }

    #[test]
    fn unknown_keyword_argument_fails_schema_validation() {
        let spec = ToolSpec {
            name: "send_money".to_string(),
            params: vec!["recipient".to_string()],
            func: Rc::new(|_args, _kwargs, _ns| Ok(Value::none(Capabilities::camel(), vec![]))),
            no_side_effect: false,
            classify: None,
        };
        let bogus = Value::int(1, Capabilities::camel(), vec![]);
        let err = spec
            .validate_kwargs(&[("not_a_param".to_string(), bogus)])
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::UnknownArgument {
                tool: "send_money".to_string(),
                argument: "not_a_param".to_string(),
            }
        );
    }
}
