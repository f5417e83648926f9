//! The single public entry point a host embeds: parse, evaluate, report
//! (§6.1).

use camel_core::Namespace;
use camel_core::Value;

use crate::eval_mode::EvalArgs;
use crate::interpreter::Interpreter;
use crate::parser::{extract_code_block, parse_program};

/// A fresh namespace carrying only the built-in library (§3.5, §6.1).
#[must_use]
pub fn namespace_with_builtins() -> Namespace {
    Namespace::with_builtins()
}

/// Parse and evaluate `code` against `namespace`, mutating it in place as
/// statements execute (the caller's `namespace` reflects every binding made
/// up to the point the run stopped, success or failure). `deps` seeds every
/// literal's dependency trace, so a run's own provenance (e.g. the assistant
/// message that produced this code) survives into every value the program
/// produces (§3.3, §6.1).
///
/// Returns the program's result value (or the uncaught exception that ended
/// it), the tool-call log, and the run's aggregated dependency trace. Parse
/// failures short-circuit with an empty log and trace; every other raised
/// exception is still a first-class [`Value`], never a silent reset (§4.7).
pub fn run(
    code: &str,
    namespace: &Namespace,
    deps: Vec<Value>,
    eval_args: &EvalArgs,
) -> (
    Result<Value, Value>,
    Vec<crate::interpreter::FunctionCall>,
    Vec<Value>,
) {
    let source = extract_code_block(code);
    let body = match parse_program(&source) {
        Ok(body) => body,
        Err(e) => {
            let exc = camel_core::exception::make(
                camel_types::ExceptionKind::ParseError(e.to_string()),
                None,
                None,
                deps,
            );
            return (Err(exc), vec![], vec![]);
        }
    };

    let mut interp = Interpreter::new(eval_args.mode, source, deps);
    let outcome = interp.exec_block(&body, namespace);
    let (log, aggregated, last_value) = interp.into_log_and_deps();

    let result = match outcome {
        Ok(_) => Ok(last_value.unwrap_or_else(|| Value::none(camel_types::Capabilities::camel(), vec![]))),
        Err(exc) => Err(exc),
    };

    (result, log, aggregated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval_mode::EvalArgs;

    #[test]
    fn simple_expression_runs_to_completion() {
        let ns = namespace_with_builtins();
        let (result, _log, _deps) = run("1 + 2", &ns, vec![], &EvalArgs::default());
        assert!(result.is_ok());
    }

    #[test]
    fn name_error_surfaces_as_exception_value() {
        let ns = namespace_with_builtins();
        let (result, _log, _deps) = run("undefined_name", &ns, vec![], &EvalArgs::default());
        let exc = result.expect_err("expected a name error");
        assert!(matches!(exc.raw(), camel_core::Raw::Exception(_)));
    }

    #[test]
    fn assignment_persists_into_the_shared_namespace() {
        let ns = namespace_with_builtins();
        let (result, _log, _deps) = run("x = 41 + 1", &ns, vec![], &EvalArgs::default());
        assert!(result.is_ok());
        assert!(ns.get("x").is_some());
    }

    #[test]
    fn markdown_fence_is_stripped_before_parsing() {
        let ns = namespace_with_builtins();
        let code = "```python\ny = 1\n```";
        let (result, _log, _deps) = run(code, &ns, vec![], &EvalArgs::default());
        assert!(result.is_ok());
        assert!(ns.get("y").is_some());
    }

    /// A state-changing tool is denied once the run's aggregated dependency
    /// trace carries a non-public value, even when a policy rule would
    /// otherwise allow it — the default-deny gate runs before the rules do.
    #[test]
    fn tool_call_is_denied_once_the_run_has_touched_a_private_value() {
        use camel_tools::policy::{CallArgs, PolicyDecision, SecurityPolicyEngine};
        use camel_tools::registry::{ToolRegistry, ToolSpec};
        use camel_types::{Capabilities, Readers, Source};
        use std::collections::BTreeSet;
        use std::rc::Rc;

        let ns = namespace_with_builtins();
        let mut registry = ToolRegistry::new();
        registry.register(ToolSpec {
            name: "send_money".to_string(),
            params: vec![],
            func: Rc::new(|_args, _kwargs, _ns| Ok(Value::none(Capabilities::camel(), vec![]))),
            no_side_effect: false,
            classify: None,
        });
        let policy: &'static SecurityPolicyEngine =
            Box::leak(Box::new(SecurityPolicyEngine::new("test").with_rule(
                "send_*",
                Box::new(|_args: &CallArgs<'_>| PolicyDecision::Allowed),
            )));
        registry.install(&ns, policy);

        let private = Value::int(
            1,
            Capabilities::with_readers(
                BTreeSet::from([Source::User]),
                Readers::Identified(BTreeSet::from(["alice".to_string()])),
            ),
            vec![],
        );
        let (result, _log, _deps) = run(
            "1\nsend_money()",
            &ns,
            vec![private],
            &EvalArgs::default(),
        );
        let exc = result.expect_err("expected the tool call to be denied");
        assert!(matches!(exc.raw(), camel_core::Raw::Exception(_)));
    }
}
