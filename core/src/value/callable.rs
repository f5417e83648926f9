//! Callable values: built-in functions/methods and tool adapters (§4.3, §6.2).
//!
//! [`Callable::call`] implements the side-effect guard directly from the
//! source semantics: native arguments are snapshotted before invocation and
//! compared against their post-call plain form. Any observed mutation raises
//! [`ExceptionKind::FunctionCallWithSideEffect`] instead of returning a value,
//! since a capability-tracked value that can silently change underneath its
//! dependents would break every downstream trust judgement.

use std::collections::BTreeSet;
use std::rc::Rc;

use camel_types::{Capabilities, ExceptionKind, Readers, Source};

use crate::namespace::Namespace;

use super::{Raw, Value};

pub type NativeFn =
    Rc<dyn Fn(&[Value], &[(String, Value)], &Namespace) -> Result<Value, ExceptionKind>>;

/// Computes a tool output's capabilities from its raw shape (§4.6). When a
/// tool registration supplies one, it replaces the generic
/// `Tool(name)`/`Public` default so the adapter can classify scalars,
/// identity lookups, free text, and structured records differently.
pub type ProvenanceFn = Rc<dyn Fn(&Value) -> Capabilities>;

#[derive(Clone)]
pub enum Callable {
    /// A free function from the standard library (§4.4).
    Builtin { name: String, func: NativeFn },
    /// A method bound to a receiver value, e.g. `"abc".upper`.
    BuiltinMethod {
        name: String,
        receiver: Box<Value>,
        func: NativeFn,
    },
    /// An adapter wrapping an externally registered tool (§4.6).
    Tool {
        name: String,
        func: NativeFn,
        no_side_effect: bool,
        classify: Option<ProvenanceFn>,
    },
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin { name, .. } => write!(f, "Callable::Builtin({name})"),
            Self::BuiltinMethod { name, .. } => write!(f, "Callable::BuiltinMethod({name})"),
            Self::Tool { name, .. } => write!(f, "Callable::Tool({name})"),
        }
    }
}

impl Callable {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin { name, .. }
            | Self::BuiltinMethod { name, .. }
            | Self::Tool { name, .. } => name,
        }
    }

    fn func(&self) -> &NativeFn {
        match self {
            Self::Builtin { func, .. } | Self::BuiltinMethod { func, .. } | Self::Tool { func, .. } => {
                func
            }
        }
    }

    #[must_use]
    pub fn is_no_side_effect_tool(&self) -> bool {
        matches!(self, Self::Tool { no_side_effect: true, .. })
    }

    /// The bound receiver of a method value, e.g. `"abc"` in `"abc".upper`.
    /// Callers prepend this to the evaluated argument list before invoking
    /// [`Callable::call`].
    #[must_use]
    pub fn receiver(&self) -> Option<&Value> {
        match self {
            Self::BuiltinMethod { receiver, .. } => Some(receiver),
            _ => None,
        }
    }

    /// Invoke the callable, enforcing the no-observable-mutation contract on
    /// tools and builtins alike. `args`/`kwargs` are the already-evaluated
    /// argument values (receiver prepended for bound methods by the caller's
    /// namespace lookup).
    pub fn call(
        &self,
        args: &[Value],
        kwargs: &[(String, Value)],
        namespace: &Namespace,
    ) -> Result<Value, ExceptionKind> {
        let before_args: Vec<_> = args.iter().map(Value::to_plain).collect();
        let before_kwargs: Vec<_> = kwargs.iter().map(|(k, v)| (k.clone(), v.to_plain())).collect();

        let output = (self.func())(args, kwargs, namespace)?;

        let after_args: Vec<_> = args.iter().map(Value::to_plain).collect();
        let after_kwargs: Vec<_> = kwargs.iter().map(|(k, v)| (k.clone(), v.to_plain())).collect();
        if before_args != after_args || before_kwargs != after_kwargs {
            return Err(ExceptionKind::FunctionCallWithSideEffect);
        }

        Ok(self.wrap_output(output, args, kwargs))
    }

    /// Re-label a raw call result with this callable's provenance: sourced
    /// from `Tool(name)`, publicly readable, depending on the callable and
    /// its arguments — every callable kind wraps its output this way
    /// (§4.4 step 6), not just registered tools; a tool's `classify`
    /// function, when present, overrides the generic labeling.
    fn wrap_output(&self, output: Value, args: &[Value], kwargs: &[(String, Value)]) -> Value {
        let mut deps = vec![Value::new(
            Raw::Callable(self.clone()),
            Capabilities::camel(),
            vec![],
        )];
        deps.extend(args.iter().cloned());
        deps.extend(kwargs.iter().map(|(_, v)| v.clone()));
        let metadata = match self {
            Self::Tool { classify: Some(f), .. } => f(&output),
            _ => {
                let sources = BTreeSet::from([Source::tool(self.name().to_string(), BTreeSet::new())]);
                Capabilities::with_readers(sources, Readers::Public)
            }
        };
        Value::new(clone_raw(&output), metadata, deps)
    }
}

fn clone_raw(v: &Value) -> Raw {
    match v.raw() {
        Raw::None => Raw::None,
        Raw::Bool(b) => Raw::Bool(*b),
        Raw::Int(i) => Raw::Int(*i),
        Raw::Float(f) => Raw::Float(*f),
        Raw::Char(c) => Raw::Char(*c),
        Raw::Str(cs) => Raw::Str(cs.clone()),
        Raw::Tuple(items) => Raw::Tuple(items.clone()),
        Raw::List(items) => Raw::List(items.clone()),
        Raw::Set(items) => Raw::Set(items.clone()),
        Raw::Dict(entries) => Raw::Dict(entries.clone()),
        Raw::Iterator(items) => Raw::Iterator(items.clone()),
        Raw::Class(c) => Raw::Class(c.clone()),
        Raw::ClassInstance(i) => Raw::ClassInstance(i.clone()),
        Raw::Callable(c) => Raw::Callable(c.clone()),
        Raw::Exception(e) => Raw::Exception(e.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;

    fn int(i: i64) -> Value {
        Value::int(i, Capabilities::camel(), vec![])
    }

    #[test]
    fn builtin_call_wraps_output_with_its_own_tool_source() {
        let func: NativeFn = Rc::new(|args, _kwargs, _ns| Ok(int_from(args)));
        let callable = Callable::Builtin {
            name: "identity".to_string(),
            func,
        };
        let ns = Namespace::with_builtins();
        let out = callable.call(&[int(1)], &[], &ns).unwrap();
        assert!(matches!(out.raw(), Raw::Int(1)));
        assert!(out
            .metadata()
            .sources
            .iter()
            .any(|s| matches!(s, Source::Tool { name, .. } if name == "identity")));
    }

    #[test]
    fn tool_call_wraps_output_with_tool_source() {
        let func: NativeFn = Rc::new(|args, _kwargs, _ns| Ok(int_from(args)));
        let callable = Callable::Tool {
            name: "get_balance".to_string(),
            func,
            no_side_effect: true,
            classify: None,
        };
        let ns = Namespace::with_builtins();
        let out = callable.call(&[int(42)], &[], &ns).unwrap();
        assert!(out
            .metadata()
            .sources
            .iter()
            .any(|s| matches!(s, Source::Tool { name, .. } if name == "get_balance")));
    }

    #[test]
    fn mutating_argument_raises_side_effect_error() {
        let func: NativeFn = Rc::new(|args, _kwargs, _ns| {
            if let Raw::List(items) = args[0].raw() {
                items.borrow_mut().push(int(99));
            }
            Ok(Value::none(Capabilities::camel(), vec![]))
        });
        let callable = Callable::Tool {
            name: "mutate".to_string(),
            func,
            no_side_effect: false,
            classify: None,
        };
        let list = Value::new(
            Raw::List(std::cell::RefCell::new(vec![int(1)])),
            Capabilities::camel(),
            vec![],
        );
        let ns = Namespace::with_builtins();
        let err = callable.call(&[list], &[], &ns).unwrap_err();
        assert_eq!(err, ExceptionKind::FunctionCallWithSideEffect);
    }

    fn int_from(args: &[Value]) -> Value {
        args[0].clone()
    }
}
