//! Variable bindings visible to a running program (§3.3).
//!
//! Grounded on the source interpreter's `Namespace`: a name-to-value map that
//! starts pre-populated with the built-in library, supports scoped
//! extension (`add_variables`, returning a new namespace rather than
//! mutating the parent's), and in-place rebinding (`set_variable`) for the
//! scope a statement is actually executing in.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Namespace {
    variables: Rc<RefCell<BTreeMap<String, Value>>>,
    /// Every value the run has produced so far, shared (not re-allocated)
    /// across child scopes so a policy check made from deep inside a call
    /// still sees the whole run's trace, not just the current scope's (§4.5).
    dependency_trace: Rc<RefCell<Vec<Value>>>,
}

impl Namespace {
    #[must_use]
    pub fn new() -> Self {
        Self {
            variables: Rc::new(RefCell::new(BTreeMap::new())),
            dependency_trace: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// A namespace pre-populated with every built-in function and class (§4.5).
    #[must_use]
    pub fn with_builtins() -> Self {
        let ns = Self::new();
        for (name, value) in crate::builtins::all() {
            ns.set_variable(&name, value);
        }
        ns
    }

    /// Returns a new namespace that is this one plus `variables`, without
    /// mutating `self` — used when entering a function/comprehension scope.
    #[must_use]
    pub fn add_variables(&self, variables: impl IntoIterator<Item = (String, Value)>) -> Self {
        let merged = self.variables.borrow().clone();
        let child = Self {
            variables: Rc::new(RefCell::new(merged)),
            dependency_trace: self.dependency_trace.clone(),
        };
        for (name, value) in variables {
            child.set_variable(&name, value);
        }
        child
    }

    pub fn set_variable(&self, name: &str, value: Value) {
        self.variables.borrow_mut().insert(name.to_string(), value);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.variables.borrow().get(name).cloned()
    }

    /// Record `v` as part of the run's aggregated dependency trace (§4.5,
    /// §4.4 step 3) — called by the interpreter as each top-level statement's
    /// value is produced, and read back by a policy-gated tool call to see
    /// every value the run depends on so far.
    pub fn record_dependency(&self, v: &Value) {
        self.dependency_trace.borrow_mut().push(v.clone());
    }

    /// The run's dependency trace as recorded so far.
    #[must_use]
    pub fn dependency_trace(&self) -> Vec<Value> {
        self.dependency_trace.borrow().clone()
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camel_types::Capabilities;

    #[test]
    fn set_then_get_round_trips() {
        let ns = Namespace::new();
        ns.set_variable("x", Value::int(1, Capabilities::camel(), vec![]));
        assert!(ns.get("x").is_some());
    }

    #[test]
    fn add_variables_does_not_mutate_parent() {
        let parent = Namespace::new();
        parent.set_variable("x", Value::int(1, Capabilities::camel(), vec![]));
        let child = parent.add_variables([(
            "y".to_string(),
            Value::int(2, Capabilities::camel(), vec![]),
        )]);
        assert!(parent.get("y").is_none());
        assert!(child.get("y").is_some());
        assert!(child.get("x").is_some());
    }

    #[test]
    fn with_builtins_exposes_len() {
        let ns = Namespace::with_builtins();
        assert!(ns.get("len").is_some());
    }

    #[test]
    fn dependency_trace_is_shared_with_child_scopes() {
        let parent = Namespace::new();
        let child = parent.add_variables([]);
        child.record_dependency(&Value::int(1, Capabilities::camel(), vec![]));
        assert_eq!(parent.dependency_trace().len(), 1);
    }
}
