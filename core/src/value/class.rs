//! User-defined classes and their instances (§3.4, §4.4).
//!
//! `ClassDef` is the runtime shape of a `class` statement: a name, its
//! declared field names (used for pydantic-like construction validation),
//! and the methods it carries. `ClassInstance` is a heap-allocated bag of
//! fields that can be frozen to reject further mutation, mirroring the
//! source language's `freeze()` contract for values assigned into shared
//! state.

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use camel_types::ExceptionKind;

use super::callable::{Callable, NativeFn};
use super::Value;

/// A field's declared type name (`"int"`, `"str"`, ...), checked against
/// [`Value::type_name`] at instantiation when the class derives from the
/// built-in pydantic-like `BaseModel` wrapper. `"Any"` (the default for a
/// field with no simple-name annotation) skips the check.
pub const ANY_FIELD_TYPE: &str = "Any";

#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub fields: Vec<String>,
    /// Parallel to `fields`: each field's declared type name, or
    /// [`ANY_FIELD_TYPE`] when the annotation wasn't a simple name.
    pub field_types: Vec<(String, String)>,
    pub methods: Vec<(String, Callable)>,
    /// Callables reachable on the class itself rather than an instance,
    /// e.g. `datetime.fromisoformat`.
    pub class_methods: Vec<(String, Callable)>,
    /// Values reachable on the class itself, e.g. an `Enum` subclass's
    /// members (`Color.RED`). A cell so the members (each a `ClassInstance`
    /// pointing back at this class) can be attached after construction.
    pub class_attrs: RefCell<Vec<(String, Value)>>,
    pub base_classes: Vec<Rc<ClassDef>>,
    /// Overrides the generic field-zip constructor in `Call` evaluation
    /// when a built-in class needs validation, defaults, or a shape other
    /// than "one positional/keyword argument per declared field" (the
    /// datetime family, `Enum` members, pydantic-style validation).
    pub constructor: Option<NativeFn>,
    pub is_builtin: bool,
}

impl ClassDef {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        let field_types = fields.iter().map(|f| (f.clone(), ANY_FIELD_TYPE.to_string())).collect();
        Self {
            name: name.into(),
            fields,
            field_types,
            methods: Vec::new(),
            class_methods: Vec::new(),
            class_attrs: RefCell::new(Vec::new()),
            base_classes: Vec::new(),
            constructor: None,
            is_builtin: false,
        }
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Callable> {
        self.methods
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .or_else(|| self.base_classes.iter().find_map(|b| b.method(name)))
    }

    #[must_use]
    pub fn class_method(&self, name: &str) -> Option<&Callable> {
        self.class_methods
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .or_else(|| self.base_classes.iter().find_map(|b| b.class_method(name)))
    }

    #[must_use]
    pub fn class_attr(&self, name: &str) -> Option<Value> {
        if let Some((_, v)) = self.class_attrs.borrow().iter().find(|(n, _)| n == name) {
            return Some(v.clone());
        }
        self.base_classes.iter().find_map(|b| b.class_attr(name))
    }

    /// A field's declared type name, or [`ANY_FIELD_TYPE`] if the field
    /// isn't declared on this class or any base.
    #[must_use]
    pub fn field_type(&self, field: &str) -> &str {
        self.field_types
            .iter()
            .find(|(n, _)| n == field)
            .map_or(ANY_FIELD_TYPE, |(_, t)| t.as_str())
    }

    /// Whether this class (or a base) is, or derives from, the built-in
    /// pydantic-like `BaseModel` wrapper, meaning generic construction must
    /// validate each field's value against `field_types` (§4.3).
    #[must_use]
    pub fn derives_from_model(&self) -> bool {
        (self.is_builtin && self.name == "BaseModel")
            || self.base_classes.iter().any(|b| b.derives_from_model())
    }

    /// Whether this class (or a base) is the built-in `Enum` wrapper,
    /// meaning its body assigns members rather than declaring fields.
    #[must_use]
    pub fn derives_from_enum(&self) -> bool {
        (self.is_builtin && self.name == "Enum") || self.base_classes.iter().any(|b| b.derives_from_enum())
    }

    /// All attribute/method names this class's instances expose, including
    /// inherited ones.
    #[must_use]
    pub fn attr_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.clone();
        names.extend(self.methods.iter().map(|(n, _)| n.clone()));
        for base in &self.base_classes {
            for name in base.attr_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

#[derive(Debug, Clone)]
pub struct ClassInstance {
    pub class: Rc<ClassDef>,
    pub fields: Rc<RefCell<Vec<(String, Value)>>>,
    pub frozen: Rc<Cell<bool>>,
}

impl ClassInstance {
    #[must_use]
    pub fn new(class: Rc<ClassDef>, fields: Vec<(String, Value)>) -> Self {
        Self {
            class,
            fields: Rc::new(RefCell::new(fields)),
            frozen: Rc::new(Cell::new(false)),
        }
    }

    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields
            .borrow()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    pub fn set_field(&self, name: &str, value: Value) -> Result<(), ExceptionKind> {
        if self.frozen.get() {
            return Err(ExceptionKind::ValueError("instance is frozen".to_string()));
        }
        let mut fields = self.fields.borrow_mut();
        if let Some(slot) = fields.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            fields.push((name.to_string(), value));
        }
        Ok(())
    }

    pub fn freeze(&self) {
        self.frozen.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camel_types::Capabilities;

    fn int(i: i64) -> Value {
        Value::int(i, Capabilities::camel(), vec![])
    }

    #[test]
    fn set_field_then_get() {
        let class = Rc::new(ClassDef::new("Point", vec!["x".to_string(), "y".to_string()]));
        let inst = ClassInstance::new(class, vec![("x".to_string(), int(1))]);
        inst.set_field("y", int(2)).unwrap();
        assert!(inst.get_field("y").is_some());
    }

    #[test]
    fn frozen_instance_rejects_mutation() {
        let class = Rc::new(ClassDef::new("Point", vec!["x".to_string()]));
        let inst = ClassInstance::new(class, vec![("x".to_string(), int(1))]);
        inst.freeze();
        assert!(inst.set_field("x", int(2)).is_err());
    }

    #[test]
    fn attr_names_include_inherited() {
        let base = Rc::new(ClassDef::new("Base", vec!["a".to_string()]));
        let mut derived = ClassDef::new("Derived", vec!["b".to_string()]);
        derived.base_classes.push(base);
        assert!(derived.attr_names().contains(&"a".to_string()));
        assert!(derived.attr_names().contains(&"b".to_string()));
    }
}
