//! The capability-tracked runtime: values, namespaces, and the built-in
//! library that every program runs against.
//!
//! This crate has no parser and no policy logic — those live in
//! `camel-engine` and `camel-tools` respectively. It owns only the data that
//! both depend on: [`value::Value`] and [`namespace::Namespace`].

pub mod builtin_classes;
pub mod builtins;
pub mod exception;
pub mod namespace;
pub mod value;

pub use exception::ExceptionData;
pub use namespace::Namespace;
pub use value::{Callable, ClassDef, ClassInstance, Plain, Raw, Value};
