//! The interpreter-level exception taxonomy (distinct from crate-boundary
//! `thiserror` errors like parse failures or config load errors).

use thiserror::Error;

/// The kind of an interpreter-level exception, carried by a `camel_core::Exception` value.
///
/// These are distinguishable error *kinds*, not the exception value itself —
/// the value also carries dependencies and an AST node span, which live in
/// `camel_core::exception::Exception`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExceptionKind {
    #[error("{0}")]
    ParseError(String),
    #[error("name '{0}' is not defined")]
    NameError(String),
    #[error("{0}")]
    TypeError(String),
    #[error("{0}")]
    ValueError(String),
    #[error("{0}")]
    KeyError(String),
    #[error("list index out of range")]
    IndexError,
    #[error("'{type_name}' object has no attribute '{attr}'")]
    AttributeError { type_name: String, attr: String },
    #[error("function call had a side effect on an aliased argument")]
    FunctionCallWithSideEffect,
    #[error("security policy denied: {0}")]
    SecurityPolicyDenied(String),
    #[error("not enough information: {0}")]
    NotEnoughInformation(String),
    #[error("no class named '{0}' in the namespace")]
    UndefinedClass(String),
    #[error("division by zero")]
    ZeroDivisionError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_error_formats_type_and_name() {
        let e = ExceptionKind::AttributeError {
            type_name: "int".to_string(),
            attr: "upper".to_string(),
        };
        assert_eq!(e.to_string(), "'int' object has no attribute 'upper'");
    }

    #[test]
    fn security_policy_denied_carries_reason() {
        let e = ExceptionKind::SecurityPolicyDenied("recipient not trusted".to_string());
        assert_eq!(
            e.to_string(),
            "security policy denied: recipient not trusted"
        );
    }
}
