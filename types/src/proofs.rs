//! Proof-carrying string types: values that enforce an invariant at construction.

use std::fmt;
use std::ops::Deref;

/// A `String` that is statically known to be non-empty.
///
/// Tool names and class names must be non-empty; rather than checking this
/// at every call site, the type itself is the proof.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyString(String);

/// The wrapped string was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("string must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.is_empty() {
            return Err(EmptyStringError);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyString {
    type Error = EmptyStringError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Deref for NonEmptyString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NonEmptyString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_string() {
        assert!(NonEmptyString::new("").is_err());
    }

    #[test]
    fn accepts_non_empty_string() {
        let s = NonEmptyString::new("len").unwrap();
        assert_eq!(s.as_str(), "len");
    }

    #[test]
    fn try_from_str_works() {
        let s: NonEmptyString = "upper".try_into().unwrap();
        assert_eq!(&*s, "upper");
    }
}
