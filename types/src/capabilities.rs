//! The two-dimensional label (integrity, confidentiality) on every value.

use std::collections::BTreeSet;

use crate::readers::Readers;
use crate::sources::Source;

/// Bundles a value's own provenance (`sources`) and confidentiality (`readers`).
///
/// These are the value's *own* label; the effective label of a value also
/// folds in its dependencies (see `core::value::capabilities`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub sources: BTreeSet<Source>,
    pub readers: Readers,
}

impl Capabilities {
    #[must_use]
    pub fn new(sources: BTreeSet<Source>, readers: Readers) -> Self {
        Self { sources, readers }
    }

    /// The neutral label for interpreter-synthesized values: `sources = {CaMeL}`, `readers = Public`.
    #[must_use]
    pub fn camel() -> Self {
        Self {
            sources: BTreeSet::from([Source::CaMeL]),
            readers: Readers::Public,
        }
    }

    /// Used for literals pre-annotation: no sources, public readers.
    #[must_use]
    pub fn default() -> Self {
        Self {
            sources: BTreeSet::new(),
            readers: Readers::Public,
        }
    }

    #[must_use]
    pub fn with_readers(sources: BTreeSet<Source>, readers: Readers) -> Self {
        Self { sources, readers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_is_trusted_and_public() {
        let c = Capabilities::camel();
        assert!(c.sources.contains(&Source::CaMeL));
        assert!(c.readers.is_public());
    }

    #[test]
    fn default_has_no_sources() {
        let c = Capabilities::default();
        assert!(c.sources.is_empty());
        assert!(c.readers.is_public());
    }
}
