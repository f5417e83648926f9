//! Provenance sources: who produced a value.

use std::collections::BTreeSet;

/// A principal or tool that produced a value.
///
/// `Tool` nests the sources that fed the tool itself, so trust can be
/// checked transitively without a separate graph traversal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    User,
    Assistant,
    CaMeL,
    TrustedToolSource,
    Tool {
        name: String,
        inner_sources: BTreeSet<Source>,
    },
}

impl Source {
    #[must_use]
    pub fn tool(name: impl Into<String>, inner_sources: BTreeSet<Source>) -> Self {
        Self::Tool {
            name: name.into(),
            inner_sources,
        }
    }

    /// A source is trusted if it's one of the enumerated trusted principals,
    /// or a `Tool` whose inner sources are non-empty and all trusted.
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        match self {
            Self::User | Self::Assistant | Self::CaMeL | Self::TrustedToolSource => true,
            Self::Tool { inner_sources, .. } => {
                !inner_sources.is_empty() && inner_sources.iter().all(Source::is_trusted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerated_principals_are_trusted() {
        assert!(Source::User.is_trusted());
        assert!(Source::Assistant.is_trusted());
        assert!(Source::CaMeL.is_trusted());
        assert!(Source::TrustedToolSource.is_trusted());
    }

    #[test]
    fn tool_with_no_inner_sources_is_untrusted() {
        let t = Source::tool("search_emails", BTreeSet::new());
        assert!(!t.is_trusted());
    }

    #[test]
    fn tool_with_all_trusted_inner_sources_is_trusted() {
        let t = Source::tool("len", BTreeSet::from([Source::CaMeL]));
        assert!(t.is_trusted());
    }

    #[test]
    fn tool_with_one_untrusted_inner_source_is_untrusted() {
        let inner = Source::tool("fetch_webpage", BTreeSet::new());
        let t = Source::tool("summarize", BTreeSet::from([Source::User, inner]));
        assert!(!t.is_trusted());
    }
}
