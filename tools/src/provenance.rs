//! Tool-output capability classification by shape (§4.6).
//!
//! The interpreter itself is agnostic to what a tool returns; this module is
//! the "per-tool mapping" the component design calls for, supplying
//! [`camel_core::Callable::Tool`]'s `classify` hook with shape-specific
//! rules instead of the generic `Tool(name)`/`Public` default.

use std::collections::BTreeSet;

use camel_types::{Capabilities, Readers, Source};

/// A scalar confirmation (an id, the current date, a public fact): trusted
/// and public.
#[must_use]
pub fn scalar_confirmation(tool_name: &str) -> Capabilities {
    Capabilities::with_readers(
        BTreeSet::from([Source::TrustedToolSource, Source::tool(tool_name.to_string(), BTreeSet::new())]),
        Readers::Public,
    )
}

/// An identity/user-profile lookup: trusted source `User`, restricted to the
/// identified principals who may read it.
#[must_use]
pub fn identity_lookup(readers: impl IntoIterator<Item = impl Into<String>>) -> Capabilities {
    Capabilities::with_readers(
        BTreeSet::from([Source::User]),
        Readers::identified(readers.into_iter().map(Into::into)),
    )
}

/// A catalog entry (hotels, flights, restaurants): trusted, public.
#[must_use]
pub fn catalog(tool_name: &str) -> Capabilities {
    scalar_confirmation(tool_name)
}

/// Untrusted free text (reviews, webpages, email bodies, file contents):
/// sourced from its producer, *not* marked trusted-tool, readable only by
/// `participants`.
#[must_use]
pub fn free_text(
    producer: impl Into<String>,
    participants: impl IntoIterator<Item = impl Into<String>>,
) -> Capabilities {
    Capabilities::with_readers(
        BTreeSet::from([Source::tool(producer.into(), BTreeSet::new())]),
        Readers::identified(participants.into_iter().map(Into::into)),
    )
}

/// A structured record (email, calendar event, file, transaction, message):
/// readers drawn from its own participant set, source from its producer,
/// substituting `User` when the producer is the authenticated user.
#[must_use]
pub fn structured_record(
    producer: impl Into<String>,
    is_authenticated_user: bool,
    readers: impl IntoIterator<Item = impl Into<String>>,
) -> Capabilities {
    let source = if is_authenticated_user {
        Source::User
    } else {
        Source::tool(producer.into(), BTreeSet::new())
    };
    Capabilities::with_readers(
        BTreeSet::from([source]),
        Readers::identified(readers.into_iter().map(Into::into)),
    )
}

/// A list of classified records: the outer container is public with no
/// trusted source (its length leaks nothing the elements don't already);
/// elements are assumed to already carry their own classification.
#[must_use]
pub fn list_wrapper() -> Capabilities {
    Capabilities::with_readers(BTreeSet::new(), Readers::Public)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_confirmation_is_trusted_and_public() {
        let c = scalar_confirmation("get_iban");
        assert!(c.sources.contains(&Source::TrustedToolSource));
        assert!(c.readers.is_public());
    }

    #[test]
    fn free_text_excludes_trusted_source() {
        let c = free_text("alice@example.com", ["alice@example.com", "bob@example.com"]);
        assert!(!c.sources.contains(&Source::TrustedToolSource));
        assert!(!c.readers.is_public());
    }

    #[test]
    fn structured_record_substitutes_user_for_authenticated_owner() {
        let c = structured_record("me@example.com", true, ["me@example.com"]);
        assert!(c.sources.contains(&Source::User));
    }
}
