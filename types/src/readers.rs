//! Readers: who is permitted to observe a value.

use std::collections::BTreeSet;

/// The set of principals permitted to read a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readers {
    /// Everyone may read.
    Public,
    /// Only these identifiers (typically email addresses or user handles).
    Identified(BTreeSet<String>),
}

impl Readers {
    #[must_use]
    pub fn identified<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Identified(ids.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Public)
    }

    /// `Public ∧ X = X`; `S1 ∧ S2 = S1 ∩ S2`.
    #[must_use]
    pub fn meet(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Public, x) | (x, Self::Public) => x.clone(),
            (Self::Identified(a), Self::Identified(b)) => {
                Self::Identified(a.intersection(b).cloned().collect())
            }
        }
    }

    /// `R_candidates ⊆ all_readers(v)` or `all_readers(v) == Public`.
    #[must_use]
    pub fn can_be_read_by(&self, candidates: &BTreeSet<String>) -> bool {
        match self {
            Self::Public => true,
            Self::Identified(allowed) => candidates.is_subset(allowed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_meet_identity() {
        let a = Readers::identified(["alice@example.com"]);
        assert_eq!(Readers::Public.meet(&a), a);
        assert_eq!(a.meet(&Readers::Public), a);
    }

    #[test]
    fn identified_meet_intersects() {
        let a = Readers::identified(["alice@example.com", "bob@example.com"]);
        let b = Readers::identified(["bob@example.com", "carol@example.com"]);
        assert_eq!(a.meet(&b), Readers::identified(["bob@example.com"]));
    }

    #[test]
    fn public_can_be_read_by_anyone() {
        let candidates = BTreeSet::from(["anyone@example.com".to_string()]);
        assert!(Readers::Public.can_be_read_by(&candidates));
    }

    #[test]
    fn identified_requires_subset() {
        let readers = Readers::identified(["alice@example.com", "bob@example.com"]);
        let ok = BTreeSet::from(["alice@example.com".to_string()]);
        let not_ok = BTreeSet::from(["mallory@example.com".to_string()]);
        assert!(readers.can_be_read_by(&ok));
        assert!(!readers.can_be_read_by(&not_ok));
    }
}
