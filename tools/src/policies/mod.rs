//! Concrete demo [`crate::SecurityPolicyEngine`]s exercising the tool-call
//! gate end-to-end (§4.8).

pub mod banking;
pub mod document_sharing;
pub mod none;
