//! Capability algebra and exception-kind taxonomy for the camel interpreter.
//!
//! This crate has no IO and no async: it is the shared vocabulary that
//! `camel-core`, `camel-tools`, and `camel-engine` all build on.

pub mod capabilities;
pub mod errors;
pub mod proofs;
pub mod readers;
pub mod sources;

pub use capabilities::Capabilities;
pub use errors::ExceptionKind;
pub use proofs::{EmptyStringError, NonEmptyString};
pub use readers::Readers;
pub use sources::Source;
