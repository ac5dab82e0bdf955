//! Outgoing mail: decide on signing and encryption, then apply it.

pub mod confirm;
pub mod policy;
pub mod wrap;

pub use confirm::{FixedAnswer, LinePrompter, Prompter};
pub use policy::{derive_flags, DerivedFlags, Resolution, SendOutcome, SendPolicyResolver};
pub use wrap::simple_wrap;
