//! Credential models: the two persisted bearer tokens and their storage keys.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
