//! Validated identifiers and redacted secret material.

pub mod id;
pub mod secret;

pub use id::*;
pub use secret::*;
