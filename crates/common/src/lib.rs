//! Shared types for the anisette workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
