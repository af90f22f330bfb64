//! The `utils` module provides the pieces shared by every other module:
//! the crate-wide error type and the tracing subscriber setup.

pub mod error;
pub mod logging;

pub use error::BridgeError;

#[cfg(test)]
mod tests;
