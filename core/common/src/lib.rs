//! Common error types shared across ezseal crates.
//!
//! Every ezseal crate reports failures through the single [`Error`] enum
//! defined here, so callers can match on one taxonomy regardless of which
//! layer produced the failure.

pub mod error;

pub use error::{Error, Result};
