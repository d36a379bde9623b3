//! Configuration validation
//!
//! Runs the per-field layer (required values, types, choices, bounds) and
//! the cross-field rules over a merged configuration, collecting every
//! violation.

mod error;
mod validator;

#[cfg(test)]
mod proptests;

pub use error::ValidationError;
pub use validator::{parse_split, validate};
