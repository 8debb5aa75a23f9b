//! Error handling utilities
//!
//! Error taxonomy, recovery primitives and helpers for opaque upstream errors.

pub mod error;
pub mod recovery;
pub mod utils;

pub use error::*;
pub use recovery::*;
pub use utils::ErrorUtils;
