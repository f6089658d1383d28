//! Shared utilities for lite-core
//!
//! Currently only error handling; path helpers live next to the code that
//! uses them.

pub mod errors;

pub use errors::{CoreError, Result};
