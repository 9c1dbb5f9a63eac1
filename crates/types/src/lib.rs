//! Shared types for the controller configuration crates
//!
//! This crate holds the error taxonomy and small helpers used by the
//! configuration resolver.

pub mod error;
pub mod utils;

// Re-export commonly used types
pub use error::{ConfigError, Result};
