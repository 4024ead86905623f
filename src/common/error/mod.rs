//! Unified error types for xpsview.
//!
//! This module provides a unified error type that encompasses errors from the
//! package, font and markup layers, presenting a consistent API to users.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
