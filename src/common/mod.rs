//! Common types and utilities shared across the package, markup and render layers.

// Submodule declarations
pub mod error;
pub mod geometry;
pub mod metadata;
pub mod unit;

// Re-exports for convenience
pub use error::{Error, Result};
pub use geometry::NormalizedRect;
pub use metadata::Metadata;
