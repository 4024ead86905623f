//! Font resolution for glyph runs.
//!
//! Fonts embedded in a package are addressed by part name. Restricted
//! fonts are stored obfuscated: the first 32 bytes are XORed with a key
//! taken from the GUID that forms the part's file name. [`FontCache`]
//! loads each font part at most once per package and hands out
//! [`FontHandle`]s that provide metrics and outlines.

pub mod cache;
pub mod loader;
pub mod obfuscation;

pub use cache::{FontCache, FontHandle};
pub use loader::LoadedFont;
pub use obfuscation::{Guid, deobfuscate};

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("Font not found: {0}")]
    NotFound(String),
    #[error("Invalid font data")]
    InvalidData,
    #[error("Font name is not a GUID: {0}")]
    InvalidGuid(String),
    #[error("Obfuscated font too small: {0} bytes")]
    TooSmall(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
