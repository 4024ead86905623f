/// Physical packaging layer for XPS documents.
///
/// This module resolves named parts inside the ZIP container:
///
/// - Part names and relative location resolution ([`PackURI`])
/// - Interleaved (multi-piece) part reassembly
/// - Typed relationships read from `.rels` parts
///
/// Required parts (root relationships, fixed representation) surface as
/// errors from the document loader; everything else is optional.
pub mod constants;
pub mod error;
pub mod packuri;
pub mod phys_pkg;
pub mod rel;

// Re-export commonly used types
pub use error::PackageError;
pub use packuri::{PACKAGE_URI, PackURI, split_fragment};
pub use phys_pkg::PhysPkgReader;
pub use rel::{Relationship, Relationships};
