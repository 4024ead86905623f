//! xpsview - rendering and text extraction for XPS and OpenXPS documents
//!
//! XPS is a fixed-layout page description format: a ZIP package holding a
//! sequence of documents, each a list of pages written in an XML drawing
//! vocabulary (paths, glyph runs, brushes and transforms). This library
//! opens such a package, walks its manifests and renders pages to pixels
//! or extracts their text with positions.
//!
//! # Features
//!
//! - **Package access**: ZIP parts, interleaved (multi-piece) parts, relationships
//! - **Path geometry**: the abbreviated path mini-language (`M`, `L`, `C`, `Q`, `H`, `V`, `A`, ...)
//! - **Brushes**: solid colours, linear and radial gradients, tiled image brushes
//! - **Fonts**: embedded TrueType/OpenType fonts, including obfuscated ones
//! - **Text extraction**: characters with normalized page boxes
//! - **Outline**: the document structure bookmarks and named link targets
//! - **Metadata**: core properties and the package thumbnail
//!
//! # Example - Rendering a page
//!
//! ```no_run
//! use xpsview::XpsFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = XpsFile::open("document.xps")?;
//!
//! let (width, height) = doc.page_size(0)?;
//! println!("First page is {}x{} units", width, height);
//!
//! let pixmap = doc.render_page(0, 816, 1056)?;
//! pixmap.save_png("page1.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Extracting text
//!
//! ```no_run
//! use xpsview::XpsFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = XpsFile::open("document.oxps")?;
//!
//! for entity in doc.text_page(0)?.entities() {
//!     println!("{} at {:?}", entity.text, entity.area);
//! }
//!
//! println!("{}", doc.export_text()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Custom options
//!
//! ```no_run
//! use xpsview::{RenderOptions, XpsFile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = RenderOptions::new()
//!     .with_anti_alias(false)
//!     .with_default_font_family("Liberation Sans");
//! let doc = XpsFile::open_with_options("document.xps", options)?;
//!
//! for entry in doc.outline() {
//!     println!("{} -> page {:?}", entry.title, entry.page);
//! }
//! # Ok(())
//! # }
//! ```

/// Shared error types, geometry helpers, units and metadata
pub mod common;

/// ZIP package access: part names, relationships and interleaved parts
pub mod package;

/// Page markup vocabulary: elements, colours, brushes and path geometry
pub mod markup;

/// Embedded font loading, deobfuscation and caching
pub mod fonts;

/// Page interpretation and the raster and text back ends
pub mod render;

/// Document sequence, pages, outline and core properties
pub mod document;

// Re-export commonly used types for convenience
pub use common::{Error, Metadata, NormalizedRect, Result};
pub use document::{LinkTarget, OutlineEntry, XpsFile, XpsPage};
pub use render::{RenderOptions, TextEntity, TextPage};
