//! Page interpretation and the drawing back ends.
//!
//! [`interpret`] walks a page's markup and issues calls to a [`Painter`].
//! Two painters are provided: [`RasterPainter`] produces pixels and
//! [`TextCollector`] produces positioned characters.

pub mod config;
pub mod glyphs;
pub mod interpreter;
pub mod node;
pub mod painter;
pub mod raster;
pub mod text;

pub use config::RenderOptions;
pub use interpreter::{PageResources, interpret};
pub use painter::{DrawState, GlyphRun, Painter};
pub use raster::RasterPainter;
pub use text::{TextCollector, TextEntity, TextPage};
