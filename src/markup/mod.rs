//! Fixed-page markup vocabulary: attribute value parsers, brushes, the
//! abbreviated path language and the typed element model.

pub mod brush;
pub mod color;
pub mod element;
pub mod path_data;

pub use brush::{Brush, GradientStop, ImageBrush, LinearGradient, RadialGradient, SpreadMethod, TileMode};
pub use element::{Element, StrokeStyle, StyleSimulations};
pub use path_data::{FillRule, PathGeometry, Segment};
