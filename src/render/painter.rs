//! Drawing back-end abstraction.

use crate::fonts::FontHandle;
use crate::markup::{Brush, PathGeometry, StrokeStyle, StyleSimulations};
use crate::render::glyphs::PositionedGlyph;
use tiny_skia::{Point, Transform};

/// Inherited drawing state: the accumulated transform from element
/// space to page space and the accumulated opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub transform: Transform,
    pub opacity: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            opacity: 1.0,
        }
    }
}

impl DrawState {
    /// State for a child element with its own transform and opacity.
    pub fn child(&self, local: Option<Transform>, opacity: f32) -> Self {
        Self {
            transform: match local {
                Some(t) => self.transform.pre_concat(t),
                None => self.transform,
            },
            opacity: self.opacity * opacity.clamp(0.0, 1.0),
        }
    }
}

/// One laid-out `Glyphs` element.
#[derive(Debug)]
pub struct GlyphRun<'a> {
    pub glyphs: &'a [PositionedGlyph],
    pub font: &'a FontHandle,
    /// `None` when the run has no fill; such runs are invisible but still
    /// carry text.
    pub fill: Option<&'a Brush>,
    pub style: StyleSimulations,
}

/// Receiver of the drawing calls issued while interpreting a page.
///
/// Geometry is in page units; `state.transform` maps it to page space.
pub trait Painter {
    /// Called with the page size when the page element starts.
    fn begin_page(&mut self, _width: f32, _height: f32) {}

    fn fill_path(&mut self, path: &PathGeometry, brush: &Brush, state: &DrawState);

    fn stroke_path(&mut self, path: &PathGeometry, brush: &Brush, style: &StrokeStyle, state: &DrawState);

    fn draw_glyphs(&mut self, run: &GlyphRun<'_>, state: &DrawState);

    /// A `Glyphs` element carrying a `Name`, positioned at its origin.
    fn named_element(&mut self, _name: &str, _origin: Point, _state: &DrawState) {}
}
