//! Positioned text extraction.

use crate::common::geometry::NormalizedRect;
use crate::markup::{Brush, PathGeometry, StrokeStyle};
use crate::render::painter::{DrawState, GlyphRun, Painter};
use serde::{Deserialize, Serialize};

/// One character and its box, in page fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEntity {
    pub text: String,
    pub area: NormalizedRect,
}

/// All text of one page in drawing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextPage {
    entities: Vec<TextEntity>,
}

impl TextPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, area: NormalizedRect) {
        self.entities.push(TextEntity {
            text: text.into(),
            area,
        });
    }

    pub fn entities(&self) -> &[TextEntity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Plain text of the page, with a line break wherever consecutive
    /// characters are vertically apart.
    ///
    /// Two characters share a line when their vertical centres differ by
    /// less than `tolerance` times the height of the earlier one.
    pub fn text_with_tolerance(&self, tolerance: f64) -> String {
        let mut out = String::new();
        let mut last: Option<&NormalizedRect> = None;
        for entity in &self.entities {
            if let Some(prev) = last {
                let limit = prev.height().abs() * tolerance;
                if (entity.area.center_y() - prev.center_y()).abs() > limit {
                    out.push('\n');
                }
            }
            out.push_str(&entity.text);
            last = Some(&entity.area);
        }
        out
    }

    /// [`TextPage::text_with_tolerance`] with half a line height.
    pub fn text(&self) -> String {
        self.text_with_tolerance(0.5)
    }
}

/// Painter that records glyph boxes instead of pixels.
#[derive(Debug)]
pub struct TextCollector {
    page: TextPage,
    width: f32,
    height: f32,
}

impl TextCollector {
    /// `width` and `height` are the page size used for normalization
    /// until the page element announces its own.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            page: TextPage::new(),
            width,
            height,
        }
    }

    pub fn finish(self) -> TextPage {
        self.page
    }
}

impl Painter for TextCollector {
    fn begin_page(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn fill_path(&mut self, _path: &PathGeometry, _brush: &Brush, _state: &DrawState) {}

    fn stroke_path(&mut self, _path: &PathGeometry, _brush: &Brush, _style: &StrokeStyle, _state: &DrawState) {}

    fn draw_glyphs(&mut self, run: &GlyphRun<'_>, state: &DrawState) {
        let line_height = run.font.line_height();
        for glyph in run.glyphs {
            let Some(ch) = glyph.ch else { continue };
            let area = NormalizedRect::from_page_box(
                glyph.x,
                glyph.y - line_height,
                glyph.x + glyph.advance,
                glyph.y,
                &state.transform,
                self.width,
                self.height,
            );
            self.page.push(ch.to_string(), area);
        }
    }
}
