//! Font data loading.
//!
//! A [`LoadedFont`] owns the raw font file and parses a `ttf_parser::Face`
//! view on demand, so it can be shared between threads without borrowing
//! issues. With the `system-fonts` feature, [`FontLoader`] looks up an
//! installed font to stand in for fonts that cannot be resolved.

use crate::fonts::FontError;
use std::sync::Arc;
use tiny_skia::{Path, PathBuilder};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

#[cfg(feature = "system-fonts")]
use font_kit::{family_name::FamilyName, handle::Handle, properties::Properties, source::SystemSource};

/// A parsed font file.
#[derive(Clone)]
pub struct LoadedFont {
    data: Arc<Vec<u8>>,
    index: u32,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
    line_gap: f32,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("data_len", &self.data.len())
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl LoadedFont {
    /// Parse font data, keeping face `index` of a collection.
    pub fn from_bytes(data: Vec<u8>, index: u32) -> Result<Self, FontError> {
        let (units_per_em, ascender, descender, line_gap) = {
            let face = Face::parse(&data, index).map_err(|_| FontError::InvalidData)?;
            (
                face.units_per_em().max(1) as f32,
                face.ascender() as f32,
                face.descender() as f32,
                face.line_gap() as f32,
            )
        };
        Ok(Self {
            data: Arc::new(data),
            index,
            units_per_em,
            ascender,
            descender,
            line_gap,
        })
    }

    /// Cheap view over the font data.
    #[inline]
    pub fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.index).ok()
    }

    #[inline]
    pub fn units_per_em(&self) -> f32 {
        self.units_per_em
    }

    /// Ascender in em units.
    #[inline]
    pub fn ascent(&self) -> f32 {
        self.ascender / self.units_per_em
    }

    /// Ascender to descender plus line gap, in em units.
    #[inline]
    pub fn line_height(&self) -> f32 {
        (self.ascender - self.descender + self.line_gap) / self.units_per_em
    }

    pub fn glyph_index(&self, c: char) -> Option<u16> {
        self.face()?.glyph_index(c).map(|g| g.0)
    }

    /// Horizontal advance of a glyph, in em units.
    pub fn glyph_advance(&self, glyph: u16) -> Option<f32> {
        let advance = self.face()?.glyph_hor_advance(GlyphId(glyph))?;
        Some(advance as f32 / self.units_per_em)
    }

    /// Outline of `glyph` with its origin at `(x, baseline_y)`, scaled by
    /// `em_size` and sheared by `skew` (for simulated italics).
    pub fn glyph_path(&self, glyph: u16, x: f32, baseline_y: f32, em_size: f32, skew: f32) -> Option<Path> {
        let face = self.face()?;
        let mut converter = PathConverter {
            builder: PathBuilder::new(),
            scale: em_size / self.units_per_em,
            x,
            y: baseline_y,
            skew,
        };
        face.outline_glyph(GlyphId(glyph), &mut converter)?;
        converter.builder.finish()
    }
}

/// Font outline sink producing page-space paths. Font units grow upward,
/// page units grow downward.
struct PathConverter {
    builder: PathBuilder,
    scale: f32,
    x: f32,
    y: f32,
    skew: f32,
}

impl PathConverter {
    #[inline]
    fn map(&self, px: f32, py: f32) -> (f32, f32) {
        (self.x + (px + self.skew * py) * self.scale, self.y - py * self.scale)
    }
}

impl OutlineBuilder for PathConverter {
    fn move_to(&mut self, px: f32, py: f32) {
        let (x, y) = self.map(px, py);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, px: f32, py: f32) {
        let (x, y) = self.map(px, py);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, px: f32, py: f32) {
        let (cx, cy) = self.map(x1, y1);
        let (x, y) = self.map(px, py);
        self.builder.quad_to(cx, cy, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, px: f32, py: f32) {
        let (c1x, c1y) = self.map(x1, y1);
        let (c2x, c2y) = self.map(x2, y2);
        let (x, y) = self.map(px, py);
        self.builder.cubic_to(c1x, c1y, c2x, c2y, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Installed-font lookup.
#[cfg(feature = "system-fonts")]
pub struct FontLoader {
    source: SystemSource,
}

#[cfg(feature = "system-fonts")]
impl FontLoader {
    pub fn new() -> Self {
        Self {
            source: SystemSource::new(),
        }
    }

    /// Load the best installed match for `family_name`, falling back to
    /// the generic sans-serif family.
    pub fn load_system_font(&self, family_name: &str) -> Result<LoadedFont, FontError> {
        let families = [FamilyName::Title(family_name.to_string()), FamilyName::SansSerif];
        let handle = self
            .source
            .select_best_match(&families, &Properties::new())
            .map_err(|_| FontError::NotFound(family_name.to_string()))?;

        match handle {
            Handle::Path { path, font_index } => {
                let data = std::fs::read(&path)?;
                LoadedFont::from_bytes(data, font_index)
            },
            Handle::Memory { bytes, font_index } => LoadedFont::from_bytes(bytes.to_vec(), font_index),
        }
    }
}

#[cfg(feature = "system-fonts")]
impl Default for FontLoader {
    fn default() -> Self {
        Self::new()
    }
}
