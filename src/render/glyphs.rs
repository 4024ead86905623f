//! Glyph run layout.
//!
//! A `Glyphs` element carries the text (`UnicodeString`), optional
//! per-glyph overrides (`Indices`) and an origin. Layout turns these into
//! one positioned unit per character, advancing right, or left for odd
//! bidi levels.

use crate::fonts::FontHandle;
use crate::markup::element::GlyphsAttrs;

/// Override entry of the `Indices` attribute. Advances and offsets are in
/// hundredths of an em.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphIndex {
    pub glyph: Option<u16>,
    pub advance: Option<f32>,
    pub u_offset: f32,
    pub v_offset: f32,
}

/// Parse the `Indices` attribute.
///
/// Entries are `;` separated; each is `[(c:g)]glyph,advance,uOffset,vOffset`
/// with every field optional. Unparseable fields are left unset.
pub fn parse_indices(value: &str) -> Vec<GlyphIndex> {
    value
        .split(';')
        .map(|entry| {
            let entry = entry.trim();
            // Cluster mappings are not used for positioning.
            let entry = match entry.strip_prefix('(') {
                Some(rest) => rest.find(')').map_or("", |end| &rest[end + 1..]),
                None => entry,
            };
            let mut fields = entry.split(',').map(str::trim);
            let glyph = fields.next().and_then(|f| f.parse().ok());
            let advance = fields.next().and_then(|f| fast_float2::parse(f).ok());
            let u_offset = fields.next().and_then(|f| fast_float2::parse(f).ok()).unwrap_or(0.0);
            let v_offset = fields.next().and_then(|f| fast_float2::parse(f).ok()).unwrap_or(0.0);
            GlyphIndex {
                glyph,
                advance,
                u_offset,
                v_offset,
            }
        })
        .collect()
}

/// Text of a glyph run, without the `{}` escape prefix.
pub fn unicode_text(value: &str) -> &str {
    value.strip_prefix("{}").unwrap_or(value)
}

/// A glyph placed on the page, in element coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedGlyph {
    /// Character this unit represents, if any.
    pub ch: Option<char>,
    pub glyph: Option<u16>,
    /// Left edge of the glyph's advance box.
    pub x: f32,
    /// Baseline.
    pub y: f32,
    pub advance: f32,
}

/// Lay out a glyph run with `font`.
pub fn layout(attrs: &GlyphsAttrs, font: &FontHandle) -> Vec<PositionedGlyph> {
    let chars: Vec<char> = attrs
        .unicode_string
        .as_deref()
        .map(unicode_text)
        .unwrap_or_default()
        .chars()
        .collect();
    let indices = attrs.indices.as_deref().map(parse_indices).unwrap_or_default();
    let units = chars.len().max(indices.len());
    let em = font.em_size();
    let rtl = attrs.bidi_level % 2 == 1;

    let mut glyphs = Vec::with_capacity(units);
    let mut pen = attrs.origin.x;
    for i in 0..units {
        let ch = chars.get(i).copied();
        let index = indices.get(i).copied().unwrap_or_default();
        let glyph = index.glyph.or_else(|| ch.and_then(|c| font.glyph_index(c)));
        let advance = match (index.advance, glyph, ch) {
            (Some(a), _, _) => a * em / 100.0,
            (None, Some(g), c) => font
                .glyph_advance(g)
                .unwrap_or_else(|| c.map_or(0.0, |c| font.char_advance(c))),
            (None, None, Some(c)) => font.char_advance(c),
            (None, None, None) => 0.0,
        };
        let u = index.u_offset * em / 100.0;
        let v = index.v_offset * em / 100.0;

        let x = if rtl { pen - advance - u } else { pen + u };
        glyphs.push(PositionedGlyph {
            ch,
            glyph,
            x,
            y: attrs.origin.y - v,
            advance,
        });

        if rtl {
            pen -= advance;
        } else {
            pen += advance;
        }
    }
    glyphs
}
