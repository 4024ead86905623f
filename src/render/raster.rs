//! Raster back end on top of tiny-skia.

use crate::markup::brush::{Brush, GradientStop, ImageBrush, LinearGradient, RadialGradient, SpreadMethod, TileMode};
use crate::markup::color::with_opacity;
use crate::markup::element::{LineCap, LineJoin, StrokeStyle};
use crate::markup::PathGeometry;
use crate::render::config::RenderOptions;
use crate::render::painter::{DrawState, GlyphRun, Painter};
use tiny_skia::{
    Color, ColorU8, FillRule, FilterQuality, Mask, Paint, PathBuilder, Pattern, Pixmap, Point, Shader,
    SpreadMode, Stroke, StrokeDash, Transform,
};

/// Slant of simulated italics, tan(20°).
const ITALIC_SHEAR: f32 = 0.364;

/// Outline thickening of simulated bold, as a fraction of the em size.
const BOLD_STROKE: f32 = 0.02;

/// Painter that draws into a pixmap.
pub struct RasterPainter {
    pixmap: Pixmap,
    /// Page units to pixels.
    device: Transform,
    anti_alias: bool,
}

impl std::fmt::Debug for RasterPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterPainter")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("device", &self.device)
            .finish()
    }
}

impl RasterPainter {
    /// Painter for a `width` x `height` pixel raster showing a page of
    /// `page_width` x `page_height` units. Returns `None` for an empty
    /// raster.
    pub fn new(width: u32, height: u32, page_width: f32, page_height: f32, options: &RenderOptions) -> Option<Self> {
        let mut pixmap = Pixmap::new(width, height)?;
        pixmap.fill(options.background);
        let mut painter = Self {
            pixmap,
            device: Transform::identity(),
            anti_alias: options.anti_alias,
        };
        painter.begin_page(page_width, page_height);
        Some(painter)
    }

    pub fn finish(self) -> Pixmap {
        self.pixmap
    }

    fn paint<'b>(&self, brush: &'b Brush, opacity: f32) -> Option<Paint<'b>> {
        let shader = match brush {
            Brush::Solid(c) => Shader::SolidColor(to_color(with_opacity(*c, opacity))),
            Brush::Linear(g) => linear_shader(g, opacity)?,
            Brush::Radial(g) => radial_shader(g, opacity)?,
            Brush::Image(img) => image_shader(img, opacity)?,
        };
        let mut paint = Paint::default();
        paint.shader = shader;
        paint.anti_alias = self.anti_alias;
        Some(paint)
    }

    /// Untiled image brushes paint only inside their viewport.
    fn mask_for(&self, brush: &Brush, transform: Transform) -> Option<Mask> {
        let Brush::Image(img) = brush else { return None };
        if img.tile_mode != TileMode::None {
            return None;
        }
        let viewport = PathBuilder::from_rect(img.viewport);
        let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())?;
        mask.fill_path(
            &viewport,
            FillRule::Winding,
            self.anti_alias,
            transform.pre_concat(img.transform),
        );
        Some(mask)
    }
}

impl Painter for RasterPainter {
    fn begin_page(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.device = Transform::from_scale(
                self.pixmap.width() as f32 / width,
                self.pixmap.height() as f32 / height,
            );
        }
    }

    fn fill_path(&mut self, geometry: &PathGeometry, brush: &Brush, state: &DrawState) {
        let Some(path) = geometry.to_path() else { return };
        let Some(paint) = self.paint(brush, state.opacity) else { return };
        let transform = self.device.pre_concat(state.transform);
        let mask = self.mask_for(brush, transform);
        self.pixmap
            .fill_path(&path, &paint, geometry.fill_rule.into(), transform, mask.as_ref());
    }

    fn stroke_path(&mut self, geometry: &PathGeometry, brush: &Brush, style: &StrokeStyle, state: &DrawState) {
        let Some(path) = geometry.to_path() else { return };
        let Some(paint) = self.paint(brush, state.opacity) else { return };
        let transform = self.device.pre_concat(state.transform);
        let mask = self.mask_for(brush, transform);
        self.pixmap
            .stroke_path(&path, &paint, &to_stroke(style), transform, mask.as_ref());
    }

    fn draw_glyphs(&mut self, run: &GlyphRun<'_>, state: &DrawState) {
        let Some(brush) = run.fill else { return };
        if brush.is_invisible() {
            return;
        }
        if !run.font.is_resolved() {
            log::debug!("no outlines for glyph run, {} glyphs not drawn", run.glyphs.len());
            return;
        }
        let Some(paint) = self.paint(brush, state.opacity) else { return };
        let transform = self.device.pre_concat(state.transform);
        let mask = self.mask_for(brush, transform);
        let skew = if run.style.is_italic() { ITALIC_SHEAR } else { 0.0 };
        let bold = run.style.is_bold().then(|| Stroke {
            width: run.font.em_size() * BOLD_STROKE,
            ..Stroke::default()
        });

        for glyph in run.glyphs {
            let Some(id) = glyph.glyph else { continue };
            // Whitespace glyphs have no outline.
            let Some(path) = run.font.glyph_path(id, glyph.x, glyph.y, skew) else { continue };
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, transform, mask.as_ref());
            if let Some(stroke) = &bold {
                self.pixmap
                    .stroke_path(&path, &paint, stroke, transform, mask.as_ref());
            }
        }
    }
}

#[inline]
fn to_color(c: ColorU8) -> Color {
    Color::from_rgba8(c.red(), c.green(), c.blue(), c.alpha())
}

fn spread_mode(spread: SpreadMethod) -> SpreadMode {
    match spread {
        SpreadMethod::Pad => SpreadMode::Pad,
        SpreadMethod::Reflect => SpreadMode::Reflect,
        SpreadMethod::Repeat => SpreadMode::Repeat,
    }
}

/// Convert stops, returning the last colour as well for degenerate
/// gradients that collapse to a solid fill.
fn convert_stops(stops: &[GradientStop], opacity: f32) -> Option<(Vec<tiny_skia::GradientStop>, Color)> {
    let last = to_color(with_opacity(stops.last()?.color, opacity));
    let converted = stops
        .iter()
        .map(|s| tiny_skia::GradientStop::new(s.offset, to_color(with_opacity(s.color, opacity))))
        .collect();
    Some((converted, last))
}

fn linear_shader(g: &LinearGradient, opacity: f32) -> Option<Shader<'static>> {
    let (stops, last) = convert_stops(&g.stops, opacity)?;
    Some(
        tiny_skia::LinearGradient::new(g.start, g.end, stops, spread_mode(g.spread), g.transform)
            .unwrap_or(Shader::SolidColor(last)),
    )
}

fn radial_shader(g: &RadialGradient, opacity: f32) -> Option<Shader<'static>> {
    if g.radius_x <= 0.0 || g.radius_y <= 0.0 {
        return None;
    }
    let (stops, last) = convert_stops(&g.stops, opacity)?;

    // Draw a circle of radius `radius_x` and squash it vertically about
    // the centre to get the ellipse.
    let k = g.radius_y / g.radius_x;
    let (cx, cy) = (g.center.x, g.center.y);
    let ellipse = Transform::from_translate(cx, cy)
        .pre_scale(1.0, k)
        .pre_translate(-cx, -cy);
    let origin = Point::from_xy(g.origin.x, cy + (g.origin.y - cy) / k);

    Some(
        tiny_skia::RadialGradient::new(
            origin,
            g.center,
            g.radius_x,
            stops,
            spread_mode(g.spread),
            g.transform.pre_concat(ellipse),
        )
        .unwrap_or(Shader::SolidColor(last)),
    )
}

fn image_shader(img: &ImageBrush, opacity: f32) -> Option<Shader<'_>> {
    let pixmap: &Pixmap = img.image.as_deref()?;
    let transform = img.pattern_transform()?;
    // Mirrored tiling is approximated by reflecting along both axes.
    let spread = match img.tile_mode {
        TileMode::None => SpreadMode::Pad,
        TileMode::Tile => SpreadMode::Repeat,
        TileMode::FlipX | TileMode::FlipY | TileMode::FlipXY => SpreadMode::Reflect,
    };
    Some(Pattern::new(
        pixmap.as_ref(),
        spread,
        FilterQuality::Bicubic,
        (img.opacity * opacity).clamp(0.0, 1.0),
        transform,
    ))
}

fn line_cap(cap: LineCap) -> tiny_skia::LineCap {
    match cap {
        LineCap::Flat => tiny_skia::LineCap::Butt,
        LineCap::Round | LineCap::Triangle => tiny_skia::LineCap::Round,
        LineCap::Square => tiny_skia::LineCap::Square,
    }
}

fn to_stroke(style: &StrokeStyle) -> Stroke {
    let dash = if style.dash_array.is_empty() {
        None
    } else {
        let mut intervals: Vec<f32> = style.dash_array.iter().map(|d| d * style.thickness).collect();
        if intervals.len() % 2 == 1 {
            intervals.extend_from_within(..);
        }
        StrokeDash::new(intervals, style.dash_offset * style.thickness)
    };
    let cap = if dash.is_some() { style.dash_cap } else { style.start_cap };

    Stroke {
        width: style.thickness,
        miter_limit: style.miter_limit,
        line_cap: line_cap(cap),
        line_join: match style.join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            LineJoin::Round => tiny_skia::LineJoin::Round,
        },
        dash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::cache::tests::FONT_GUID;
    use crate::markup::brush::normalize_stops;
    use std::sync::Arc;
    use tiny_skia::Rect;

    fn painter(size: u32) -> RasterPainter {
        RasterPainter::new(size, size, size as f32, size as f32, &RenderOptions::default()).unwrap()
    }

    fn rgba(p: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let c = p.pixel(x, y).unwrap().demultiply();
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    fn square(size: f32) -> PathGeometry {
        PathGeometry::parse(&format!("M 0,0 L {s},0 L {s},{s} L 0,{s} Z", s = size))
    }

    /// Pixels noticeably darker than the white background.
    fn dark_pixels(p: &Pixmap) -> usize {
        p.pixels().iter().filter(|c| c.demultiply().red() < 128).count()
    }

    fn render_glyph_page(font_uri: &str) -> Pixmap {
        use crate::fonts::FontCache;
        use crate::fonts::cache::tests::obfuscated_font;
        use crate::package::phys_pkg::tests::build_zip;
        use crate::package::{PackURI, PhysPkgReader};
        use crate::render::interpreter::{PageResources, interpret};

        let page = format!(
            r##"<FixedPage Width="100" Height="40"><Glyphs OriginX="5" OriginY="30" FontRenderingEmSize="24" FontUri="{}" UnicodeString="HH" Fill="#FF000000"/></FixedPage>"##,
            font_uri
        );
        let font = obfuscated_font();
        let font_part = format!("Resources/{}.odttf", FONT_GUID);
        let pkg = PhysPkgReader::from_bytes(build_zip(&[
            ("Documents/1/Pages/1.fpage", page.as_bytes()),
            (font_part.as_str(), font.as_slice()),
        ]))
        .unwrap();
        let uri = PackURI::new("/Documents/1/Pages/1.fpage").unwrap();
        let fonts = FontCache::new("Arial");
        let resources = PageResources {
            package: &pkg,
            page_uri: &uri,
            fonts: &fonts,
        };
        let mut p = RasterPainter::new(100, 40, 100.0, 40.0, &RenderOptions::default()).unwrap();
        interpret(page.as_bytes(), resources, &mut p).unwrap();
        p.finish()
    }

    #[test]
    fn test_glyphs_drawn_with_embedded_font() {
        let pixmap = render_glyph_page(&format!("../../../Resources/{}.odttf", FONT_GUID));
        let dark = dark_pixels(&pixmap);
        assert!(dark > 50, "only {} dark pixels", dark);
        // Nothing lands left of the origin or below the descender.
        assert_eq!(rgba(&pixmap, 1, 20), (255, 255, 255, 255));
        assert_eq!(rgba(&pixmap, 50, 39), (255, 255, 255, 255));
    }

    #[test]
    fn test_glyphs_without_font_draw_nothing() {
        let pixmap = render_glyph_page("/Resources/missing.odttf");
        assert_eq!(dark_pixels(&pixmap), 0);
    }

    #[test]
    fn test_solid_fill() {
        let mut p = painter(10);
        let brush = Brush::Solid(ColorU8::from_rgba(255, 0, 0, 255));
        p.fill_path(&square(5.0), &brush, &DrawState::default());
        let pixmap = p.finish();
        assert_eq!(rgba(&pixmap, 2, 2), (255, 0, 0, 255));
        assert_eq!(rgba(&pixmap, 7, 7), (255, 255, 255, 255));
    }

    #[test]
    fn test_device_scale_maps_page_to_pixels() {
        let mut p = RasterPainter::new(20, 20, 10.0, 10.0, &RenderOptions::default()).unwrap();
        let brush = Brush::Solid(ColorU8::from_rgba(0, 0, 255, 255));
        p.fill_path(&square(5.0), &brush, &DrawState::default());
        let pixmap = p.finish();
        assert_eq!(rgba(&pixmap, 8, 8), (0, 0, 255, 255));
        assert_eq!(rgba(&pixmap, 12, 12), (255, 255, 255, 255));
    }

    #[test]
    fn test_state_transform_and_opacity() {
        let mut p = painter(10);
        let brush = Brush::Solid(ColorU8::from_rgba(0, 0, 0, 255));
        let state = DrawState {
            transform: Transform::from_translate(5.0, 5.0),
            opacity: 0.5,
        };
        p.fill_path(&square(5.0), &brush, &state);
        let pixmap = p.finish();
        assert_eq!(rgba(&pixmap, 2, 2), (255, 255, 255, 255));
        let (r, _, _, a) = rgba(&pixmap, 7, 7);
        assert_eq!(a, 255);
        assert!((120..=136).contains(&r), "got {}", r);
    }

    #[test]
    fn test_linear_gradient_fill() {
        let mut p = painter(100);
        let black = ColorU8::from_rgba(0, 0, 0, 255);
        let white = ColorU8::from_rgba(255, 255, 255, 255);
        let brush = Brush::Linear(LinearGradient {
            start: Point::from_xy(0.0, 0.0),
            end: Point::from_xy(100.0, 0.0),
            stops: normalize_stops(vec![GradientStop::new(0.0, black), GradientStop::new(1.0, white)]),
            spread: SpreadMethod::Pad,
            transform: Transform::identity(),
        });
        p.fill_path(&square(100.0), &brush, &DrawState::default());
        let pixmap = p.finish();
        let (left, ..) = rgba(&pixmap, 2, 50);
        let (right, ..) = rgba(&pixmap, 97, 50);
        assert!(left < 20 && right > 235, "left {} right {}", left, right);
    }

    #[test]
    fn test_stroke() {
        let mut p = painter(20);
        let brush = Brush::Solid(ColorU8::from_rgba(0, 128, 0, 255));
        let line = PathGeometry::parse("M 0,10 L 20,10");
        let style = StrokeStyle {
            thickness: 4.0,
            ..StrokeStyle::default()
        };
        p.stroke_path(&line, &brush, &style, &DrawState::default());
        let pixmap = p.finish();
        assert_eq!(rgba(&pixmap, 10, 10), (0, 128, 0, 255));
        assert_eq!(rgba(&pixmap, 10, 2), (255, 255, 255, 255));
    }

    #[test]
    fn test_untiled_image_brush_stays_in_viewport() {
        let mut source = Pixmap::new(1, 1).unwrap();
        source.fill(Color::from_rgba8(0, 0, 255, 255));
        let brush = Brush::Image(ImageBrush {
            image: Some(Arc::new(source)),
            viewbox: Rect::from_xywh(0.0, 0.0, 1.0, 1.0).unwrap(),
            viewport: Rect::from_xywh(0.0, 0.0, 5.0, 5.0).unwrap(),
            tile_mode: TileMode::None,
            transform: Transform::identity(),
            opacity: 1.0,
        });
        let mut p = painter(10);
        p.fill_path(&square(10.0), &brush, &DrawState::default());
        let pixmap = p.finish();
        let (r, g, b, _) = rgba(&pixmap, 2, 2);
        assert!(r < 5 && g < 5 && b > 250, "got {:?}", (r, g, b));
        assert_eq!(rgba(&pixmap, 7, 7), (255, 255, 255, 255));
    }

    #[test]
    fn test_dash_array_is_scaled_by_thickness() {
        let style = StrokeStyle {
            thickness: 2.0,
            dash_array: vec![1.0],
            ..StrokeStyle::default()
        };
        let stroke = to_stroke(&style);
        assert!(stroke.dash.is_some());
        assert_eq!(stroke.width, 2.0);
        assert_eq!(stroke.line_cap, tiny_skia::LineCap::Butt);
    }
}
