//! Brush values and gradient-stop normalization.
//!
//! A brush is produced either from a colour attribute (`Fill="#FF0000"`) or
//! from a brush element nested in a `Path.Fill`, `Path.Stroke` or
//! `Glyphs.Fill` property element. Brush opacity is folded into the colours
//! (or the image opacity) when the brush is built, so painters only deal
//! with the element opacity inherited from canvases.

use crate::common::geometry::rect_to_rect;
use crate::markup::color::{argb_key, mean_color, parse_color_or_transparent, with_opacity};
use std::sync::Arc;
use tiny_skia::{ColorU8, IntSize, Pixmap, Point, Rect, Transform};

/// How a gradient continues past its first and last stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpreadMethod {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

impl SpreadMethod {
    /// Parse a `SpreadMethod` attribute; unknown values pad.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Reflect" => SpreadMethod::Reflect,
            "Repeat" => SpreadMethod::Repeat,
            _ => SpreadMethod::Pad,
        }
    }
}

/// How an image brush fills the area outside its viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileMode {
    #[default]
    None,
    Tile,
    FlipX,
    FlipY,
    FlipXY,
}

impl TileMode {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Tile" => TileMode::Tile,
            "FlipX" => TileMode::FlipX,
            "FlipY" => TileMode::FlipY,
            "FlipXY" => TileMode::FlipXY,
            _ => TileMode::None,
        }
    }
}

/// One colour stop of a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: ColorU8,
}

impl GradientStop {
    #[inline]
    pub fn new(offset: f32, color: ColorU8) -> Self {
        Self { offset, color }
    }
}

/// Normalize a raw stop list so that it starts at offset 0 and ends at 1.
///
/// Stops are sorted by offset (equal offsets ordered by ARGB value, sort is
/// stable). For the lower bound:
///
/// - no stop below 0: a stop at 0 with the first colour is prepended unless
///   one already exists;
/// - stops on both sides of 0: those below are dropped and, unless a stop at
///   exactly 0 exists, a stop at 0 with the mean of the two colours
///   straddling the boundary is prepended;
/// - every stop below 0: the list collapses to a single stop at 0 with the
///   last colour.
///
/// The upper bound is handled the same way, mirrored. Stops with a NaN
/// offset are discarded. An empty list stays empty.
pub fn normalize_stops(mut stops: Vec<GradientStop>) -> Vec<GradientStop> {
    stops.retain(|s| !s.offset.is_nan());
    if stops.is_empty() {
        return stops;
    }

    stops.sort_by(|a, b| {
        a.offset
            .total_cmp(&b.offset)
            .then_with(|| argb_key(a.color).cmp(&argb_key(b.color)))
    });

    match stops.iter().position(|s| s.offset >= 0.0) {
        None => {
            let color = stops[stops.len() - 1].color;
            stops = vec![GradientStop::new(0.0, color)];
        },
        Some(0) => {
            if stops[0].offset != 0.0 {
                let color = stops[0].color;
                stops.insert(0, GradientStop::new(0.0, color));
            }
        },
        Some(i) => {
            let boundary = if stops[i].offset == 0.0 {
                None
            } else {
                Some(mean_color(stops[i - 1].color, stops[i].color))
            };
            stops.drain(..i);
            if let Some(color) = boundary {
                stops.insert(0, GradientStop::new(0.0, color));
            }
        },
    }

    let last = stops.len() - 1;
    match stops.iter().rposition(|s| s.offset <= 1.0) {
        None => {
            let color = stops[0].color;
            stops = vec![GradientStop::new(1.0, color)];
        },
        Some(i) if i == last => {
            if stops[i].offset != 1.0 {
                let color = stops[i].color;
                stops.push(GradientStop::new(1.0, color));
            }
        },
        Some(i) => {
            let boundary = if stops[i].offset == 1.0 {
                None
            } else {
                Some(mean_color(stops[i].color, stops[i + 1].color))
            };
            stops.truncate(i + 1);
            if let Some(color) = boundary {
                stops.push(GradientStop::new(1.0, color));
            }
        },
    }

    stops
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Point,
    pub end: Point,
    pub stops: Vec<GradientStop>,
    pub spread: SpreadMethod,
    pub transform: Transform,
}

/// Elliptical gradient. `origin` is the focal point where offset 0 sits.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Point,
    pub origin: Point,
    pub radius_x: f32,
    pub radius_y: f32,
    pub stops: Vec<GradientStop>,
    pub spread: SpreadMethod,
    pub transform: Transform,
}

#[derive(Debug, Clone)]
pub struct ImageBrush {
    /// Decoded, premultiplied pixels; `None` when the source was missing
    /// or could not be decoded (nothing is painted).
    pub image: Option<Arc<Pixmap>>,
    /// Portion of the image to show, in image units.
    pub viewbox: Rect,
    /// Where the viewbox lands, in brush space.
    pub viewport: Rect,
    pub tile_mode: TileMode,
    pub transform: Transform,
    pub opacity: f32,
}

impl ImageBrush {
    /// Maps the viewbox onto the unit square.
    pub fn image_to_unit(&self) -> Option<Transform> {
        rect_to_rect(&self.viewbox, &unit_square()?)
    }

    /// Maps the unit square onto the viewport.
    pub fn unit_to_viewport(&self) -> Option<Transform> {
        rect_to_rect(&unit_square()?, &self.viewport)
    }

    /// Image pixel space to user space, including the brush transform.
    pub fn pattern_transform(&self) -> Option<Transform> {
        Some(
            self.transform
                .pre_concat(self.unit_to_viewport()?)
                .pre_concat(self.image_to_unit()?),
        )
    }
}

#[inline]
fn unit_square() -> Option<Rect> {
    Rect::from_xywh(0.0, 0.0, 1.0, 1.0)
}

#[derive(Debug, Clone)]
pub enum Brush {
    Solid(ColorU8),
    Linear(LinearGradient),
    Radial(RadialGradient),
    Image(ImageBrush),
}

impl Brush {
    /// Brush from a `Fill` or `Stroke` attribute.
    ///
    /// Values starting with `{` reference a resource dictionary, which is
    /// not supported: they resolve to no brush.
    pub fn from_attr(value: &str) -> Option<Brush> {
        let value = value.trim();
        if value.starts_with('{') {
            log::debug!("resource reference in brush attribute ignored: {}", value);
            return None;
        }
        Some(Brush::Solid(parse_color_or_transparent(value)))
    }

    /// Apply a brush `Opacity` attribute.
    pub fn with_opacity(self, opacity: f32) -> Brush {
        if opacity >= 1.0 {
            return self;
        }
        let fade = |stops: Vec<GradientStop>| -> Vec<GradientStop> {
            stops
                .into_iter()
                .map(|s| GradientStop::new(s.offset, with_opacity(s.color, opacity)))
                .collect()
        };
        match self {
            Brush::Solid(c) => Brush::Solid(with_opacity(c, opacity)),
            Brush::Linear(mut g) => {
                g.stops = fade(g.stops);
                Brush::Linear(g)
            },
            Brush::Radial(mut g) => {
                g.stops = fade(g.stops);
                Brush::Radial(g)
            },
            Brush::Image(mut img) => {
                img.opacity *= opacity.clamp(0.0, 1.0);
                Brush::Image(img)
            },
        }
    }

    /// True when painting with this brush cannot change any pixel.
    pub fn is_invisible(&self) -> bool {
        match self {
            Brush::Solid(c) => c.alpha() == 0,
            Brush::Linear(g) => g.stops.iter().all(|s| s.color.alpha() == 0),
            Brush::Radial(g) => g.stops.iter().all(|s| s.color.alpha() == 0),
            Brush::Image(img) => img.image.is_none() || img.opacity <= 0.0,
        }
    }
}

/// Decode an image part into a premultiplied pixmap.
pub fn decode_image(data: &[u8]) -> Option<Pixmap> {
    let decoded = match image::load_from_memory(data) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            log::warn!("failed to decode image: {}", e);
            return None;
        },
    };
    let (width, height) = decoded.dimensions();
    let mut pixels = decoded.into_raw();
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u16;
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
    Pixmap::from_vec(pixels, IntSize::from_wh(width, height)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn c(v: u8) -> ColorU8 {
        ColorU8::from_rgba(v, v, v, 255)
    }

    fn offsets(stops: &[GradientStop]) -> Vec<f32> {
        stops.iter().map(|s| s.offset).collect()
    }

    #[test]
    fn test_empty_stays_empty() {
        assert!(normalize_stops(Vec::new()).is_empty());
    }

    #[test]
    fn test_missing_boundaries_are_added() {
        let out = normalize_stops(vec![GradientStop::new(0.7, c(7)), GradientStop::new(0.3, c(3))]);
        assert_eq!(offsets(&out), vec![0.0, 0.3, 0.7, 1.0]);
        assert_eq!(out[0].color, c(3));
        assert_eq!(out[3].color, c(7));
    }

    #[test]
    fn test_straddling_stops_use_mean_colour() {
        let out = normalize_stops(vec![
            GradientStop::new(-1.0, c(0)),
            GradientStop::new(1.0 / 2.0, c(100)),
            GradientStop::new(2.0, c(200)),
        ]);
        assert_eq!(offsets(&out), vec![0.0, 0.5, 1.0]);
        assert_eq!(out[0].color, c(50));
        assert_eq!(out[2].color, c(150));
    }

    #[test]
    fn test_all_below_zero_collapses() {
        let out = normalize_stops(vec![GradientStop::new(-2.0, c(1)), GradientStop::new(-1.0, c(2))]);
        assert_eq!(offsets(&out), vec![0.0, 1.0]);
        assert_eq!(out[0].color, c(2));
        assert_eq!(out[1].color, c(2));
    }

    #[test]
    fn test_all_above_one() {
        let out = normalize_stops(vec![GradientStop::new(3.0, c(9)), GradientStop::new(2.0, c(8))]);
        assert_eq!(offsets(&out), vec![0.0, 1.0]);
        assert_eq!(out[0].color, c(8));
        assert_eq!(out[1].color, c(8));
    }

    #[test]
    fn test_existing_zero_drops_negatives() {
        let out = normalize_stops(vec![
            GradientStop::new(-0.5, c(1)),
            GradientStop::new(0.0, c(2)),
            GradientStop::new(1.0, c(3)),
        ]);
        assert_eq!(offsets(&out), vec![0.0, 1.0]);
        assert_eq!(out[0].color, c(2));
    }

    #[test]
    fn test_ties_ordered_by_colour() {
        let out = normalize_stops(vec![
            GradientStop::new(0.5, c(200)),
            GradientStop::new(0.5, c(10)),
        ]);
        assert_eq!(out[1].color, c(10));
        assert_eq!(out[2].color, c(200));
    }

    fn arb_stop(range: std::ops::Range<f32>) -> impl Strategy<Value = GradientStop> {
        (range, any::<[u8; 4]>())
            .prop_map(|(o, [r, g, b, a])| GradientStop::new(o, ColorU8::from_rgba(r, g, b, a)))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_bounds_and_order(stops in prop::collection::vec(arb_stop(-3.0f32..4.0), 1..12)) {
            let out = normalize_stops(stops);
            prop_assert!(!out.is_empty());
            prop_assert_eq!(out[0].offset, 0.0);
            prop_assert_eq!(out[out.len() - 1].offset, 1.0);
            prop_assert!(out.windows(2).all(|w| w[0].offset <= w[1].offset));
        }

        #[test]
        fn prop_bounded_list_is_unchanged(
            inner in prop::collection::vec(arb_stop(0.0f32..1.0), 0..10),
            lo in any::<[u8; 4]>(),
            hi in any::<[u8; 4]>(),
        ) {
            let mut stops = inner;
            stops.push(GradientStop::new(0.0, ColorU8::from_rgba(lo[0], lo[1], lo[2], lo[3])));
            stops.push(GradientStop::new(1.0, ColorU8::from_rgba(hi[0], hi[1], hi[2], hi[3])));

            let mut expected = stops.clone();
            expected.sort_by(|a, b| {
                a.offset
                    .total_cmp(&b.offset)
                    .then_with(|| argb_key(a.color).cmp(&argb_key(b.color)))
            });

            let out = normalize_stops(stops);
            prop_assert_eq!(out, expected);
        }
    }

    #[test]
    fn test_brush_from_attr() {
        assert!(matches!(Brush::from_attr("#FF0000"), Some(Brush::Solid(c)) if c.red() == 255));
        assert!(Brush::from_attr("{StaticResource b0}").is_none());
        assert!(Brush::from_attr("bogus").unwrap().is_invisible());
    }

    #[test]
    fn test_brush_opacity() {
        let b = Brush::from_attr("#FF0000").unwrap().with_opacity(0.5);
        assert!(matches!(b, Brush::Solid(c) if c.alpha() == 128));
    }

    #[test]
    fn test_image_brush_transforms() {
        let brush = ImageBrush {
            image: None,
            viewbox: Rect::from_xywh(0.0, 0.0, 10.0, 20.0).unwrap(),
            viewport: Rect::from_xywh(5.0, 5.0, 100.0, 100.0).unwrap(),
            tile_mode: TileMode::None,
            transform: Transform::identity(),
            opacity: 1.0,
        };
        let mut pts = [Point::from_xy(10.0, 20.0)];
        brush.pattern_transform().unwrap().map_points(&mut pts);
        assert_eq!((pts[0].x, pts[0].y), (105.0, 105.0));
    }

    #[test]
    fn test_decode_garbage_image() {
        assert!(decode_image(b"not an image").is_none());
    }

    #[test]
    fn test_spread_and_tile_parse() {
        assert_eq!(SpreadMethod::parse("Reflect"), SpreadMethod::Reflect);
        assert_eq!(SpreadMethod::parse("whatever"), SpreadMethod::Pad);
        assert_eq!(TileMode::parse("FlipXY"), TileMode::FlipXY);
    }
}
