//! Typed view of the fixed-page markup vocabulary.
//!
//! Each start tag is turned into one [`Element`] variant carrying only the
//! attributes that variant's handling needs, already parsed. Unknown tags
//! and tags this renderer deliberately ignores (clips, opacity masks,
//! resource dictionaries, visual brushes) become [`Element::Unknown`].
//! A malformed attribute value falls back to that attribute's default.

use crate::common::geometry::{parse_f32, parse_matrix, parse_point, parse_rect};
use crate::markup::brush::{Brush, SpreadMethod, TileMode};
use crate::markup::color::parse_color_or_transparent;
use crate::markup::path_data::PathGeometry;
use quick_xml::events::BytesStart;
use smallvec::SmallVec;
use tiny_skia::{ColorU8, Point, Rect, Transform};

/// Attribute values of one start tag, keyed by local name.
#[derive(Debug, Default)]
pub struct Attributes {
    items: SmallVec<[(String, String); 8]>,
}

impl Attributes {
    /// Collect the attributes of a start tag.
    ///
    /// Attributes that fail to parse or unescape are skipped.
    pub fn from_start(e: &BytesStart<'_>) -> Self {
        let mut items = SmallVec::new();
        for attr in e.attributes() {
            let attr = match attr {
                Ok(a) => a,
                Err(err) => {
                    log::debug!("skipping malformed attribute: {}", err);
                    continue;
                },
            };
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            match attr.unescape_value() {
                Ok(value) => items.push((key, value.into_owned())),
                Err(err) => log::debug!("skipping attribute {}: {}", key, err),
            }
        }
        Self { items }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn string(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    fn number(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(parse_f32)
    }

    fn point(&self, name: &str) -> Option<Point> {
        self.get(name).and_then(parse_point)
    }

    fn rect(&self, name: &str) -> Option<Rect> {
        self.get(name).and_then(parse_rect)
    }

    fn matrix(&self, name: &str) -> Option<Transform> {
        self.get(name).and_then(parse_matrix)
    }

    fn brush(&self, name: &str) -> Option<Brush> {
        self.get(name).and_then(Brush::from_attr)
    }

    /// `Opacity`, clamped to 0..=1, defaulting to fully opaque.
    fn opacity(&self) -> f32 {
        self.number("Opacity").unwrap_or(1.0).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Flat,
    Round,
    Square,
    Triangle,
}

impl LineCap {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("Round") => LineCap::Round,
            Some("Square") => LineCap::Square,
            Some("Triangle") => LineCap::Triangle,
            _ => LineCap::Flat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Bevel,
    Round,
}

impl LineJoin {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("Bevel") => LineJoin::Bevel,
            Some("Round") => LineJoin::Round,
            _ => LineJoin::Miter,
        }
    }
}

/// Stroke geometry of a `Path`.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub thickness: f32,
    /// Dash and gap lengths as multiples of the thickness.
    pub dash_array: Vec<f32>,
    /// Dash phase as a multiple of the thickness.
    pub dash_offset: f32,
    pub dash_cap: LineCap,
    pub start_cap: LineCap,
    pub end_cap: LineCap,
    pub join: LineJoin,
    /// Miter limit as a ratio of miter length to stroke thickness.
    pub miter_limit: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            thickness: 1.0,
            dash_array: Vec::new(),
            dash_offset: 0.0,
            dash_cap: LineCap::Flat,
            start_cap: LineCap::Flat,
            end_cap: LineCap::Flat,
            join: LineJoin::Miter,
            miter_limit: 5.0,
        }
    }
}

impl StrokeStyle {
    fn from_attrs(attrs: &Attributes) -> Self {
        let defaults = Self::default();
        Self {
            thickness: attrs
                .number("StrokeThickness")
                .filter(|t| *t >= 0.0)
                .unwrap_or(defaults.thickness),
            dash_array: attrs
                .get("StrokeDashArray")
                .and_then(crate::common::geometry::parse_number_list)
                .unwrap_or_default(),
            dash_offset: attrs.number("StrokeDashOffset").unwrap_or(0.0),
            dash_cap: LineCap::parse(attrs.get("StrokeDashCap")),
            start_cap: LineCap::parse(attrs.get("StrokeStartLineCap")),
            end_cap: LineCap::parse(attrs.get("StrokeEndLineCap")),
            join: LineJoin::parse(attrs.get("StrokeLineJoin")),
            // The attribute is relative to half the thickness.
            miter_limit: attrs
                .number("StrokeMiterLimit")
                .map(|m| (m / 2.0).max(1.0))
                .unwrap_or(defaults.miter_limit),
        }
    }
}

/// Synthetic styling applied when a font lacks the requested face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleSimulations {
    #[default]
    None,
    Italic,
    Bold,
    BoldItalic,
}

impl StyleSimulations {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("ItalicSimulation") => StyleSimulations::Italic,
            Some("BoldSimulation") => StyleSimulations::Bold,
            Some("BoldItalicSimulation") => StyleSimulations::BoldItalic,
            _ => StyleSimulations::None,
        }
    }

    #[inline]
    pub fn is_bold(self) -> bool {
        matches!(self, StyleSimulations::Bold | StyleSimulations::BoldItalic)
    }

    #[inline]
    pub fn is_italic(self) -> bool {
        matches!(self, StyleSimulations::Italic | StyleSimulations::BoldItalic)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CanvasAttrs {
    pub render_transform: Option<Transform>,
    pub opacity: f32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PathAttrs {
    pub data: Option<PathGeometry>,
    pub fill: Option<Brush>,
    pub stroke: Option<Brush>,
    pub stroke_style: StrokeStyle,
    pub render_transform: Option<Transform>,
    pub opacity: f32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GlyphsAttrs {
    pub unicode_string: Option<String>,
    pub indices: Option<String>,
    pub font_uri: Option<String>,
    pub em_size: f32,
    pub origin: Point,
    pub fill: Option<Brush>,
    pub style: StyleSimulations,
    pub bidi_level: u32,
    pub render_transform: Option<Transform>,
    pub opacity: f32,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LinearGradientAttrs {
    pub start: Point,
    pub end: Point,
    pub spread: SpreadMethod,
    pub transform: Option<Transform>,
    pub opacity: f32,
}

#[derive(Debug, Clone)]
pub struct RadialGradientAttrs {
    pub center: Point,
    pub origin: Point,
    pub radius_x: f32,
    pub radius_y: f32,
    pub spread: SpreadMethod,
    pub transform: Option<Transform>,
    pub opacity: f32,
}

#[derive(Debug, Clone)]
pub struct ImageBrushAttrs {
    pub image_source: Option<String>,
    pub viewbox: Option<Rect>,
    pub viewport: Option<Rect>,
    pub tile_mode: TileMode,
    pub transform: Option<Transform>,
    pub opacity: f32,
}

/// One element of page markup.
#[derive(Debug, Clone)]
pub enum Element {
    /// Synthetic root pushed before the first event.
    Document,
    FixedPage {
        width: Option<f32>,
        height: Option<f32>,
    },
    Canvas(CanvasAttrs),
    Path(Box<PathAttrs>),
    Glyphs(Box<GlyphsAttrs>),
    /// `Canvas.RenderTransform`, `Path.RenderTransform`, `Glyphs.RenderTransform`
    RenderTransform,
    /// `<Brush>.Transform` property elements
    BrushTransform,
    /// `Path.Fill`, `Glyphs.Fill`
    Fill,
    /// `Path.Stroke`
    Stroke,
    /// `<Gradient>.GradientStops`
    GradientStops,
    GradientStop {
        offset: Option<f32>,
        color: ColorU8,
    },
    MatrixTransform {
        matrix: Option<Transform>,
    },
    SolidColorBrush {
        color: ColorU8,
        opacity: f32,
    },
    LinearGradientBrush(Box<LinearGradientAttrs>),
    RadialGradientBrush(Box<RadialGradientAttrs>),
    ImageBrush(Box<ImageBrushAttrs>),
    Unknown,
}

impl Element {
    /// Build the element for a start (or empty) tag.
    pub fn from_start(e: &BytesStart<'_>) -> Self {
        let name = e.local_name();
        let name = name.as_ref();
        match name {
            b"FixedPage" => {
                let attrs = Attributes::from_start(e);
                Element::FixedPage {
                    width: attrs.number("Width"),
                    height: attrs.number("Height"),
                }
            },
            b"Canvas" => {
                let attrs = Attributes::from_start(e);
                Element::Canvas(CanvasAttrs {
                    render_transform: attrs.matrix("RenderTransform"),
                    opacity: attrs.opacity(),
                    name: attrs.string("Name"),
                })
            },
            b"Path" => {
                let attrs = Attributes::from_start(e);
                let data = attrs.get("Data").and_then(|d| {
                    if d.trim_start().starts_with('{') {
                        log::debug!("resource reference in path data ignored: {}", d);
                        None
                    } else {
                        Some(PathGeometry::parse(d))
                    }
                });
                Element::Path(Box::new(PathAttrs {
                    data,
                    fill: attrs.brush("Fill"),
                    stroke: attrs.brush("Stroke"),
                    stroke_style: StrokeStyle::from_attrs(&attrs),
                    render_transform: attrs.matrix("RenderTransform"),
                    opacity: attrs.opacity(),
                    name: attrs.string("Name"),
                }))
            },
            b"Glyphs" => {
                let attrs = Attributes::from_start(e);
                Element::Glyphs(Box::new(GlyphsAttrs {
                    unicode_string: attrs.string("UnicodeString"),
                    indices: attrs.string("Indices"),
                    font_uri: attrs.string("FontUri"),
                    em_size: attrs.number("FontRenderingEmSize").unwrap_or(0.0),
                    origin: Point::from_xy(
                        attrs.number("OriginX").unwrap_or(0.0),
                        attrs.number("OriginY").unwrap_or(0.0),
                    ),
                    fill: attrs.brush("Fill"),
                    style: StyleSimulations::parse(attrs.get("StyleSimulations")),
                    bidi_level: attrs
                        .get("BidiLevel")
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0),
                    render_transform: attrs.matrix("RenderTransform"),
                    opacity: attrs.opacity(),
                    name: attrs.string("Name"),
                }))
            },
            b"Canvas.RenderTransform" | b"Path.RenderTransform" | b"Glyphs.RenderTransform" => {
                Element::RenderTransform
            },
            b"ImageBrush.Transform"
            | b"LinearGradientBrush.Transform"
            | b"RadialGradientBrush.Transform"
            | b"SolidColorBrush.Transform"
            | b"VisualBrush.Transform" => Element::BrushTransform,
            b"Path.Fill" | b"Glyphs.Fill" => Element::Fill,
            b"Path.Stroke" => Element::Stroke,
            b"LinearGradientBrush.GradientStops" | b"RadialGradientBrush.GradientStops" => {
                Element::GradientStops
            },
            b"GradientStop" => {
                let attrs = Attributes::from_start(e);
                Element::GradientStop {
                    offset: attrs.number("Offset"),
                    color: parse_color_or_transparent(attrs.get("Color").unwrap_or_default()),
                }
            },
            b"MatrixTransform" => {
                let attrs = Attributes::from_start(e);
                Element::MatrixTransform {
                    matrix: attrs.matrix("Matrix"),
                }
            },
            b"SolidColorBrush" => {
                let attrs = Attributes::from_start(e);
                Element::SolidColorBrush {
                    color: parse_color_or_transparent(attrs.get("Color").unwrap_or_default()),
                    opacity: attrs.opacity(),
                }
            },
            b"LinearGradientBrush" => {
                let attrs = Attributes::from_start(e);
                Element::LinearGradientBrush(Box::new(LinearGradientAttrs {
                    start: attrs.point("StartPoint").unwrap_or_default(),
                    end: attrs.point("EndPoint").unwrap_or_default(),
                    spread: attrs.get("SpreadMethod").map(SpreadMethod::parse).unwrap_or_default(),
                    transform: attrs.matrix("Transform"),
                    opacity: attrs.opacity(),
                }))
            },
            b"RadialGradientBrush" => {
                let attrs = Attributes::from_start(e);
                let center = attrs.point("Center").unwrap_or_default();
                Element::RadialGradientBrush(Box::new(RadialGradientAttrs {
                    center,
                    origin: attrs.point("GradientOrigin").unwrap_or(center),
                    radius_x: attrs.number("RadiusX").unwrap_or(0.0),
                    radius_y: attrs.number("RadiusY").unwrap_or(0.0),
                    spread: attrs.get("SpreadMethod").map(SpreadMethod::parse).unwrap_or_default(),
                    transform: attrs.matrix("Transform"),
                    opacity: attrs.opacity(),
                }))
            },
            b"ImageBrush" => {
                let attrs = Attributes::from_start(e);
                Element::ImageBrush(Box::new(ImageBrushAttrs {
                    image_source: attrs.string("ImageSource"),
                    viewbox: attrs.rect("Viewbox"),
                    viewport: attrs.rect("Viewport"),
                    tile_mode: attrs.get("TileMode").map(TileMode::parse).unwrap_or_default(),
                    transform: attrs.matrix("Transform"),
                    opacity: attrs.opacity(),
                }))
            },
            _ => {
                log::trace!("unhandled element {}", String::from_utf8_lossy(name));
                Element::Unknown
            },
        }
    }

    /// Canvases scope drawing state: transform and opacity changes made
    /// inside one are undone when it ends.
    #[inline]
    pub fn is_canvas(&self) -> bool {
        matches!(self, Element::Canvas(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;
    use quick_xml::events::Event;

    fn first_element(xml: &str) -> Element {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => return Element::from_start(&e),
                Event::Eof => panic!("no element"),
                _ => {},
            }
        }
    }

    #[test]
    fn test_path_attributes() {
        let el = first_element(
            r##"<Path Data="M 0,0 L 10,0" Fill="#FF00FF00" StrokeThickness="2" StrokeDashArray="3 1" StrokeMiterLimit="8" Opacity="0.5" RenderTransform="2,0,0,2,1,1"/>"##,
        );
        let Element::Path(p) = el else { panic!("not a path") };
        assert_eq!(p.data.as_ref().unwrap().segments.len(), 2);
        assert!(matches!(p.fill, Some(Brush::Solid(c)) if c.green() == 255));
        assert!(p.stroke.is_none());
        assert_eq!(p.stroke_style.thickness, 2.0);
        assert_eq!(p.stroke_style.dash_array, vec![3.0, 1.0]);
        assert_eq!(p.stroke_style.miter_limit, 4.0);
        assert_eq!(p.opacity, 0.5);
        assert_eq!(p.render_transform.unwrap().sx, 2.0);
    }

    #[test]
    fn test_resource_references_are_dropped() {
        let el = first_element(r#"<Path Data="{StaticResource g}" Fill="{StaticResource b}"/>"#);
        let Element::Path(p) = el else { panic!("not a path") };
        assert!(p.data.is_none());
        assert!(p.fill.is_none());
    }

    #[test]
    fn test_glyphs_attributes() {
        let el = first_element(
            r##"<Glyphs OriginX="10" OriginY="20.5" FontRenderingEmSize="12" FontUri="/Fonts/a.odttf" UnicodeString="Hi" StyleSimulations="BoldSimulation" BidiLevel="1" Fill="#000000" x:Name="g1" xmlns:x="http://schemas.microsoft.com/xps/2005/06/resourcedictionary-key"/>"##,
        );
        let Element::Glyphs(g) = el else { panic!("not glyphs") };
        assert_eq!(g.origin, Point::from_xy(10.0, 20.5));
        assert_eq!(g.em_size, 12.0);
        assert_eq!(g.font_uri.as_deref(), Some("/Fonts/a.odttf"));
        assert!(g.style.is_bold() && !g.style.is_italic());
        assert_eq!(g.bidi_level, 1);
        assert_eq!(g.name.as_deref(), Some("g1"));
    }

    #[test]
    fn test_property_elements() {
        assert!(matches!(first_element("<Canvas.RenderTransform/>"), Element::RenderTransform));
        assert!(matches!(first_element("<ImageBrush.Transform/>"), Element::BrushTransform));
        assert!(matches!(first_element("<Glyphs.Fill/>"), Element::Fill));
        assert!(matches!(first_element("<Canvas.Clip/>"), Element::Unknown));
    }

    #[test]
    fn test_gradient_elements() {
        let el = first_element(r#"<RadialGradientBrush Center="5,5" RadiusX="4" RadiusY="2" SpreadMethod="Repeat"/>"#);
        let Element::RadialGradientBrush(r) = el else { panic!("not radial") };
        assert_eq!(r.origin, Point::from_xy(5.0, 5.0));
        assert_eq!(r.spread, SpreadMethod::Repeat);

        let el = first_element(r##"<GradientStop Offset="0.25" Color="#80102030"/>"##);
        assert!(matches!(el, Element::GradientStop { offset: Some(o), color } if o == 0.25 && color.alpha() == 0x80));
    }
}
