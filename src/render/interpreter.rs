//! Page markup interpreter.
//!
//! The page is read as a stream of XML events. Every start tag pushes a
//! [`RenderNode`]; every end tag pops it, computes its value from the
//! children collected so far and hands it to the parent. Property
//! elements (`Path.Fill`, `*.RenderTransform`, ...) therefore reach their
//! owner before the owner's own end tag, where paths and glyph runs are
//! finally drawn. Canvases scope the drawing state.

use crate::common::error::Result;
use crate::fonts::{FontCache, FontHandle};
use crate::markup::brush::{Brush, ImageBrush, LinearGradient, RadialGradient, decode_image, normalize_stops};
use crate::markup::element::{Element, GlyphsAttrs, PathAttrs};
use crate::markup::GradientStop;
use crate::package::{PackURI, PhysPkgReader, split_fragment};
use crate::render::glyphs;
use crate::render::node::{RenderNode, ResolvedValue};
use crate::render::painter::{DrawState, GlyphRun, Painter};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{Pixmap, Transform};

/// Glyph runs smaller than this em size are not drawn.
const MIN_EM_SIZE: f32 = 0.1;

/// Everything a page needs from its package.
#[derive(Debug, Clone, Copy)]
pub struct PageResources<'a> {
    pub package: &'a PhysPkgReader,
    /// Part name of the page, against which relative references resolve.
    pub page_uri: &'a PackURI,
    pub fonts: &'a FontCache,
}

/// Interpret `markup` and send the drawing calls to `painter`.
///
/// Malformed XML stops interpretation with an error; whatever was drawn
/// up to that point stays drawn.
pub fn interpret<P: Painter>(markup: &[u8], resources: PageResources<'_>, painter: &mut P) -> Result<()> {
    Interpreter::new(resources, painter).run(markup)
}

struct Interpreter<'r, 'p, P: Painter> {
    resources: PageResources<'r>,
    painter: &'p mut P,
    stack: Vec<RenderNode>,
    state: DrawState,
    saved: Vec<DrawState>,
    images: HashMap<String, Option<Arc<Pixmap>>>,
}

impl<'r, 'p, P: Painter> Interpreter<'r, 'p, P> {
    fn new(resources: PageResources<'r>, painter: &'p mut P) -> Self {
        Self {
            resources,
            painter,
            stack: Vec::with_capacity(16),
            state: DrawState::default(),
            saved: Vec::new(),
            images: HashMap::new(),
        }
    }

    fn run(mut self, markup: &[u8]) -> Result<()> {
        let mut reader = Reader::from_reader(markup);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        self.stack.push(RenderNode::new(Element::Document));
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => self.start(Element::from_start(&e)),
                Event::Empty(e) => {
                    self.start(Element::from_start(&e));
                    self.end();
                },
                Event::End(_) => self.end(),
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }
        Ok(())
    }

    fn start(&mut self, element: Element) {
        match &element {
            Element::FixedPage { width, height } => {
                if let (Some(w), Some(h)) = (width, height) {
                    self.painter.begin_page(*w, *h);
                }
            },
            Element::Canvas(attrs) => {
                self.saved.push(self.state);
                self.state = self.state.child(attrs.render_transform, attrs.opacity);
            },
            _ => {},
        }
        self.stack.push(RenderNode::new(element));
    }

    fn end(&mut self) {
        // The synthetic document node is never closed by the markup.
        if self.stack.len() < 2 {
            log::debug!("unbalanced end element ignored");
            return;
        }
        let Some(node) = self.stack.pop() else { return };
        let node = self.resolve(node);
        if node.value.is_some() {
            if let Some(parent) = self.stack.last_mut() {
                parent.children.push(node);
            }
        }
    }

    fn resolve(&mut self, mut node: RenderNode) -> RenderNode {
        let element = std::mem::replace(&mut node.element, Element::Unknown);
        let value = match &element {
            Element::MatrixTransform { matrix } => {
                Some(ResolvedValue::Transform(matrix.unwrap_or_default()))
            },
            Element::RenderTransform => {
                let transform = node.take_transform(|e| matches!(e, Element::MatrixTransform { .. }));
                let parent_is_canvas = self.stack.last().is_some_and(|p| p.element.is_canvas());
                match transform {
                    Some(t) if parent_is_canvas => {
                        self.state.transform = self.state.transform.pre_concat(t);
                        None
                    },
                    Some(t) => Some(ResolvedValue::Transform(t)),
                    None => None,
                }
            },
            Element::BrushTransform => node
                .take_transform(|e| matches!(e, Element::MatrixTransform { .. }))
                .map(ResolvedValue::Transform),
            Element::Fill | Element::Stroke => node.take_first_value(),
            Element::GradientStop { offset, color } => match offset {
                Some(offset) => Some(ResolvedValue::GradientStops(vec![GradientStop::new(*offset, *color)])),
                None => {
                    log::debug!("gradient stop without offset ignored");
                    None
                },
            },
            Element::GradientStops => Some(ResolvedValue::GradientStops(normalize_stops(node.take_stops()))),
            Element::SolidColorBrush { color, opacity } => {
                Some(ResolvedValue::Brush(Brush::Solid(*color).with_opacity(*opacity)))
            },
            Element::LinearGradientBrush(attrs) => {
                let stops = node.take_stops();
                if stops.is_empty() {
                    log::debug!("linear gradient without stops ignored");
                    None
                } else {
                    let transform = attrs.transform.or_else(|| node.take_transform(is_brush_transform));
                    let brush = Brush::Linear(LinearGradient {
                        start: attrs.start,
                        end: attrs.end,
                        stops,
                        spread: attrs.spread,
                        transform: transform.unwrap_or_default(),
                    });
                    Some(ResolvedValue::Brush(brush.with_opacity(attrs.opacity)))
                }
            },
            Element::RadialGradientBrush(attrs) => {
                let stops = node.take_stops();
                if stops.is_empty() {
                    log::debug!("radial gradient without stops ignored");
                    None
                } else {
                    let transform = attrs.transform.or_else(|| node.take_transform(is_brush_transform));
                    let brush = Brush::Radial(RadialGradient {
                        center: attrs.center,
                        origin: attrs.origin,
                        radius_x: attrs.radius_x,
                        radius_y: attrs.radius_y,
                        stops,
                        spread: attrs.spread,
                        transform: transform.unwrap_or_default(),
                    });
                    Some(ResolvedValue::Brush(brush.with_opacity(attrs.opacity)))
                }
            },
            Element::ImageBrush(attrs) => match (attrs.viewbox, attrs.viewport) {
                (Some(viewbox), Some(viewport)) => {
                    let image = attrs.image_source.as_deref().and_then(|s| self.load_image(s));
                    let transform = attrs.transform.or_else(|| node.take_transform(is_brush_transform));
                    Some(ResolvedValue::Brush(Brush::Image(ImageBrush {
                        image,
                        viewbox,
                        viewport,
                        tile_mode: attrs.tile_mode,
                        transform: transform.unwrap_or_default(),
                        opacity: attrs.opacity,
                    })))
                },
                _ => {
                    log::debug!("image brush without viewbox or viewport ignored");
                    None
                },
            },
            Element::Path(attrs) => {
                self.draw_path(attrs, &mut node);
                None
            },
            Element::Glyphs(attrs) => {
                self.draw_glyphs(attrs, &mut node);
                None
            },
            Element::Canvas(_) => {
                self.state = self.saved.pop().unwrap_or_default();
                None
            },
            Element::Document | Element::FixedPage { .. } | Element::Unknown => None,
        };

        node.element = element;
        node.value = value;
        node.children.clear();
        node
    }

    /// Drawing state of a path or glyph run: own transform from the
    /// attribute or the property element, then own opacity.
    fn element_state(&self, attr: Option<Transform>, node: &mut RenderNode, opacity: f32) -> DrawState {
        let local = attr.or_else(|| node.take_transform(|e| matches!(e, Element::RenderTransform)));
        self.state.child(local, opacity)
    }

    fn draw_path(&mut self, attrs: &PathAttrs, node: &mut RenderNode) {
        let fill = attrs
            .fill
            .clone()
            .or_else(|| node.take_brush(|e| matches!(e, Element::Fill)));
        let stroke = attrs
            .stroke
            .clone()
            .or_else(|| node.take_brush(|e| matches!(e, Element::Stroke)));
        let state = self.element_state(attrs.render_transform, node, attrs.opacity);

        let Some(geometry) = &attrs.data else {
            log::debug!("path without inline geometry skipped");
            return;
        };
        if geometry.is_empty() {
            return;
        }
        if let Some(fill) = fill.filter(|b| !b.is_invisible()) {
            self.painter.fill_path(geometry, &fill, &state);
        }
        if let Some(stroke) = stroke.filter(|b| !b.is_invisible()) {
            self.painter
                .stroke_path(geometry, &stroke, &attrs.stroke_style, &state);
        }
    }

    fn draw_glyphs(&mut self, attrs: &GlyphsAttrs, node: &mut RenderNode) {
        let fill = attrs
            .fill
            .clone()
            .or_else(|| node.take_brush(|e| matches!(e, Element::Fill)));
        let state = self.element_state(attrs.render_transform, node, attrs.opacity);

        if let Some(name) = &attrs.name {
            self.painter.named_element(name, attrs.origin, &state);
        }
        if attrs.em_size < MIN_EM_SIZE {
            log::debug!("glyph run with em size {} skipped", attrs.em_size);
            return;
        }

        let font = self.font_for(attrs.font_uri.as_deref(), attrs.em_size);
        let positioned = glyphs::layout(attrs, &font);
        let run = GlyphRun {
            glyphs: &positioned,
            font: &font,
            fill: fill.as_ref(),
            style: attrs.style,
        };
        self.painter.draw_glyphs(&run, &state);
    }

    fn font_for(&self, font_uri: Option<&str>, em_size: f32) -> FontHandle {
        let Some(location) = font_uri else {
            return FontHandle::approximate(em_size);
        };
        let (path, fragment) = split_fragment(location.trim());
        let index = fragment.and_then(|f| f.parse().ok()).unwrap_or(0);
        match self.resources.page_uri.resolve(path) {
            Ok(uri) => self
                .resources
                .fonts
                .resolve(self.resources.package, &uri, index, em_size),
            Err(e) => {
                log::debug!("bad font reference '{}': {}", location, e);
                FontHandle::approximate(em_size)
            },
        }
    }

    /// Decoded image for an `ImageSource`, cached for the rest of the page.
    fn load_image(&mut self, source: &str) -> Option<Arc<Pixmap>> {
        let source = source.trim();
        if source.starts_with('{') {
            log::debug!("colour-converted image source not supported: {}", source);
            return None;
        }
        if let Some(cached) = self.images.get(source) {
            return cached.clone();
        }

        let image = match self.resources.page_uri.resolve(source) {
            Ok(uri) => match self.resources.package.blob_for(&uri) {
                Ok(data) => decode_image(&data).map(Arc::new),
                Err(e) => {
                    log::warn!("image {} unavailable: {}", uri, e);
                    None
                },
            },
            Err(e) => {
                log::debug!("bad image reference '{}': {}", source, e);
                None
            },
        };
        self.images.insert(source.to_string(), image.clone());
        image
    }
}

#[inline]
fn is_brush_transform(e: &Element) -> bool {
    matches!(e, Element::BrushTransform)
}
