use crate::markup::{Brush, Element, GradientStop};
use tiny_skia::Transform;

/// Value a finished element hands to its parent.
#[derive(Debug, Clone)]
pub enum ResolvedValue {
    Brush(Brush),
    Transform(Transform),
    GradientStops(Vec<GradientStop>),
}

/// Node of the element stack kept while a page is interpreted.
///
/// Only children that produced a value are retained, and they are
/// dropped once the node itself is resolved.
#[derive(Debug)]
pub struct RenderNode {
    pub element: Element,
    pub children: Vec<RenderNode>,
    pub value: Option<ResolvedValue>,
}

impl RenderNode {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            children: Vec::new(),
            value: None,
        }
    }

    /// Take the value of the first child matching `pred` whose value is of
    /// the kind `kind` accepts. Values of other kinds stay in place.
    pub fn take_value(
        &mut self,
        pred: impl Fn(&Element) -> bool,
        kind: impl Fn(&ResolvedValue) -> bool,
    ) -> Option<ResolvedValue> {
        self.children
            .iter_mut()
            .find(|c| pred(&c.element) && c.value.as_ref().is_some_and(&kind))
            .and_then(|c| c.value.take())
    }

    /// Take the value of the first child, whatever it is.
    pub fn take_first_value(&mut self) -> Option<ResolvedValue> {
        self.children.iter_mut().find_map(|c| c.value.take())
    }

    pub fn take_brush(&mut self, pred: impl Fn(&Element) -> bool) -> Option<Brush> {
        match self.take_value(pred, |v| matches!(v, ResolvedValue::Brush(_)))? {
            ResolvedValue::Brush(b) => Some(b),
            _ => None,
        }
    }

    pub fn take_transform(&mut self, pred: impl Fn(&Element) -> bool) -> Option<Transform> {
        match self.take_value(pred, |v| matches!(v, ResolvedValue::Transform(_)))? {
            ResolvedValue::Transform(t) => Some(t),
            _ => None,
        }
    }

    /// All gradient stops carried by the children, in document order.
    pub fn take_stops(&mut self) -> Vec<GradientStop> {
        let mut stops = Vec::new();
        for child in &mut self.children {
            if let Some(ResolvedValue::GradientStops(s)) = child.value.take() {
                stops.extend(s);
            }
        }
        stops
    }
}
