//! Geometry helpers shared by the markup readers and the renderer.
//!
//! Coordinates are kept in `f32` and transforms are `tiny_skia::Transform`
//! values, so the raster painter can use them without conversion.

use serde::{Deserialize, Serialize};
use tiny_skia::{Point, Rect, Transform};

/// Parse a single number attribute, tolerating surrounding whitespace.
#[inline]
pub fn parse_f32(value: &str) -> Option<f32> {
    fast_float2::parse::<f32, _>(value.trim()).ok()
}

/// Split a comma/space separated list of numbers.
///
/// Returns `None` as soon as one item fails to parse.
pub fn parse_number_list(value: &str) -> Option<Vec<f32>> {
    value
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|s| !s.is_empty())
        .map(parse_f32)
        .collect()
}

/// Parse a `x,y` point.
pub fn parse_point(value: &str) -> Option<Point> {
    match parse_number_list(value)?.as_slice() {
        [x, y] => Some(Point::from_xy(*x, *y)),
        _ => None,
    }
}

/// Parse a `x,y,width,height` box as used by `Viewbox` and `Viewport`.
///
/// A box without positive width and height yields `None`.
pub fn parse_rect(value: &str) -> Option<Rect> {
    match parse_number_list(value)?.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Rect::from_xywh(*x, *y, *w, *h),
        _ => None,
    }
}

/// Parse a six-component affine matrix `m11,m12,m21,m22,dx,dy`.
///
/// A value starting with `{` is a resource reference, which is not
/// supported and yields `None`.
pub fn parse_matrix(value: &str) -> Option<Transform> {
    let value = value.trim();
    if value.starts_with('{') {
        log::debug!("resource reference in matrix attribute ignored: {}", value);
        return None;
    }
    match parse_number_list(value)?.as_slice() {
        [m11, m12, m21, m22, dx, dy] => Some(Transform::from_row(*m11, *m12, *m21, *m22, *dx, *dy)),
        _ => None,
    }
}

/// Transform that maps `from` onto `to`, scaling each axis independently.
pub fn rect_to_rect(from: &Rect, to: &Rect) -> Option<Transform> {
    if from.width() <= 0.0 || from.height() <= 0.0 {
        return None;
    }
    let sx = to.width() / from.width();
    let sy = to.height() / from.height();
    Some(Transform::from_row(
        sx,
        0.0,
        0.0,
        sy,
        to.x() - from.x() * sx,
        to.y() - from.y() * sy,
    ))
}

/// A rectangle whose coordinates are fractions of the page size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl NormalizedRect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Map a box in page units through `transform` and normalize it
    /// against the page size.
    ///
    /// The result is the axis-aligned bounds of the transformed corners.
    pub fn from_page_box(
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        transform: &Transform,
        page_width: f32,
        page_height: f32,
    ) -> Self {
        let mut corners = [
            Point::from_xy(left, top),
            Point::from_xy(right, top),
            Point::from_xy(right, bottom),
            Point::from_xy(left, bottom),
        ];
        transform.map_points(&mut corners);

        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for p in &corners {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let w = if page_width > 0.0 { page_width as f64 } else { 1.0 };
        let h = if page_height > 0.0 { page_height as f64 } else { 1.0 };
        Self::new(
            min_x as f64 / w,
            min_y as f64 / h,
            max_x as f64 / w,
            max_y as f64 / h,
        )
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Vertical centre, used to group characters into lines.
    #[inline]
    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matrix() {
        let t = parse_matrix("1,0,0,1,10,20").unwrap();
        assert_eq!((t.sx, t.ky, t.kx, t.sy, t.tx, t.ty), (1.0, 0.0, 0.0, 1.0, 10.0, 20.0));

        let t = parse_matrix("0.5 0 0 2 0 0").unwrap();
        assert_eq!((t.sx, t.sy), (0.5, 2.0));

        assert!(parse_matrix("{StaticResource m}").is_none());
        assert!(parse_matrix("1,0,0,1").is_none());
        assert!(parse_matrix("1,0,0,1,x,0").is_none());
    }

    #[test]
    fn test_parse_point_and_rect() {
        let p = parse_point("3.5,-2").unwrap();
        assert_eq!((p.x, p.y), (3.5, -2.0));
        assert!(parse_point("1").is_none());

        let r = parse_rect("0,0,96,48").unwrap();
        assert_eq!((r.width(), r.height()), (96.0, 48.0));
        assert!(parse_rect("0,0,0,0").is_none());
        assert!(parse_rect("0,0,10,-1").is_none());
        assert!(parse_rect("5,5,0,10").is_none());
    }

    #[test]
    fn test_rect_to_rect() {
        let from = Rect::from_xywh(10.0, 10.0, 20.0, 20.0).unwrap();
        let to = Rect::from_xywh(0.0, 0.0, 1.0, 2.0).unwrap();
        let t = rect_to_rect(&from, &to).unwrap();
        let mut pts = [Point::from_xy(10.0, 10.0), Point::from_xy(30.0, 30.0)];
        t.map_points(&mut pts);
        assert_eq!((pts[0].x, pts[0].y), (0.0, 0.0));
        assert_eq!((pts[1].x, pts[1].y), (1.0, 2.0));
    }

    #[test]
    fn test_normalized_box() {
        let r = NormalizedRect::from_page_box(
            10.0,
            20.0,
            30.0,
            40.0,
            &Transform::identity(),
            100.0,
            200.0,
        );
        assert_eq!(r, NormalizedRect::new(0.1, 0.1, 0.3, 0.2));
        assert!((r.width() - 0.2).abs() < 1e-9);
    }
}
