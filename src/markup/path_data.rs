//! Parser for the abbreviated path geometry syntax used by `Path.Data`.
//!
//! The syntax is a sequence of single-letter commands, each followed by as
//! many coordinate groups as it consumes; a command letter repeats for every
//! further group that follows it. Upper-case commands take absolute
//! coordinates, lower-case ones are relative to the current point at the
//! start of each individual operation.
//!
//! Malformed input never fails the page: parsing stops at the last complete
//! operation and whatever was read so far is returned.

use tiny_skia::{FillRule as SkiaFillRule, Path, PathBuilder, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    EvenOdd,
    NonZero,
}

impl From<FillRule> for SkiaFillRule {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::EvenOdd => SkiaFillRule::EvenOdd,
            FillRule::NonZero => SkiaFillRule::Winding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CubicTo(Point, Point, Point),
    /// Elliptical arc; renderers approximate it with a straight segment
    /// to `end`.
    ArcTo {
        size: Point,
        rotation: f32,
        large_arc: bool,
        sweep: bool,
        end: Point,
    },
    Close,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathGeometry {
    pub fill_rule: FillRule,
    pub segments: Vec<Segment>,
}

impl PathGeometry {
    /// Parse abbreviated path data.
    pub fn parse(data: &str) -> Self {
        PathParser::new(data).run()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Convert to a tiny-skia path. Returns `None` for geometry that
    /// encloses nothing drawable (for example a lone move).
    pub fn to_path(&self) -> Option<Path> {
        let mut pb = PathBuilder::new();
        for seg in &self.segments {
            match *seg {
                Segment::MoveTo(p) => pb.move_to(p.x, p.y),
                Segment::LineTo(p) => pb.line_to(p.x, p.y),
                Segment::QuadTo(c, p) => pb.quad_to(c.x, c.y, p.x, p.y),
                Segment::CubicTo(c1, c2, p) => pb.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
                Segment::ArcTo { end, .. } => pb.line_to(end.x, end.y),
                Segment::Close => pb.close(),
            }
        }
        pb.finish()
    }

    /// End points of each subpath, with whether it was closed.
    pub fn subpaths(&self) -> Vec<(Vec<Point>, bool)> {
        let mut out: Vec<(Vec<Point>, bool)> = Vec::new();
        let mut start = Point::zero();
        for seg in &self.segments {
            match *seg {
                Segment::MoveTo(p) => {
                    start = p;
                    out.push((vec![p], false));
                },
                Segment::Close => {
                    if let Some(last) = out.last_mut() {
                        last.1 = true;
                    }
                    out.push((vec![start], false));
                },
                Segment::LineTo(p)
                | Segment::QuadTo(_, p)
                | Segment::CubicTo(_, _, p)
                | Segment::ArcTo { end: p, .. } => match out.last_mut() {
                    Some(last) => last.0.push(p),
                    None => out.push((vec![Point::zero(), p], false)),
                },
            }
        }
        // Drop the implicit subpath opened by a trailing close.
        out.retain(|(points, closed)| *closed || points.len() > 1);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f32),
    Comma,
    Command(u8),
    Eof,
    Invalid,
}

struct Tokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn next(&mut self) -> Token {
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let Some(&ch) = self.data.get(self.pos) else {
            return Token::Eof;
        };
        match ch {
            b'0'..=b'9' | b'+' | b'-' | b'.' => {
                match fast_float2::parse_partial::<f32, _>(&self.data[self.pos..]) {
                    Ok((value, len)) if len > 0 => {
                        self.pos += len;
                        Token::Number(value)
                    },
                    _ => Token::Invalid,
                }
            },
            b',' => {
                self.pos += 1;
                Token::Comma
            },
            c if c.is_ascii_alphabetic() => {
                self.pos += 1;
                Token::Command(c)
            },
            _ => Token::Invalid,
        }
    }
}

struct PathParser<'a> {
    tokens: Tokenizer<'a>,
    lookahead: Token,
    geometry: PathGeometry,
    current: Point,
    subpath_start: Point,
    /// Second control point of the previous segment when it was a cubic
    /// (`C` or `S`), for reflection by `S`.
    last_cubic_ctrl: Option<Point>,
}

impl<'a> PathParser<'a> {
    fn new(data: &'a str) -> Self {
        let mut tokens = Tokenizer {
            data: data.as_bytes(),
            pos: 0,
        };
        let lookahead = tokens.next();
        Self {
            tokens,
            lookahead,
            geometry: PathGeometry::default(),
            current: Point::zero(),
            subpath_start: Point::zero(),
            last_cubic_ctrl: None,
        }
    }

    fn advance(&mut self) {
        self.lookahead = self.tokens.next();
    }

    fn run(mut self) -> PathGeometry {
        loop {
            match self.lookahead {
                Token::Eof => break,
                Token::Command(c) => {
                    self.advance();
                    if self.command(c).is_none() {
                        log::debug!("malformed path data, truncated after command '{}'", c as char);
                        break;
                    }
                },
                other => {
                    log::debug!("malformed path data, unexpected {:?}", other);
                    break;
                },
            }
        }
        self.geometry
    }

    #[inline]
    fn at_number(&self) -> bool {
        matches!(self.lookahead, Token::Number(_) | Token::Comma)
    }

    fn number(&mut self) -> Option<f32> {
        if self.lookahead == Token::Comma {
            self.advance();
        }
        match self.lookahead {
            Token::Number(n) => {
                self.advance();
                Some(n)
            },
            _ => None,
        }
    }

    fn point(&mut self, relative: bool, origin: Point) -> Option<Point> {
        let x = self.number()?;
        let y = self.number()?;
        Some(if relative {
            Point::from_xy(origin.x + x, origin.y + y)
        } else {
            Point::from_xy(x, y)
        })
    }

    fn flag(&mut self) -> Option<bool> {
        match self.number()? {
            n if n == 0.0 => Some(false),
            n if n == 1.0 => Some(true),
            _ => None,
        }
    }

    fn push(&mut self, seg: Segment) {
        self.geometry.segments.push(seg);
    }

    /// Handle one command letter and its implicit repetitions.
    fn command(&mut self, cmd: u8) -> Option<()> {
        let relative = cmd.is_ascii_lowercase();
        let mut first = true;

        match cmd.to_ascii_uppercase() {
            b'F' => {
                if !self.geometry.segments.is_empty() {
                    return None;
                }
                self.geometry.fill_rule = match self.number()? {
                    n if n == 0.0 => FillRule::EvenOdd,
                    n if n == 1.0 => FillRule::NonZero,
                    _ => return None,
                };
                return Some(());
            },
            b'Z' => {
                self.push(Segment::Close);
                self.current = self.subpath_start;
                self.last_cubic_ctrl = None;
                return Some(());
            },
            _ => {},
        }

        while first || self.at_number() {
            first = false;
            let origin = self.current;
            let mut cubic_ctrl = None;

            match cmd.to_ascii_uppercase() {
                b'M' => {
                    let p = self.point(relative, origin)?;
                    self.push(Segment::MoveTo(p));
                    self.subpath_start = p;
                    self.current = p;
                },
                b'L' => {
                    let p = self.point(relative, origin)?;
                    self.push(Segment::LineTo(p));
                    self.current = p;
                },
                b'H' => {
                    let x = self.number()?;
                    let p = Point::from_xy(if relative { origin.x + x } else { x }, origin.y);
                    self.push(Segment::LineTo(p));
                    self.current = p;
                },
                b'V' => {
                    let y = self.number()?;
                    let p = Point::from_xy(origin.x, if relative { origin.y + y } else { y });
                    self.push(Segment::LineTo(p));
                    self.current = p;
                },
                b'C' => {
                    let c1 = self.point(relative, origin)?;
                    let c2 = self.point(relative, origin)?;
                    let p = self.point(relative, origin)?;
                    self.push(Segment::CubicTo(c1, c2, p));
                    self.current = p;
                    cubic_ctrl = Some(c2);
                },
                b'Q' => {
                    let c = self.point(relative, origin)?;
                    let p = self.point(relative, origin)?;
                    self.push(Segment::QuadTo(c, p));
                    self.current = p;
                },
                b'S' => {
                    let c1 = match self.last_cubic_ctrl {
                        Some(prev) => Point::from_xy(2.0 * origin.x - prev.x, 2.0 * origin.y - prev.y),
                        None => origin,
                    };
                    let c2 = self.point(relative, origin)?;
                    let p = self.point(relative, origin)?;
                    self.push(Segment::CubicTo(c1, c2, p));
                    self.current = p;
                    cubic_ctrl = Some(c2);
                },
                b'A' => {
                    let size = Point::from_xy(self.number()?, self.number()?);
                    let rotation = self.number()?;
                    let large_arc = self.flag()?;
                    let sweep = self.flag()?;
                    let end = self.point(relative, origin)?;
                    self.push(Segment::ArcTo {
                        size,
                        rotation,
                        large_arc,
                        sweep,
                        end,
                    });
                    self.current = end;
                },
                _ => return None,
            }

            self.last_cubic_ctrl = cubic_ctrl;
        }

        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(v: &[(f32, f32)]) -> Vec<Point> {
        v.iter().map(|&(x, y)| Point::from_xy(x, y)).collect()
    }

    #[test]
    fn test_closed_triangle() {
        let g = PathGeometry::parse("M 0,0 L 10,0 L 10,10 Z");
        assert_eq!(g.fill_rule, FillRule::EvenOdd);
        assert_eq!(
            g.subpaths(),
            vec![(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]), true)]
        );
        assert_eq!(g.segments.last(), Some(&Segment::Close));
        assert!(g.to_path().is_some());
    }

    #[test]
    fn test_relative_matches_absolute() {
        let abs = PathGeometry::parse("M 0,0 L 10,0");
        let rel = PathGeometry::parse("m 0,0 l 10,0");
        assert_eq!(abs, rel);
    }

    #[test]
    fn test_relative_is_per_repetition() {
        let g = PathGeometry::parse("M 1,1 l 1,0 1,0 1,0");
        assert_eq!(
            g.subpaths()[0].0,
            pts(&[(1.0, 1.0), (2.0, 1.0), (3.0, 1.0), (4.0, 1.0)])
        );
    }

    #[test]
    fn test_horizontal_and_vertical() {
        let g = PathGeometry::parse("M 5 5 H 10 v 3 h -2 V 0");
        assert_eq!(
            g.subpaths()[0].0,
            pts(&[(5.0, 5.0), (10.0, 5.0), (10.0, 8.0), (8.0, 8.0), (8.0, 0.0)])
        );
    }

    #[test]
    fn test_fill_rule() {
        assert_eq!(PathGeometry::parse("F 1 M 0,0 L 1,1").fill_rule, FillRule::NonZero);
        assert_eq!(PathGeometry::parse("F0 M 0,0 L 1,1").fill_rule, FillRule::EvenOdd);

        // F after geometry is a grammar error; the path stops before it.
        let g = PathGeometry::parse("M 0,0 L 1,1 F 1 L 2,2");
        assert_eq!(g.fill_rule, FillRule::EvenOdd);
        assert_eq!(g.segments.len(), 2);
    }

    #[test]
    fn test_quadratic_keeps_distinct_points() {
        let g = PathGeometry::parse("M 0,0 Q 5,10 10,0");
        assert_eq!(
            g.segments[1],
            Segment::QuadTo(Point::from_xy(5.0, 10.0), Point::from_xy(10.0, 0.0))
        );
    }

    #[test]
    fn test_smooth_cubic_reflects_previous_control() {
        let g = PathGeometry::parse("M 0,0 C 0,10 10,10 10,0 S 20,-10 20,0");
        assert_eq!(
            g.segments[2],
            Segment::CubicTo(
                Point::from_xy(10.0, -10.0),
                Point::from_xy(20.0, -10.0),
                Point::from_xy(20.0, 0.0)
            )
        );

        // Without a preceding cubic the first control is the current point.
        let g = PathGeometry::parse("M 3,4 S 5,5 6,6");
        assert_eq!(
            g.segments[1],
            Segment::CubicTo(Point::from_xy(3.0, 4.0), Point::from_xy(5.0, 5.0), Point::from_xy(6.0, 6.0))
        );
    }

    #[test]
    fn test_arc_is_consumed() {
        let g = PathGeometry::parse("M 0,0 A 5,5 0 1 0 10,0 L 10,10");
        assert!(matches!(
            g.segments[1],
            Segment::ArcTo { large_arc: true, sweep: false, end, .. } if end == Point::from_xy(10.0, 0.0)
        ));
        assert_eq!(g.segments[2], Segment::LineTo(Point::from_xy(10.0, 10.0)));
    }

    #[test]
    fn test_close_resets_current_point() {
        let g = PathGeometry::parse("M 5,5 L 10,5 z l 1,1");
        assert_eq!(g.segments[3], Segment::LineTo(Point::from_xy(6.0, 6.0)));
    }

    #[test]
    fn test_numbers() {
        let g = PathGeometry::parse("M .5,-1.5e1 L+2,3E0");
        assert_eq!(g.segments[0], Segment::MoveTo(Point::from_xy(0.5, -15.0)));
        assert_eq!(g.segments[1], Segment::LineTo(Point::from_xy(2.0, 3.0)));
    }

    #[test]
    fn test_malformed_input_truncates() {
        let g = PathGeometry::parse("M 0,0 L 10,0 L 20");
        assert_eq!(g.segments.len(), 2);

        let g = PathGeometry::parse("M 0,0 L 10,0 # L 5,5");
        assert_eq!(g.segments.len(), 2);

        let g = PathGeometry::parse("10,0");
        assert!(g.is_empty());

        assert!(PathGeometry::parse("").is_empty());
        assert!(PathGeometry::parse("M 0,0 X 1,1").segments.len() == 1);
    }
}
