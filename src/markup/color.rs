//! Colour attribute parsing.
//!
//! Colours are written `#RRGGBB` (opaque) or `#AARRGGBB`. Anything else,
//! including the `sc#` floating point form, is treated as unparseable and
//! yields fully transparent black.

use tiny_skia::ColorU8;

/// Fully transparent black, the result of any parse failure.
#[inline]
pub fn transparent() -> ColorU8 {
    ColorU8::from_rgba(0, 0, 0, 0)
}

/// Parse a colour attribute value.
///
/// Returns `None` for malformed values; use [`parse_color_or_transparent`]
/// where the caller wants the documented fallback.
pub fn parse_color(value: &str) -> Option<ColorU8> {
    let hex = value.trim().strip_prefix('#')?.as_bytes();
    let byte = |i: usize| -> Option<u8> { Some((hex_digit(hex[i])? << 4) | hex_digit(hex[i + 1])?) };
    match hex.len() {
        6 => Some(ColorU8::from_rgba(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(ColorU8::from_rgba(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
        _ => None,
    }
}

/// Parse a colour attribute value, falling back to transparent.
#[inline]
pub fn parse_color_or_transparent(value: &str) -> ColorU8 {
    parse_color(value).unwrap_or_else(|| {
        log::debug!("unparseable colour '{}'", value);
        transparent()
    })
}

#[inline]
fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Packed `0xAARRGGBB` value, used as a stable ordering key.
#[inline]
pub fn argb_key(color: ColorU8) -> u32 {
    u32::from_be_bytes([color.alpha(), color.red(), color.green(), color.blue()])
}

/// Per-channel arithmetic mean of two colours, alpha included.
#[inline]
pub fn mean_color(a: ColorU8, b: ColorU8) -> ColorU8 {
    let avg = |x: u8, y: u8| ((x as u16 + y as u16) / 2) as u8;
    ColorU8::from_rgba(
        avg(a.red(), b.red()),
        avg(a.green(), b.green()),
        avg(a.blue(), b.blue()),
        avg(a.alpha(), b.alpha()),
    )
}

/// Scale a colour's alpha by `opacity` (clamped to 0..=1).
#[inline]
pub fn with_opacity(color: ColorU8, opacity: f32) -> ColorU8 {
    let alpha = (color.alpha() as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    ColorU8::from_rgba(color.red(), color.green(), color.blue(), alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(c: ColorU8) -> (u8, u8, u8, u8) {
        (c.red(), c.green(), c.blue(), c.alpha())
    }

    #[test]
    fn test_rgb() {
        assert_eq!(rgba(parse_color("#FF8000").unwrap()), (255, 128, 0, 255));
        assert_eq!(rgba(parse_color(" #ff8000 ").unwrap()), (255, 128, 0, 255));
    }

    #[test]
    fn test_argb() {
        assert_eq!(rgba(parse_color("#80FF0000").unwrap()), (255, 0, 0, 128));
    }

    #[test]
    fn test_malformed() {
        assert!(parse_color("FF8000").is_none());
        assert!(parse_color("#FF80").is_none());
        assert!(parse_color("#GG8000").is_none());
        assert!(parse_color("sc#1,0.5,0.5,0.5").is_none());
        assert!(parse_color("#").is_none());
        assert_eq!(rgba(parse_color_or_transparent("#12345")), (0, 0, 0, 0));
    }

    #[test]
    fn test_mean_and_key() {
        let a = ColorU8::from_rgba(0, 100, 200, 255);
        let b = ColorU8::from_rgba(100, 200, 0, 1);
        assert_eq!(rgba(mean_color(a, b)), (50, 150, 100, 128));
        assert_eq!(argb_key(ColorU8::from_rgba(1, 2, 3, 4)), 0x04010203);
    }

    #[test]
    fn test_with_opacity() {
        let c = with_opacity(ColorU8::from_rgba(10, 20, 30, 200), 0.5);
        assert_eq!(rgba(c), (10, 20, 30, 100));
    }
}
