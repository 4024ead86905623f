//! Unit conversion utilities.
//!
//! Page markup is expressed in device independent units of 1/96 inch.

/// Native markup units per inch.
pub const XPS_UNITS_PER_INCH: f32 = 96.0;

/// Page width used when neither the fixed document nor the page gives one (US Letter).
pub const DEFAULT_PAGE_WIDTH: f32 = 816.0;

/// Page height used when neither the fixed document nor the page gives one (US Letter).
pub const DEFAULT_PAGE_HEIGHT: f32 = 1056.0;

/// Pixel extent of `units` at the given resolution, never less than one pixel.
#[inline]
pub fn units_to_pixels(units: f32, dpi: f32) -> u32 {
    ((units * dpi / XPS_UNITS_PER_INCH).round() as u32).max(1)
}

/// Markup units to typographic points.
#[inline]
pub fn units_to_pt(units: f32) -> f32 {
    units * 72.0 / XPS_UNITS_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_to_pixels() {
        assert_eq!(units_to_pixels(DEFAULT_PAGE_WIDTH, 96.0), 816);
        assert_eq!(units_to_pixels(DEFAULT_PAGE_WIDTH, 72.0), 612);
        assert_eq!(units_to_pixels(0.0, 72.0), 1);
    }

    #[test]
    fn test_units_to_pt() {
        assert_eq!(units_to_pt(96.0), 72.0);
    }
}
