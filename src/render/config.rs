/// Configuration types for page rendering and text extraction.
use tiny_skia::Color;

/// Options controlling how pages are rasterized and how text is grouped.
///
/// # Examples
///
/// ```rust
/// use xpsview::render::RenderOptions;
///
/// let options = RenderOptions::new()
///     .with_anti_alias(false)
///     .with_default_font_family("DejaVu Sans");
/// assert!(!options.anti_alias);
/// ```
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Colour the raster is cleared to before drawing
    pub background: Color,
    /// Whether paths and glyphs are anti-aliased
    pub anti_alias: bool,
    /// Installed font used when an embedded font cannot be resolved
    /// (requires the `system-fonts` feature)
    pub default_font_family: String,
    /// Vertical distance, as a fraction of character height, below which
    /// two characters are considered to be on the same line
    pub line_tolerance: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            anti_alias: true,
            default_font_family: "Arial".to_string(),
            line_tolerance: 0.5,
        }
    }
}

impl RenderOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    #[inline]
    pub fn with_anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }

    #[inline]
    pub fn with_default_font_family(mut self, family: impl Into<String>) -> Self {
        self.default_font_family = family.into();
        self
    }

    #[inline]
    pub fn with_line_tolerance(mut self, tolerance: f64) -> Self {
        self.line_tolerance = tolerance;
        self
    }
}
