//! A single fixed page.

use crate::common::error::{Error, Result};
use crate::fonts::FontCache;
use crate::markup::element::Element;
use crate::markup::{Brush, PathGeometry, StrokeStyle};
use crate::package::{PackURI, PhysPkgReader};
use crate::render::{DrawState, GlyphRun, PageResources, Painter, RasterPainter, RenderOptions, TextCollector, TextPage, interpret};
use parking_lot::Mutex;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{Pixmap, Point};

/// A page of the document: its part name, its size and the last raster
/// produced for it.
#[derive(Debug)]
pub struct XpsPage {
    uri: PackURI,
    width: f32,
    height: f32,
    cache: Mutex<Option<Arc<Pixmap>>>,
}

impl XpsPage {
    pub fn new(uri: PackURI, width: f32, height: f32) -> Self {
        Self {
            uri,
            width,
            height,
            cache: Mutex::new(None),
        }
    }

    #[inline]
    pub fn uri(&self) -> &PackURI {
        &self.uri
    }

    /// Page size in 1/96 inch.
    #[inline]
    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    fn resources<'a>(&'a self, package: &'a PhysPkgReader, fonts: &'a FontCache) -> PageResources<'a> {
        PageResources {
            package,
            page_uri: &self.uri,
            fonts,
        }
    }

    /// Rasterize the page at `width` x `height` pixels.
    ///
    /// The raster is cached: asking again for the same size returns the
    /// same `Arc` without reading the markup, a different size replaces
    /// the cached raster. A page whose markup is missing renders blank, and
    /// markup that breaks off midway keeps what was drawn before the break.
    pub fn render(
        &self,
        package: &PhysPkgReader,
        fonts: &FontCache,
        options: &RenderOptions,
        width: u32,
        height: u32,
    ) -> Result<Arc<Pixmap>> {
        let mut cache = self.cache.lock();
        if let Some(pixmap) = cache.as_ref() {
            if pixmap.width() == width && pixmap.height() == height {
                return Ok(Arc::clone(pixmap));
            }
        }

        let mut painter = RasterPainter::new(width, height, self.width, self.height, options)
            .ok_or_else(|| Error::Other(format!("cannot allocate a {}x{} raster", width, height)))?;

        match package.blob_for(&self.uri) {
            Ok(markup) => {
                if let Err(e) = interpret(&markup, self.resources(package, fonts), &mut painter) {
                    log::warn!("page {} rendered partially: {}", self.uri, e);
                }
            },
            Err(e) => log::warn!("page {} not found, rendering blank: {}", self.uri, e),
        }

        let pixmap = Arc::new(painter.finish());
        *cache = Some(Arc::clone(&pixmap));
        Ok(pixmap)
    }

    /// The raster currently cached for this page.
    pub fn cached(&self) -> Option<Arc<Pixmap>> {
        self.cache.lock().clone()
    }

    /// Extract the characters on the page with their boxes.
    pub fn text(&self, package: &PhysPkgReader, fonts: &FontCache) -> TextPage {
        let mut collector = TextCollector::new(self.width, self.height);
        match package.blob_for(&self.uri) {
            Ok(markup) => {
                if let Err(e) = interpret(&markup, self.resources(package, fonts), &mut collector) {
                    log::warn!("text of page {} extracted partially: {}", self.uri, e);
                }
            },
            Err(e) => log::warn!("page {} not found: {}", self.uri, e),
        }
        collector.finish()
    }

    /// Positions of the named glyph runs on the page, as page fractions.
    pub fn anchors(&self, package: &PhysPkgReader, fonts: &FontCache) -> HashMap<String, (f64, f64)> {
        let mut collector = AnchorCollector {
            anchors: HashMap::new(),
            width: self.width,
            height: self.height,
        };
        match package.blob_for(&self.uri) {
            Ok(markup) => {
                if let Err(e) = interpret(&markup, self.resources(package, fonts), &mut collector) {
                    log::debug!("anchors of page {} read partially: {}", self.uri, e);
                }
            },
            Err(e) => log::debug!("page {} not found: {}", self.uri, e),
        }
        collector.anchors
    }
}

/// Painter that only records where named elements sit.
struct AnchorCollector {
    anchors: HashMap<String, (f64, f64)>,
    width: f32,
    height: f32,
}

impl Painter for AnchorCollector {
    fn begin_page(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn fill_path(&mut self, _path: &PathGeometry, _brush: &Brush, _state: &DrawState) {}

    fn stroke_path(&mut self, _path: &PathGeometry, _brush: &Brush, _style: &StrokeStyle, _state: &DrawState) {}

    fn draw_glyphs(&mut self, _run: &GlyphRun<'_>, _state: &DrawState) {}

    fn named_element(&mut self, name: &str, origin: Point, state: &DrawState) {
        let mut p = [origin];
        state.transform.map_points(&mut p);
        let w = if self.width > 0.0 { self.width as f64 } else { 1.0 };
        let h = if self.height > 0.0 { self.height as f64 } else { 1.0 };
        self.anchors
            .entry(name.to_string())
            .or_insert((p[0].x as f64 / w, p[0].y as f64 / h));
    }
}

/// Read the `Width` and `Height` of a page from its root element without
/// parsing the rest of the markup.
pub fn read_page_size(package: &PhysPkgReader, uri: &PackURI) -> Option<(f32, f32)> {
    let markup = package.blob_for(uri).ok()?;
    let mut reader = Reader::from_reader(markup.as_slice());
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                return match Element::from_start(e) {
                    Element::FixedPage {
                        width: Some(w),
                        height: Some(h),
                    } if w > 0.0 && h > 0.0 => Some((w, h)),
                    _ => None,
                };
            },
            Ok(Event::Eof) | Err(_) => return None,
            _ => {},
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::phys_pkg::tests::build_zip;

    const PAGE: &str = r##"<FixedPage xmlns="http://schemas.microsoft.com/xps/2005/06" Width="100" Height="50">
  <Path Data="M 0,0 L 50,0 L 50,50 L 0,50 Z" Fill="#FFFF0000"/>
  <Glyphs Name="here" OriginX="25" OriginY="10" FontRenderingEmSize="12" UnicodeString="Hi" Fill="#FF000000"/>
</FixedPage>"##;

    fn fixture() -> (PhysPkgReader, FontCache) {
        let pkg = PhysPkgReader::from_bytes(build_zip(&[("Pages/1.fpage", PAGE.as_bytes())])).unwrap();
        (pkg, FontCache::new("Arial"))
    }

    fn page() -> XpsPage {
        XpsPage::new(PackURI::new("/Pages/1.fpage").unwrap(), 100.0, 50.0)
    }

    #[test]
    fn test_render_is_cached_per_size() {
        let (pkg, fonts) = fixture();
        let page = page();
        let options = RenderOptions::default();

        let first = page.render(&pkg, &fonts, &options, 100, 50).unwrap();
        let again = page.render(&pkg, &fonts, &options, 100, 50).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let larger = page.render(&pkg, &fonts, &options, 200, 100).unwrap();
        assert!(!Arc::ptr_eq(&first, &larger));
        assert_eq!(larger.width(), 200);
        assert!(Arc::ptr_eq(&page.cached().unwrap(), &larger));
    }

    #[test]
    fn test_render_draws_markup() {
        let (pkg, fonts) = fixture();
        let pixmap = page().render(&pkg, &fonts, &RenderOptions::default(), 100, 50).unwrap();
        let left = pixmap.pixel(10, 40).unwrap();
        let right = pixmap.pixel(90, 40).unwrap();
        assert_eq!((left.red(), left.green(), left.blue()), (255, 0, 0));
        assert_eq!((right.red(), right.green(), right.blue()), (255, 255, 255));
    }

    #[test]
    fn test_missing_page_renders_blank() {
        let (pkg, fonts) = fixture();
        let page = XpsPage::new(PackURI::new("/Pages/9.fpage").unwrap(), 100.0, 50.0);
        let pixmap = page.render(&pkg, &fonts, &RenderOptions::default(), 10, 5).unwrap();
        assert!(pixmap.pixels().iter().all(|p| p.red() == 255 && p.alpha() == 255));
        assert!(page.text(&pkg, &fonts).is_empty());
    }

    #[test]
    fn test_zero_size_is_an_error() {
        let (pkg, fonts) = fixture();
        assert!(page().render(&pkg, &fonts, &RenderOptions::default(), 0, 50).is_err());
    }

    #[test]
    fn test_text_and_anchors() {
        let (pkg, fonts) = fixture();
        let page = page();
        let text = page.text(&pkg, &fonts);
        assert_eq!(text.text(), "Hi");

        let anchors = page.anchors(&pkg, &fonts);
        let (x, y) = anchors["here"];
        assert!((x - 0.25).abs() < 1e-6);
        assert!((y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_read_page_size() {
        let (pkg, _) = fixture();
        assert_eq!(read_page_size(&pkg, &PackURI::new("/Pages/1.fpage").unwrap()), Some((100.0, 50.0)));
        assert_eq!(read_page_size(&pkg, &PackURI::new("/Pages/2.fpage").unwrap()), None);
    }
}
