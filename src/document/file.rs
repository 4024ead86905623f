//! The opened XPS document.

use super::fixed_doc::{read_document, read_outline, read_sequence};
use super::outline::{OutlineBuilder, OutlineEntry};
use super::page::{XpsPage, read_page_size};
use super::properties::parse_core_properties;
use crate::common::unit::{DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH, units_to_pixels};
use crate::common::{Error, Metadata, Result};
use crate::fonts::FontCache;
use crate::package::constants::relationship_type;
use crate::package::{PACKAGE_URI, PackURI, PhysPkgReader, Relationships};
use crate::render::{RenderOptions, TextPage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use tiny_skia::Pixmap;

/// Where a named link target lives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkTarget {
    /// Global page index
    pub page: usize,
    /// Position on the page as fractions of its size, when the name
    /// belongs to a glyph run on that page
    pub position: Option<(f64, f64)>,
}

/// An XPS or OpenXPS document.
///
/// Opening reads the package manifests and builds the page list, the link
/// target map and the outline. Pages are rendered on demand; each page
/// keeps its most recent raster.
///
/// `XpsFile` is `Send + Sync`: different pages may be rendered from
/// different threads at the same time.
///
/// # Examples
///
/// ```rust,no_run
/// use xpsview::XpsFile;
///
/// let doc = XpsFile::open("report.xps")?;
/// println!("{} pages", doc.page_count());
///
/// let pixmap = doc.render_page_at_dpi(0, 150.0)?;
/// pixmap.save_png("page1.png").ok();
///
/// println!("{}", doc.export_text()?);
/// # Ok::<(), xpsview::common::Error>(())
/// ```
#[derive(Debug)]
pub struct XpsFile {
    package: PhysPkgReader,
    fonts: FontCache,
    options: RenderOptions,
    pages: Vec<XpsPage>,
    link_targets: HashMap<String, usize>,
    outline: Vec<OutlineEntry>,
    core_properties: Option<PackURI>,
    thumbnail: Option<PackURI>,
    signature_origin: Option<PackURI>,
}

impl XpsFile {
    /// Open a document from a file path with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, RenderOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: RenderOptions) -> Result<Self> {
        let package = PhysPkgReader::open(path)?;
        Self::load(package, options)
    }

    /// Open a document held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes_with_options(bytes, RenderOptions::default())
    }

    pub fn from_bytes_with_options(bytes: Vec<u8>, options: RenderOptions) -> Result<Self> {
        let package = PhysPkgReader::from_bytes(bytes)?;
        Self::load(package, options)
    }

    /// Open a document by draining `reader`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let package = PhysPkgReader::from_reader(reader)?;
        Self::load(package, RenderOptions::default())
    }

    fn load(package: PhysPkgReader, options: RenderOptions) -> Result<Self> {
        let root = PackURI::new(PACKAGE_URI).map_err(Error::InvalidFormat)?;
        let rels = package
            .rels_for(&root)?
            .ok_or_else(|| Error::MissingPart("/_rels/.rels".to_string()))?;

        let fixed = rels
            .find(relationship_type::is_fixed_representation)
            .ok_or_else(|| Error::MissingPart("fixed representation relationship".to_string()))?
            .target_partname()?;

        let mut file = Self {
            fonts: FontCache::new(options.default_font_family.clone()),
            options,
            pages: Vec::new(),
            link_targets: HashMap::new(),
            outline: Vec::new(),
            core_properties: optional_target(&rels, relationship_type::CORE_PROPERTIES),
            thumbnail: optional_target(&rels, relationship_type::THUMBNAIL),
            signature_origin: optional_target(&rels, relationship_type::DIGITAL_SIGNATURE_ORIGIN),
            package,
        };

        let documents = read_sequence(&file.package, &fixed)?;
        if documents.is_empty() {
            log::warn!("{} references no documents", fixed);
        }
        for doc_uri in &documents {
            file.add_document(doc_uri)?;
        }

        log::debug!(
            "loaded {} pages from {} documents, {} outline entries",
            file.pages.len(),
            documents.len(),
            file.outline.len()
        );
        Ok(file)
    }

    fn add_document(&mut self, doc_uri: &PackURI) -> Result<()> {
        let document = read_document(&self.package, doc_uri)?;
        let offset = self.pages.len();

        for page in document.pages {
            let (width, height) = read_page_size(&self.package, &page.uri).unwrap_or_else(|| {
                (
                    page.width.filter(|w| *w > 0.0).unwrap_or(DEFAULT_PAGE_WIDTH),
                    page.height.filter(|h| *h > 0.0).unwrap_or(DEFAULT_PAGE_HEIGHT),
                )
            });
            self.pages.push(XpsPage::new(page.uri, width, height));
        }
        for (name, local) in document.link_targets {
            self.link_targets.insert(name, offset + local);
        }

        if let Some(structure) = &document.structure {
            match read_outline(&self.package, structure) {
                Ok(items) => {
                    let mut builder = OutlineBuilder::new();
                    for item in items {
                        let mut entry = OutlineEntry::new(item.title, item.level);
                        entry.page = item
                            .target
                            .as_ref()
                            .and_then(|t| self.link_targets.get(t).copied());
                        entry.target = item.target;
                        builder.push(entry);
                    }
                    self.outline.extend(builder.finish());
                },
                Err(e) => log::debug!("outline of {} skipped: {}", doc_uri, e),
            }
        }
        Ok(())
    }

    /// Number of pages across all documents.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Result<&XpsPage> {
        self.pages.get(index).ok_or(Error::PageOutOfRange {
            index,
            count: self.pages.len(),
        })
    }

    pub fn pages(&self) -> &[XpsPage] {
        &self.pages
    }

    /// Size of a page in 1/96 inch.
    pub fn page_size(&self, index: usize) -> Result<(f32, f32)> {
        Ok(self.page(index)?.size())
    }

    /// Rasterize a page at an exact pixel size.
    pub fn render_page(&self, index: usize, width: u32, height: u32) -> Result<Arc<Pixmap>> {
        self.page(index)?
            .render(&self.package, &self.fonts, &self.options, width, height)
    }

    /// Rasterize a page at a resolution, keeping its aspect ratio.
    pub fn render_page_at_dpi(&self, index: usize, dpi: f32) -> Result<Arc<Pixmap>> {
        let (w, h) = self.page_size(index)?;
        self.render_page(index, units_to_pixels(w, dpi), units_to_pixels(h, dpi))
    }

    /// Render every page at `dpi`, several pages at a time.
    #[cfg(feature = "parallel")]
    pub fn render_all(&self, dpi: f32) -> Vec<Result<Arc<Pixmap>>> {
        use rayon::prelude::*;

        (0..self.pages.len())
            .into_par_iter()
            .map(|index| self.render_page_at_dpi(index, dpi))
            .collect()
    }

    /// Positioned characters of a page.
    pub fn text_page(&self, index: usize) -> Result<TextPage> {
        Ok(self.page(index)?.text(&self.package, &self.fonts))
    }

    /// Plain text of the whole document, one block per page, pages
    /// separated by a newline.
    pub fn export_text(&self) -> Result<String> {
        let mut out = Vec::new();
        self.export_text_to(&mut out)?;
        String::from_utf8(out).map_err(|e| Error::Other(e.to_string()))
    }

    /// [`XpsFile::export_text`] written to `writer`.
    pub fn export_text_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                writer.write_all(b"\n")?;
            }
            let text = page
                .text(&self.package, &self.fonts)
                .text_with_tolerance(self.options.line_tolerance);
            writer.write_all(text.as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Outline entries of all documents, in document order.
    pub fn outline(&self) -> &[OutlineEntry] {
        &self.outline
    }

    /// Resolve a named link target.
    ///
    /// The position is found by scanning the target page for a glyph run
    /// with that name.
    pub fn link_target(&self, name: &str) -> Option<LinkTarget> {
        let page = *self.link_targets.get(name)?;
        let position = self
            .pages
            .get(page)?
            .anchors(&self.package, &self.fonts)
            .remove(name);
        Some(LinkTarget { page, position })
    }

    /// Names of all declared link targets.
    pub fn link_target_names(&self) -> impl Iterator<Item = &str> {
        self.link_targets.keys().map(String::as_str)
    }

    /// Core properties of the package, or empty metadata when it has none.
    pub fn metadata(&self) -> Result<Metadata> {
        let Some(uri) = &self.core_properties else {
            return Ok(Metadata::default());
        };
        match self.package.blob_for(uri) {
            Ok(xml) => parse_core_properties(&xml),
            Err(e) => {
                log::warn!("core properties {} unavailable: {}", uri, e);
                Ok(Metadata::default())
            },
        }
    }

    /// Bytes of the package thumbnail image, if there is one.
    pub fn thumbnail(&self) -> Result<Option<Vec<u8>>> {
        match &self.thumbnail {
            Some(uri) => Ok(Some(self.package.blob_for(uri)?)),
            None => Ok(None),
        }
    }

    /// The digital signature origin part, present when the package is signed.
    pub fn signature_origin(&self) -> Option<&PackURI> {
        self.signature_origin.as_ref()
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Number of font resources resolved so far.
    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    /// Close the document, releasing the package and every loaded font.
    pub fn close(self) {
        self.fonts.clear();
    }
}

fn optional_target(rels: &Relationships, reltype: &str) -> Option<PackURI> {
    let rel = rels.by_type(reltype)?;
    match rel.target_partname() {
        Ok(uri) => Some(uri),
        Err(e) => {
            log::debug!("relationship {} ignored: {}", rel.r_id(), e);
            None
        },
    }
}
