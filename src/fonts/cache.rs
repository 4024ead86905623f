//! Per-package font cache.

use crate::fonts::obfuscation::{Guid, deobfuscate};
use crate::fonts::{FontError, LoadedFont};
use crate::package::{PackURI, PhysPkgReader};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::Path;

/// Outcome of one resolution: a font, or `None` once loading failed.
type Slot = Arc<OnceCell<Option<Arc<LoadedFont>>>>;

/// Advance used for every character when no font is available, in ems.
const APPROX_ADVANCE: f32 = 0.5;
const APPROX_ASCENT: f32 = 0.8;
const APPROX_LINE_HEIGHT: f32 = 1.2;

/// Font cache shared by all pages of one package.
///
/// Each resource is loaded at most once, even when several threads ask
/// for it at the same time. Failures are cached as well.
pub struct FontCache {
    slots: Mutex<HashMap<String, Slot>>,
    default_family: String,
    default_font: OnceCell<Option<Arc<LoadedFont>>>,
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache")
            .field("entries", &self.slots.lock().len())
            .field("default_family", &self.default_family)
            .finish()
    }
}

impl FontCache {
    /// `default_family` names the installed font used for unresolved
    /// resources when the `system-fonts` feature is enabled.
    pub fn new(default_family: impl Into<String>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            default_family: default_family.into(),
            default_font: OnceCell::new(),
        }
    }

    /// Resolve the font part `uri` (face `index`) of `pkg`.
    pub fn resolve(&self, pkg: &PhysPkgReader, uri: &PackURI, index: u32, em_size: f32) -> FontHandle {
        let key = if index == 0 {
            uri.as_str().to_string()
        } else {
            format!("{}#{}", uri, index)
        };
        self.resolve_with(&key, em_size, || match load_font_part(pkg, uri, index) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("failed to load font {}: {}", uri, e);
                None
            },
        })
    }

    /// Resolve `key`, running `load` only if no thread has resolved it yet.
    pub fn resolve_with<F>(&self, key: &str, em_size: f32, load: F) -> FontHandle
    where
        F: FnOnce() -> Option<LoadedFont>,
    {
        // Only hold the map lock long enough to fetch the slot, so loads of
        // different fonts proceed in parallel.
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(key.to_string()).or_default().clone()
        };
        let font = slot
            .get_or_init(|| load().map(Arc::new))
            .clone()
            .or_else(|| self.default_font());
        FontHandle { font, em_size }
    }

    /// Number of resources resolved so far, failures included.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Forget every resolved font.
    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    fn default_font(&self) -> Option<Arc<LoadedFont>> {
        self.default_font
            .get_or_init(|| self.load_default_font().map(Arc::new))
            .clone()
    }

    #[cfg(feature = "system-fonts")]
    fn load_default_font(&self) -> Option<LoadedFont> {
        match crate::fonts::loader::FontLoader::new().load_system_font(&self.default_family) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("no default font '{}': {}", self.default_family, e);
                None
            },
        }
    }

    #[cfg(not(feature = "system-fonts"))]
    fn load_default_font(&self) -> Option<LoadedFont> {
        log::debug!(
            "system font lookup disabled, using approximate metrics instead of '{}'",
            self.default_family
        );
        None
    }
}

/// Read a font part, deobfuscating it when it does not parse as is.
fn load_font_part(pkg: &PhysPkgReader, uri: &PackURI, index: u32) -> Result<LoadedFont, FontError> {
    let data = pkg
        .blob_for(uri)
        .map_err(|_| FontError::NotFound(uri.to_string()))?;

    let mut data = match LoadedFont::from_bytes(data.clone(), index) {
        Ok(font) => return Ok(font),
        Err(_) => data,
    };

    let guid = Guid::parse(uri.stem())?;
    deobfuscate(&mut data, &guid)?;
    LoadedFont::from_bytes(data, index)
}

/// A font at a given em size.
///
/// Without a font, metrics are approximated from the em size and no
/// outlines are available.
#[derive(Debug, Clone)]
pub struct FontHandle {
    font: Option<Arc<LoadedFont>>,
    em_size: f32,
}

impl FontHandle {
    /// Handle with approximate metrics only.
    pub fn approximate(em_size: f32) -> Self {
        Self { font: None, em_size }
    }

    #[inline]
    pub fn em_size(&self) -> f32 {
        self.em_size
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.font.is_some()
    }

    pub fn glyph_index(&self, c: char) -> Option<u16> {
        self.font.as_ref()?.glyph_index(c)
    }

    /// Advance of `c` in page units.
    pub fn char_advance(&self, c: char) -> f32 {
        self.glyph_index(c)
            .and_then(|g| self.glyph_advance(g))
            .unwrap_or(APPROX_ADVANCE * self.em_size)
    }

    /// Advance of a glyph in page units.
    pub fn glyph_advance(&self, glyph: u16) -> Option<f32> {
        Some(self.font.as_ref()?.glyph_advance(glyph)? * self.em_size)
    }

    pub fn ascent(&self) -> f32 {
        self.font
            .as_ref()
            .map_or(APPROX_ASCENT, |f| f.ascent())
            * self.em_size
    }

    pub fn line_height(&self) -> f32 {
        self.font
            .as_ref()
            .map_or(APPROX_LINE_HEIGHT, |f| f.line_height())
            * self.em_size
    }

    pub fn glyph_path(&self, glyph: u16, x: f32, baseline_y: f32, skew: f32) -> Option<Path> {
        self.font
            .as_ref()?
            .glyph_path(glyph, x, baseline_y, self.em_size, skew)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::package::phys_pkg::tests::build_zip;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// GUID naming the obfuscated fixture font part.
    pub(crate) const FONT_GUID: &str = "B5D3F3AD-4C1A-4A6C-9E2F-0123456789AB";

    pub(crate) const FIXTURE_FONT: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/fonts/DejaVuSansMono.ttf"));

    /// The fixture font obfuscated with [`FONT_GUID`].
    pub(crate) fn obfuscated_font() -> Vec<u8> {
        let mut data = FIXTURE_FONT.to_vec();
        deobfuscate(&mut data, &Guid::parse(FONT_GUID).unwrap()).unwrap();
        data
    }

    fn font_package(name: &str, data: &[u8]) -> (PhysPkgReader, PackURI) {
        let pkg = PhysPkgReader::from_bytes(build_zip(&[(name, data)])).unwrap();
        (pkg, PackURI::new(format!("/{}", name)).unwrap())
    }

    #[test]
    fn test_obfuscated_font_part_resolves() {
        let data = obfuscated_font();
        assert!(LoadedFont::from_bytes(data.clone(), 0).is_err());

        let (pkg, uri) = font_package(&format!("Resources/{}.odttf", FONT_GUID), &data);
        let cache = FontCache::new("Arial");
        let handle = cache.resolve(&pkg, &uri, 0, 10.0);
        assert!(handle.is_resolved());
        assert_eq!(cache.len(), 1);

        let h = handle.glyph_index('H').unwrap();
        let i = handle.glyph_index('i').unwrap();
        assert_ne!(h, i);
        // Monospaced: every advance is the same and below one em.
        let advance = handle.glyph_advance(h).unwrap();
        assert!(advance > 0.0 && advance < 10.0, "got {}", advance);
        assert_eq!(handle.glyph_advance(i), Some(advance));
        assert_eq!(handle.char_advance('H'), advance);
        assert!(handle.glyph_path(h, 0.0, 10.0, 0.0).is_some());
        assert!(handle.ascent() > 0.0);
    }

    #[test]
    fn test_plain_font_part_needs_no_guid() {
        let (pkg, uri) = font_package("Resources/Mono.ttf", FIXTURE_FONT);
        let font = load_font_part(&pkg, &uri, 0).unwrap();
        assert!(font.glyph_index('A').is_some());
    }

    #[test]
    fn test_load_runs_at_most_once_across_threads() {
        let cache = FontCache::new("Arial");
        let loads = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let handle = cache.resolve_with("/Resources/font.odttf", 12.0, || {
                        loads.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(std::time::Duration::from_millis(5));
                        None
                    });
                    assert_eq!(handle.em_size(), 12.0);
                });
            }
        });
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failures_are_cached_until_clear() {
        let cache = FontCache::new("Arial");
        let loads = AtomicUsize::new(0);
        let load = || {
            loads.fetch_add(1, Ordering::SeqCst);
            None
        };
        cache.resolve_with("/a.ttf", 10.0, load);
        cache.resolve_with("/a.ttf", 20.0, load);
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        cache.clear();
        assert!(cache.is_empty());
        cache.resolve_with("/a.ttf", 10.0, load);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_approximate_metrics() {
        let handle = FontHandle::approximate(10.0);
        assert!(!handle.is_resolved());
        assert_eq!(handle.char_advance('x'), 5.0);
        assert_eq!(handle.ascent(), 8.0);
        assert_eq!(handle.line_height(), 12.0);
        assert!(handle.glyph_path(1, 0.0, 0.0, 0.0).is_none());
    }

    #[test]
    fn test_unparseable_font_part_is_unresolved() {
        let zip = build_zip(&[("Resources/Arial.ttf", &[1u8; 48])]);
        let pkg = PhysPkgReader::from_bytes(zip).unwrap();
        let uri = PackURI::new("/Resources/Arial.ttf").unwrap();
        assert!(matches!(load_font_part(&pkg, &uri, 0), Err(FontError::InvalidGuid(_))));

        let missing = PackURI::new("/Resources/missing.ttf").unwrap();
        assert!(matches!(load_font_part(&pkg, &missing, 0), Err(FontError::NotFound(_))));
    }

    #[test]
    fn test_obfuscated_garbage_stays_invalid() {
        let zip = build_zip(&[(
            "Resources/B5D3F3AD-4C1A-4A6C-9E2F-0123456789AB.odttf",
            &[7u8; 48],
        )]);
        let pkg = PhysPkgReader::from_bytes(zip).unwrap();
        let uri = PackURI::new("/Resources/B5D3F3AD-4C1A-4A6C-9E2F-0123456789AB.odttf").unwrap();
        assert!(matches!(load_font_part(&pkg, &uri, 0), Err(FontError::InvalidData)));
    }
}
