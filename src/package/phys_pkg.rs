//! Provides a general interface to a physical XPS package (ZIP file).
//!
//! Parts are usually stored as a single ZIP entry, but the packaging rules
//! also allow an interleaved layout where a part is a folder of numbered
//! pieces (`[0].piece`, `[1].piece`, ... `[n].last.piece`). The reader
//! hides that difference: [`PhysPkgReader::blob_for`] returns the logical
//! bytes either way.

use crate::package::error::{PackageError, Result};
use crate::package::packuri::PackURI;
use crate::package::rel::Relationships;
use bytes::Bytes;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use zip::ZipArchive;

/// Upper bound on the buffer reserved up front from a declared entry size.
/// Larger entries still read in full, growing as data arrives.
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Physical package reader that provides access to parts in a ZIP container.
///
/// The archive bytes are held in a shared [`Bytes`] buffer. Each read works
/// on a clone of the archive handle, which shares the parsed central
/// directory, so lookups take `&self` and may run from several threads.
#[derive(Clone)]
pub struct PhysPkgReader {
    /// Parsed archive over the shared buffer
    archive: ZipArchive<Cursor<Bytes>>,

    /// Entry names in archive order, for piece and case-insensitive lookup
    members: Arc<Vec<String>>,
}

impl PhysPkgReader {
    /// Open a package from a file path.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, can't be read, or isn't a
    /// valid ZIP archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(PackageError::PackageNotFound(path.display().to_string()));
        }

        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Create a reader from owned bytes.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data.into()))?;
        let members = archive.file_names().map(String::from).collect();
        Ok(Self {
            archive,
            members: Arc::new(members),
        })
    }

    /// Create a reader by draining `reader`.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Get the logical content of a part.
    ///
    /// Lookup order: an entry with the exact member name, then an
    /// interleaved part stored as pieces under `<member>/`, then an entry
    /// whose name matches ignoring ASCII case (part names are
    /// case-insensitive and producers are not consistent about it).
    pub fn blob_for(&self, pack_uri: &PackURI) -> Result<Vec<u8>> {
        let membername = pack_uri.membername();

        if self.has_member(membername) {
            return self.read_member(membername);
        }

        if let Some(pieces) = self.pieces_of(membername) {
            let mut blob = Vec::new();
            for piece in &pieces {
                blob.extend_from_slice(&self.read_member(piece)?);
            }
            return Ok(blob);
        }

        if let Some(name) = self
            .members
            .iter()
            .find(|m| m.eq_ignore_ascii_case(membername))
        {
            return self.read_member(name);
        }

        Err(PackageError::PartNotFound(pack_uri.to_string()))
    }

    /// Get the parsed relationships for a source part.
    ///
    /// Returns `None` when the source has no `.rels` part.
    pub fn rels_for(&self, source_uri: &PackURI) -> Result<Option<Relationships>> {
        let rels_uri = source_uri.rels_uri().map_err(PackageError::InvalidPackUri)?;

        match self.blob_for(&rels_uri) {
            Ok(blob) => Ok(Some(Relationships::from_xml(&blob, source_uri.base_uri())?)),
            Err(PackageError::PartNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if a part exists in the package, in any storage layout.
    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        let membername = pack_uri.membername();
        self.has_member(membername)
            || self.pieces_of(membername).is_some()
            || self
                .members
                .iter()
                .any(|m| m.eq_ignore_ascii_case(membername))
    }

    /// List all ZIP entry names in the package.
    #[inline]
    pub fn member_names(&self) -> &[String] {
        &self.members
    }

    /// Get the number of ZIP entries in the package.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the package is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn has_member(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    fn read_member(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.clone();
        let mut file = archive
            .by_name(name)
            .map_err(|_| PackageError::PartNotFound(format!("/{}", name)))?;
        let mut blob = Vec::with_capacity(initial_capacity(file.size()));
        file.read_to_end(&mut blob)?;
        Ok(blob)
    }

    /// Entry names of the pieces making up `membername`, in numeric order.
    ///
    /// Only direct children of the part folder count; nested entries are
    /// ignored. Returns `None` when there are no pieces at all.
    fn pieces_of(&self, membername: &str) -> Option<Vec<String>> {
        if membername.is_empty() {
            return None;
        }
        let prefix = format!("{}/", membername);
        let mut pieces: Vec<(u32, bool, &String)> = self
            .members
            .iter()
            .filter_map(|m| {
                let leaf = m.strip_prefix(&prefix)?;
                if leaf.contains('/') {
                    return None;
                }
                let (index, last) = parse_piece_name(leaf)?;
                Some((index, last, m))
            })
            .collect();

        if pieces.is_empty() {
            return None;
        }

        pieces.sort_by_key(|(index, last, _)| (*index, *last));
        if !pieces.iter().any(|(_, last, _)| *last) {
            log::debug!("interleaved part {} has no terminal piece", membername);
        }
        Some(pieces.into_iter().map(|(_, _, m)| m.clone()).collect())
    }
}

/// Parse `[N].piece` or `[N].last.piece` (case-insensitively) into the
/// piece index and whether it is the terminal piece.
pub fn parse_piece_name(leaf: &str) -> Option<(u32, bool)> {
    let rest = leaf.strip_prefix('[')?;
    let close = memchr::memchr(b']', rest.as_bytes())?;
    let index = rest[..close].parse::<u32>().ok()?;
    let suffix = &rest[close + 1..];
    if suffix.eq_ignore_ascii_case(".piece") {
        Some((index, false))
    } else if suffix.eq_ignore_ascii_case(".last.piece") {
        Some((index, true))
    } else {
        None
    }
}

impl std::fmt::Debug for PhysPkgReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysPkgReader")
            .field("members", &self.members.len())
            .finish()
    }
}

/// Capacity to reserve for an entry whose header claims `declared` bytes.
///
/// The header is untrusted, so the reservation is capped.
#[inline]
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOC, |size| size.min(MAX_PREALLOC))
}
