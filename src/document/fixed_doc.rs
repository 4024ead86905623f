//! Readers for the fixed document sequence, fixed documents and the
//! document structure part.
//!
//! These are the manifests that turn a package into an ordered page list:
//!
//! ```text
//! /_rels/.rels ──fixedrepresentation──▶ FixedDocumentSequence
//!     DocumentReference Source ──▶ FixedDocument
//!         PageContent Source ──▶ FixedPage
//!         LinkTarget Name
//!     FixedDocument .rels ──documentstructure──▶ DocumentStructure
//!         OutlineEntry OutlineLevel Description OutlineTarget
//! ```

use crate::common::error::{Error, Result};
use crate::common::geometry::parse_f32;
use crate::markup::element::Attributes;
use crate::package::PackURI;
use crate::package::PhysPkgReader;
use crate::package::constants::relationship_type;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// A `PageContent` entry of a fixed document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRef {
    pub uri: PackURI,
    /// Width hint from the document, in 1/96 inch
    pub width: Option<f32>,
    /// Height hint from the document, in 1/96 inch
    pub height: Option<f32>,
}

/// One fixed document: its pages and the named targets on them.
#[derive(Debug, Clone)]
pub struct FixedDocument {
    pub uri: PackURI,
    pub pages: Vec<PageRef>,
    /// Link target name to page index within this document
    pub link_targets: HashMap<String, usize>,
    /// Document structure part named by the document's relationships
    pub structure: Option<PackURI>,
}

/// A flat outline record, before nesting.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem {
    pub title: String,
    pub level: u32,
    /// Target name with any part path stripped (the text after the last `#`)
    pub target: Option<String>,
}

/// Call `visit` with the local name and attributes of every element.
fn scan_elements<F>(xml: &[u8], what: &str, mut visit: F) -> Result<()>
where
    F: FnMut(&[u8], &Attributes) -> Result<()>,
{
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let attrs = Attributes::from_start(e);
                visit(e.local_name().as_ref(), &attrs)?;
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("{}: {}", what, e))),
            _ => {},
        }
        buf.clear();
    }
    Ok(())
}

fn resolve_in(base: &PackURI, location: &str) -> Result<PackURI> {
    base.resolve(location).map_err(Error::InvalidFormat)
}

/// Read a `FixedDocumentSequence` and return its document parts in order.
pub fn read_sequence(package: &PhysPkgReader, seq_uri: &PackURI) -> Result<Vec<PackURI>> {
    let xml = package
        .blob_for(seq_uri)
        .map_err(|e| Error::MissingPart(format!("{}: {}", seq_uri, e)))?;

    let mut documents = Vec::new();
    scan_elements(&xml, seq_uri.as_str(), |name, attrs| {
        if name == b"DocumentReference" {
            match attrs.get("Source") {
                Some(source) => documents.push(resolve_in(seq_uri, source)?),
                None => log::debug!("DocumentReference without Source in {}", seq_uri),
            }
        }
        Ok(())
    })?;
    Ok(documents)
}

/// Read a `FixedDocument` part together with its relationships.
pub fn read_document(package: &PhysPkgReader, doc_uri: &PackURI) -> Result<FixedDocument> {
    let xml = package
        .blob_for(doc_uri)
        .map_err(|e| Error::MissingPart(format!("{}: {}", doc_uri, e)))?;

    let mut pages: Vec<PageRef> = Vec::new();
    let mut link_targets = HashMap::new();
    scan_elements(&xml, doc_uri.as_str(), |name, attrs| {
        match name {
            b"PageContent" => match attrs.get("Source") {
                Some(source) => pages.push(PageRef {
                    uri: resolve_in(doc_uri, source)?,
                    width: attrs.get("Width").and_then(parse_f32),
                    height: attrs.get("Height").and_then(parse_f32),
                }),
                None => log::debug!("PageContent without Source in {}", doc_uri),
            },
            b"LinkTarget" => match (attrs.get("Name"), pages.len().checked_sub(1)) {
                (Some(target), Some(page)) if !target.is_empty() => {
                    link_targets.insert(target.to_string(), page);
                },
                _ => log::debug!("LinkTarget outside a PageContent in {}", doc_uri),
            },
            _ => {},
        }
        Ok(())
    })?;

    Ok(FixedDocument {
        uri: doc_uri.clone(),
        pages,
        link_targets,
        structure: structure_part(package, doc_uri),
    })
}

/// The document structure part, if the document's relationships name one.
///
/// Problems here only cost the outline, so they are logged, not returned.
fn structure_part(package: &PhysPkgReader, doc_uri: &PackURI) -> Option<PackURI> {
    let rels = match package.rels_for(doc_uri) {
        Ok(Some(rels)) => rels,
        Ok(None) => return None,
        Err(e) => {
            log::debug!("relationships of {} unreadable: {}", doc_uri, e);
            return None;
        },
    };
    let rel = rels.find(relationship_type::is_document_structure)?;
    match rel.target_partname() {
        Ok(uri) => Some(uri),
        Err(e) => {
            log::debug!("document structure target of {} unusable: {}", doc_uri, e);
            None
        },
    }
}

/// Read the `OutlineEntry` elements of a document structure part.
///
/// Malformed markup ends the scan early; entries read before the error
/// are still returned.
pub fn read_outline(package: &PhysPkgReader, structure_uri: &PackURI) -> Result<Vec<OutlineItem>> {
    let xml = package.blob_for(structure_uri)?;

    let mut items = Vec::new();
    let scanned = scan_elements(&xml, structure_uri.as_str(), |name, attrs| {
        if name == b"OutlineEntry" {
            let level = match attrs.get("OutlineLevel") {
                None => 1,
                Some(raw) => match raw.trim().parse::<u32>() {
                    Ok(level) => level,
                    Err(_) => {
                        log::debug!("OutlineEntry with bad OutlineLevel '{}' dropped", raw);
                        return Ok(());
                    },
                },
            };
            let target = attrs.get("OutlineTarget").map(|t| match memchr::memrchr(b'#', t.as_bytes()) {
                Some(pos) => t[pos + 1..].to_string(),
                None => t.to_string(),
            });
            items.push(OutlineItem {
                title: attrs.get("Description").unwrap_or_default().to_string(),
                level,
                target: target.filter(|t| !t.is_empty()),
            });
        }
        Ok(())
    });
    if let Err(e) = scanned {
        log::warn!("outline truncated after {} entries: {}", items.len(), e);
    }
    Ok(items)
}
