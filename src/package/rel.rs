/// Relationship records read from `.rels` parts.
///
/// Relationships are how an XPS package is discovered: the package-level
/// `.rels` names the fixed document sequence, core properties and thumbnail,
/// and each fixed document may carry its own `.rels` naming its outline.
use crate::package::constants::target_mode;
use crate::package::error::{PackageError, Result};
use crate::package::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::events::Event;
use smallvec::SmallVec;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Relationship ID (e.g., "R0")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a part location or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference as written in the `.rels` part.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Get the absolute target partname for internal relationships.
    ///
    /// Returns an error if this is an external relationship.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(PackageError::InvalidRelationship(format!(
                "Cannot resolve external relationship '{}' to a part",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(PackageError::InvalidPackUri)
    }
}

/// Relationships declared by one source part, in document order.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    rels: SmallVec<[Relationship; 8]>,
}

impl Relationships {
    /// Parse a `.rels` part.
    ///
    /// `base_uri` is the folder of the *source* part (not of the `.rels`
    /// part), against which relative targets resolve. Entries lacking any
    /// of `Id`, `Type` or `Target` are skipped.
    pub fn from_xml(rels_xml: &[u8], base_uri: &str) -> Result<Self> {
        let mut rels = SmallVec::new();
        let mut reader = Reader::from_reader(rels_xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut r_id = None;
                        let mut reltype = None;
                        let mut target_ref = None;
                        let mut mode = target_mode::INTERNAL.to_string();

                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"Id" => r_id = Some(attr.unescape_value()?.to_string()),
                                b"Type" => reltype = Some(attr.unescape_value()?.to_string()),
                                b"Target" => target_ref = Some(attr.unescape_value()?.to_string()),
                                b"TargetMode" => mode = attr.unescape_value()?.to_string(),
                                _ => {},
                            }
                        }

                        if let (Some(id), Some(rt), Some(tr)) = (r_id, reltype, target_ref) {
                            rels.push(Relationship::new(
                                id,
                                rt,
                                tr,
                                base_uri.to_string(),
                                mode == target_mode::EXTERNAL,
                            ));
                        } else {
                            log::debug!("incomplete Relationship entry skipped");
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(PackageError::XmlError(format!("Rels parse error: {}", e))),
                _ => {},
            }
            buf.clear();
        }

        Ok(Self { rels })
    }

    /// First internal relationship whose type satisfies `pred`.
    pub fn find(&self, pred: impl Fn(&str) -> bool) -> Option<&Relationship> {
        self.rels
            .iter()
            .find(|rel| !rel.is_external() && pred(rel.reltype()))
    }

    /// First internal relationship of exactly `reltype`.
    #[inline]
    pub fn by_type(&self, reltype: &str) -> Option<&Relationship> {
        self.find(|t| t == reltype)
    }

    /// Get an iterator over all relationships.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::constants::relationship_type as rt;

    const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Type="http://schemas.microsoft.com/xps/2005/06/fixedrepresentation" Target="/FixedDocSeq.fdseq" Id="R0" />
  <Relationship Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail" Target="Metadata/thumb.png" Id="R1" />
  <Relationship Type="http://example.com/link" Target="http://example.com" TargetMode="External" Id="R2" />
  <Relationship Type="http://example.com/broken" Id="R3" />
</Relationships>"#;

    #[test]
    fn test_parse_rels() {
        let rels = Relationships::from_xml(ROOT_RELS.as_bytes(), "/").unwrap();
        assert_eq!(rels.len(), 3);

        let fixed = rels.find(rt::is_fixed_representation).unwrap();
        assert_eq!(fixed.r_id(), "R0");
        assert_eq!(fixed.target_partname().unwrap().as_str(), "/FixedDocSeq.fdseq");

        let thumb = rels.by_type(rt::THUMBNAIL).unwrap();
        assert_eq!(thumb.target_partname().unwrap().as_str(), "/Metadata/thumb.png");
    }

    #[test]
    fn test_external_relationship() {
        let rels = Relationships::from_xml(ROOT_RELS.as_bytes(), "/").unwrap();
        let ext = rels.iter().find(|r| r.r_id() == "R2").unwrap();
        assert!(ext.is_external());
        assert!(ext.target_partname().is_err());
        assert!(rels.by_type("http://example.com/link").is_none());
    }

    #[test]
    fn test_relative_target_uses_source_folder() {
        let xml = r#"<Relationships><Relationship Id="R1" Type="http://schemas.openxps.org/oxps/v1.0/documentstructure" Target="Structure/DocStructure.struct"/></Relationships>"#;
        let rels = Relationships::from_xml(xml.as_bytes(), "/Documents/1").unwrap();
        let rel = rels.find(rt::is_document_structure).unwrap();
        assert_eq!(
            rel.target_partname().unwrap().as_str(),
            "/Documents/1/Structure/DocStructure.struct"
        );
    }
}
