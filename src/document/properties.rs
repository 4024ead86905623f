//! Core properties (`docProps/core.xml` or wherever the package root
//! relationship points) parsed into [`Metadata`].
use crate::common::{Error, Metadata, Result};
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::BufRead;

/// Parse a core-properties part.
pub fn parse_core_properties(xml: &[u8]) -> Result<Metadata> {
    // Text is trimmed once it is joined; trimming each event would eat the
    // spaces around entity references.
    let mut reader = Reader::from_reader(xml);

    let mut metadata = Metadata::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                let slot = match name.as_ref() {
                    b"title" => &mut metadata.title,
                    b"subject" => &mut metadata.subject,
                    b"description" => &mut metadata.description,
                    b"creator" => &mut metadata.creator,
                    b"category" => &mut metadata.category,
                    b"keywords" => &mut metadata.keywords,
                    b"revision" => &mut metadata.revision,
                    b"created" | b"modified" => {
                        let is_created = name.as_ref() == b"created";
                        if let Some(text) = read_text_element(&mut reader, &mut buf)? {
                            match parse_datetime(text.trim()) {
                                Ok(dt) if is_created => metadata.created = Some(dt),
                                Ok(dt) => metadata.modified = Some(dt),
                                Err(e) => log::debug!("{}", e),
                            }
                        }
                        buf.clear();
                        continue;
                    },
                    _ => {
                        buf.clear();
                        continue;
                    },
                };
                if let Some(text) = read_text_element(&mut reader, &mut buf)? {
                    *slot = Some(text);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("core properties: {}", e))),
            _ => {},
        }
        buf.clear();
    }

    Ok(metadata)
}

/// Read the text content of an XML element.
fn read_text_element<B: BufRead>(reader: &mut Reader<B>, buf: &mut Vec<u8>) -> Result<Option<String>> {
    let mut text = String::new();

    loop {
        match reader.read_event_into(buf) {
            Ok(Event::Text(e)) => {
                let content = std::str::from_utf8(e.as_ref())
                    .map_err(|e| Error::XmlError(format!("Invalid UTF-8 in text content: {}", e)))?;
                text.push_str(content);
            },
            Ok(Event::GeneralRef(r)) => {
                // Predefined entities only; anything else is kept verbatim.
                let entity = String::from_utf8_lossy(r.as_ref()).into_owned();
                match quick_xml::escape::resolve_predefined_entity(&entity) {
                    Some(resolved) => text.push_str(resolved),
                    None => {
                        text.push('&');
                        text.push_str(&entity);
                        text.push(';');
                    },
                }
            },
            Ok(Event::End(_)) | Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("XML parsing error: {}", e))),
            _ => {},
        }
    }

    let text = text.trim();
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text.to_string()))
    }
}

/// Parse a W3CDTF timestamp.
///
/// Supports formats like:
/// - 2023-10-10T14:30:00Z
/// - 2023-10-10T14:30:00.1234567Z
/// - 2023-10-10T14:30:00
/// - 2023-10-10
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, format) {
            return Ok(DateTime::from_naive_utc_and_offset(dt, Utc));
        }
    }

    if let Some(dt) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(DateTime::from_naive_utc_and_offset(dt, Utc));
    }

    Err(Error::ParseError(format!("Invalid datetime format: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    const CORE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<coreProperties xmlns="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
    xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">
  <dc:title>Annual &amp; Quarterly Report</dc:title>
  <dc:creator>J. Smith</dc:creator>
  <keywords>finance, report</keywords>
  <revision>3</revision>
  <dc:description>   </dc:description>
  <dcterms:created>2021-03-04T05:06:07Z</dcterms:created>
  <dcterms:modified>2022-01-02</dcterms:modified>
  <lastModifiedBy>Someone</lastModifiedBy>
</coreProperties>"#;

    #[test]
    fn test_parse_core_properties() {
        let metadata = parse_core_properties(CORE.as_bytes()).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Annual & Quarterly Report"));
        assert_eq!(metadata.creator.as_deref(), Some("J. Smith"));
        assert_eq!(metadata.keywords.as_deref(), Some("finance, report"));
        assert_eq!(metadata.revision.as_deref(), Some("3"));
        assert!(metadata.description.is_none());
        assert_eq!(metadata.created.unwrap().year(), 2021);
        assert_eq!(metadata.modified.unwrap().month(), 1);
        assert!(metadata.subject.is_none());
    }

    #[test]
    fn test_entities_keep_surrounding_spaces() {
        let xml = "<coreProperties><subject>  a &lt; b &amp;&amp; c  </subject><keywords>&quot;x&quot; y</keywords></coreProperties>";
        let metadata = parse_core_properties(xml.as_bytes()).unwrap();
        assert_eq!(metadata.subject.as_deref(), Some("a < b && c"));
        assert_eq!(metadata.keywords.as_deref(), Some("\"x\" y"));
    }

    #[test]
    fn test_parse_datetime() {
        assert_eq!(parse_datetime("2023-10-10T14:30:00Z").unwrap().day(), 10);
        assert_eq!(parse_datetime("2023-10-10T14:30:00.1234567Z").unwrap().year(), 2023);
        assert_eq!(parse_datetime("2023-10-10T14:30:00").unwrap().month(), 10);
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(parse_core_properties(b"<coreProperties><title>x</subject>").is_err());
    }
}
