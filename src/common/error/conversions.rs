//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::fonts::FontError;
use crate::package::PackageError;

impl From<PackageError> for Error {
    fn from(err: PackageError) -> Self {
        Error::from_package_error(err)
    }
}

impl From<FontError> for Error {
    fn from(err: FontError) -> Self {
        match err {
            FontError::Io(e) => Error::Io(e),
            other => Error::FontError(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipError(err.to_string())
    }
}

impl Error {
    /// Convert a package-layer error, keeping "not found" distinct from
    /// malformed content.
    pub(crate) fn from_package_error(err: PackageError) -> Self {
        match err {
            PackageError::PackageNotFound(path) => Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Package not found: {}", path),
            )),
            PackageError::PartNotFound(name) => Error::ComponentNotFound(name),
            PackageError::InvalidPackUri(s) => Error::InvalidFormat(s),
            PackageError::InvalidRelationship(s) => Error::InvalidFormat(s),
            PackageError::XmlError(s) | PackageError::AttrError(s) => Error::XmlError(s),
            PackageError::QuickXmlError(e) => Error::XmlError(e.to_string()),
            PackageError::ZipError(e) => Error::ZipError(e.to_string()),
            PackageError::IoError(e) => Error::Io(e),
        }
    }
}
