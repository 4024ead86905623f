/// Constant values used when walking an XPS package.
///
/// Relationship types come in two flavours: the original Microsoft XPS
/// namespace and the ECMA OpenXPS namespace. Readers accept both.

/// Relationship type URIs
pub mod relationship_type {
    // Package-level relationships
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const THUMBNAIL: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail";
    pub const DIGITAL_SIGNATURE_ORIGIN: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/digital-signature/origin";

    // Microsoft XPS
    pub const FIXED_REPRESENTATION: &str =
        "http://schemas.microsoft.com/xps/2005/06/fixedrepresentation";
    pub const DOCUMENT_STRUCTURE: &str =
        "http://schemas.microsoft.com/xps/2005/06/documentstructure";
    pub const RESTRICTED_FONT: &str = "http://schemas.microsoft.com/xps/2005/06/restricted-font";
    pub const REQUIRED_RESOURCE: &str =
        "http://schemas.microsoft.com/xps/2005/06/required-resource";

    // OpenXPS
    pub const OXPS_FIXED_REPRESENTATION: &str =
        "http://schemas.openxps.org/oxps/v1.0/fixedrepresentation";
    pub const OXPS_DOCUMENT_STRUCTURE: &str =
        "http://schemas.openxps.org/oxps/v1.0/documentstructure";
    pub const OXPS_RESTRICTED_FONT: &str = "http://schemas.openxps.org/oxps/v1.0/restricted-font";
    pub const OXPS_REQUIRED_RESOURCE: &str =
        "http://schemas.openxps.org/oxps/v1.0/required-resource";

    /// True for either flavour of the fixed-representation relationship.
    #[inline]
    pub fn is_fixed_representation(reltype: &str) -> bool {
        reltype == FIXED_REPRESENTATION || reltype == OXPS_FIXED_REPRESENTATION
    }

    /// True for either flavour of the document-structure relationship.
    #[inline]
    pub fn is_document_structure(reltype: &str) -> bool {
        reltype == DOCUMENT_STRUCTURE || reltype == OXPS_DOCUMENT_STRUCTURE
    }
}

/// Relationship target modes
pub mod target_mode {
    /// Internal relationship target mode (default)
    pub const INTERNAL: &str = "Internal";

    /// External relationship target mode (URL outside the package)
    pub const EXTERNAL: &str = "External";
}
