/// The PackURI value type and utilities for working with part names.
///
/// A PackURI is the absolute name of a part inside an XPS package. It always
/// begins with a forward slash and uses forward slashes as path separators.
/// Markup refers to parts with absolute or relative locations; relative
/// locations resolve against the folder of the part that contains them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    /// The full pack URI string (e.g., "/Documents/1/Pages/1.fpage")
    uri: String,
}

impl PackURI {
    /// Create a new PackURI from a string.
    ///
    /// # Arguments
    /// * `uri` - The URI string, which must begin with a forward slash
    ///
    /// # Returns
    /// * `Ok(PackURI)` if the URI is valid
    /// * `Err` if the URI doesn't start with a forward slash
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Create a PackURI from a relative reference and a base URI.
    ///
    /// This translates a relative reference (like "../Resources/font.odttf") onto
    /// a base URI (like "/Documents/1/Pages") to produce an absolute PackURI
    /// (like "/Documents/1/Resources/font.odttf").
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else {
            Self::join_paths(base_uri, relative_ref)
        };
        Self::new(Self::normalize_path(&joined))
    }

    /// Resolve a location found inside the part `self`.
    ///
    /// Absolute locations pass through (normalized), relative ones resolve
    /// against this part's folder. A trailing `#fragment` is dropped; use
    /// [`split_fragment`] first when the fragment matters.
    pub fn resolve(&self, location: &str) -> Result<Self, String> {
        let (path, _) = split_fragment(location.trim());
        if path.is_empty() {
            return Err(format!("Empty part location in '{}'", self.uri));
        }
        Self::from_rel_ref(self.base_uri(), path)
    }

    /// Get the base URI (directory portion) of this PackURI.
    ///
    /// For example, "/Documents/1/Pages" for "/Documents/1/Pages/1.fpage".
    /// For the package pseudo-partname "/", returns "/".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Get the filename portion of this PackURI.
    ///
    /// For example, "1.fpage" for "/Documents/1/Pages/1.fpage".
    /// For the package pseudo-partname "/", returns an empty string.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Get the filename without its extension.
    ///
    /// Obfuscated fonts carry their key in this portion of the name.
    pub fn stem(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[..pos],
            None => filename,
        }
    }

    /// Get the extension portion of this PackURI (no leading period).
    pub fn ext(&self) -> &str {
        let filename = self.filename();
        match filename.rfind('.') {
            Some(pos) => &filename[pos + 1..],
            None => "",
        }
    }

    /// Get the membername (URI with leading slash stripped).
    ///
    /// This is the form used as the ZIP entry name for the part.
    /// Returns an empty string for the package pseudo-partname "/".
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Get the PackURI of the .rels part corresponding to this PackURI.
    ///
    /// For example, "/Documents/1/_rels/FixedDoc.fdoc.rels" for
    /// "/Documents/1/FixedDoc.fdoc", and "/_rels/.rels" for the package.
    pub fn rels_uri(&self) -> Result<PackURI, String> {
        let rels_filename = format!("{}.rels", self.filename());
        let base_uri = self.base_uri();
        let rels_uri_str = if base_uri == "/" {
            format!("/_rels/{}", rels_filename)
        } else {
            format!("{}/_rels/{}", base_uri, rels_filename)
        };

        Self::new(rels_uri_str)
    }

    /// Get the full URI string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Helper function to join two paths using forward slashes
    fn join_paths(base: &str, rel: &str) -> String {
        if base.ends_with('/') {
            format!("{}{}", base, rel)
        } else {
            format!("{}/{}", base, rel)
        }
    }

    /// Helper function to normalize a path (resolve ".." and ".")
    ///
    /// Backslashes are accepted as separators since some producers emit them.
    fn normalize_path(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();

        for part in path.split(['/', '\\']) {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }

        let mut out = String::with_capacity(path.len() + 1);
        for part in &parts {
            out.push('/');
            out.push_str(part);
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }
}

/// Split `location#fragment` into its path and optional fragment.
pub fn split_fragment(location: &str) -> (&str, Option<&str>) {
    match memchr::memchr(b'#', location.as_bytes()) {
        Some(pos) => (&location[..pos], Some(&location[pos + 1..])),
        None => (location, None),
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packuri_new() {
        assert!(PackURI::new("/FixedDocSeq.fdseq").is_ok());
        assert!(PackURI::new("FixedDocSeq.fdseq").is_err());
    }

    #[test]
    fn test_base_uri() {
        let uri = PackURI::new("/Documents/1/Pages/1.fpage").unwrap();
        assert_eq!(uri.base_uri(), "/Documents/1/Pages");

        let root = PackURI::new("/").unwrap();
        assert_eq!(root.base_uri(), "/");

        let top = PackURI::new("/FixedDocSeq.fdseq").unwrap();
        assert_eq!(top.base_uri(), "/");
    }

    #[test]
    fn test_filename_stem_ext() {
        let uri = PackURI::new("/Resources/0B1C2D3E-4F50-6172-8394-A5B6C7D8E9F0.odttf").unwrap();
        assert_eq!(uri.filename(), "0B1C2D3E-4F50-6172-8394-A5B6C7D8E9F0.odttf");
        assert_eq!(uri.stem(), "0B1C2D3E-4F50-6172-8394-A5B6C7D8E9F0");
        assert_eq!(uri.ext(), "odttf");

        let root = PackURI::new("/").unwrap();
        assert_eq!(root.filename(), "");
    }

    #[test]
    fn test_membername() {
        let uri = PackURI::new("/Documents/1/FixedDoc.fdoc").unwrap();
        assert_eq!(uri.membername(), "Documents/1/FixedDoc.fdoc");

        let root = PackURI::new("/").unwrap();
        assert_eq!(root.membername(), "");
    }

    #[test]
    fn test_rels_uri() {
        let root = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(root.rels_uri().unwrap().as_str(), "/_rels/.rels");

        let doc = PackURI::new("/Documents/1/FixedDoc.fdoc").unwrap();
        assert_eq!(
            doc.rels_uri().unwrap().as_str(),
            "/Documents/1/_rels/FixedDoc.fdoc.rels"
        );
    }

    #[test]
    fn test_resolve() {
        let page = PackURI::new("/Documents/1/Pages/1.fpage").unwrap();
        assert_eq!(
            page.resolve("../Resources/Images/a.png").unwrap().as_str(),
            "/Documents/1/Resources/Images/a.png"
        );
        assert_eq!(
            page.resolve("/Resources/Fonts/f.odttf").unwrap().as_str(),
            "/Resources/Fonts/f.odttf"
        );
        assert_eq!(page.resolve("./2.fpage#anchor").unwrap().as_str(), "/Documents/1/Pages/2.fpage");
        assert!(page.resolve("").is_err());
    }

    #[test]
    fn test_split_fragment() {
        assert_eq!(split_fragment("Pages/1.fpage#top"), ("Pages/1.fpage", Some("top")));
        assert_eq!(split_fragment("#top"), ("", Some("top")));
        assert_eq!(split_fragment("a.fpage"), ("a.fpage", None));
    }
}
