/// Document metadata taken from the package core properties.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Core document properties.
///
/// Every field is optional: producers fill in as much or as little as
/// they like, and a package without a core-properties part yields the
/// default value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document description/comments
    pub description: Option<String>,
    /// Document author/creator
    pub creator: Option<String>,
    /// Document category
    pub category: Option<String>,
    /// Keywords associated with the document
    pub keywords: Option<String>,
    /// Revision number
    pub revision: Option<String>,
    /// Creation date
    pub created: Option<DateTime<Utc>>,
    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Check if the metadata contains any actual data.
    pub fn has_data(&self) -> bool {
        self.title.is_some()
            || self.subject.is_some()
            || self.description.is_some()
            || self.creator.is_some()
            || self.category.is_some()
            || self.keywords.is_some()
            || self.revision.is_some()
            || self.created.is_some()
            || self.modified.is_some()
    }

    /// Label/value pairs for the populated fields, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let mut push = |label: &'static str, value: &Option<String>| {
            if let Some(v) = value {
                out.push((label, v.clone()));
            }
        };
        push("Title", &self.title);
        push("Subject", &self.subject);
        push("Description", &self.description);
        push("Author", &self.creator);
        push("Category", &self.category);
        push("Keywords", &self.keywords);
        push("Revision", &self.revision);
        if let Some(dt) = self.created {
            out.push(("Created", dt.to_rfc3339()));
        }
        if let Some(dt) = self.modified {
            out.push(("Modified", dt.to_rfc3339()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_has_data() {
        let empty_metadata = Metadata::default();
        assert!(!empty_metadata.has_data());
        assert!(empty_metadata.entries().is_empty());

        let metadata_with_title = Metadata {
            title: Some("Test Document".to_string()),
            ..Default::default()
        };
        assert!(metadata_with_title.has_data());
        assert_eq!(
            metadata_with_title.entries(),
            vec![("Title", "Test Document".to_string())]
        );
    }
}
