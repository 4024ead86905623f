//! Document structure: the fixed document sequence, its pages, link
//! targets, outline and core properties.

pub mod file;
pub mod fixed_doc;
pub mod outline;
pub mod page;
pub mod properties;

pub use file::{LinkTarget, XpsFile};
pub use fixed_doc::{FixedDocument, OutlineItem, PageRef};
pub use outline::{OutlineBuilder, OutlineEntry};
pub use page::XpsPage;
pub use properties::parse_core_properties;
