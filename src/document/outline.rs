//! Document outline (bookmarks).
use serde::{Deserialize, Serialize};

/// One outline entry and its nested entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub title: String,
    /// Nesting level as declared by the producer, 1 for top-level entries
    pub level: u32,
    /// Link target name the entry points at, if any
    pub target: Option<String>,
    /// Global page index of the target, when the name is known
    pub page: Option<usize>,
    pub children: Vec<OutlineEntry>,
}

impl OutlineEntry {
    pub fn new(title: impl Into<String>, level: u32) -> Self {
        Self {
            title: title.into(),
            level,
            target: None,
            page: None,
            children: Vec::new(),
        }
    }

    /// Number of entries in this subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(OutlineEntry::count).sum::<usize>()
    }
}

/// Builds an outline tree from a flat list of levelled entries.
///
/// An entry attaches to the most recent entry one level above it, found
/// by following the last child from the last root downwards. An entry
/// whose level skips past that chain has no parent and is dropped.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    roots: Vec<OutlineEntry>,
}

impl OutlineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `entry`. Returns `false` when it was dropped.
    pub fn push(&mut self, entry: OutlineEntry) -> bool {
        if entry.level <= 1 {
            self.roots.push(entry);
            return true;
        }

        let parent_level = entry.level - 1;
        let mut cursor = self.roots.last_mut();
        while let Some(node) = cursor {
            if node.level == parent_level {
                node.children.push(entry);
                return true;
            }
            if node.level > parent_level {
                break;
            }
            cursor = node.children.last_mut();
        }

        log::debug!(
            "outline entry '{}' at level {} has no parent, dropped",
            entry.title,
            entry.level
        );
        false
    }

    pub fn finish(self) -> Vec<OutlineEntry> {
        self.roots
    }
}
