//! Test items as seen by the gate

use crate::classify::CategoryTag;
use crate::marker::Marker;

/// A single test case with its markers and category tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestItem {
    name: String,
    path: String,
    markers: Vec<Marker>,
    tags: Vec<CategoryTag>,
}

impl TestItem {
    /// Create an item without markers or tags
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            markers: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Attach a marker (for chaining)
    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Attach a marker
    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    /// Attach a category tag; tags already present are ignored
    pub fn add_tag(&mut self, tag: CategoryTag) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    /// Test name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File path the test was collected from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Markers in attachment order
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Category tags in the order they were assigned
    pub fn tags(&self) -> &[CategoryTag] {
        &self.tags
    }

    /// Whether a marker with this name is attached
    pub fn has_marker(&self, name: &str) -> bool {
        self.markers.iter().any(|marker| marker.name() == name)
    }

    /// Whether a category tag with this name is attached
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.as_str() == tag)
    }
}
