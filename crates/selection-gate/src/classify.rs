//! Category tags derived from a test's file path

use crate::item::TestItem;
use serde::Serialize;
use std::fmt;

/// Subsystems recognized under an `integration` directory, in match priority order
pub const INTEGRATION_SUBSYSTEMS: &[&str] = &[
    "cli", "client", "cloud", "fileserver", "loader", "minion", "modules", "netapi", "output",
    "reactor", "renderers", "runners", "sdb", "shell", "ssh", "states", "utils", "wheel",
];

/// Subsystems recognized under a `unit` directory, in match priority order
pub const UNIT_SUBSYSTEMS: &[&str] = &[
    "acl", "beacons", "cli", "cloud", "config", "grains", "modules", "netapi", "output", "pillar",
    "renderers", "runners", "serializers", "states", "templates", "transport", "utils",
];

/// A label attached to a test for reporting and filtering
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CategoryTag(String);

impl CategoryTag {
    /// Create a tag
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Tag name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A suite directory (`integration`, `unit`) and the subsystems looked for beneath it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRule {
    suite: String,
    subsystems: Vec<String>,
}

impl SuiteRule {
    /// Create a rule; `subsystems` are matched in order, first match wins
    pub fn new<I, S>(suite: impl Into<String>, subsystems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suite: suite.into(),
            subsystems: subsystems.into_iter().map(Into::into).collect(),
        }
    }

    /// The suite directory name
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Subsystem names in priority order
    pub fn subsystems(&self) -> &[String] {
        &self.subsystems
    }
}

/// Assigns category tags from path segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    rules: Vec<SuiteRule>,
}

impl Classifier {
    /// Create a classifier from explicit rules, evaluated in order
    pub fn new(rules: Vec<SuiteRule>) -> Self {
        Self { rules }
    }

    /// The rules in evaluation order
    pub fn rules(&self) -> &[SuiteRule] {
        &self.rules
    }

    /// Tags for a path: the suite tag of every matching rule, each followed by at
    /// most one subsystem tag
    pub fn classify(&self, path: &str) -> Vec<CategoryTag> {
        let path = path.replace('\\', "/");
        let mut tags: Vec<CategoryTag> = Vec::new();

        for rule in &self.rules {
            if !has_segment(&path, &rule.suite) {
                continue;
            }
            push_unique(&mut tags, CategoryTag::new(rule.suite.as_str()));

            if let Some(subsystem) = rule
                .subsystems
                .iter()
                .find(|subsystem| has_segment(&path, subsystem))
            {
                push_unique(&mut tags, CategoryTag::new(subsystem.as_str()));
            }
        }

        tags
    }

    /// Attach the tags for the item's path to the item
    pub fn tag_item(&self, item: &mut TestItem) {
        for tag in self.classify(item.path()) {
            item.add_tag(tag);
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(vec![
            SuiteRule::new("integration", INTEGRATION_SUBSYSTEMS.iter().copied()),
            SuiteRule::new("unit", UNIT_SUBSYSTEMS.iter().copied()),
        ])
    }
}

/// Classify a path with the default rules
pub fn classify(path: &str) -> Vec<CategoryTag> {
    Classifier::default().classify(path)
}

fn has_segment(path: &str, name: &str) -> bool {
    path.contains(&format!("/{name}/"))
}

fn push_unique(tags: &mut Vec<CategoryTag>, tag: CategoryTag) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}
