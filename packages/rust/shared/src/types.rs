//! Core domain types for prompttree documentation trees.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::PromptTreeError;

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// One of the fixed top-level namespaces of the documentation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    System,
    Packages,
    Applications,
    Workflows,
}

impl Partition {
    /// Every partition, in canonical order.
    pub const ALL: [Partition; 4] = [
        Partition::System,
        Partition::Packages,
        Partition::Applications,
        Partition::Workflows,
    ];

    /// Directory name of the partition inside the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Packages => "packages",
            Self::Applications => "applications",
            Self::Workflows => "workflows",
        }
    }

    /// Whether the partition holds one category per project component.
    pub fn is_categorised(&self) -> bool {
        matches!(self, Self::Packages | Self::Applications)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntryPath
// ---------------------------------------------------------------------------

/// Hierarchical address of an entry or container: partition, optional
/// category, name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryPath(Vec<String>);

impl EntryPath {
    /// The root of a partition.
    pub fn partition(partition: Partition) -> Self {
        Self(vec![partition.as_str().to_string()])
    }

    /// Build a path from raw segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// A new path with `segment` appended.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Which part of the tree an aggregation collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    System,
    Package,
    Application,
    Workflow,
    Full,
}

impl Scope {
    pub const ALL: [Scope; 5] = [
        Scope::System,
        Scope::Package,
        Scope::Application,
        Scope::Workflow,
        Scope::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Package => "package",
            Self::Application => "application",
            Self::Workflow => "workflow",
            Self::Full => "full",
        }
    }

    /// Whether an aggregation of this scope is meaningless without a target.
    pub fn requires_target(&self) -> bool {
        matches!(self, Self::Package | Self::Application)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = PromptTreeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                PromptTreeError::config(format!(
                    "unknown scope '{s}': expected one of system, package, application, workflow, full"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Aggregated context
// ---------------------------------------------------------------------------

/// Ordered mapping used at every level of an aggregated context.
pub type ContextMap = IndexMap<String, ContextNode>;

/// A node in an aggregated context: entry text or a nested mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextNode {
    Text(String),
    Branch(ContextMap),
}

impl ContextNode {
    /// Number of text leaves at or below this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Text(_) => 1,
            Self::Branch(children) => children.values().map(ContextNode::leaf_count).sum(),
        }
    }
}

/// The in-memory slice of the documentation tree chosen by an aggregation.
///
/// Keys are exactly the entries that existed and were read; insertion order
/// is the order of collection and is kept by every renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatedContext(ContextMap);

impl AggregatedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, node: ContextNode) {
        self.0.insert(key.into(), node);
    }

    pub fn get(&self, key: &str) -> Option<&ContextNode> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, ContextNode> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &ContextMap {
        &self.0
    }

    /// Count every text leaf by depth-first traversal.
    pub fn leaf_count(&self) -> usize {
        self.0.values().map(ContextNode::leaf_count).sum()
    }
}

impl From<ContextMap> for AggregatedContext {
    fn from(map: ContextMap) -> Self {
        Self(map)
    }
}

/// Derived summary attached to an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMetadata {
    /// When the aggregation ran.
    pub generated_at: DateTime<Utc>,
    /// Requested scope.
    pub scope: Scope,
    /// Requested target name, when one was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Every package known to the store at aggregation time.
    pub packages: Vec<String>,
    /// Every application known to the store at aggregation time.
    pub applications: Vec<String>,
    /// Every workflow entry known to the store at aggregation time.
    pub workflows: Vec<String>,
    /// Number of text leaves in the aggregated context.
    pub total_prompts: usize,
}

// ---------------------------------------------------------------------------
// Components & validation
// ---------------------------------------------------------------------------

/// Declared kind of a project component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Package,
    Application,
}

impl ComponentKind {
    /// The partition documenting components of this kind.
    pub fn partition(&self) -> Partition {
        match self {
            Self::Package => Partition::Packages,
            Self::Application => Partition::Applications,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Application => "application",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component of the host project, as reported by the project lister.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
}

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Where this component's documentation is expected in the store.
    pub fn expected_location(&self) -> EntryPath {
        EntryPath::partition(self.kind.partition()).join(self.name.clone())
    }
}

/// Outcome of checking one component's expected location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCheck {
    pub component: Component,
    pub location: EntryPath,
    pub exists: bool,
}

/// A documented location with no matching project component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanEntry {
    pub name: String,
    pub partition: Partition,
    pub location: EntryPath,
}

/// Result of one structure validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// One check per ground-truth component, in lister order.
    pub checks: Vec<LocationCheck>,
    /// Components whose expected location does not exist.
    pub missing: Vec<Component>,
    /// Store locations with no component of the same name.
    pub orphaned: Vec<OrphanEntry>,
}

impl ValidationReport {
    /// True iff nothing is missing and nothing is orphaned.
    pub fn is_success(&self) -> bool {
        self.missing.is_empty() && self.orphaned.is_empty()
    }
}
