//! Directory scanning shared by aggregation and validation.
//!
//! Produces comparable name sets: what the project says should be documented
//! versus what the store actually holds, per categorised partition.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument};

use prompttree_shared::{Component, ComponentKind, EntryPath, Partition, Result};
use prompttree_storage::{ChildKind, EntryStore};

use crate::lister::ProjectLister;

/// Names a partition currently exposes.
///
/// Categorised partitions list their category containers; `system` and
/// `workflows` list their entries.
pub fn known_names(store: &dyn EntryStore, partition: Partition) -> Vec<String> {
    let kind = if partition.is_categorised() {
        ChildKind::Container
    } else {
        ChildKind::Entry
    };
    store.child_names(&EntryPath::partition(partition), kind)
}

/// Snapshot of every partition's visible names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub system: Vec<String>,
    pub packages: Vec<String>,
    pub applications: Vec<String>,
    pub workflows: Vec<String>,
}

impl Inventory {
    pub fn collect(store: &dyn EntryStore) -> Self {
        Self {
            system: known_names(store, Partition::System),
            packages: known_names(store, Partition::Packages),
            applications: known_names(store, Partition::Applications),
            workflows: known_names(store, Partition::Workflows),
        }
    }

    /// Names collected for `partition`.
    pub fn names(&self, partition: Partition) -> &[String] {
        match partition {
            Partition::System => &self.system,
            Partition::Packages => &self.packages,
            Partition::Applications => &self.applications,
            Partition::Workflows => &self.workflows,
        }
    }
}

/// Expected and actual names for one categorised partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionScan {
    pub partition: Partition,
    /// Component names the project declares for this partition, lister order.
    pub expected: Vec<String>,
    /// Category names present in the store, store order.
    pub actual: Vec<String>,
}

impl PartitionScan {
    /// Whether the store holds a category named `name`.
    pub fn has_category(&self, name: &str) -> bool {
        self.actual.iter().any(|actual| actual == name)
    }
}

/// Result of scanning the project and the store side by side.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Ground-truth components as returned by the lister.
    pub components: Vec<Component>,
    pub packages: PartitionScan,
    pub applications: PartitionScan,
}

impl ScanResult {
    pub fn partitions(&self) -> [&PartitionScan; 2] {
        [&self.packages, &self.applications]
    }

    /// The scan of the partition components of `kind` are documented in.
    pub fn for_kind(&self, kind: ComponentKind) -> &PartitionScan {
        match kind {
            ComponentKind::Package => &self.packages,
            ComponentKind::Application => &self.applications,
        }
    }

    /// Every expected component name, across both partitions.
    pub fn expected_names(&self) -> HashSet<&str> {
        self.partitions()
            .into_iter()
            .flat_map(|scan| scan.expected.iter().map(String::as_str))
            .collect()
    }
}

/// Scan the project listing and the store's categorised partitions.
#[instrument(skip_all)]
pub fn scan(store: &dyn EntryStore, lister: &dyn ProjectLister) -> Result<ScanResult> {
    let components = lister.list_components()?;

    let expected_for = |partition: Partition| -> Vec<String> {
        components
            .iter()
            .filter(|c| c.kind.partition() == partition)
            .map(|c| c.name.clone())
            .collect()
    };

    let packages = PartitionScan {
        partition: Partition::Packages,
        expected: expected_for(Partition::Packages),
        actual: known_names(store, Partition::Packages),
    };
    let applications = PartitionScan {
        partition: Partition::Applications,
        expected: expected_for(Partition::Applications),
        actual: known_names(store, Partition::Applications),
    };

    debug!(
        components = components.len(),
        packages = packages.actual.len(),
        applications = applications.actual.len(),
        "scan complete"
    );

    Ok(ScanResult {
        components,
        packages,
        applications,
    })
}
