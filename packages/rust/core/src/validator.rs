//! Structure validation: does the documentation tree match the project?

use tracing::{info, instrument, warn};

use prompttree_shared::{
    EntryPath, LocationCheck, OrphanEntry, Partition, Result, ValidationReport,
};
use prompttree_storage::EntryStore;

use crate::lister::ProjectLister;
use crate::scanner;

/// Compares the project's components against the store's categorised partitions.
pub struct Validator<'a> {
    store: &'a dyn EntryStore,
    lister: &'a dyn ProjectLister,
}

impl<'a> Validator<'a> {
    pub fn new(store: &'a dyn EntryStore, lister: &'a dyn ProjectLister) -> Self {
        Self { store, lister }
    }

    /// Build a fresh report.
    ///
    /// A component is missing when the store has no category container for
    /// it; a flat entry of the same name does not count. A store category is
    /// orphaned when no component, of either kind, has its name.
    #[instrument(skip_all)]
    pub fn validate(&self) -> Result<ValidationReport> {
        let scan = scanner::scan(self.store, self.lister)?;
        let mut report = ValidationReport::default();

        for component in &scan.components {
            let location = component.expected_location();
            let exists = scan.for_kind(component.kind).has_category(&component.name);
            if !exists {
                if self.store.exists(&location) {
                    warn!(location = %location, "flat entry is not a category directory");
                }
                warn!(name = %component.name, location = %location, "documentation missing");
                report.missing.push(component.clone());
            }
            report.checks.push(LocationCheck {
                component: component.clone(),
                location,
                exists,
            });
        }

        let known = scan.expected_names();
        for partition_scan in scan.partitions() {
            for name in &partition_scan.actual {
                if known.contains(name.as_str()) {
                    continue;
                }
                let location = EntryPath::partition(partition_scan.partition).join(name.clone());
                warn!(location = %location, "orphaned documentation");
                report.orphaned.push(OrphanEntry {
                    name: name.clone(),
                    partition: partition_scan.partition,
                    location,
                });
            }
        }

        info!(
            components = report.checks.len(),
            missing = report.missing.len(),
            orphaned = report.orphaned.len(),
            success = report.is_success(),
            "validation complete"
        );

        Ok(report)
    }
}

/// Create an empty container for every missing location in `report`.
///
/// No content is generated. Returns the created locations in report order.
#[instrument(skip_all, fields(missing = report.missing.len()))]
pub fn create_missing(store: &dyn EntryStore, report: &ValidationReport) -> Result<Vec<EntryPath>> {
    let mut created = Vec::with_capacity(report.missing.len());
    for component in &report.missing {
        let location = component.expected_location();
        store.create_container(&location)?;
        info!(location = %location, "created documentation directory");
        created.push(location);
    }
    Ok(created)
}

/// Orphans of `report` that live in `partition`.
pub fn orphans_in(report: &ValidationReport, partition: Partition) -> Vec<&OrphanEntry> {
    report
        .orphaned
        .iter()
        .filter(|o| o.partition == partition)
        .collect()
}
