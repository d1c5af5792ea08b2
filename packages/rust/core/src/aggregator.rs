//! Context aggregation.
//!
//! Selects a scoped slice of the entry store, reads every entry in it, and
//! derives the metadata summary that travels with the rendered bundle.
//!
//! Result shapes per scope:
//!
//! ```text
//! system       { system: { <entry>: text, ... } }
//! package      { package: { <target>: { <entry>: text, ... } } }
//! application  { application: { <target>: { ... } } }
//! workflow     { <target>: text }              (target given, entry exists)
//!              { workflows: { <entry>: text } } (no target)
//! full         { system, workflows, packages: { <each>: ... }, applications: { <each>: ... } }
//! ```

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use prompttree_shared::{
    AggregatedContext, ContextMap, ContextMetadata, ContextNode, EntryPath, Partition,
    PromptTreeError, Result, Scope,
};
use prompttree_storage::{ChildKind, EntryStore};

use crate::scanner::{Inventory, known_names};

/// An aggregated context together with its metadata.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub context: AggregatedContext,
    pub metadata: ContextMetadata,
}

/// Collects scoped sub-trees from an entry store.
pub struct Aggregator<'a> {
    store: &'a dyn EntryStore,
}

impl<'a> Aggregator<'a> {
    pub fn new(store: &'a dyn EntryStore) -> Self {
        Self { store }
    }

    /// Aggregate `scope`, optionally narrowed to `target`.
    ///
    /// `package` and `application` fail with [`PromptTreeError::MissingTarget`]
    /// when `target` is absent or blank, before the store is read. Absent
    /// partitions and categories become empty mappings; unreadable entries
    /// are logged and skipped.
    #[instrument(skip_all, fields(scope = %scope))]
    pub fn aggregate(&self, scope: Scope, target: Option<&str>) -> Result<Aggregation> {
        let target = target.map(str::trim).filter(|t| !t.is_empty());

        let mut context = AggregatedContext::new();
        match scope {
            Scope::System => {
                context.insert(
                    Partition::System.as_str(),
                    self.load_partition(Partition::System),
                );
            }
            Scope::Package => {
                let name = required_target(scope, target)?;
                context.insert("package", self.load_categories(Partition::Packages, &[name]));
            }
            Scope::Application => {
                let name = required_target(scope, target)?;
                context.insert(
                    "application",
                    self.load_categories(Partition::Applications, &[name]),
                );
            }
            Scope::Workflow => match target {
                Some(name) => {
                    if let Some(text) = self.read_workflow(name) {
                        context.insert(name, ContextNode::Text(text));
                    }
                }
                None => {
                    context.insert(
                        Partition::Workflows.as_str(),
                        self.load_partition(Partition::Workflows),
                    );
                }
            },
            Scope::Full => {
                context.insert(
                    Partition::System.as_str(),
                    self.load_partition(Partition::System),
                );
                context.insert(
                    Partition::Workflows.as_str(),
                    self.load_partition(Partition::Workflows),
                );
                // Known components are whatever the store holds right now.
                for partition in [Partition::Packages, Partition::Applications] {
                    let names = known_names(self.store, partition);
                    let names: Vec<&str> = names.iter().map(String::as_str).collect();
                    context.insert(partition.as_str(), self.load_categories(partition, &names));
                }
            }
        }

        let inventory = Inventory::collect(self.store);
        let metadata = ContextMetadata {
            generated_at: Utc::now(),
            scope,
            target: target.map(str::to_string),
            packages: inventory.packages,
            applications: inventory.applications,
            workflows: inventory.workflows,
            total_prompts: context.leaf_count(),
        };

        info!(
            requested = target.unwrap_or("-"),
            total_prompts = metadata.total_prompts,
            "aggregation complete"
        );

        Ok(Aggregation { context, metadata })
    }

    /// A whole partition as a branch.
    fn load_partition(&self, partition: Partition) -> ContextNode {
        ContextNode::Branch(self.load_tree(&EntryPath::partition(partition)))
    }

    /// `{ <name>: <tree of partition/name> }` for each name, in the given order.
    fn load_categories(&self, partition: Partition, names: &[&str]) -> ContextNode {
        let root = EntryPath::partition(partition);
        let mut categories = ContextMap::new();
        for name in names {
            let tree = self.load_tree(&root.join(*name));
            categories.insert((*name).to_string(), ContextNode::Branch(tree));
        }
        ContextNode::Branch(categories)
    }

    /// Recursively read every visible child of `path`, in store order.
    fn load_tree(&self, path: &EntryPath) -> ContextMap {
        let mut map = ContextMap::new();
        for child in self.store.children(path) {
            let child_path = path.join(child.name.clone());
            match child.kind {
                ChildKind::Container => {
                    let subtree = self.load_tree(&child_path);
                    map.insert(child.name, ContextNode::Branch(subtree));
                }
                ChildKind::Entry => match self.store.read_entry(&child_path) {
                    Ok(text) => {
                        map.insert(child.name, ContextNode::Text(text));
                    }
                    Err(e) => {
                        warn!(path = %child_path, error = %e, "skipping unreadable entry");
                    }
                },
            }
        }
        debug!(path = %path, children = map.len(), "loaded tree");
        map
    }

    /// Text of the single workflow entry `name`, if it exists and is readable.
    fn read_workflow(&self, name: &str) -> Option<String> {
        let path = EntryPath::partition(Partition::Workflows).join(name);
        match self.store.read_entry(&path) {
            Ok(text) => Some(text),
            Err(PromptTreeError::NotFound { .. }) => {
                debug!(path = %path, "workflow not found");
                None
            }
            Err(e) => {
                warn!(path = %path, error = %e, "skipping unreadable workflow");
                None
            }
        }
    }
}

fn required_target(scope: Scope, target: Option<&str>) -> Result<&str> {
    target.ok_or_else(|| PromptTreeError::MissingTarget {
        scope: scope.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::test_support::{temp_store, write};
    use prompttree_storage::Listing;

    fn text(node: Option<&ContextNode>) -> &str {
        match node {
            Some(ContextNode::Text(t)) => t.as_str(),
            other => panic!("expected text, got {other:?}"),
        }
    }

    fn branch(node: Option<&ContextNode>) -> &ContextMap {
        match node {
            Some(ContextNode::Branch(m)) => m,
            other => panic!("expected branch, got {other:?}"),
        }
    }

    fn seed(root: &std::path::Path) {
        write(root, "system/architecture.md", "# Architecture");
        write(root, "system/conventions.md", "# Conventions");
        write(root, "packages/cache/overview.md", "cache overview");
        write(root, "packages/cache/status.md", "cache status");
        write(root, "packages/cache/notes.txt", "ignored");
        write(root, "packages/queue/overview.md", "queue overview");
        write(root, "applications/dashboard/overview.md", "dashboard overview");
        write(root, "applications/dashboard/api/routes.md", "routes");
        write(root, "workflows/report-generation.md", "generate reports");
        write(root, "workflows/release.md", "cut a release");
    }

    #[test]
    fn package_scope_collects_target_tree() {
        let (tmp, store) = temp_store();
        seed(&tmp);

        let agg = Aggregator::new(&store)
            .aggregate(Scope::Package, Some("cache"))
            .unwrap();

        assert_eq!(agg.context.len(), 1);
        let cache = branch(branch(agg.context.get("package")).get("cache"));
        let keys: Vec<&str> = cache.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["overview", "status"]);
        assert_eq!(text(cache.get("status")), "cache status");

        assert_eq!(agg.metadata.total_prompts, 2);
        assert_eq!(agg.metadata.total_prompts, agg.context.leaf_count());
        assert_eq!(agg.metadata.scope, Scope::Package);
        assert_eq!(agg.metadata.target.as_deref(), Some("cache"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    /// Store that records whether it was touched at all.
    struct TrackingStore {
        touched: Cell<bool>,
    }

    impl EntryStore for TrackingStore {
        fn list_children(&self, _path: &EntryPath) -> Result<Listing> {
            self.touched.set(true);
            Ok(Listing::Absent)
        }
        fn read_entry(&self, path: &EntryPath) -> Result<String> {
            self.touched.set(true);
            Err(PromptTreeError::not_found(path))
        }
        fn exists(&self, _path: &EntryPath) -> bool {
            self.touched.set(true);
            false
        }
        fn create_container(&self, _path: &EntryPath) -> Result<()> {
            self.touched.set(true);
            Ok(())
        }
    }

    #[test]
    fn missing_target_fails_before_touching_store() {
        let store = TrackingStore {
            touched: Cell::new(false),
        };
        let aggregator = Aggregator::new(&store);

        for scope in [Scope::Package, Scope::Application] {
            let err = aggregator.aggregate(scope, None).unwrap_err();
            assert!(matches!(err, PromptTreeError::MissingTarget { .. }));
            assert!(err.is_config());

            let err = aggregator.aggregate(scope, Some("  ")).unwrap_err();
            assert!(matches!(err, PromptTreeError::MissingTarget { .. }));
        }
        assert!(!store.touched.get());
    }

    #[test]
    fn workflow_target_reads_single_entry() {
        let (tmp, store) = temp_store();
        seed(&tmp);
        let aggregator = Aggregator::new(&store);

        let agg = aggregator
            .aggregate(Scope::Workflow, Some("report-generation"))
            .unwrap();
        assert_eq!(agg.context.len(), 1);
        assert_eq!(text(agg.context.get("report-generation")), "generate reports");
        assert_eq!(agg.metadata.total_prompts, 1);

        let agg = aggregator
            .aggregate(Scope::Workflow, Some("nonexistent"))
            .unwrap();
        assert!(agg.context.is_empty());
        assert_eq!(agg.metadata.total_prompts, 0);
        assert_eq!(agg.metadata.workflows, vec!["release", "report-generation"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn workflow_without_target_collects_all() {
        let (tmp, store) = temp_store();
        seed(&tmp);

        let agg = Aggregator::new(&store)
            .aggregate(Scope::Workflow, None)
            .unwrap();
        let workflows = branch(agg.context.get("workflows"));
        assert_eq!(workflows.len(), 2);
        assert_eq!(agg.metadata.total_prompts, 2);
        assert_eq!(agg.metadata.target, None);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn system_scope_collects_partition() {
        let (tmp, store) = temp_store();
        seed(&tmp);

        let agg = Aggregator::new(&store).aggregate(Scope::System, None).unwrap();
        let system = branch(agg.context.get("system"));
        assert_eq!(text(system.get("architecture")), "# Architecture");
        assert_eq!(agg.metadata.total_prompts, 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn application_scope_keeps_nested_containers() {
        let (tmp, store) = temp_store();
        seed(&tmp);

        let agg = Aggregator::new(&store)
            .aggregate(Scope::Application, Some("dashboard"))
            .unwrap();
        let dashboard = branch(branch(agg.context.get("application")).get("dashboard"));
        assert_eq!(text(branch(dashboard.get("api")).get("routes")), "routes");
        assert_eq!(agg.metadata.total_prompts, 2);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn full_scope_accumulates_every_component() {
        let (tmp, store) = temp_store();
        seed(&tmp);

        let agg = Aggregator::new(&store).aggregate(Scope::Full, None).unwrap();

        let keys: Vec<&str> = agg.context.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["system", "workflows", "packages", "applications"]);

        let packages = branch(agg.context.get("packages"));
        assert_eq!(packages.len(), 2, "earlier packages must not be dropped");
        assert_eq!(text(branch(packages.get("cache")).get("overview")), "cache overview");
        assert_eq!(text(branch(packages.get("queue")).get("overview")), "queue overview");

        // 2 system + 2 workflows + 3 package entries + 2 application entries
        assert_eq!(agg.metadata.total_prompts, 9);
        assert_eq!(agg.metadata.total_prompts, agg.context.leaf_count());
        assert_eq!(agg.metadata.packages, vec!["cache", "queue"]);
        assert_eq!(agg.metadata.applications, vec!["dashboard"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_subtrees_degrade_to_empty_mappings() {
        let (tmp, store) = temp_store();

        let agg = Aggregator::new(&store)
            .aggregate(Scope::Package, Some("ghost"))
            .unwrap();
        let ghost = branch(branch(agg.context.get("package")).get("ghost"));
        assert!(ghost.is_empty());
        assert_eq!(agg.metadata.total_prompts, 0);

        let agg = Aggregator::new(&store).aggregate(Scope::Full, None).unwrap();
        assert_eq!(agg.context.len(), 4);
        assert_eq!(agg.metadata.total_prompts, 0);
        assert!(agg.metadata.packages.is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let (tmp, store) = temp_store();
        write(&tmp, "packages/cache/overview.md", "fine");
        let broken = tmp.join("packages/cache/broken.md");
        std::fs::write(&broken, [0xff, 0xfe, 0x80]).unwrap();

        let agg = Aggregator::new(&store)
            .aggregate(Scope::Package, Some("cache"))
            .unwrap();
        let cache = branch(branch(agg.context.get("package")).get("cache"));
        assert!(cache.get("broken").is_none());
        assert_eq!(agg.metadata.total_prompts, 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let (tmp, store) = temp_store();
        seed(&tmp);
        let aggregator = Aggregator::new(&store);

        for scope in Scope::ALL {
            let target = scope.requires_target().then_some(match scope {
                Scope::Application => "dashboard",
                _ => "cache",
            });
            let a = aggregator.aggregate(scope, target).unwrap();
            let b = aggregator.aggregate(scope, target).unwrap();

            assert_eq!(a.context, b.context);
            let mut meta_b = b.metadata.clone();
            meta_b.generated_at = a.metadata.generated_at;
            assert_eq!(a.metadata, meta_b);
            assert_eq!(a.metadata.total_prompts, a.context.leaf_count());
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn metadata_lists_are_independent_of_selection() {
        let (tmp, store) = temp_store();
        seed(&tmp);

        let agg = Aggregator::new(&store)
            .aggregate(Scope::Workflow, Some("release"))
            .unwrap();
        assert_eq!(agg.metadata.packages, vec!["cache", "queue"]);
        assert_eq!(agg.metadata.applications, vec!["dashboard"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
