//! Project component listing.
//!
//! The validator treats whatever a [`ProjectLister`] returns as ground truth.
//! [`WorkspaceLister`] derives it from the host project's directory layout;
//! [`StaticLister`] serves a fixed list.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use prompttree_shared::{Component, ComponentKind, ProjectConfig, PromptTreeError, Result};

/// Supplies the authoritative list of project components and their kinds.
pub trait ProjectLister {
    fn list_components(&self) -> Result<Vec<Component>>;
}

// ---------------------------------------------------------------------------
// StaticLister
// ---------------------------------------------------------------------------

/// A lister over a fixed, pre-computed component list.
#[derive(Debug, Clone, Default)]
pub struct StaticLister {
    components: Vec<Component>,
}

impl StaticLister {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }
}

impl ProjectLister for StaticLister {
    fn list_components(&self) -> Result<Vec<Component>> {
        Ok(self.components.clone())
    }
}

// ---------------------------------------------------------------------------
// WorkspaceLister
// ---------------------------------------------------------------------------

/// Lists components by scanning the host project's package and application
/// directories.
///
/// Every immediate sub-directory of a configured directory that contains one
/// of the manifest files is a component, named after the sub-directory.
#[derive(Debug, Clone)]
pub struct WorkspaceLister {
    root: PathBuf,
    package_dirs: Vec<String>,
    application_dirs: Vec<String>,
    manifest_files: Vec<String>,
}

impl WorkspaceLister {
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            root: config.root.clone(),
            package_dirs: config.package_dirs.clone(),
            application_dirs: config.application_dirs.clone(),
            manifest_files: config.manifest_files.clone(),
        }
    }

    /// Components of `kind` directly under `dir`, sorted by name.
    fn scan_dir(&self, dir: &Path, kind: ComponentKind) -> Result<Vec<Component>> {
        let read_dir = match std::fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "component directory absent");
                return Ok(Vec::new());
            }
            Err(e) => return Err(PromptTreeError::io(dir, e)),
        };

        let mut names = Vec::new();
        for item in read_dir {
            let item = item.map_err(|e| PromptTreeError::io(dir, e))?;
            let path = item.path();
            let Some(name) = item.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') || !path.is_dir() {
                continue;
            }
            if self.manifest_files.iter().any(|m| path.join(m).is_file()) {
                names.push(name);
            } else {
                debug!(dir = %path.display(), "no manifest, not a component");
            }
        }

        names.sort();
        Ok(names
            .into_iter()
            .map(|name| Component::new(name, kind))
            .collect())
    }
}

impl ProjectLister for WorkspaceLister {
    #[instrument(skip_all, fields(root = %self.root.display()))]
    fn list_components(&self) -> Result<Vec<Component>> {
        if !self.root.is_dir() {
            return Err(PromptTreeError::config(format!(
                "project root '{}' is not a directory",
                self.root.display()
            )));
        }

        let groups = [
            (&self.package_dirs, ComponentKind::Package),
            (&self.application_dirs, ComponentKind::Application),
        ];

        let mut seen = HashSet::new();
        let mut components = Vec::new();
        for (dirs, kind) in groups {
            for dir in dirs {
                for component in self.scan_dir(&self.root.join(dir), kind)? {
                    if seen.insert(component.clone()) {
                        components.push(component);
                    } else {
                        warn!(name = %component.name, %kind, "duplicate component, ignoring");
                    }
                }
            }
        }

        debug!(count = components.len(), "listed project components");
        Ok(components)
    }
}
