//! Filesystem-backed entry store.
//!
//! The [`EntryStore`] trait is the only view the rest of prompttree has of the
//! documentation tree. [`FsStore`] implements it over a directory laid out as:
//!
//! ```text
//! <root>/
//! ├── system/*.md
//! ├── packages/<name>/*.md
//! ├── applications/<name>/*.md
//! └── workflows/*.md
//! ```
//!
//! **Visibility rules:**
//! - Directories are containers; `.md` files are entries named by their stem.
//! - Any other file, and any name starting with `.`, is invisible.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use prompttree_shared::{EntryPath, PromptTreeError, Result};
use tracing::{debug, warn};

/// Extension of files recognised as documentation entries.
pub const ENTRY_EXTENSION: &str = "md";

// ---------------------------------------------------------------------------
// Listing types
// ---------------------------------------------------------------------------

/// What a visible child of a container is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildKind {
    Container,
    Entry,
}

/// A visible child of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    pub name: String,
    pub kind: ChildKind,
}

impl Child {
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ChildKind::Container,
        }
    }

    pub fn entry(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ChildKind::Entry,
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind == ChildKind::Container
    }
}

/// Outcome of listing a path that could be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// The path does not exist or is not a container.
    Absent,
    /// The container's visible children, in store order.
    Present(Vec<Child>),
}

impl Listing {
    /// Children of a present container; empty when absent.
    pub fn into_children(self) -> Vec<Child> {
        match self {
            Self::Absent => Vec::new(),
            Self::Present(children) => children,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Read access to a hierarchical collection of named text blobs.
pub trait EntryStore {
    /// List visible children under `path`.
    ///
    /// `Ok(Listing::Absent)` when the path is missing or not a container;
    /// `Err` only when the container exists but cannot be read.
    fn list_children(&self, path: &EntryPath) -> Result<Listing>;

    /// Read the text of the entry at exactly `path`.
    fn read_entry(&self, path: &EntryPath) -> Result<String>;

    /// Whether a container or entry exists at `path`. Never fails.
    fn exists(&self, path: &EntryPath) -> bool;

    /// Create an empty container at `path`, including missing parents.
    fn create_container(&self, path: &EntryPath) -> Result<()>;

    /// Visible children under `path`, degrading absence and read errors to
    /// an empty list.
    fn children(&self, path: &EntryPath) -> Vec<Child> {
        match self.list_children(path) {
            Ok(listing) => listing.into_children(),
            Err(e) => {
                warn!(path = %path, error = %e, "listing failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Names of visible children of the given kind under `path`.
    fn child_names(&self, path: &EntryPath, kind: ChildKind) -> Vec<String> {
        self.children(path)
            .into_iter()
            .filter(|child| child.kind == kind)
            .map(|child| child.name)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FsStore
// ---------------------------------------------------------------------------

/// Entry store over a directory tree rooted at an explicit base path.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`. The directory does not need to exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a container. `None` if any segment is unsafe.
    fn container_path(&self, path: &EntryPath) -> Option<PathBuf> {
        let mut fs_path = self.root.clone();
        for segment in path.segments() {
            if !is_safe_segment(segment) {
                return None;
            }
            fs_path.push(segment);
        }
        Some(fs_path)
    }

    /// Filesystem path of an entry blob. `None` for unsafe or empty paths.
    fn entry_path(&self, path: &EntryPath) -> Option<PathBuf> {
        if path.segments().is_empty() {
            return None;
        }
        let mut fs_path = self.container_path(path)?;
        let name = path.name()?;
        fs_path.set_file_name(format!("{name}.{ENTRY_EXTENSION}"));
        Some(fs_path)
    }
}

impl EntryStore for FsStore {
    fn list_children(&self, path: &EntryPath) -> Result<Listing> {
        let Some(dir) = self.container_path(path) else {
            return Ok(Listing::Absent);
        };

        let read_dir = match std::fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                debug!(path = %path, "container absent");
                return Ok(Listing::Absent);
            }
            Err(e) => return Err(PromptTreeError::io(&dir, e)),
        };

        let mut containers = Vec::new();
        let mut entries = Vec::new();

        for item in read_dir {
            let item = item.map_err(|e| PromptTreeError::io(&dir, e))?;
            let file_name = item.file_name();
            let Some(name) = file_name.to_str() else {
                debug!(dir = %dir.display(), "skipping non UTF-8 name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            let file_type = item
                .file_type()
                .map_err(|e| PromptTreeError::io(item.path(), e))?;
            let is_dir = if file_type.is_symlink() {
                item.path().is_dir()
            } else {
                file_type.is_dir()
            };

            if is_dir {
                containers.push(name.to_string());
            } else if let Some(stem) = entry_stem(name) {
                entries.push(stem.to_string());
            }
        }

        containers.sort();
        entries.sort();

        // A container shadows an entry of the same name so keys stay unique.
        entries.retain(|name| {
            let shadowed = containers.binary_search(name).is_ok();
            if shadowed {
                warn!(path = %path, name = %name, "entry shadowed by container of the same name");
            }
            !shadowed
        });

        let mut children: Vec<Child> = containers
            .into_iter()
            .map(Child::container)
            .chain(entries.into_iter().map(Child::entry))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Listing::Present(children))
    }

    fn read_entry(&self, path: &EntryPath) -> Result<String> {
        let file = self
            .entry_path(path)
            .ok_or_else(|| PromptTreeError::not_found(path))?;

        match std::fs::read_to_string(&file) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(PromptTreeError::not_found(path)),
            Err(e) => Err(PromptTreeError::io(&file, e)),
        }
    }

    fn exists(&self, path: &EntryPath) -> bool {
        let is_container = self.container_path(path).is_some_and(|p| p.is_dir());
        is_container || self.entry_path(path).is_some_and(|p| p.is_file())
    }

    fn create_container(&self, path: &EntryPath) -> Result<()> {
        let dir = self.container_path(path).ok_or_else(|| {
            PromptTreeError::validation(format!("invalid container path '{path}'"))
        })?;
        std::fs::create_dir_all(&dir).map_err(|e| PromptTreeError::io(&dir, e))?;
        debug!(path = %dir.display(), "created container");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Entry name for a file name carrying the entry extension.
fn entry_stem(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    (ext == ENTRY_EXTENSION && !stem.is_empty()).then_some(stem)
}

/// Reject segments that would escape the store root or address hidden files.
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.contains(['/', '\\'])
        && Path::new(segment).components().count() == 1
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
