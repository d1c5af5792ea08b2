//! Application configuration for prompttree.
//!
//! The config file is `prompttree.toml`, looked up in the working directory
//! first and then at `~/.prompttree/prompttree.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PromptTreeError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "prompttree.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".prompttree";

// ---------------------------------------------------------------------------
// Config structs (matching prompttree.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Documentation store location.
    #[serde(default)]
    pub store: StoreConfig,

    /// Host project layout for structure validation.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Rendering defaults.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base directory holding `system/`, `packages/`, `applications/`, `workflows/`.
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
        }
    }
}

fn default_store_root() -> PathBuf {
    PathBuf::from("docs")
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Root of the host project whose components are documented.
    #[serde(default = "default_project_root")]
    pub root: PathBuf,

    /// Directories (relative to `root`) whose children are packages.
    #[serde(default = "default_package_dirs")]
    pub package_dirs: Vec<String>,

    /// Directories (relative to `root`) whose children are applications.
    #[serde(default = "default_application_dirs")]
    pub application_dirs: Vec<String>,

    /// A child directory counts as a component only if it holds one of these.
    #[serde(default = "default_manifest_files")]
    pub manifest_files: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_project_root(),
            package_dirs: default_package_dirs(),
            application_dirs: default_application_dirs(),
            manifest_files: default_manifest_files(),
        }
    }
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_package_dirs() -> Vec<String> {
    vec!["packages".into()]
}
fn default_application_dirs() -> Vec<String> {
    vec!["apps".into()]
}
fn default_manifest_files() -> Vec<String> {
    vec![
        "Cargo.toml".into(),
        "package.json".into(),
        "pyproject.toml".into(),
        "go.mod".into(),
    ]
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format name (json, xml, markdown).
    #[serde(default = "default_format")]
    pub format: String,

    /// Whether rendered bundles carry the metadata block.
    #[serde(default = "default_true")]
    pub include_metadata: bool,

    /// Compact JSON output.
    #[serde(default)]
    pub minify: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            include_metadata: true,
            minify: false,
        }
    }
}

fn default_format() -> String {
    "json".into()
}
fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Resolve relative roots against `base` (usually the config file's directory).
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        if self.store.root.is_relative() {
            self.store.root = base.join(&self.store.root);
        }
        if self.project.root.is_relative() {
            self.project.root = base.join(&self.project.root);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.prompttree/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PromptTreeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.prompttree/prompttree.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config for the working directory `cwd`.
///
/// Checks `<cwd>/prompttree.toml`, then the user config file. Returns
/// defaults resolved against `cwd` if neither exists.
pub fn load_config(cwd: &Path) -> Result<AppConfig> {
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return load_config_from(&local);
    }

    // A missing home directory only means there is no user config to find.
    if let Ok(path) = config_file_path() {
        if path.is_file() {
            return load_config_from(&path);
        }
    }

    tracing::debug!(cwd = %cwd.display(), "config file not found, using defaults");
    Ok(AppConfig::default().resolve_paths(cwd))
}

/// Load the application config from a specific file path.
///
/// Relative roots in the file are resolved against the file's directory.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PromptTreeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        PromptTreeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config.resolve_paths(base))
}

/// Write a default config file into `dir`. Returns the path to the created file.
pub fn init_config(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| PromptTreeError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(PromptTreeError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PromptTreeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PromptTreeError::io(&path, e))?;
    tracing::info!(path = %path.display(), "created default config file");

    Ok(path)
}
