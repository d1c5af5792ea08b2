//! Shared types, error model, and configuration for prompttree.
//!
//! This crate is the foundation depended on by all other prompttree crates.
//! It provides:
//! - [`PromptTreeError`]: the unified error type
//! - Domain types ([`EntryPath`], [`Scope`], [`AggregatedContext`], [`ValidationReport`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, OutputConfig, ProjectConfig, StoreConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{PromptTreeError, Result};
pub use types::{
    AggregatedContext, Component, ComponentKind, ContextMap, ContextMetadata, ContextNode,
    EntryPath, LocationCheck, OrphanEntry, Partition, Scope, ValidationReport,
};
