//! Aggregation and structure validation for prompttree.
//!
//! This crate ties the entry store, the project lister, and the renderers
//! together into the two user-facing workflows: aggregating a scoped slice of
//! the documentation tree, and checking the tree against the host project.

pub mod aggregator;
pub mod lister;
pub mod output;
pub mod scanner;
pub mod validator;

pub use aggregator::{Aggregation, Aggregator};
pub use lister::{ProjectLister, StaticLister, WorkspaceLister};
pub use output::{OutputMeta, write_output};
pub use scanner::{Inventory, PartitionScan, ScanResult, known_names, scan};
pub use validator::{Validator, create_missing, orphans_in};
