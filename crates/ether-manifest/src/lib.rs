//! Manifest editing for Ether.
//!
//! Reads and rewrites the dependency and target sections of a
//! `Package.swift` without parsing Swift. A delimiter-balance scan finds the
//! `Package(...)` call and the array literals inside it; every edit splices
//! new text into the original, so everything else stays byte for byte.
//!
//! Known limitation: entries built from variables, loops or conditional
//! compilation are invisible to extraction and are skipped with a log line.

mod edit;
mod extract;
mod literal;
mod model;
mod scan;
mod store;

pub use extract::{extract_dependencies, extract_products, extract_targets};
pub use literal::{clean_version, quote, render_dependency, render_requirement, render_target_dependency};
pub use model::Manifest;
pub use store::{ManifestStore, MANIFEST_FILE};

use ether_lockfile::LockfileError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found in {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {0}: {1}")]
    ReadError(PathBuf, #[source] std::io::Error),
    #[error("Failed to write {0}: {1}")]
    WriteError(PathBuf, #[source] std::io::Error),
    #[error("Malformed manifest: {0}")]
    Malformed(String),
    #[error("Dependency '{0}' is already in the manifest")]
    DuplicateDependency(String),
    #[error("Dependency '{0}' not found in the manifest")]
    DependencyNotFound(String),
    #[error("No resolved package named '{0}'")]
    UnresolvedName(String),
    #[error("Target '{0}' not found in the manifest")]
    TargetNotFound(String),
    #[error(transparent)]
    Lockfile(#[from] LockfileError),
}
