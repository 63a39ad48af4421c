//! CLI command implementations.
//!
//! Each verb loads what it needs, decides every interactive question up
//! front, edits the manifest in memory, saves it, then hands over to the
//! Swift package manager. Errors from the lower crates are translated into
//! [`EtherError`] here.

pub mod ui;

mod config;
mod install;
mod remove;
mod search;
mod update;
mod version;

pub use config::config;
pub use install::{install, InstallOptions};
pub use remove::remove;
pub use search::search;
pub use update::update;
pub use version::{version_all, version_latest, version_set, Requirement};

use crate::config::{CommitKind, Configuration};
use crate::metadata::MetadataError;
use crate::process::{self, ProcessError, SwiftPackageManager};
use ether_diagnostics::EtherError;
use ether_lockfile::LockfileDiff;
use ether_manifest::{ManifestError, ManifestStore};
use ether_registry::{CatalogClient, RegistryError};
use miette::Result;
use std::path::PathBuf;

/// Everything a command needs from the environment.
pub struct Context {
    /// Project root holding `Package.swift`
    pub root: PathBuf,
    pub config: Configuration,
    /// Where `config` was loaded from, if a location could be determined
    pub config_path: Option<PathBuf>,
}

impl Context {
    pub fn store(&self) -> ManifestStore {
        ManifestStore::new(&self.root)
    }

    pub fn catalog(&self) -> CatalogClient {
        CatalogClient::new().with_package_list(self.config.package_list_url())
    }

    pub fn swift(&self) -> Result<SwiftPackageManager> {
        Ok(SwiftPackageManager::locate(&self.root).map_err(process_error)?)
    }

    /// Commit the project if a message template is configured for `kind`.
    ///
    /// A failed commit is reported but does not fail the command; the
    /// manifest change has already been made.
    pub async fn commit(&self, kind: CommitKind, name: &str) {
        let Some(message) = self.config.commit_message(kind, name) else {
            return;
        };
        match process::git_commit(&self.root, &message).await {
            Ok(()) => ui::success(format!("Committed: {}", ui::dim(&message))),
            Err(e) => ui::warn(format!("Could not commit: {}", e)),
        }
    }
}

pub(crate) fn manifest_error(err: ManifestError) -> EtherError {
    match err {
        ManifestError::NotFound(path) => EtherError::manifest_not_found(path.display().to_string()),
        ManifestError::ReadError(path, e) | ManifestError::WriteError(path, e) => {
            EtherError::ManifestIo {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        }
        ManifestError::Malformed(message) => EtherError::malformed(message),
        ManifestError::DuplicateDependency(name) => EtherError::DuplicateDependency { name },
        ManifestError::DependencyNotFound(name) => EtherError::DependencyNotFound { name },
        ManifestError::UnresolvedName(name) => EtherError::UnresolvedName { name },
        ManifestError::TargetNotFound(name) => EtherError::TargetNotFound { name },
        ManifestError::Lockfile(e) => EtherError::Lockfile {
            message: e.to_string(),
        },
    }
}

pub(crate) fn process_error(err: ProcessError) -> EtherError {
    match &err {
        ProcessError::NotFound(tool) => {
            let help = match tool.as_str() {
                "swift" => "Install a Swift toolchain from https://swift.org/install",
                _ => "Install git and make sure it is on your PATH",
            };
            EtherError::tool_not_found(tool.as_str(), help)
        }
        ProcessError::Spawn { source, .. } => EtherError::process(err.command(), source.to_string()),
        ProcessError::Failed { status, stderr, .. } => {
            let detail = if stderr.is_empty() {
                status.to_string()
            } else {
                stderr.clone()
            };
            EtherError::process(err.command(), detail)
        }
    }
}

pub(crate) fn registry_error(err: RegistryError) -> EtherError {
    match err {
        RegistryError::NotFound(query) => EtherError::package_not_found(query),
        RegistryError::Network(e) => EtherError::network(e.to_string()),
        RegistryError::InvalidResponse(message) => EtherError::network(message),
    }
}

pub(crate) fn metadata_error(err: MetadataError) -> EtherError {
    match err {
        MetadataError::Registry(e) => registry_error(e),
        MetadataError::Process(e) => process_error(e),
    }
}

pub(crate) fn prompt_error(err: std::io::Error) -> EtherError {
    EtherError::Generic(format!("Prompt failed: {}", err))
}

/// Run `swift package resolve` behind a spinner.
pub(crate) async fn resolve(swift: &SwiftPackageManager) -> Result<()> {
    let pb = ui::spinner("Resolving packages...");
    let result = swift.resolve().await;
    match result {
        Ok(()) => {
            ui::finish(&pb, "Resolved packages");
            Ok(())
        }
        Err(e) => {
            pb.finish_and_clear();
            ui::hint("Package.swift was saved; fix the error and run `swift package resolve`");
            Err(process_error(e).into())
        }
    }
}

/// Print how the set of resolved packages changed.
pub(crate) fn report_delta(diff: &LockfileDiff) {
    if diff.is_empty() {
        ui::hint("No resolved packages changed");
        return;
    }
    if diff.added_count() > 0 {
        println!("📦 {} installed", ui::packages(diff.added_count()));
    }
    if diff.removed_count() > 0 {
        println!("📦 {} removed", ui::packages(diff.removed_count()));
    }
}
