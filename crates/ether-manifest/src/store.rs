use crate::{Manifest, ManifestError};
use ether_lockfile::LockfileSnapshot;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the manifest file at the project root.
pub const MANIFEST_FILE: &str = "Package.swift";

/// Reads and writes the project's boundary files.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: PathBuf,
}

impl ManifestStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Load `Package.swift`. It must exist and be UTF-8.
    pub fn load(&self) -> Result<Manifest, ManifestError> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Err(ManifestError::NotFound(self.root.clone()));
        }
        let raw = fs::read_to_string(&path).map_err(|e| ManifestError::ReadError(path, e))?;
        Ok(Manifest::parse(raw))
    }

    /// Load the lockfile, or an empty snapshot if the project was never resolved.
    pub fn load_lockfile(&self) -> Result<LockfileSnapshot, ManifestError> {
        Ok(LockfileSnapshot::load_from_project(&self.root)?)
    }

    /// Write the manifest through a temporary file in the same directory,
    /// then rename it over the original.
    pub fn save(&self, manifest: &Manifest) -> Result<(), ManifestError> {
        let path = self.manifest_path();
        let write_error = |e: std::io::Error| ManifestError::WriteError(path.clone(), e);

        let mut temp = NamedTempFile::new_in(&self.root).map_err(write_error)?;
        temp.write_all(manifest.raw_text().as_bytes())
            .map_err(write_error)?;
        temp.as_file().sync_all().map_err(write_error)?;

        if let Ok(metadata) = fs::metadata(&path) {
            fs::set_permissions(temp.path(), metadata.permissions()).map_err(write_error)?;
        }

        temp.persist(&path).map_err(|e| write_error(e.error))?;
        tracing::debug!("Wrote {}", path.display());
        Ok(())
    }
}
