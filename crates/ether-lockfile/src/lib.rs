//! Lockfile reading for Ether.
//!
//! Decodes the resolved dependency graph SwiftPM writes next to the manifest
//! (`Package.resolved` in its v1, v2 and v3 layouts, or the legacy
//! `Package.pins`) into a typed [`LockfileSnapshot`], and compares two
//! snapshots taken around a resolve.

use ether_types::canonical_url;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names SwiftPM has used for its lockfile, in lookup order.
pub const LOCKFILE_NAMES: [&str; 2] = ["Package.resolved", "Package.pins"];

#[derive(Error, Debug)]
pub enum LockfileError {
    #[error("Failed to read lockfile {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse lockfile: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid pin at index {index}: {reason}")]
    InvalidPin { index: usize, reason: String },
    #[error("Lockfile has no pins array")]
    MissingPins,
}

/// The resolved state of one pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinState {
    /// Resolved to a tagged version
    Version {
        version: String,
        revision: Option<String>,
    },
    /// Tracking a branch
    Branch {
        branch: String,
        revision: Option<String>,
    },
    /// Pinned to a bare commit
    Revision(String),
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version { version, .. } => write!(f, "v{}", version),
            Self::Branch { branch, .. } => f.write_str(branch),
            Self::Revision(revision) => f.write_str(revision),
        }
    }
}

/// One resolved package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    /// Package name (`package` in v1, `identity` in v2+)
    pub package: String,
    /// Repository location
    pub repository_url: String,
    /// Resolved version, branch or revision
    pub state: PinState,
}

impl Pin {
    fn key(&self) -> (String, String) {
        (self.package.to_lowercase(), canonical_url(&self.repository_url))
    }
}

#[derive(Debug, Deserialize)]
struct RawLockfile {
    object: Option<RawObject>,
    pins: Option<Vec<RawPin>>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    pins: Vec<RawPin>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPin {
    package: Option<String>,
    identity: Option<String>,
    #[serde(rename = "repositoryURL")]
    repository_url: Option<String>,
    location: Option<String>,
    state: Option<RawState>,
    // Package.pins carried the state inline
    version: Option<String>,
    revision: Option<String>,
    branch: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawState {
    version: Option<String>,
    revision: Option<String>,
    branch: Option<String>,
}

impl RawPin {
    fn into_pin(self, index: usize) -> Result<Pin, LockfileError> {
        let invalid = |reason: &str| LockfileError::InvalidPin {
            index,
            reason: reason.to_string(),
        };

        let package = self
            .package
            .or(self.identity)
            .ok_or_else(|| invalid("missing package name"))?;
        let repository_url = self
            .repository_url
            .or(self.location)
            .ok_or_else(|| invalid("missing repository URL"))?;

        let state = self.state.unwrap_or(RawState {
            version: self.version,
            revision: self.revision,
            branch: self.branch,
        });

        let state = match (state.version, state.branch, state.revision) {
            (Some(version), _, revision) => PinState::Version { version, revision },
            (None, Some(branch), revision) => PinState::Branch { branch, revision },
            (None, None, Some(revision)) => PinState::Revision(revision),
            (None, None, None) => return Err(invalid("state has no version, branch or revision")),
        };

        Ok(Pin {
            package,
            repository_url,
            state,
        })
    }
}

/// A point-in-time copy of the resolved pins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockfileSnapshot {
    pins: Vec<Pin>,
}

impl LockfileSnapshot {
    /// A snapshot of a project that has not been resolved yet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pins(pins: Vec<Pin>) -> Self {
        Self { pins }
    }

    /// Decode any supported lockfile layout.
    pub fn from_json(json: &str) -> Result<Self, LockfileError> {
        let raw: RawLockfile = serde_json::from_str(json)?;
        let raw_pins = match (raw.object, raw.pins) {
            (Some(object), _) => object.pins,
            (None, Some(pins)) => pins,
            (None, None) => return Err(LockfileError::MissingPins),
        };

        let pins = raw_pins
            .into_iter()
            .enumerate()
            .map(|(index, pin)| pin.into_pin(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { pins })
    }

    /// Read a lockfile at an explicit path.
    pub fn load(path: &Path) -> Result<Self, LockfileError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LockfileError::Read(path.to_path_buf(), e))?;
        Self::from_json(&content)
    }

    /// Read the project's lockfile, or an empty snapshot if there is none.
    pub fn load_from_project(root: &Path) -> Result<Self, LockfileError> {
        for name in LOCKFILE_NAMES {
            let path = root.join(name);
            if path.is_file() {
                tracing::debug!("Reading lockfile {}", path.display());
                return Self::load(&path);
            }
        }

        tracing::debug!("No lockfile in {}", root.display());
        Ok(Self::empty())
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Find a pin by package name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&Pin> {
        self.pins
            .iter()
            .find(|pin| pin.package.eq_ignore_ascii_case(name))
    }

    /// Find a pin by repository URL, ignoring `.git` suffixes and case.
    pub fn find_by_url(&self, url: &str) -> Option<&Pin> {
        let wanted = canonical_url(url);
        self.pins
            .iter()
            .find(|pin| canonical_url(&pin.repository_url) == wanted)
    }
}

/// What changed between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockfileDiff {
    /// Pins present only in the later snapshot
    pub added: Vec<Pin>,
    /// Pins present only in the earlier snapshot
    pub removed: Vec<Pin>,
}

impl LockfileDiff {
    /// Compare pins by `(name, repository URL)`.
    ///
    /// Version changes of the same package are not counted.
    pub fn between(before: &LockfileSnapshot, after: &LockfileSnapshot) -> Self {
        let before_keys: BTreeSet<_> = before.pins.iter().map(Pin::key).collect();
        let after_keys: BTreeSet<_> = after.pins.iter().map(Pin::key).collect();

        let added = after
            .pins
            .iter()
            .filter(|pin| !before_keys.contains(&pin.key()))
            .cloned()
            .collect();
        let removed = before
            .pins
            .iter()
            .filter(|pin| !after_keys.contains(&pin.key()))
            .cloned()
            .collect();

        Self { added, removed }
    }

    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Shorthand for [`LockfileDiff::between`].
pub fn diff(before: &LockfileSnapshot, after: &LockfileSnapshot) -> LockfileDiff {
    LockfileDiff::between(before, after)
}
