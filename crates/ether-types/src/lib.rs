//! Core types for Ether.
//!
//! This crate defines the data structures shared by the manifest editor,
//! the lockfile reader and the CLI: dependencies, version requirements,
//! targets and products as they appear in a `Package.swift`.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use semver::Version;

/// How a dependency's acceptable versions are expressed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum VersionSpec {
    /// `.exact("1.2.3")`
    Exact(String),
    /// `from: "1.2.3"`
    From(String),
    /// `.upToNextMajor(from: "1.2.3")`
    UpToNextMajor(String),
    /// `.upToNextMinor(from: "1.2.3")`
    UpToNextMinor(String),
    /// `"1.0.0"..<"2.0.0"` or `"1.0.0"..."1.5.0"`
    Range {
        lower: String,
        upper: String,
        inclusive_upper: bool,
    },
    /// `.branch("main")`
    Branch(String),
    /// `.revision("abc123")`
    Revision(String),
}

impl VersionSpec {
    /// `.exact`, with a leading `v` stripped from the tag.
    pub fn exact(version: &str) -> Self {
        Self::Exact(normalize_version(version).to_string())
    }

    /// `from:`, with a leading `v` stripped from the tag.
    pub fn from_version(version: &str) -> Self {
        Self::From(normalize_version(version).to_string())
    }

    pub fn up_to_next_major(version: &str) -> Self {
        Self::UpToNextMajor(normalize_version(version).to_string())
    }

    pub fn up_to_next_minor(version: &str) -> Self {
        Self::UpToNextMinor(normalize_version(version).to_string())
    }

    /// Parse `lower..<upper` or `lower...upper`.
    pub fn parse_range(range: &str) -> Option<Self> {
        let (lower, upper, inclusive_upper) = if let Some((l, u)) = range.split_once("..<") {
            (l, u, false)
        } else if let Some((l, u)) = range.split_once("...") {
            (l, u, true)
        } else {
            return None;
        };

        let lower = normalize_version(lower.trim().trim_matches('"'));
        let upper = normalize_version(upper.trim().trim_matches('"'));
        if lower.is_empty() || upper.is_empty() {
            return None;
        }

        Some(Self::Range {
            lower: lower.to_string(),
            upper: upper.to_string(),
            inclusive_upper,
        })
    }

    /// The version this requirement is anchored on, if it is version based.
    pub fn base_version(&self) -> Option<&str> {
        match self {
            Self::Exact(v) | Self::From(v) | Self::UpToNextMajor(v) | Self::UpToNextMinor(v) => {
                Some(v)
            }
            Self::Range { lower, .. } => Some(lower),
            Self::Branch(_) | Self::Revision(_) => None,
        }
    }

    /// Same variant, anchored on a new version.
    ///
    /// Ranges collapse to `from:` since the upper bound no longer applies.
    /// Branch and revision requirements have no version to move.
    pub fn with_version(&self, version: &str) -> Option<Self> {
        match self {
            Self::Exact(_) => Some(Self::exact(version)),
            Self::From(_) | Self::Range { .. } => Some(Self::from_version(version)),
            Self::UpToNextMajor(_) => Some(Self::up_to_next_major(version)),
            Self::UpToNextMinor(_) => Some(Self::up_to_next_minor(version)),
            Self::Branch(_) | Self::Revision(_) => None,
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "exactly {}", v),
            Self::From(v) => write!(f, "from {}", v),
            Self::UpToNextMajor(v) => write!(f, "up to next major from {}", v),
            Self::UpToNextMinor(v) => write!(f, "up to next minor from {}", v),
            Self::Range {
                lower,
                upper,
                inclusive_upper,
            } => {
                let op = if *inclusive_upper { "..." } else { "..<" };
                write!(f, "{}{}{}", lower, op, upper)
            }
            Self::Branch(b) => write!(f, "branch {}", b),
            Self::Revision(r) => write!(f, "revision {}", r),
        }
    }
}

/// One package reference in the manifest's `dependencies:` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Source location, usually a git URL
    pub url: String,
    /// Package name, from an explicit `name:` argument or derived from the URL
    pub name: String,
    /// Version requirement
    pub version: VersionSpec,
}

impl Dependency {
    /// Create a dependency whose name is derived from its URL.
    pub fn new(url: impl Into<String>, version: VersionSpec) -> Self {
        let url = url.into();
        let name = package_identity(&url);
        Self { url, name, version }
    }

    /// Set an explicit package name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The identity SwiftPM derives from the URL (lowercased last path component).
    pub fn identity(&self) -> String {
        package_identity(&self.url).to_lowercase()
    }

    /// Whether this dependency points at `url`, ignoring `.git`, trailing
    /// slashes and case.
    pub fn matches_url(&self, url: &str) -> bool {
        canonical_url(&self.url) == canonical_url(url)
    }
}

/// Normalize a repository URL for comparison.
pub fn canonical_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed.to_lowercase()
}

/// Last path component of a repository URL without `.git`.
pub fn package_identity(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

/// The type of a build target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// `.executableTarget`
    Executable,
    /// `.target`
    Library,
    /// `.testTarget`
    Test,
    /// `.plugin`
    Plugin,
    /// `.macro`
    Macro,
    /// `.systemLibrary`
    SystemLibrary,
    /// `.binaryTarget`
    Binary,
}

impl TargetType {
    /// Map a manifest declaration (`target`, `testTarget`, ...) to its type.
    pub fn from_declaration(call: &str) -> Option<Self> {
        match call {
            "target" | "Target" => Some(Self::Library),
            "executableTarget" => Some(Self::Executable),
            "testTarget" => Some(Self::Test),
            "plugin" => Some(Self::Plugin),
            "macro" => Some(Self::Macro),
            "systemLibrary" => Some(Self::SystemLibrary),
            "binaryTarget" => Some(Self::Binary),
            _ => None,
        }
    }

    /// Whether the declaration takes a `dependencies:` argument.
    pub fn accepts_dependencies(&self) -> bool {
        !matches!(self, Self::SystemLibrary | Self::Binary)
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Executable => "executable",
            Self::Library => "library",
            Self::Test => "test",
            Self::Plugin => "plugin",
            Self::Macro => "macro",
            Self::SystemLibrary => "system library",
            Self::Binary => "binary",
        };
        f.write_str(s)
    }
}

/// One entry of a target's `dependencies:` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TargetDependency {
    /// `"Name"` or `.byName(name: "Name")`
    ByName { name: String },
    /// `.product(name: "Name", package: "pkg")`
    Product {
        name: String,
        package: Option<String>,
    },
    /// `.target(name: "Name")`
    Target { name: String },
}

impl TargetDependency {
    /// The product or target name this entry refers to.
    pub fn name(&self) -> &str {
        match self {
            Self::ByName { name } | Self::Product { name, .. } | Self::Target { name } => name,
        }
    }

    /// Whether this entry pulls in anything from one of the given packages.
    ///
    /// Local `.target(name:)` references never match.
    pub fn references_package(&self, packages: &[&str]) -> bool {
        let eq = |a: &str| packages.iter().any(|p| p.eq_ignore_ascii_case(a));
        match self {
            Self::ByName { name } => eq(name),
            Self::Product { name, package } => eq(name) || package.as_deref().is_some_and(eq),
            Self::Target { .. } => false,
        }
    }
}

/// A build target declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Target name
    pub name: String,
    /// Target type
    #[serde(rename = "type")]
    pub target_type: TargetType,
    /// Per-target dependency list, in source order
    #[serde(default)]
    pub dependencies: Vec<TargetDependency>,
}

impl Target {
    /// Names referenced by the target's dependency list.
    pub fn dependency_names(&self) -> Vec<&str> {
        self.dependencies.iter().map(|d| d.name()).collect()
    }
}

/// The kind of a product a package exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Library,
    Executable,
    Plugin,
}

/// A product declared in a manifest's `products:` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
}

/// Strip a leading `v` from a tag (`v1.2.3` → `1.2.3`).
pub fn normalize_version(version: &str) -> &str {
    let version = version.trim();
    match version.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => version,
    }
}

/// Whether a tag names a pre-release (`rc`, `beta`, `alpha`, or a semver
/// pre-release component).
pub fn is_prerelease(tag: &str) -> bool {
    let lower = tag.to_lowercase();
    if lower.contains("rc") || lower.contains("beta") || lower.contains("alpha") {
        return true;
    }
    Version::parse(normalize_version(tag))
        .map(|v| !v.pre.is_empty())
        .unwrap_or(false)
}

/// Which release to pick when the newest tag is a pre-release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleasePolicy {
    /// Fall back to the newest stable release when one exists
    #[default]
    PreferStable,
    /// Take the newest tag whatever it is
    AllowPrerelease,
}

impl ReleasePolicy {
    pub fn from_flag(allow_prerelease: bool) -> Self {
        if allow_prerelease {
            Self::AllowPrerelease
        } else {
            Self::PreferStable
        }
    }
}

/// Pick a release from tags ordered newest first.
pub fn select_release<S: AsRef<str>>(tags: &[S], policy: ReleasePolicy) -> Option<&str> {
    let latest = tags.first()?.as_ref();
    if policy == ReleasePolicy::AllowPrerelease || !is_prerelease(latest) {
        return Some(latest);
    }

    let stable = tags
        .iter()
        .map(AsRef::as_ref)
        .find(|tag| !is_prerelease(tag));
    Some(stable.unwrap_or(latest))
}

/// Order tags newest first: semver tags by version, then the rest by name.
pub fn sort_tags_newest_first(tags: &mut [String]) {
    tags.sort_by(|a, b| {
        let va = Version::parse(normalize_version(a)).ok();
        let vb = Version::parse(normalize_version(b)).ok();
        match (vb, va) {
            (Some(v1), Some(v2)) => v1.cmp(&v2),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.cmp(a),
        }
    });
}
