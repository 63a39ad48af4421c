use crate::extract::Structure;
use ether_types::{canonical_url, Dependency, Product, Target};
use std::cell::OnceCell;
use std::fmt;
use std::ops::Range;

/// The text of a `Package.swift` plus a structural view derived from it.
///
/// The text is the source of truth. The view is rebuilt lazily after every
/// edit, so bytes outside an edited range are never touched.
#[derive(Debug, Clone)]
pub struct Manifest {
    raw: String,
    structure: OnceCell<Structure>,
}

impl Manifest {
    pub fn parse(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            structure: OnceCell::new(),
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    pub fn into_text(self) -> String {
        self.raw
    }

    pub(crate) fn structure(&self) -> &Structure {
        self.structure.get_or_init(|| Structure::scan(&self.raw))
    }

    pub(crate) fn replace_range(&mut self, range: Range<usize>, text: &str) {
        self.raw.replace_range(range, text);
        self.structure = OnceCell::new();
    }

    /// Whether the manifest has a `Package(...)` declaration at all.
    pub fn has_package_declaration(&self) -> bool {
        self.structure().package.is_some()
    }

    /// Whether the package declares a `dependencies:` array, even an empty one.
    pub fn has_dependencies_section(&self) -> bool {
        self.structure()
            .package
            .as_ref()
            .is_some_and(|p| p.dependencies.is_some())
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.structure().dependencies.iter().map(|e| &e.dependency)
    }

    pub fn dependency_by_url(&self, url: &str) -> Option<&Dependency> {
        let wanted = canonical_url(url);
        self.dependencies()
            .find(|dep| canonical_url(&dep.url) == wanted)
    }

    /// Find a dependency by its explicit name or URL-derived identity.
    pub fn dependency_by_name(&self, name: &str) -> Option<&Dependency> {
        self.dependencies()
            .find(|dep| dep.name.eq_ignore_ascii_case(name) || dep.identity() == name.to_lowercase())
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.structure().targets.iter().map(|e| &e.target)
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets().find(|t| t.name == name)
    }

    pub fn products(&self) -> &[Product] {
        &self.structure().products
    }

    /// Dependencies that no target refers to.
    ///
    /// Legal, but usually a leftover worth mentioning to the user.
    pub fn unreferenced_dependencies(&self) -> Vec<&Dependency> {
        self.dependencies()
            .filter(|dep| {
                let identity = dep.identity();
                let names = [dep.name.as_str(), identity.as_str()];
                !self
                    .targets()
                    .flat_map(|t| t.dependencies.iter())
                    .any(|d| d.references_package(&names))
            })
            .collect()
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Manifest {}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"// swift-tools-version:5.5
import PackageDescription

let package = Package(
    name: "Site",
    dependencies: [
        .package(url: "https://github.com/vapor/vapor.git", from: "4.0.0"),
        .package(url: "https://github.com/JohnSundell/Ink.git", .upToNextMinor(from: "0.5.0")),
        .package(url: "https://github.com/apple/swift-log", from: "1.0.0"),
    ],
    targets: [
        .executableTarget(name: "Site", dependencies: [
            .product(name: "Vapor", package: "vapor"),
            "Ink",
        ]),
    ]
)
"#;

    #[test]
    fn test_round_trip_untouched() {
        let manifest = Manifest::parse(MANIFEST);
        assert_eq!(manifest.dependencies().count(), 3);
        assert_eq!(manifest.targets().count(), 1);
        assert_eq!(manifest.to_string(), MANIFEST);
        assert_eq!(manifest.into_text(), MANIFEST);
    }

    #[test]
    fn test_lookups() {
        let manifest = Manifest::parse(MANIFEST);
        assert!(manifest.has_package_declaration());
        assert!(manifest.has_dependencies_section());
        assert_eq!(
            manifest
                .dependency_by_url("https://github.com/vapor/vapor")
                .map(|d| d.name.as_str()),
            Some("vapor")
        );
        assert!(manifest.dependency_by_name("ink").is_some());
        assert!(manifest.target("Site").is_some());
        assert!(manifest.target("site").is_none());
    }

    #[test]
    fn test_unreferenced_dependencies() {
        let manifest = Manifest::parse(MANIFEST);
        let unused: Vec<_> = manifest
            .unreferenced_dependencies()
            .into_iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(unused, vec!["swift-log"]);
    }
}
