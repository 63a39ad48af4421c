//! In-place edits of the manifest's dependency and target sections.
//!
//! Every operation computes its complete text edit before touching the
//! manifest, so a failed operation leaves the text unchanged.

use crate::extract::{ListRegion, PackageDecl};
use crate::literal::{render_dependency, render_requirement, render_target_dependency};
use crate::scan::{indent_of, line_end, line_start, starts_line, Scanner};
use crate::{Manifest, ManifestError};
use ether_lockfile::LockfileSnapshot;
use ether_types::{Dependency, VersionSpec};
use std::ops::Range;

/// `Package(...)` arguments that must come after `dependencies:`.
const AFTER_DEPENDENCIES: [&str; 5] = [
    "targets",
    "swiftLanguageVersions",
    "swiftLanguageModes",
    "cLanguageStandard",
    "cxxLanguageStandard",
];

type TextEdit = (Range<usize>, String);

impl Manifest {
    /// Append a `.package(url:)` entry, creating the `dependencies:` section
    /// when the package has none.
    pub fn add_dependency(
        &mut self,
        url: &str,
        version: VersionSpec,
    ) -> Result<Dependency, ManifestError> {
        let structure = self.structure();
        let package = structure.package.as_ref().ok_or_else(no_package)?;

        if structure
            .dependencies
            .iter()
            .any(|entry| entry.dependency.matches_url(url))
        {
            return Err(ManifestError::DuplicateDependency(url.to_string()));
        }

        let entry = render_dependency(url, &version);
        let scanner = Scanner::new(self.raw_text());
        let (range, text) = match &package.dependencies {
            Some(list) => append_to_list(&scanner, list, &entry, true),
            None if package.arg("dependencies").is_some() => {
                return Err(ManifestError::Malformed(
                    "the package's dependencies are not an array literal".to_string(),
                ))
            }
            None => synthesize_section(&scanner, package, &entry)?,
        };

        tracing::debug!("Adding {} to the manifest", url);
        self.replace_range(range, &text);
        Ok(Dependency::new(url, version))
    }

    /// Remove the dependency a resolved package name maps to, along with
    /// every target dependency that refers to it.
    ///
    /// The manifest only stores URLs, so `name` is looked up in the lockfile
    /// first.
    pub fn remove_dependency(
        &mut self,
        name: &str,
        lockfile: &LockfileSnapshot,
    ) -> Result<Dependency, ManifestError> {
        let pin = lockfile
            .find_by_name(name)
            .ok_or_else(|| ManifestError::UnresolvedName(name.to_string()))?;

        let removed = self
            .remove_dependency_by_url(&pin.repository_url)
            .map_err(|err| match err {
                ManifestError::DependencyNotFound(_) => {
                    ManifestError::DependencyNotFound(name.to_string())
                }
                other => other,
            })?;

        let identity = removed.identity();
        let names = [
            name,
            pin.package.as_str(),
            removed.name.as_str(),
            identity.as_str(),
        ];
        let stripped = self.strip_package_references(&names);
        tracing::debug!(
            "Removed {} and {} target references to it",
            removed.url,
            stripped
        );
        Ok(removed)
    }

    /// Remove the dependency entry for `url` without touching targets.
    pub fn remove_dependency_by_url(&mut self, url: &str) -> Result<Dependency, ManifestError> {
        let structure = self.structure();
        let entry = structure
            .dependencies
            .iter()
            .find(|entry| entry.dependency.matches_url(url))
            .ok_or_else(|| ManifestError::DependencyNotFound(url.to_string()))?;
        let list = structure
            .package
            .as_ref()
            .and_then(|p| p.dependencies.as_ref())
            .ok_or_else(no_package)?;

        let scanner = Scanner::new(self.raw_text());
        let (range, text) = remove_list_element(&scanner, list, entry.element);
        let removed = entry.dependency.clone();

        self.replace_range(range, &text);
        Ok(removed)
    }

    /// Remove every target dependency that pulls from one of `packages`.
    ///
    /// Returns how many entries were removed.
    pub fn strip_package_references(&mut self, packages: &[&str]) -> usize {
        let mut removed = 0;
        loop {
            let edit = {
                let scanner = Scanner::new(self.raw_text());
                let edit = self.structure().targets.iter().find_map(|entry| {
                    let list = entry.dependencies.as_ref()?;
                    entry
                        .target
                        .dependencies
                        .iter()
                        .zip(&entry.dependency_elements)
                        .find(|(dependency, _)| dependency.references_package(packages))
                        .map(|(_, &element)| remove_list_element(&scanner, list, element))
                });
                edit
            };

            let Some((range, text)) = edit else {
                return removed;
            };
            self.replace_range(range, &text);
            removed += 1;
        }
    }

    /// Add `product` to a target's dependencies.
    ///
    /// Returns `false` if the target already depends on it.
    pub fn attach_dependency(&mut self, target: &str, product: &str) -> Result<bool, ManifestError> {
        self.attach_product(target, product, None)
    }

    /// Add `product` from `package` to a target's dependencies, using the
    /// `.product(name:package:)` form when the names differ.
    pub fn attach_product(
        &mut self,
        target: &str,
        product: &str,
        package: Option<&str>,
    ) -> Result<bool, ManifestError> {
        let entry = self
            .structure()
            .targets
            .iter()
            .find(|entry| entry.target.name == target)
            .ok_or_else(|| ManifestError::TargetNotFound(target.to_string()))?;

        if !entry.target.target_type.accepts_dependencies() {
            return Err(ManifestError::Malformed(format!(
                "{} target '{}' cannot have dependencies",
                entry.target.target_type, target
            )));
        }
        if entry.target.dependencies.iter().any(|d| d.name() == product) {
            return Ok(false);
        }

        let literal = render_target_dependency(product, package);
        let scanner = Scanner::new(self.raw_text());
        let raw = scanner.src();
        let (range, text) = match &entry.dependencies {
            Some(list) => append_to_list(&scanner, list, &literal, false),
            None if entry.has_dependencies_arg => {
                return Err(ManifestError::Malformed(format!(
                    "dependencies of target '{}' are not an array literal",
                    target
                )))
            }
            None => {
                let after = &entry.dependencies_after;
                let at = after.end;
                let text = if starts_line(raw, after.start) {
                    let indent = indent_of(raw, after.start);
                    format!(",\n{}dependencies: [{}]", indent, literal)
                } else {
                    format!(", dependencies: [{}]", literal)
                };
                (at..at, text)
            }
        };

        self.replace_range(range, &text);
        Ok(true)
    }

    /// Remove `product` from a target's dependencies.
    ///
    /// Returns `false` if the target did not depend on it.
    pub fn detach_dependency(&mut self, target: &str, product: &str) -> Result<bool, ManifestError> {
        let entry = self
            .structure()
            .targets
            .iter()
            .find(|entry| entry.target.name == target)
            .ok_or_else(|| ManifestError::TargetNotFound(target.to_string()))?;

        let position = entry.target.dependencies.iter().position(|d| d.name() == product);
        let (Some(position), Some(list)) = (position, entry.dependencies.as_ref()) else {
            return Ok(false);
        };

        let scanner = Scanner::new(self.raw_text());
        let (range, text) = remove_list_element(&scanner, list, entry.dependency_elements[position]);
        self.replace_range(range, &text);
        Ok(true)
    }

    /// Replace the version requirement of the dependency on `url`.
    pub fn set_version(&mut self, url: &str, version: &VersionSpec) -> Result<(), ManifestError> {
        let range = self
            .structure()
            .dependencies
            .iter()
            .find(|entry| entry.dependency.matches_url(url))
            .map(|entry| entry.requirement.clone())
            .ok_or_else(|| ManifestError::DependencyNotFound(url.to_string()))?;

        self.replace_range(range, &render_requirement(version));
        Ok(())
    }
}

fn no_package() -> ManifestError {
    ManifestError::Malformed("no Package(...) declaration found".to_string())
}

fn indent_unit(indent: &str) -> &'static str {
    if indent.starts_with('\t') {
        "\t"
    } else {
        "    "
    }
}

fn rest_is_trivia(rest: &str) -> bool {
    let rest = rest.trim();
    rest.is_empty() || rest.starts_with("//")
}

/// Append `entry` after the last element, following the list's layout.
fn append_to_list(
    scanner: &Scanner<'_>,
    list: &ListRegion,
    entry: &str,
    multiline_when_empty: bool,
) -> TextEdit {
    let raw = scanner.src();

    let Some(last) = list.elements.last() else {
        let inner = &raw[list.open + 1..list.close];
        let outer = indent_of(raw, list.open);
        let unit = indent_unit(outer);
        if !inner.trim().is_empty() {
            // only comments inside
            let at = list.open + 1 + inner.trim_end().len();
            return (at..at, format!("\n{}{}{}", outer, unit, entry));
        }
        let text = if multiline_when_empty {
            format!("\n{}{}{}\n{}", outer, unit, entry, outer)
        } else {
            entry.to_string()
        };
        return (list.open + 1..list.close, text);
    };

    let first = &list.elements[0];
    let multiline = raw[list.open..first.span.start].contains('\n');
    let comma = scanner.trailing_comma(last.span.end, list.close);

    if !multiline {
        return match comma {
            Some(c) => (c + 1..c + 1, format!(" {},", entry)),
            None => (last.span.end..last.span.end, format!(", {}", entry)),
        };
    }

    let indent = indent_of(raw, last.span.start);
    match comma {
        Some(c) => {
            let eol = line_end(raw, c);
            let at = if eol < list.close && rest_is_trivia(&raw[c + 1..eol]) {
                eol
            } else {
                c + 1
            };
            (at..at, format!("\n{}{},", indent, entry))
        }
        None => {
            let eol = line_end(raw, last.span.end);
            if eol < list.close && rest_is_trivia(&raw[last.span.end..eol]) {
                let rest = &raw[last.span.end..eol];
                (
                    last.span.end..eol,
                    format!(",{}\n{}{}", rest, indent, entry),
                )
            } else {
                (
                    last.span.end..last.span.end,
                    format!(",\n{}{}", indent, entry),
                )
            }
        }
    }
}

/// Remove one element and the separator that belongs to it.
fn remove_list_element(scanner: &Scanner<'_>, list: &ListRegion, index: usize) -> TextEdit {
    let raw = scanner.src();
    let element = &list.elements[index];
    let span = element.span.clone();

    if list.elements.len() == 1 {
        let end = scanner
            .trailing_comma(span.end, list.close)
            .map_or(span.end, |c| c + 1);
        let bare = raw[list.open + 1..span.start].trim().is_empty()
            && raw[end..list.close].trim().is_empty();
        return if bare {
            (list.open + 1..list.close, String::new())
        } else {
            (span.start..end, String::new())
        };
    }

    if let Some(next) = list.elements.get(index + 1) {
        let Some(comma) = scanner.trailing_comma(span.end, next.span.start) else {
            return (span.start..next.span.start, String::new());
        };
        let eol = line_end(raw, comma);
        if starts_line(raw, span.start) && eol < next.span.start && rest_is_trivia(&raw[comma + 1..eol]) {
            return (line_start(raw, span.start)..eol + 1, String::new());
        }
        if line_start(raw, span.start) == line_start(raw, next.span.start) {
            return (span.start..next.span.start, String::new());
        }
        let start = if starts_line(raw, span.start) {
            span.start
        } else {
            // drop the space that separated it from the previous element
            raw[..span.start].trim_end_matches([' ', '\t']).len()
        };
        return (start..comma + 1, String::new());
    }

    if let Some(comma) = scanner.trailing_comma(span.end, list.close) {
        let eol = line_end(raw, comma);
        if starts_line(raw, span.start) && eol < list.close && rest_is_trivia(&raw[comma + 1..eol]) {
            return (line_start(raw, span.start)..eol + 1, String::new());
        }
    }

    // last element: take the previous element's comma with it, keeping any
    // comments in between
    let previous = &list.elements[index - 1];
    let Some(comma) = scanner.trailing_comma(previous.span.end, span.start) else {
        return (previous.span.end..span.end, String::new());
    };
    let mut end = span.end;
    if starts_line(raw, span.start) {
        let eol = line_end(raw, span.end);
        if eol < list.close && rest_is_trivia(&raw[span.end..eol]) {
            end = eol;
        }
    }
    (comma..end, raw[comma + 1..span.start].trim_end().to_string())
}

/// Insert a fresh `dependencies:` argument into the `Package(...)` call.
fn synthesize_section(
    scanner: &Scanner<'_>,
    package: &PackageDecl,
    entry: &str,
) -> Result<TextEdit, ManifestError> {
    let raw = scanner.src();

    let following = package.args.iter().find(|arg| {
        arg.label
            .as_deref()
            .is_some_and(|label| AFTER_DEPENDENCIES.contains(&label))
    });
    if let Some(next) = following {
        let at = next.span.start;
        let text = if starts_line(raw, at) {
            let indent = indent_of(raw, at);
            let unit = indent_unit(indent);
            format!(
                "dependencies: [\n{indent}{unit}{entry}\n{indent}],\n{indent}",
                indent = indent,
                unit = unit,
                entry = entry
            )
        } else {
            format!("dependencies: [{}], ", entry)
        };
        return Ok((at..at, text));
    }

    let last = package.args.last().ok_or_else(|| {
        ManifestError::Malformed("Package(...) declaration has no arguments".to_string())
    })?;
    let multiline = starts_line(raw, last.span.start);
    let indent = indent_of(raw, last.span.start);
    let section = if multiline {
        let unit = indent_unit(indent);
        format!("dependencies: [\n{}{}{}\n{}]", indent, unit, entry, indent)
    } else {
        format!("dependencies: [{}]", entry)
    };

    let edit = match (scanner.trailing_comma(last.span.end, package.call.close), multiline) {
        (Some(c), true) => (c + 1..c + 1, format!("\n{}{},", indent, section)),
        (Some(c), false) => (c + 1..c + 1, format!(" {},", section)),
        (None, true) => (last.span.end..last.span.end, format!(",\n{}{}", indent, section)),
        (None, false) => (last.span.end..last.span.end, format!(", {}", section)),
    };
    Ok(edit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ether_lockfile::{Pin, PinState};
    use ether_types::{select_release, ReleasePolicy, TargetDependency};

    const TRAILING: &str = r#"// swift-tools-version:5.9
import PackageDescription

let package = Package(
    name: "App",
    products: [
        .executable(name: "App", targets: ["App"]),
    ],
    dependencies: [
        .package(url: "https://github.com/vapor/vapor.git", from: "4.0.0"),
        .package(url: "https://github.com/vapor/leaf.git", from: "4.2.0"),
    ],
    targets: [
        .executableTarget(
            name: "App",
            dependencies: [
                .product(name: "Vapor", package: "vapor"),
                .product(name: "Leaf", package: "leaf"),
            ]
        ),
        .target(name: "Views", dependencies: ["Leaf", "Shared"]),
        .target(name: "Shared"),
        .testTarget(name: "AppTests", dependencies: ["App"]),
        .binaryTarget(name: "Blob", path: "Blob.xcframework"),
    ]
)
"#;

    const NO_TRAILING: &str = r#"let package = Package(
    name: "Tool",
    dependencies: [
        .package(url: "https://github.com/apple/swift-argument-parser", from: "1.2.0")
    ],
    targets: [
        .executableTarget(name: "Tool", dependencies: [.product(name: "ArgumentParser", package: "swift-argument-parser")])
    ]
)
"#;

    const NO_SECTION: &str = r#"let package = Package(
    name: "Pkg",
    targets: [
        .target(name: "Pkg"),
    ]
)
"#;

    fn pin(name: &str, url: &str) -> Pin {
        Pin {
            package: name.to_string(),
            repository_url: url.to_string(),
            state: PinState::Version {
                version: "1.0.0".to_string(),
                revision: None,
            },
        }
    }

    fn lockfile() -> LockfileSnapshot {
        LockfileSnapshot::from_pins(vec![
            pin("vapor", "https://github.com/vapor/vapor.git"),
            pin("leaf", "https://github.com/vapor/leaf.git"),
            pin("swift-log", "https://github.com/apple/swift-log.git"),
        ])
    }

    fn names(manifest: &Manifest, target: &str) -> Vec<String> {
        manifest
            .target(target)
            .unwrap()
            .dependency_names()
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_add_keeps_trailing_commas() {
        let mut manifest = Manifest::parse(TRAILING);
        manifest
            .add_dependency(
                "https://github.com/apple/swift-log.git",
                VersionSpec::exact("v1.5.0"),
            )
            .unwrap();

        let expected = TRAILING.replace(
            "from: \"4.2.0\"),\n",
            "from: \"4.2.0\"),\n        .package(url: \"https://github.com/apple/swift-log.git\", .exact(\"1.5.0\")),\n",
        );
        assert_eq!(manifest.raw_text(), expected);
        assert_eq!(manifest.dependencies().count(), 3);
    }

    #[test]
    fn test_add_without_trailing_comma() {
        let mut manifest = Manifest::parse(NO_TRAILING);
        manifest
            .add_dependency(
                "https://github.com/apple/swift-log.git",
                VersionSpec::from_version("1.0.0"),
            )
            .unwrap();

        assert!(manifest.raw_text().contains(
            "from: \"1.2.0\"),\n        .package(url: \"https://github.com/apple/swift-log.git\", from: \"1.0.0\")\n    ],"
        ));
    }

    #[test]
    fn test_add_to_inline_and_empty_lists() {
        let inline = r#"let package = Package(name: "A", dependencies: [.package(url: "https://example.com/a.git", from: "1.0.0")], targets: [])"#;
        let mut manifest = Manifest::parse(inline);
        manifest
            .add_dependency("https://example.com/b.git", VersionSpec::Branch("main".into()))
            .unwrap();
        assert!(manifest.raw_text().contains(
            r#"from: "1.0.0"), .package(url: "https://example.com/b.git", .branch("main"))]"#
        ));

        let empty = "let package = Package(\n    name: \"A\",\n    dependencies: [],\n    targets: []\n)\n";
        let mut manifest = Manifest::parse(empty);
        manifest
            .add_dependency("https://example.com/a.git", VersionSpec::exact("1.0.0"))
            .unwrap();
        assert_eq!(
            manifest.raw_text(),
            "let package = Package(\n    name: \"A\",\n    dependencies: [\n        .package(url: \"https://example.com/a.git\", .exact(\"1.0.0\"))\n    ],\n    targets: []\n)\n"
        );
    }

    #[test]
    fn test_add_synthesizes_section() {
        let mut manifest = Manifest::parse(NO_SECTION);
        assert!(!manifest.has_dependencies_section());

        manifest
            .add_dependency("https://example.com/pkg.git", VersionSpec::exact("1.0.0"))
            .unwrap();

        assert!(manifest.has_dependencies_section());
        let deps: Vec<_> = manifest.dependencies().cloned().collect();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].url, "https://example.com/pkg.git");
        assert_eq!(deps[0].version, VersionSpec::Exact("1.0.0".into()));
        assert!(manifest.raw_text().contains(
            "    name: \"Pkg\",\n    dependencies: [\n        .package(url: \"https://example.com/pkg.git\", .exact(\"1.0.0\"))\n    ],\n    targets: [\n"
        ));
        assert_eq!(manifest.targets().count(), 1);
    }

    #[test]
    fn test_synthesize_without_targets() {
        let src = r#"let package = Package(name: "Empty")"#;
        let mut manifest = Manifest::parse(src);
        manifest
            .add_dependency("https://example.com/a.git", VersionSpec::from_version("1.0.0"))
            .unwrap();
        assert_eq!(
            manifest.raw_text(),
            r#"let package = Package(name: "Empty", dependencies: [.package(url: "https://example.com/a.git", from: "1.0.0")])"#
        );
    }

    #[test]
    fn test_add_duplicate_fails() {
        let mut manifest = Manifest::parse(TRAILING);
        let err = manifest
            .add_dependency(
                "https://github.com/Vapor/vapor",
                VersionSpec::from_version("4.1.0"),
            )
            .unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateDependency(_)));
        assert_eq!(manifest.raw_text(), TRAILING);
    }

    #[test]
    fn test_add_without_package_is_malformed() {
        let mut manifest = Manifest::parse("import PackageDescription\n");
        let err = manifest
            .add_dependency("https://example.com/a.git", VersionSpec::exact("1.0.0"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::Malformed(_)));
    }

    #[test]
    fn test_add_then_remove_is_inverse() {
        for original in [TRAILING, NO_TRAILING] {
            let mut manifest = Manifest::parse(original);
            let before: Vec<_> = manifest.dependencies().cloned().collect();

            manifest
                .add_dependency(
                    "https://github.com/apple/swift-log.git",
                    VersionSpec::up_to_next_major("1.0.0"),
                )
                .unwrap();
            manifest.remove_dependency("swift-log", &lockfile()).unwrap();

            let after: Vec<_> = manifest.dependencies().cloned().collect();
            assert_eq!(after, before);
            assert_eq!(manifest.raw_text(), original);
        }
    }

    #[test]
    fn test_remove_cascades_into_targets() {
        let mut manifest = Manifest::parse(TRAILING);
        let removed = manifest.remove_dependency("leaf", &lockfile()).unwrap();
        assert_eq!(removed.url, "https://github.com/vapor/leaf.git");

        let urls: Vec<_> = manifest.dependencies().map(|d| d.url.clone()).collect();
        assert_eq!(urls, vec!["https://github.com/vapor/vapor.git"]);

        assert_eq!(names(&manifest, "App"), vec!["Vapor"]);
        assert_eq!(names(&manifest, "Views"), vec!["Shared"]);
        for target in manifest.targets() {
            assert!(!target
                .dependencies
                .iter()
                .any(|d| d.references_package(&["leaf"])));
        }
        assert!(manifest.raw_text().contains(".target(name: \"Views\", dependencies: [\"Shared\"]),"));
    }

    #[test]
    fn test_remove_first_of_two() {
        let src = r#"let package = Package(
    name: "P",
    dependencies: [
        .package(url: "https://example.com/a.git", from: "1.0.0"),
        .package(url: "https://example.com/b.git", from: "1.0.0"),
    ],
    targets: [
        .target(name: "P", dependencies: ["a", "b"]),
        .target(name: "Q", dependencies: [.product(name: "a", package: "a")]),
    ]
)
"#;
        let lockfile = LockfileSnapshot::from_pins(vec![
            pin("a", "https://example.com/a.git"),
            pin("b", "https://example.com/b.git"),
        ]);
        let mut manifest = Manifest::parse(src);
        manifest.remove_dependency("a", &lockfile).unwrap();

        let urls: Vec<_> = manifest.dependencies().map(|d| d.url.clone()).collect();
        assert_eq!(urls, vec!["https://example.com/b.git"]);
        assert_eq!(names(&manifest, "P"), vec!["b"]);
        assert!(names(&manifest, "Q").is_empty());
        assert!(manifest.raw_text().contains(".target(name: \"Q\", dependencies: []),"));
    }

    #[test]
    fn test_remove_twice_is_not_found() {
        let mut manifest = Manifest::parse(TRAILING);
        manifest.remove_dependency("vapor", &lockfile()).unwrap();
        let text = manifest.raw_text().to_string();

        let err = manifest.remove_dependency("vapor", &lockfile()).unwrap_err();
        assert!(matches!(err, ManifestError::DependencyNotFound(ref n) if n == "vapor"));
        assert_eq!(manifest.raw_text(), text);
    }

    #[test]
    fn test_remove_unresolved_name() {
        let mut manifest = Manifest::parse(TRAILING);
        let err = manifest
            .remove_dependency("vapor", &LockfileSnapshot::empty())
            .unwrap_err();
        assert!(matches!(err, ManifestError::UnresolvedName(_)));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut manifest = Manifest::parse(TRAILING);
        assert!(manifest.attach_dependency("Views", "Markdown").unwrap());
        let once = names(&manifest, "Views");
        assert!(!manifest.attach_dependency("Views", "Markdown").unwrap());
        assert_eq!(names(&manifest, "Views"), once);
        assert_eq!(once, vec!["Leaf", "Shared", "Markdown"]);
    }

    #[test]
    fn test_attach_creates_list() {
        let mut manifest = Manifest::parse(TRAILING);
        manifest
            .attach_product("Shared", "Logging", Some("swift-log"))
            .unwrap();
        assert!(manifest.raw_text().contains(
            r#".target(name: "Shared", dependencies: [.product(name: "Logging", package: "swift-log")]),"#
        ));
        assert_eq!(
            manifest.target("Shared").unwrap().dependencies,
            vec![TargetDependency::Product {
                name: "Logging".into(),
                package: Some("swift-log".into()),
            }]
        );
    }

    #[test]
    fn test_attach_multiline_list() {
        let mut manifest = Manifest::parse(TRAILING);
        manifest.attach_product("App", "Fluent", Some("fluent")).unwrap();
        assert!(manifest.raw_text().contains(
            "                .product(name: \"Leaf\", package: \"leaf\"),\n                \"Fluent\",\n            ]"
        ));
    }

    #[test]
    fn test_attach_errors() {
        let mut manifest = Manifest::parse(TRAILING);
        assert!(matches!(
            manifest.attach_dependency("Missing", "Vapor"),
            Err(ManifestError::TargetNotFound(_))
        ));
        assert!(matches!(
            manifest.attach_dependency("Blob", "Vapor"),
            Err(ManifestError::Malformed(_))
        ));
        assert_eq!(manifest.raw_text(), TRAILING);
    }

    #[test]
    fn test_detach_reverses_attach() {
        let mut manifest = Manifest::parse(TRAILING);
        manifest.attach_dependency("Views", "Markdown").unwrap();
        assert!(manifest.detach_dependency("Views", "Markdown").unwrap());
        assert_eq!(manifest.raw_text(), TRAILING);
        assert!(!manifest.detach_dependency("Views", "Markdown").unwrap());
    }

    #[test]
    fn test_set_version_every_variant() {
        let url = "https://github.com/vapor/leaf.git";
        let specs = [
            VersionSpec::exact("4.3.0"),
            VersionSpec::from_version("4.3.0"),
            VersionSpec::up_to_next_major("4.3.0"),
            VersionSpec::up_to_next_minor("4.3.0"),
            VersionSpec::parse_range("4.0.0..<5.0.0").unwrap(),
            VersionSpec::parse_range("4.0.0...4.5.0").unwrap(),
            VersionSpec::Branch("main".into()),
            VersionSpec::Revision("0a1b2c3".into()),
        ];

        for spec in specs {
            let mut manifest = Manifest::parse(TRAILING);
            manifest.set_version(url, &spec).unwrap();
            assert_eq!(manifest.dependency_by_url(url).unwrap().version, spec);
            // position is preserved
            let urls: Vec<_> = manifest.dependencies().map(|d| d.url.clone()).collect();
            assert_eq!(urls[1], url);
        }
    }

    #[test]
    fn test_set_version_prefers_stable_release() {
        let tags = ["2.0.0-beta", "1.9.0", "1.8.0"];
        let chosen = select_release(&tags, ReleasePolicy::PreferStable).unwrap();

        let mut manifest = Manifest::parse(NO_TRAILING);
        let url = "https://github.com/apple/swift-argument-parser";
        manifest
            .set_version(url, &VersionSpec::from_version(chosen))
            .unwrap();
        assert_eq!(
            manifest.dependency_by_url(url).unwrap().version,
            VersionSpec::From("1.9.0".into())
        );
    }

    #[test]
    fn test_spaced_ranges_are_recognized() {
        let src = r#"let package = Package(
    name: "A",
    dependencies: [
        .package(url: "https://example.com/a.git", "1.0.0" ..< "2.0.0"),
        .package(
            url: "https://example.com/b.git",
            "1.0.0"
                ...
            "1.5.0"
        ),
    ]
)
"#;
        let mut manifest = Manifest::parse(src);
        assert_eq!(manifest.dependencies().count(), 2);

        let err = manifest
            .add_dependency("https://example.com/a.git", VersionSpec::exact("1.2.0"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::DuplicateDependency(_)));
        assert_eq!(manifest.raw_text(), src);

        manifest
            .set_version("https://example.com/b.git", &VersionSpec::exact("1.4.0"))
            .unwrap();
        assert!(manifest.raw_text().contains(
            "url: \"https://example.com/b.git\",\n            .exact(\"1.4.0\")\n        ),"
        ));

        manifest.remove_dependency_by_url("https://example.com/a.git").unwrap();
        let urls: Vec<_> = manifest.dependencies().map(|d| d.url.clone()).collect();
        assert_eq!(urls, vec!["https://example.com/b.git"]);
    }

    #[test]
    fn test_attach_to_plugin_follows_capability() {
        let src = r#"let package = Package(
    name: "Tools",
    targets: [
        .plugin(name: "Gen", capability: .buildTool()),
        .plugin(
            name: "Lint",
            capability: .command(intent: .custom(verb: "lint", description: "Lint sources"))
        ),
    ]
)
"#;
        let mut manifest = Manifest::parse(src);
        assert!(manifest.attach_dependency("Gen", "SwiftFormat").unwrap());
        assert!(manifest.attach_dependency("Lint", "SwiftLint").unwrap());

        let text = manifest.raw_text();
        assert!(text.contains(
            r#".plugin(name: "Gen", capability: .buildTool(), dependencies: ["SwiftFormat"]),"#
        ));
        assert!(text.contains(
            "description: \"Lint sources\")),\n            dependencies: [\"SwiftLint\"]\n        ),"
        ));
        assert_eq!(names(&manifest, "Gen"), vec!["SwiftFormat"]);
        assert_eq!(names(&manifest, "Lint"), vec!["SwiftLint"]);
    }

    #[test]
    fn test_detach_last_keeps_comments() {
        let src = r#"let package = Package(
    name: "P",
    targets: [
        .target(
            name: "P",
            dependencies: [
                "a",  // keep
                "b"
            ]
        ),
    ]
)
"#;
        let mut manifest = Manifest::parse(src);
        assert!(manifest.detach_dependency("P", "b").unwrap());
        assert!(manifest
            .raw_text()
            .contains("dependencies: [\n                \"a\"  // keep\n            ]"));
        assert_eq!(names(&manifest, "P"), vec!["a"]);
    }

    #[test]
    fn test_detach_shared_line_middle() {
        let src = r#"let package = Package(
    name: "P",
    targets: [
        .target(
            name: "P",
            dependencies: [
                "a", "b",  // keep
                "c",
            ]
        ),
    ]
)
"#;
        let mut manifest = Manifest::parse(src);
        assert!(manifest.detach_dependency("P", "b").unwrap());
        assert!(manifest
            .raw_text()
            .contains("                \"a\",  // keep\n                \"c\",\n"));
        assert_eq!(names(&manifest, "P"), vec!["a", "c"]);
    }

    #[test]
    fn test_set_version_missing() {
        let mut manifest = Manifest::parse(TRAILING);
        let err = manifest
            .set_version("https://example.com/none.git", &VersionSpec::exact("1.0.0"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::DependencyNotFound(_)));
    }
}
