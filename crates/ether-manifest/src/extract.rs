//! Pattern extraction of dependencies, targets and products.
//!
//! Only the top-level arguments of the `Package(...)` initializer are
//! considered. Entries whose shape is not recognized are skipped and logged,
//! so a manifest with unusual formatting still yields everything readable.

use crate::literal::read_requirement;
use crate::scan::{Arg, Call, Scanner};
use ether_types::{Dependency, Product, ProductType, Target, TargetDependency, TargetType};
use std::ops::Range;

/// Target arguments that precede `dependencies:` (`.plugin` takes a
/// `capability:` first).
const BEFORE_DEPENDENCIES: [&str; 2] = ["name", "capability"];

/// An array literal: its brackets and its elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListRegion {
    pub open: usize,
    pub close: usize,
    pub elements: Vec<Arg>,
}

#[derive(Debug, Clone)]
pub(crate) struct PackageDecl {
    pub call: Call,
    pub args: Vec<Arg>,
    pub dependencies: Option<ListRegion>,
}

impl PackageDecl {
    pub fn arg(&self, label: &str) -> Option<&Arg> {
        self.args
            .iter()
            .find(|arg| arg.label.as_deref() == Some(label))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DependencyEntry {
    pub dependency: Dependency,
    /// Index into the dependencies list's elements
    pub element: usize,
    pub requirement: Range<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct TargetEntry {
    pub target: Target,
    /// The argument a new `dependencies:` list is inserted after
    pub dependencies_after: Range<usize>,
    pub has_dependencies_arg: bool,
    pub dependencies: Option<ListRegion>,
    /// Element index of each entry in `target.dependencies`
    pub dependency_elements: Vec<usize>,
}

/// Structural view of a manifest, as byte ranges into its text.
#[derive(Debug, Clone, Default)]
pub(crate) struct Structure {
    pub package: Option<PackageDecl>,
    pub dependencies: Vec<DependencyEntry>,
    pub targets: Vec<TargetEntry>,
    pub products: Vec<Product>,
}

impl Structure {
    pub fn scan(raw: &str) -> Self {
        let scanner = Scanner::new(raw);
        let Some(call) = scanner.find_package_call() else {
            tracing::debug!("No Package(...) declaration found");
            return Self::default();
        };

        let args = scanner.split_list(call.open, call.close);
        let list = |label: &str| {
            args.iter()
                .find(|arg| arg.label.as_deref() == Some(label))
                .and_then(|arg| list_region(&scanner, arg.value.clone()))
        };
        let dependency_list = list("dependencies");
        let target_list = list("targets");
        let product_list = list("products");

        let dependencies = dependency_list
            .iter()
            .flat_map(|list| list.elements.iter().enumerate())
            .filter_map(|(index, element)| read_dependency(&scanner, index, element))
            .collect();
        let targets = target_list
            .iter()
            .flat_map(|list| list.elements.iter())
            .filter_map(|element| read_target(&scanner, element))
            .collect();
        let products = product_list
            .iter()
            .flat_map(|list| list.elements.iter())
            .filter_map(|element| read_product(&scanner, element))
            .collect();

        Self {
            package: Some(PackageDecl {
                call,
                args,
                dependencies: dependency_list,
            }),
            dependencies,
            targets,
            products,
        }
    }
}

pub(crate) fn list_region(scanner: &Scanner<'_>, value: Range<usize>) -> Option<ListRegion> {
    if value.is_empty() || scanner.text(value.start..value.start + 1) != "[" {
        return None;
    }
    let close = scanner.matching_close(value.start)?;
    if close + 1 != value.end {
        return None;
    }
    Some(ListRegion {
        open: value.start,
        close,
        elements: scanner.split_list(value.start, close),
    })
}

fn labeled<'a>(args: &'a [Arg], label: &str) -> Option<&'a Arg> {
    args.iter().find(|arg| arg.label.as_deref() == Some(label))
}

fn read_dependency(scanner: &Scanner<'_>, index: usize, element: &Arg) -> Option<DependencyEntry> {
    let text = scanner.text(element.span.clone());
    let Some(call) = scanner
        .call_at(element.span.clone())
        .filter(|call| call.name == "package" || call.name == "Package")
    else {
        tracing::warn!("Skipping unrecognized dependency entry: {}", text);
        return None;
    };

    let args = scanner.split_list(call.open, call.close);
    let Some(url_index) = args.iter().position(|a| a.label.as_deref() == Some("url")) else {
        if labeled(&args, "path").is_some() || labeled(&args, "id").is_some() {
            tracing::debug!("Skipping local or registry package: {}", text);
        } else {
            tracing::warn!("Skipping dependency without a url: {}", text);
        }
        return None;
    };

    let Some(url) = scanner.string_at(args[url_index].value.clone()) else {
        tracing::warn!("Skipping dependency with a computed url: {}", text);
        return None;
    };

    let Some((version, requirement)) = read_requirement(scanner, &args[url_index + 1..]) else {
        tracing::warn!("Skipping {}: unreadable version requirement", url);
        return None;
    };

    let mut dependency = Dependency::new(url, version);
    if let Some(name) = labeled(&args[..url_index], "name").and_then(|a| scanner.string_at(a.value.clone())) {
        dependency = dependency.with_name(name);
    }

    Some(DependencyEntry {
        dependency,
        element: index,
        requirement,
    })
}

fn read_target(scanner: &Scanner<'_>, element: &Arg) -> Option<TargetEntry> {
    let text = scanner.text(element.span.clone());
    let call = scanner.call_at(element.span.clone());
    let Some((call, target_type)) =
        call.and_then(|c| TargetType::from_declaration(&c.name).map(|t| (c, t)))
    else {
        tracing::warn!("Skipping unrecognized target entry: {}", text);
        return None;
    };

    let args = scanner.split_list(call.open, call.close);
    let Some((name, name_span)) = labeled(&args, "name")
        .and_then(|a| scanner.string_at(a.value.clone()).map(|n| (n, a.span.clone())))
    else {
        tracing::warn!("Skipping target without a literal name: {}", text);
        return None;
    };
    let dependencies_after = args
        .iter()
        .rev()
        .find(|a| matches!(a.label.as_deref(), Some(label) if BEFORE_DEPENDENCIES.contains(&label)))
        .map_or(name_span, |a| a.span.clone());

    let dependencies_arg = labeled(&args, "dependencies");
    let dependencies = dependencies_arg.and_then(|a| list_region(scanner, a.value.clone()));

    let mut target = Target {
        name,
        target_type,
        dependencies: Vec::new(),
    };
    let mut dependency_elements = Vec::new();
    for (index, element) in dependencies.iter().flat_map(|l| l.elements.iter()).enumerate() {
        match read_target_dependency(scanner, element) {
            Some(dependency) => {
                target.dependencies.push(dependency);
                dependency_elements.push(index);
            }
            None => tracing::warn!(
                "Skipping dependency {} of target {}",
                scanner.text(element.span.clone()),
                target.name
            ),
        }
    }

    Some(TargetEntry {
        target,
        dependencies_after,
        has_dependencies_arg: dependencies_arg.is_some(),
        dependencies,
        dependency_elements,
    })
}

fn read_target_dependency(scanner: &Scanner<'_>, element: &Arg) -> Option<TargetDependency> {
    if let Some(name) = scanner.string_at(element.span.clone()) {
        return Some(TargetDependency::ByName { name });
    }

    let call = scanner.call_at(element.span.clone())?;
    let args = scanner.split_list(call.open, call.close);
    let string = |label: &str| labeled(&args, label).and_then(|a| scanner.string_at(a.value.clone()));
    let name = string("name")?;

    match call.name.as_str() {
        "byName" => Some(TargetDependency::ByName { name }),
        "product" => Some(TargetDependency::Product {
            name,
            package: string("package"),
        }),
        "target" | "Target" => Some(TargetDependency::Target { name }),
        _ => None,
    }
}

fn read_product(scanner: &Scanner<'_>, element: &Arg) -> Option<Product> {
    let call = scanner.call_at(element.span.clone())?;
    let product_type = match call.name.as_str() {
        "library" => ProductType::Library,
        "executable" => ProductType::Executable,
        "plugin" => ProductType::Plugin,
        other => {
            tracing::debug!("Skipping product declared with .{}", other);
            return None;
        }
    };
    let args = scanner.split_list(call.open, call.close);
    let name = labeled(&args, "name").and_then(|a| scanner.string_at(a.value.clone()))?;
    Some(Product { name, product_type })
}

/// Every readable dependency in the manifest's `dependencies:` list, in order.
pub fn extract_dependencies(raw: &str) -> Vec<Dependency> {
    Structure::scan(raw)
        .dependencies
        .into_iter()
        .map(|entry| entry.dependency)
        .collect()
}

/// Every readable target in the manifest's `targets:` list, in order.
pub fn extract_targets(raw: &str) -> Vec<Target> {
    Structure::scan(raw)
        .targets
        .into_iter()
        .map(|entry| entry.target)
        .collect()
}

/// The products a manifest exposes.
pub fn extract_products(raw: &str) -> Vec<Product> {
    Structure::scan(raw).products
}
