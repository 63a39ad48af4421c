//! `ether version set`, `version latest` and `version all`.

use super::{manifest_error, process_error, prompt_error, report_delta, resolve, ui, Context};
use crate::config::CommitKind;
use crate::process;
use crate::prompt::{self, Prompter};
use ether_diagnostics::EtherError;
use ether_lockfile::{LockfileDiff, LockfileSnapshot};
use ether_manifest::{clean_version, Manifest, ManifestError};
use ether_types::{normalize_version, select_release, Dependency, ReleasePolicy, Version, VersionSpec};
use futures::future::join_all;
use miette::Result;

/// Which requirement form `version set` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requirement {
    /// Keep the dependency's current form
    #[default]
    Keep,
    Exact,
    From,
    UpToNextMajor,
    UpToNextMinor,
    Branch,
    Revision,
    Range,
}

impl Requirement {
    fn is_version_based(self) -> bool {
        !matches!(self, Self::Branch | Self::Revision | Self::Range)
    }
}

/// Build the new requirement for a dependency currently at `current`.
fn build_spec(requirement: Requirement, current: &VersionSpec, value: &str) -> Result<VersionSpec, String> {
    let value = value.trim();
    let spec = match requirement {
        Requirement::Keep => current
            .with_version(value)
            .unwrap_or_else(|| VersionSpec::from_version(value)),
        Requirement::Exact => VersionSpec::exact(value),
        Requirement::From => VersionSpec::from_version(value),
        Requirement::UpToNextMajor => VersionSpec::up_to_next_major(value),
        Requirement::UpToNextMinor => VersionSpec::up_to_next_minor(value),
        Requirement::Branch => VersionSpec::Branch(value.to_string()),
        Requirement::Revision => VersionSpec::Revision(value.to_string()),
        Requirement::Range => VersionSpec::parse_range(value)
            .ok_or_else(|| format!("'{}' is not a range like 1.0.0..<2.0.0", value))?,
    };
    Ok(spec)
}

/// Find the manifest dependency a user-supplied name refers to.
///
/// The lockfile maps resolved names to URLs; a dependency that was never
/// resolved can still be found by its URL-derived name.
fn find_dependency(
    manifest: &Manifest,
    lockfile: &LockfileSnapshot,
    name: &str,
) -> Result<Dependency, ManifestError> {
    if let Some(pin) = lockfile.find_by_name(name) {
        return manifest
            .dependency_by_url(&pin.repository_url)
            .cloned()
            .ok_or_else(|| ManifestError::DependencyNotFound(name.to_string()));
    }
    manifest
        .dependency_by_name(name)
        .cloned()
        .ok_or_else(|| ManifestError::UnresolvedName(name.to_string()))
}

/// Whether `candidate` is a newer release than `current`.
///
/// Tags that are not semver count as newer whenever they differ.
fn is_newer(candidate: &str, current: &str) -> bool {
    let (candidate, current) = (normalize_version(candidate), normalize_version(current));
    match (Version::parse(candidate), Version::parse(current)) {
        (Ok(a), Ok(b)) => a > b,
        _ => candidate != current,
    }
}

async fn latest_release(url: &str, policy: ReleasePolicy) -> Result<String> {
    let pb = ui::spinner(format!("Fetching tags of {}...", url));
    let tags = process::remote_tags(url).await;
    pb.finish_and_clear();
    let tags = tags.map_err(process_error)?;
    select_release(&tags, policy)
        .map(clean_version)
        .ok_or_else(|| EtherError::Generic(format!("{} has no tagged releases", url)).into())
}

/// Change the version requirement of one dependency.
pub async fn version_set(
    ctx: &Context,
    name: &str,
    version: &str,
    requirement: Requirement,
    pre: bool,
) -> Result<()> {
    let swift = ctx.swift()?;
    let store = ctx.store();
    let mut manifest = store.load().map_err(manifest_error)?;
    let before = store.load_lockfile().map_err(manifest_error)?;

    let dependency = find_dependency(&manifest, &before, name).map_err(manifest_error)?;

    let value = if version.eq_ignore_ascii_case("latest") {
        if !requirement.is_version_based() {
            return Err(EtherError::Generic(
                "`latest` can only be used with a version requirement".to_string(),
            )
            .into());
        }
        latest_release(&dependency.url, ctx.config.release_policy(pre)).await?
    } else {
        version.to_string()
    };

    let spec = build_spec(requirement, &dependency.version, &value).map_err(EtherError::Generic)?;
    manifest
        .set_version(&dependency.url, &spec)
        .map_err(manifest_error)?;
    store.save(&manifest).map_err(manifest_error)?;
    ui::success(format!(
        "{} now requires {}",
        ui::pkg(&dependency.name),
        ui::num(&spec)
    ));

    resolve(&swift).await?;
    let after = store.load_lockfile().map_err(manifest_error)?;
    report_delta(&LockfileDiff::between(&before, &after));

    ctx.commit(CommitKind::Update, &dependency.name).await;
    Ok(())
}

/// Move every version-based dependency to its latest release.
pub async fn version_latest(ctx: &Context, pre: bool) -> Result<()> {
    let swift = ctx.swift()?;
    let store = ctx.store();
    let mut manifest = store.load().map_err(manifest_error)?;
    let before = store.load_lockfile().map_err(manifest_error)?;
    let policy = ctx.config.release_policy(pre);

    let dependencies: Vec<Dependency> = manifest
        .dependencies()
        .filter(|dep| dep.version.base_version().is_some())
        .cloned()
        .collect();
    if dependencies.is_empty() {
        ui::hint("No version-based dependencies to update");
        return Ok(());
    }

    let pb = ui::spinner(format!("Checking {}...", ui::packages(dependencies.len())));
    let tags = join_all(dependencies.iter().map(|dep| process::remote_tags(&dep.url))).await;
    pb.finish_and_clear();

    let mut updated = Vec::new();
    for (dependency, tags) in dependencies.iter().zip(tags) {
        let tags = match tags {
            Ok(tags) => tags,
            Err(e) => {
                ui::warn(format!("Skipping {}: {}", ui::pkg(&dependency.name), e));
                continue;
            }
        };
        let Some(latest) = select_release(&tags, policy) else {
            tracing::debug!("{} has no tags", dependency.url);
            continue;
        };
        let current = dependency.version.base_version().unwrap_or_default();
        if !is_newer(latest, current) {
            continue;
        }
        let Some(spec) = dependency.version.with_version(latest) else {
            continue;
        };

        manifest
            .set_version(&dependency.url, &spec)
            .map_err(manifest_error)?;
        ui::info(format!(
            "{} {} → {}",
            ui::pkg(&dependency.name),
            ui::dim(current),
            ui::num(normalize_version(latest))
        ));
        updated.push(dependency.name.clone());
    }

    if updated.is_empty() {
        ui::success("All dependencies are on their latest release");
        return Ok(());
    }

    let mut prompter = prompt::for_session();
    if prompter.is_interactive() {
        let question = format!("Update {}?", ui::packages(updated.len()));
        if !prompter.confirm(&question).map_err(prompt_error)? {
            ui::hint("Package.swift left unchanged");
            return Ok(());
        }
    }

    store.save(&manifest).map_err(manifest_error)?;
    ui::success(format!("Updated {}", ui::packages(updated.len())));

    resolve(&swift).await?;
    let after = store.load_lockfile().map_err(manifest_error)?;
    report_delta(&LockfileDiff::between(&before, &after));

    ctx.commit(CommitKind::Update, &updated.join(", ")).await;
    Ok(())
}

/// List every resolved package with its version, branch or revision.
pub async fn version_all(ctx: &Context) -> Result<()> {
    let lockfile = ctx.store().load_lockfile().map_err(manifest_error)?;
    if lockfile.is_empty() {
        ui::hint("No resolved packages; run `swift package resolve` first");
        return Ok(());
    }

    let width = lockfile
        .pins()
        .iter()
        .map(|pin| pin.package.len())
        .max()
        .unwrap_or(0);
    for pin in lockfile.pins() {
        println!(
            "{}  {}",
            ui::pkg(format!("{:width$}", pin.package, width = width)),
            ui::num(&pin.state)
        );
    }
    Ok(())
}
