use super::{manifest_error, metadata_error, prompt_error, report_delta, resolve, ui, Context};
use crate::config::CommitKind;
use crate::metadata::fetch_package_metadata;
use crate::prompt::{self, Prompter};
use ether_diagnostics::EtherError;
use ether_lockfile::LockfileDiff;
use ether_manifest::clean_version;
use ether_types::{is_prerelease, Target, VersionSpec};
use miette::Result;

/// Arguments to `ether install`.
#[derive(Debug, Default)]
pub struct InstallOptions {
    /// Package name, `owner/repo` or repository URL
    pub name: String,
    pub url: Option<String>,
    pub version: Option<String>,
    /// Targets to attach the products to; asked for when absent
    pub targets: Option<Vec<String>>,
    /// Pin `.exact` instead of `from:`
    pub exact: bool,
    /// Accept a pre-release as the latest version
    pub pre: bool,
}

/// Add a package to the manifest and to the chosen targets, then resolve.
pub async fn install(ctx: &Context, options: InstallOptions) -> Result<()> {
    let swift = ctx.swift()?;
    let store = ctx.store();
    let mut manifest = store.load().map_err(manifest_error)?;
    let before = store.load_lockfile().map_err(manifest_error)?;

    let catalog = ctx.catalog();
    let policy = ctx.config.release_policy(options.pre);
    let pb = ui::spinner(format!("Looking up {}...", options.name));
    let metadata =
        fetch_package_metadata(&catalog, &options.name, options.url.as_deref(), policy).await;
    pb.finish_and_clear();
    let metadata = metadata.map_err(metadata_error)?;

    let version = match &options.version {
        Some(version) => clean_version(version),
        None => metadata.latest_version.clone().ok_or_else(|| {
            EtherError::Generic(format!(
                "{} has no tagged releases; pass --version",
                metadata.url
            ))
        })?,
    };
    if is_prerelease(&version) {
        ui::warn(format!("{} is a pre-release", ui::num(&version)));
    }

    let spec = if options.exact {
        VersionSpec::exact(&version)
    } else {
        VersionSpec::from_version(&version)
    };
    let dependency = manifest
        .add_dependency(&metadata.url, spec)
        .map_err(manifest_error)?;

    let mut prompter = prompt::for_session();
    let products = prompt::select_products(prompter.as_mut(), &metadata.name, &metadata.product_names)
        .map_err(prompt_error)?;
    let targets = match options.targets {
        Some(targets) => targets,
        None => {
            let declared: Vec<Target> = manifest.targets().cloned().collect();
            choose_targets(prompter.as_mut(), &declared)?
        }
    };

    for target in &targets {
        for product in &products {
            let added = manifest
                .attach_product(target, product, Some(&dependency.name))
                .map_err(manifest_error)?;
            if added {
                tracing::info!("{} now depends on {}", target, product);
            }
        }
    }

    store.save(&manifest).map_err(manifest_error)?;
    ui::success(format!(
        "Added {} {}",
        ui::pkg(&dependency.name),
        ui::dim(&dependency.version)
    ));
    if targets.is_empty() {
        ui::hint("No target depends on it yet; list it in a target's dependencies to use it");
    } else {
        ui::info(format!(
            "{} → {}",
            products.join(", "),
            ui::pkg(targets.join(", "))
        ));
    }

    resolve(&swift).await?;
    let after = store.load_lockfile().map_err(manifest_error)?;
    report_delta(&LockfileDiff::between(&before, &after));

    ctx.commit(CommitKind::Install, &dependency.name).await;
    Ok(())
}

fn choose_targets(prompter: &mut dyn Prompter, targets: &[Target]) -> Result<Vec<String>> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }
    Ok(prompt::select_targets(prompter, targets).map_err(prompt_error)?)
}
