use super::{manifest_error, report_delta, resolve, ui, Context};
use crate::config::CommitKind;
use ether_lockfile::LockfileDiff;
use miette::Result;

/// Remove a resolved package from the manifest and from every target.
pub async fn remove(ctx: &Context, name: &str) -> Result<()> {
    let swift = ctx.swift()?;
    let store = ctx.store();
    let mut manifest = store.load().map_err(manifest_error)?;
    let before = store.load_lockfile().map_err(manifest_error)?;

    let removed = manifest
        .remove_dependency(name, &before)
        .map_err(manifest_error)?;
    store.save(&manifest).map_err(manifest_error)?;
    ui::success(format!("Removed {} ({})", ui::pkg(name), ui::dim(&removed.url)));

    for leftover in manifest.unreferenced_dependencies() {
        ui::hint(format!("{} is not used by any target", ui::pkg(&leftover.name)));
    }

    resolve(&swift).await?;
    let after = store.load_lockfile().map_err(manifest_error)?;
    report_delta(&LockfileDiff::between(&before, &after));

    ctx.commit(CommitKind::Remove, name).await;
    Ok(())
}
