use super::{manifest_error, process_error, report_delta, ui, Context};
use crate::config::CommitKind;
use ether_lockfile::LockfileDiff;
use miette::Result;

/// Update every package within its requirement, then resolve.
pub async fn update(ctx: &Context) -> Result<()> {
    let swift = ctx.swift()?;
    let store = ctx.store();
    let before = store.load_lockfile().map_err(manifest_error)?;

    let pb = ui::spinner("Updating packages...");
    let result = swift.update().await;
    pb.finish_and_clear();
    result.map_err(process_error)?;

    let after = store.load_lockfile().map_err(manifest_error)?;
    let diff = LockfileDiff::between(&before, &after);
    for pin in &diff.added {
        ui::info(format!("{} {}", ui::pkg(&pin.package), ui::num(&pin.state)));
    }
    report_delta(&diff);

    ctx.commit(CommitKind::Update, "dependencies").await;
    Ok(())
}
