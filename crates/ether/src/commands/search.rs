use super::{registry_error, ui, Context};
use miette::Result;

/// Search the package catalog by name or owner.
pub async fn search(ctx: &Context, query: &str, limit: usize) -> Result<()> {
    let catalog = ctx.catalog();
    let pb = ui::spinner(format!("Searching for '{}'...", query));
    let results = catalog.search(query, limit).await;
    pb.finish_and_clear();
    let results = results.map_err(registry_error)?;

    if results.is_empty() {
        ui::warn(format!("No packages match '{}'", query));
        return Ok(());
    }

    for package in &results {
        println!(
            "{}  {}",
            ui::pkg(format!("{}/{}", package.owner, package.name)),
            ui::dim(&package.url)
        );
    }
    println!();
    ui::hint(format!(
        "Install with {}",
        ui::pkg(format!("ether install {}/{}", results[0].owner, results[0].name))
    ));
    Ok(())
}
