use super::{ui, Context};
use crate::config::{parse_assignment, ConfigError, KEYS};
use ether_diagnostics::EtherError;
use miette::Result;

/// Print the configuration, or set one `key:value` pair.
pub async fn config(ctx: &Context, assignment: Option<&str>) -> Result<()> {
    let path = ctx.config_path.as_deref();
    let Some(assignment) = assignment else {
        for key in KEYS {
            let value = ctx.config.get(key).map_err(config_error)?;
            match value {
                Some(value) => println!("{}: {}", ui::pkg(key), value),
                None => println!("{}: {}", ui::pkg(key), ui::dim("(unset)")),
            }
        }
        if let Some(path) = path {
            println!();
            ui::hint(format!("Stored in {}", path.display()));
        }
        return Ok(());
    };

    let path = path.ok_or_else(|| EtherError::config("no configuration directory available"))?;
    let (key, value) = parse_assignment(assignment).map_err(config_error)?;
    let mut updated = ctx.config.clone();
    updated.set(key, value).map_err(config_error)?;
    updated.save_to(path).map_err(config_error)?;

    match value {
        Some(value) => ui::success(format!("{} set to {}", ui::pkg(key), value)),
        None => ui::success(format!("{} cleared", ui::pkg(key))),
    }
    Ok(())
}

fn config_error(err: ConfigError) -> EtherError {
    EtherError::config(err.to_string())
}
