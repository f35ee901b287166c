use crate::AppContext;
use anyhow::{Context, Result};
use colored::Colorize;

pub fn show(ctx: &AppContext, init: bool) -> Result<()> {
    let path = ctx.config_service.path();

    if init {
        if path.exists() {
            println!("{}", format!("{} already exists, leaving it untouched", path.display()).yellow());
        } else {
            ctx.config_service
                .save(&ctx.config)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{}", format!("Wrote {}", path.display()).green());
        }
    }

    if ctx.json {
        return super::print_json(&ctx.config);
    }

    println!("{}", format!("# {}", path.display()).dimmed());
    print!("{}", toml::to_string_pretty(&ctx.config)?);
    Ok(())
}
