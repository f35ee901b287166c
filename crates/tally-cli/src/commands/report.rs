use super::{open_usecase, parse_code, print_json};
use crate::{AppContext, render};
use anyhow::{Context, Result};
use colored::Colorize;
use tally_application::{SessionView, SyncDaemon};

pub async fn results(ctx: &AppContext, code: &str) -> Result<()> {
    let usecase = open_usecase(ctx).await?;
    let code = parse_code(code)?;
    let result = usecase.show_results(&code).await?;

    if ctx.json {
        return print_json(&result);
    }
    print!("{}", render::results(&result));
    Ok(())
}

pub async fn participants(ctx: &AppContext, code: &str) -> Result<()> {
    let usecase = open_usecase(ctx).await?;
    let code = parse_code(code)?;
    let rows = usecase.list_participants(&code).await?;

    if ctx.json {
        return print_json(&rows);
    }

    let progress = usecase.progress(&code).await?;
    println!("{}", render::progress(&progress));
    print!("{}", render::roster(&rows));
    Ok(())
}

/// Reconciles on the configured interval and prints the view whenever it
/// changes, until Ctrl-C.
pub async fn watch(ctx: &AppContext, code: &str) -> Result<()> {
    let usecase = open_usecase(ctx).await?;
    let code = parse_code(code)?;
    let interval = ctx.config.sync.interval();
    let json = ctx.json;

    println!(
        "{}",
        format!("Watching {} every {} ms, Ctrl-C to stop", code, interval.as_millis()).dimmed()
    );

    let mut last: Option<SessionView> = None;
    let handle = SyncDaemon::new(usecase.store(), interval).start(code, move |view| {
        if last.as_ref() == Some(&view) {
            return;
        }
        if json {
            match serde_json::to_string(&view) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(error = %e, "failed to encode view"),
            }
        } else {
            println!("{}", render::view(&view));
        }
        last = Some(view);
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    handle.join().await;
    Ok(())
}
