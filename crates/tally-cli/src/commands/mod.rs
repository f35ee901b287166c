pub mod config;
pub mod report;
pub mod session;
pub mod vote;

use crate::AppContext;
use anyhow::{Context, Result};
use tally_application::EvaluationUseCase;
use tally_core::session::SessionCode;

/// Opens the configured substrates.
pub async fn open_usecase(ctx: &AppContext) -> Result<EvaluationUseCase> {
    EvaluationUseCase::open(&ctx.config)
        .await
        .context("Failed to open session storage")
}

pub fn parse_code(code: &str) -> Result<SessionCode> {
    SessionCode::parse(code).with_context(|| format!("Invalid session code '{}'", code))
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
