use super::{open_usecase, parse_code, print_json};
use crate::{AppContext, render};
use anyhow::{Context, Result};
use colored::Colorize;
use tally_core::invitation::{Invitation, render_visual_code};
use tally_core::voting::EvaluationMethod;

pub async fn create(
    ctx: &AppContext,
    name: Option<String>,
    capacity: Option<i64>,
    object_count: Option<i64>,
    method: Option<EvaluationMethod>,
) -> Result<()> {
    let usecase = open_usecase(ctx).await?;
    let spec = usecase.defaults().apply(name, capacity, object_count, method);
    let session = usecase.create_session(spec).await;

    if ctx.json {
        return print_json(&session);
    }

    print!("{}", render::session(&session));
    println!(
        "\nShare the code with participants, or run {}",
        format!("tally invite {}", session.code).cyan()
    );
    Ok(())
}

pub async fn invite(
    ctx: &AppContext,
    code: &str,
    embed: bool,
    base_url: Option<String>,
) -> Result<()> {
    let usecase = open_usecase(ctx).await?;
    let code = parse_code(code)?;
    let base_url = base_url.unwrap_or_else(|| ctx.config.invitation.base_url.clone());

    let invitation = usecase
        .invitation(&code, &base_url, embed)
        .await
        .with_context(|| format!("Failed to build an invitation for {}", code))?;
    let link = invitation.to_link()?;

    if ctx.json {
        return print_json(&serde_json::json!({ "code": code, "link": link }));
    }

    let visual = render_visual_code(&invitation)?;
    println!("{}", visual.as_str());
    if visual.is_fallback() {
        println!("{}", "Scannable code unavailable, showing the session code.".dimmed());
    }
    println!("\n{} {}", "Link:".bold(), link);
    Ok(())
}

pub async fn join(ctx: &AppContext, name: &str, code: &str, link: Option<&str>) -> Result<()> {
    let mut usecase = open_usecase(ctx).await?;
    if let Some(link) = link {
        let invitation = Invitation::parse(link).context("Failed to read the invitation link")?;
        usecase = usecase.with_ambient_invitation(invitation);
    }

    let outcome = usecase.join_session(code, name).await?;

    if ctx.json {
        return print_json(&serde_json::json!({
            "materialized": outcome.is_materialized(),
            "session": outcome.session(),
            "participant": outcome.participant(),
        }));
    }

    print!("{}", render::join_outcome(&outcome));
    let session = outcome.session();
    println!(
        "\nVote with {}",
        format!("tally vote {} {} ...", session.code, outcome.participant().id).cyan()
    );
    Ok(())
}

pub async fn start(ctx: &AppContext, code: &str) -> Result<()> {
    let usecase = open_usecase(ctx).await?;
    let code = parse_code(code)?;
    let progress = usecase.start_voting(&code).await?;

    if ctx.json {
        return print_json(&progress);
    }
    println!("{}", render::progress(&progress));
    Ok(())
}
