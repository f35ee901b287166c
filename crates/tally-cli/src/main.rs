use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tally_core::config::TallyConfig;
use tally_core::voting::EvaluationMethod;
use tally_infrastructure::ConfigService;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

/// Tally - run a small group evaluation from the terminal
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Origin directory to replicate through; repeat for several
    #[arg(long = "origin", global = true)]
    origins: Vec<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a session and print its code
    Create {
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Target number of participants
        #[arg(long)]
        capacity: Option<i64>,
        /// Number of objects to evaluate
        #[arg(long = "objects")]
        object_count: Option<i64>,
        /// direct, ranking or pairwise
        #[arg(long)]
        method: Option<EvaluationMethod>,
    },
    /// Print the invitation link and its scannable code
    Invite {
        code: String,
        /// Embed the whole session record in the link
        #[arg(long)]
        embed: bool,
        /// Override the configured base URL
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Join a session as a participant
    Join {
        name: String,
        /// Session code
        #[arg(long, default_value = "")]
        code: String,
        /// Invitation link the participant was given
        #[arg(long)]
        link: Option<String>,
    },
    /// Submit a ballot
    Vote {
        code: String,
        /// Participant id printed by `join` (a participant name also works)
        participant: String,
        /// Direct score, `OBJECT=VALUE`; objects may be given by label or number
        #[arg(long = "score", value_name = "OBJECT=VALUE")]
        scores: Vec<String>,
        /// Ranking, most preferred first
        #[arg(long = "rank", value_name = "OBJECT")]
        ranking: Vec<String>,
        /// Pairwise preference, `WINNER>LOSER`
        #[arg(long = "prefer", value_name = "WINNER>LOSER")]
        preferences: Vec<String>,
    },
    /// Open voting
    Start { code: String },
    /// Complete the session and show the ranking
    Results { code: String },
    /// Show the roster and who has voted
    Participants { code: String },
    /// Follow a session until interrupted
    Watch { code: String },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration if no file exists yet
        #[arg(long)]
        init: bool,
    },
}

/// Global settings every command receives.
pub struct AppContext {
    pub config: TallyConfig,
    pub config_service: ConfigService,
    pub json: bool,
}

fn init_tracing(cli: &Cli) {
    // --debug > --verbose > TALLY_LOG > RUST_LOG > "warn"
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_env("TALLY_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_context(cli: &Cli) -> Result<AppContext> {
    let config_service = match &cli.config {
        Some(path) => ConfigService::new(path),
        None => ConfigService::at_default_location()
            .context("Failed to locate the configuration directory")?,
    };

    let mut config = config_service.get_config().with_context(|| {
        format!(
            "Failed to load configuration from {}",
            config_service.path().display()
        )
    })?;
    if !cli.origins.is_empty() {
        config.storage.origins = cli.origins.clone();
    }

    tracing::debug!(path = %config_service.path().display(), origins = config.storage.origins.len(), "configuration ready");

    Ok(AppContext {
        config,
        config_service,
        json: cli.json,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);
    let ctx = load_context(&cli)?;

    match cli.command {
        Commands::Create {
            name,
            capacity,
            object_count,
            method,
        } => commands::session::create(&ctx, name, capacity, object_count, method).await?,
        Commands::Invite {
            code,
            embed,
            base_url,
        } => commands::session::invite(&ctx, &code, embed, base_url).await?,
        Commands::Join { name, code, link } => {
            commands::session::join(&ctx, &name, &code, link.as_deref()).await?
        }
        Commands::Vote {
            code,
            participant,
            scores,
            ranking,
            preferences,
        } => {
            let raw = commands::vote::RawBallot {
                scores,
                ranking,
                preferences,
            };
            commands::vote::submit(&ctx, &code, &participant, raw).await?
        }
        Commands::Start { code } => commands::session::start(&ctx, &code).await?,
        Commands::Results { code } => commands::report::results(&ctx, &code).await?,
        Commands::Participants { code } => commands::report::participants(&ctx, &code).await?,
        Commands::Watch { code } => commands::report::watch(&ctx, &code).await?,
        Commands::Config { init } => commands::config::show(&ctx, init)?,
    }

    Ok(())
}
