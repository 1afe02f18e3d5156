mod report;
mod tags;
mod update;
mod worker;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tagpulse")]
#[command(about = "Track tag engagement across content platforms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch fresh data for tracked tags and refresh the dataset
    Update {
        /// Restrict the run to one configured tag
        #[arg(long)]
        tag: Option<String>,
    },
    /// Run the queue worker until interrupted
    Worker,
    /// Queue a shell command for the worker
    Enqueue {
        /// Command and arguments, joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Manage tracked tags
    Tag {
        #[command(subcommand)]
        command: tags::TagCommands,
    },
    /// Show pending tasks and recent results
    Status {
        /// Number of recent results to show
        #[arg(long, default_value = "10")]
        results: usize,
    },
    /// Regenerate the tag/link table for the report renderer
    Links,
    /// Show hotness tiers per tag
    Hotness,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = tagpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(use_ansi(&config.env))
        .init();

    match cli.command {
        Commands::Update { tag } => update::run_update(&config, tag.as_deref()).await,
        Commands::Worker => worker::run_worker(&config).await,
        Commands::Enqueue { command } => tags::run_enqueue(&config, &command.join(" ")),
        Commands::Tag { command } => match command {
            tags::TagCommands::Add { name } => tags::run_tag_add(&config, &name),
        },
        Commands::Status { results } => report::run_status(&config, results),
        Commands::Links => report::run_links(&config),
        Commands::Hotness => report::run_hotness(&config),
    }
}

/// ANSI colors everywhere except production.
fn use_ansi(env: &tagpulse_core::Environment) -> bool {
    !matches!(env, tagpulse_core::Environment::Production)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

#[cfg(test)]
mod tests;
