// conform/src/main.rs

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=conform_core=debug conform run ... pour voir les détails
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project_dir,
            analytics,
            input,
            output,
            as_of,
            individual_reports,
            timeout_secs,
        } => {
            commands::run::execute(commands::run::RunArgs {
                project_dir,
                analytics,
                input,
                output,
                as_of,
                individual_reports,
                timeout_secs,
            })
            .await
        }
        Commands::List { project_dir, rules } => commands::list::execute(project_dir, rules),
        Commands::References { project_dir, as_of } => {
            commands::references::execute(project_dir, as_of).await
        }
        Commands::Check { project_dir } => commands::check::execute(project_dir),
    }
}
