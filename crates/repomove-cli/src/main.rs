use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "repomove")]
#[command(about = "repomove - inspect repository migration state", long_about = None)]
struct Cli {
    /// Config file (default: <config_dir>/repomove/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State file, overriding the configured location
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List in-flight migrations
    Active,
    /// List finished migrations, oldest first
    History {
        /// Only the most recent N records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one migration from either set
    Show {
        /// Migration ID
        id: String,
    },
    /// List registered migration sources
    Sources,
    /// Print the effective configuration (names only, never values)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = commands::Context::load(cli.config, cli.state_file)?;

    match cli.command {
        Commands::Active => commands::inspect::active(&ctx).await?,
        Commands::History { limit } => commands::inspect::history(&ctx, limit).await?,
        Commands::Show { id } => commands::inspect::show(&ctx, &id).await?,
        Commands::Sources => commands::inspect::sources(&ctx).await?,
        Commands::Config => commands::config::print(&ctx)?,
    }

    Ok(())
}
