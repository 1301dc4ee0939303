mod cli;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use salty::config::SaltyConfig;
use salty::server;

#[derive(Parser)]
#[command(name = "salty", version, about = "Home controller MCP server: routines and smart lights")]
struct Cli {
    /// Config file (defaults to ~/.salty/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server
    Serve {
        /// Transport to serve on (overrides config)
        #[arg(long, value_enum)]
        transport: Option<Transport>,
    },
    /// List saved routines
    List,
    /// Show one routine with all its steps
    Show { name: String },
    /// Delete a routine
    Delete { name: String },
    /// Run a routine now
    Run { name: String },
    /// Show recent routine executions
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show routine statistics
    Stats,
    /// Back up all routines and history
    Backup {
        #[arg(long)]
        name: Option<String>,
    },
    /// Restore routines and history from a backup file (replaces all routines)
    Restore { file: PathBuf },
    /// List available backups
    Backups,
    /// Import routines from a JSON array file
    Import {
        file: PathBuf,
        /// Replace routines that already exist
        #[arg(long)]
        overwrite: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SaltyConfig::load_from(path)?,
        None => SaltyConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { transport } => {
            let transport = match transport {
                Some(t) => t,
                None => match config.server.transport.as_str() {
                    "stdio" => Transport::Stdio,
                    "http" | "sse" => Transport::Http,
                    other => bail!("unknown transport '{other}' (expected stdio or http)"),
                },
            };
            match transport {
                Transport::Stdio => server::serve_stdio(config).await?,
                Transport::Http => server::serve_http(config).await?,
            }
        }
        Command::List => cli::routines::list(&config)?,
        Command::Show { name } => cli::routines::show(&config, &name)?,
        Command::Delete { name } => cli::routines::delete(&config, &name)?,
        Command::Run { name } => cli::run::run(&config, &name).await?,
        Command::History { limit } => cli::history::history(&config, limit)?,
        Command::Stats => cli::stats::stats(&config)?,
        Command::Backup { name } => cli::backup::backup(&config, name.as_deref())?,
        Command::Restore { file } => cli::backup::restore(&config, &file)?,
        Command::Backups => cli::backup::backups(&config)?,
        Command::Import { file, overwrite } => cli::import::import(&config, &file, overwrite)?,
    }

    Ok(())
}
