//! Moco CLI
//!
//! Command-line interface for Moco - save links now, read them later.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use moco_core::{Config, Identity, Library};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "moco")]
#[command(about = "Moco - Read it later")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a link, reading its title and description from the page
    Add {
        /// URL to save
        url: String,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Title (overrides the page heading)
        #[arg(long)]
        title: Option<String>,
        /// Description (overrides the page text)
        #[arg(long)]
        desc: Option<String>,
    },
    /// List saved articles
    #[command(alias = "ls")]
    List {
        /// Only show articles whose title contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one article
    Show {
        /// Article link
        link: String,
    },
    /// Edit an article
    Edit {
        /// Article link
        link: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        desc: Option<String>,
        /// New tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete an article
    #[command(alias = "rm")]
    Delete {
        /// Article link
        link: String,
    },
    /// Merge your remote articles into this device
    Pull,
    /// Overwrite your remote articles with this device's
    Push,
    /// Sign in as a user
    Login {
        /// User id that owns the remote articles
        user_id: String,
        /// Token presented to the remote store
        #[arg(long)]
        token: Option<String>,
    },
    /// Sign out and clear local articles
    Logout,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, remote_url, conflict_policy, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands work even when the store cannot be opened
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(&key, &value, &output)
            }
        };
    }

    let config = Config::load().context("Failed to load configuration")?;
    debug!(data_dir = ?config.data_dir, "Loaded configuration");
    let mut identity = Identity::load(&config).context("Failed to load session")?;

    if let Commands::Login { user_id, token } = &cli.command {
        return commands::auth::login(&mut identity, user_id, token.clone(), &output);
    }

    let library = Library::open(&config)?;

    match cli.command {
        Commands::Add {
            url,
            tag,
            title,
            desc,
        } => commands::article::add(&library, &url, &tag, title, desc, &output).await,
        Commands::List { search } => commands::article::list(&library, search, &output),
        Commands::Show { link } => commands::article::show(&library, &link, &output),
        Commands::Edit {
            link,
            title,
            desc,
            tags,
        } => commands::article::edit(&library, &link, title, desc, tags, &output).await,
        Commands::Delete { link } => commands::article::delete(&library, &link, &output).await,
        Commands::Pull => commands::sync::pull(&library, &config, &identity, &output).await,
        Commands::Push => commands::sync::push(&library, &config, &identity, &output).await,
        Commands::Logout => commands::auth::logout(&library, &mut identity, &output).await,
        Commands::Login { .. } | Commands::Config { .. } => Ok(()), // Handled above
    }
}

/// Log to stderr, filtered by MOCO_LOG or RUST_LOG
fn init_logging() {
    let env_filter = EnvFilter::try_from_env("MOCO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
