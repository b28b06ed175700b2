//! slk - Slack CLI with session auth borrowed from the macOS desktop app.
//!
//! No app tokens or OAuth flows: credentials are recovered from the
//! artifacts the Slack desktop app already keeps on this machine, validated
//! against the live API, and then used for ordinary workspace commands.

mod api;
mod auth;
mod commands;
mod config;
mod models;
mod utils;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::SlackClient;
use auth::{CredentialResolver, SlackDataDir};
use config::Config;

#[derive(Parser)]
#[command(name = "slk")]
#[command(version, about = "Slack CLI (session-based auth, macOS)", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test authentication
    Auth {
        /// Re-extract credentials, ignoring caches
        #[arg(long)]
        refresh: bool,
    },
    /// List channels
    #[command(visible_alias = "ch")]
    Channels,
    /// List direct message conversations
    Dms,
    /// Read recent messages
    #[command(visible_alias = "r")]
    Read {
        /// Channel name (e.g. "ai-coding") or ID (e.g. "C08A8AQ2AFP")
        channel: String,
        #[arg(default_value_t = 20)]
        count: u32,
    },
    /// Send a message
    #[command(visible_alias = "s")]
    Send {
        channel: String,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Search messages
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[arg(short, long, default_value_t = 20)]
        count: u32,
    },
    /// Read a thread
    #[command(visible_alias = "t")]
    Thread {
        channel: String,
        /// Parent message timestamp
        ts: String,
        #[arg(default_value_t = 50)]
        count: u32,
    },
    /// List workspace users
    #[command(visible_alias = "u")]
    Users,
    /// React to a message
    React {
        channel: String,
        ts: String,
        emoji: String,
    },
    /// Show all channel activity
    #[command(visible_alias = "a")]
    Activity,
    /// Show only channels with unreads
    #[command(visible_alias = "ur")]
    Unread,
    /// Show VIP users + starred items
    #[command(visible_alias = "star")]
    Starred,
    /// Show pinned items in a channel
    #[command(visible_alias = "pin")]
    Pins { channel: String },
    /// Show saved-for-later items
    Saved {
        #[arg(short, long, default_value_t = 20)]
        count: u32,
        /// Include completed items
        #[arg(long)]
        all: bool,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let data_dir = match &config.slack_dir {
        Some(dir) => SlackDataDir::at(dir.clone()),
        None => SlackDataDir::locate()?,
    };
    info!(dir = %data_dir.root().display(), "Using Slack data directory");

    let mut resolver = CredentialResolver::new(&data_dir, config.api_base.clone())?;
    let force_refresh = matches!(&cli.command, Commands::Auth { refresh: true });
    let creds = if force_refresh {
        resolver.refresh().await?
    } else {
        resolver.resolve(false).await?
    };

    let client = match &config.api_base {
        Some(base) => SlackClient::with_base_url(creds, base.clone())?,
        None => SlackClient::new(creds)?,
    };

    match cli.command {
        Commands::Auth { .. } => commands::auth(&client).await,
        Commands::Channels => commands::channels(&client).await,
        Commands::Dms => commands::dms(&client).await,
        Commands::Read { channel, count } => commands::read(&client, &channel, count).await,
        Commands::Send { channel, message } => {
            commands::send(&client, &channel, &message.join(" ")).await
        }
        Commands::Search { query, count } => {
            commands::search(&client, &query.join(" "), count).await
        }
        Commands::Thread { channel, ts, count } => {
            commands::thread(&client, &channel, &ts, count).await
        }
        Commands::Users => commands::users(&client).await,
        Commands::React { channel, ts, emoji } => {
            commands::react(&client, &channel, &ts, &emoji).await
        }
        Commands::Activity => commands::activity(&client, false).await,
        Commands::Unread => commands::activity(&client, true).await,
        Commands::Starred => commands::starred(&client).await,
        Commands::Pins { channel } => commands::pins(&client, &channel).await,
        Commands::Saved { count, all } => commands::saved(&client, count, all).await,
    }
}
