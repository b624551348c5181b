//! Workdesk
//!
//! Chat-driven office desk: role-scoped file folders, internal mail, assignable test links
//! and fuzzy file search.
//!
//! ## Usage
//!
//! ```text
//! workdesk --config workdesk.toml --base-dir /srv/desk
//! ```
//!
//! Updates are read from stdin as JSON lines and rendered output is written to stdout; logs
//! go to stderr.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use workdesk_bot::{serve, Desk, DeskConfig, StdioTransport};

#[derive(Parser)]
#[command(name = "workdesk")]
#[command(about = "Role-scoped files, internal mail and tests behind a chat interface", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./workdesk.toml or the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Folder holding the role folders (overrides WORKDESK_BASE_DIR)
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Handle with developer access (overrides WORKDESK_DEVELOPER)
    #[arg(long)]
    developer: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr only (stdout carries the transport)
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = DeskConfig::load(cli.config.as_deref())?;
    config.apply_env();
    config.apply_overrides(cli.base_dir, cli.developer);

    log::info!("Starting workdesk");
    let transport = Arc::new(StdioTransport::new(tokio::io::stdout()));
    let desk = Arc::new(Desk::open(config, transport)?);
    desk.announce_startup().await;

    serve(desk, tokio::io::BufReader::new(tokio::io::stdin())).await?;

    log::info!("Workdesk stopped");
    Ok(())
}
