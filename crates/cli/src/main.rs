//! claimdesk - inspect action availability and the stored session from a
//! terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use claimdesk_session::SessionConfig;

mod commands;

use commands::{ActionsArgs, MenuArgs};

/// claimdesk - claim request system tooling
#[derive(Parser, Debug)]
#[command(name = "claimdesk")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the actions a user may invoke on a claim or project
    Actions(ActionsArgs),

    /// Print the navigation menu visible to a role
    Menu(MenuArgs),

    /// Print the standard rule table in audit order
    Rules,

    /// Check the stored session, refreshing the access token if it expired
    CheckSession,

    /// End the session remotely (best-effort) and clear the stored record
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    claimdesk_observability::init();

    let cli = Cli::parse();
    let config = SessionConfig::from_env().context("invalid configuration")?;

    let output = match cli.command {
        Commands::Actions(args) => commands::actions(&args, &config)?,
        Commands::Menu(args) => commands::menu(&args)?,
        Commands::Rules => commands::rules(),
        Commands::CheckSession => commands::check_session(&config).await?,
        Commands::Logout => commands::logout(&config).await?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
