//! moodchat - chat with the mood journal assistant from the terminal
//!
#![doc = "moodchat - chat with the mood journal assistant"]
#![doc = "Main entry point for the moodchat CLI."]

use anyhow::Result;

use moodchat::cli::{Cli, Commands};
use moodchat::commands;
use moodchat::config::Config;
use moodchat::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    logging::init_logging(cli.verbose, cli.json_logs)?;

    // Load configuration
    let config = Config::load(cli.config.as_deref(), &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { user_id } => {
            let user_id = commands::resolve_user_id(user_id, &config)?;
            commands::chat::run_chat(config, user_id).await
        }
        Commands::Send { user_id, message } => {
            let user_id = commands::resolve_user_id(user_id, &config)?;
            commands::send::run_send(config, user_id, message).await
        }
        Commands::Sessions { command } => {
            tracing::debug!(?command, "Starting session command");
            commands::sessions::handle_sessions(&config, command).await
        }
    }
}
