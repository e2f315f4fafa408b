//! Command-line interface definition for moodchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot sends and session
//! management.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// moodchat - talk to the mood journal assistant
#[derive(Parser, Debug, Clone)]
#[command(name = "moodchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults to the platform config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override `api.base_url` from the config file
    #[arg(long, env = "MOODCHAT_API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for moodchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open today's session and chat interactively
    Chat {
        /// User whose session to open (defaults to config / auth profile)
        #[arg(short, long)]
        user_id: Option<String>,
    },

    /// Send one message to today's session and print the reply
    Send {
        /// User whose session receives the message
        #[arg(short, long)]
        user_id: Option<String>,

        /// Message text
        message: String,
    },

    /// Manage chat sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List a user's sessions
    List {
        #[arg(short, long)]
        user_id: Option<String>,
    },

    /// Delete today's sessions and start a fresh one
    Reset {
        #[arg(short, long)]
        user_id: Option<String>,
    },

    /// Delete one session by id
    Delete {
        /// Session id to delete
        session_id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
