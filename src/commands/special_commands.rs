//! Slash commands for the interactive chat
//!
//! Lines starting with `/` control the chat instead of being sent to the
//! assistant. Commands are case-insensitive; `exit` and `quit` also work
//! without the slash.

use colored::Colorize;
use thiserror::Error;

/// Errors from parsing a slash command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command takes no argument but got one
    #[error("{command} takes no arguments (got '{arg}')")]
    UnexpectedArgument { command: String, arg: String },
}

/// Commands available in the interactive chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Delete today's session and start a fresh one
    Reset,

    /// Stop the reply being streamed and drop queued messages
    Cancel,

    /// Show session id, phase, message and queue counts
    Status,

    /// Display help information
    Help,

    /// Leave the chat
    Exit,

    /// Not a command; send the line as a message
    None,
}

/// Parse one input line.
///
/// # Examples
///
/// ```
/// use moodchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/status").unwrap(), SpecialCommand::Status);
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (command, arg) = match lower.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (lower.as_str(), ""),
    };

    let parsed = match command {
        "/reset" | "/new" => SpecialCommand::Reset,
        "/cancel" | "/stop" => SpecialCommand::Cancel,
        "/status" => SpecialCommand::Status,
        "/help" | "/?" => SpecialCommand::Help,
        "/exit" | "/quit" | "exit" | "quit" => SpecialCommand::Exit,
        _ => return Err(CommandError::UnknownCommand(trimmed.to_string())),
    };

    if !arg.is_empty() {
        return Err(CommandError::UnexpectedArgument {
            command: command.to_string(),
            arg: arg.to_string(),
        });
    }
    Ok(parsed)
}

/// Print the command reference
pub fn print_help() {
    println!("\n{}", "Chat commands".bold());
    println!("  {}   start a fresh session for today", "/reset".cyan());
    println!("  {}  stop the current reply and drop queued messages", "/cancel".cyan());
    println!("  {}  show session and reply status", "/status".cyan());
    println!("  {}    show this help", "/help".cyan());
    println!("  {}    leave the chat", "/exit".cyan());
    println!();
    println!("Anything else is sent as a message. Lines typed while a reply is");
    println!("still streaming are queued and sent in order once it finishes.\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("I slept badly").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(
            parse_special_command("exit strategy?").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        assert_eq!(parse_special_command("/RESET").unwrap(), SpecialCommand::Reset);
        assert_eq!(parse_special_command(" /Cancel ").unwrap(), SpecialCommand::Cancel);
        assert_eq!(parse_special_command("/status").unwrap(), SpecialCommand::Status);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_exit_with_and_without_slash() {
        for input in ["/exit", "/quit", "exit", "QUIT"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_special_command("/mode write"),
            Err(CommandError::UnknownCommand("/mode write".to_string()))
        );
    }

    #[test]
    fn test_argument_rejected() {
        assert!(matches!(
            parse_special_command("/reset now"),
            Err(CommandError::UnexpectedArgument { .. })
        ));
    }
}
