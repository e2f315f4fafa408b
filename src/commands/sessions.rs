//! `moodchat sessions`: list, reset and delete a user's chat sessions.

use colored::Colorize;
use prettytable::{format, Table};

use crate::cli::SessionCommand;
use crate::commands::{print_not_signed_in, resolve_user_id, Services};
use crate::config::Config;
use crate::error::Result;
use crate::models::SessionSummary;
use crate::session::is_same_local_day;

/// Handle `moodchat sessions ...`
pub async fn handle_sessions(config: &Config, command: SessionCommand) -> Result<()> {
    let services = Services::from_config(config)?;
    if !services.resolver.signed_in()? {
        print_not_signed_in();
        return Ok(());
    }

    match command {
        SessionCommand::List { user_id } => {
            let user_id = resolve_user_id(user_id, config)?;
            let sessions = services.resolver.list_sessions(&user_id).await?;

            if sessions.is_empty() {
                println!("{}", "No chat sessions found.".yellow());
                return Ok(());
            }

            println!("\nChat sessions for {}:", user_id.cyan());
            sessions_table(&sessions).printstd();
            println!();
        }
        SessionCommand::Reset { user_id } => {
            let user_id = resolve_user_id(user_id, config)?;
            let Some(fresh) = services.resolver.reset_today_session(&user_id).await? else {
                print_not_signed_in();
                return Ok(());
            };
            println!(
                "{}",
                format!("Started a fresh session {}", fresh.session_id).green()
            );
        }
        SessionCommand::Delete { session_id } => {
            services.directory.delete_session(&session_id).await?;
            println!("{}", format!("Deleted session {}", session_id).green());
        }
    }

    Ok(())
}

fn sessions_table(sessions: &[SessionSummary]) -> Table {
    let now = chrono::Local::now();
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Created".bold(),
        "Messages".bold(),
        "Status".bold()
    ]);

    for session in sessions {
        let title = if session.title.chars().count() > 40 {
            format!("{}...", session.title.chars().take(37).collect::<String>())
        } else if session.title.is_empty() {
            "-".to_string()
        } else {
            session.title.clone()
        };
        let created = session
            .created_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        let messages = session
            .message_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if !session.is_active {
            "closed".dimmed()
        } else if is_same_local_day(&session.created_at, &now) {
            "today".green()
        } else {
            "active".normal()
        };

        table.add_row(prettytable::row![
            session.session_id.cyan(),
            title,
            created,
            messages,
            status
        ]);
    }
    table
}
