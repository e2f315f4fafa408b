//! Interactive chat handler.
//!
//! Opens today's session, prints its history and runs a readline loop.
//! The [`ChatEngine`] runs on its own task and is driven through
//! [`ChatCommand`]s, so lines typed while a reply is still streaming are
//! queued by the engine instead of blocking the prompt. A second task
//! renders [`ChatUpdate`]s as they arrive.

use std::io::Write;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::{mpsc, oneshot};

use crate::chat::{ChatCommand, ChatEngine, ChatStatus, ChatUpdate};
use crate::commands::special_commands::{self, parse_special_command, SpecialCommand};
use crate::commands::{print_not_signed_in, Services};
use crate::config::Config;
use crate::error::Result;
use crate::models::{ChatSession, Message, MessageRole};

/// Start interactive chat for `user_id`
pub async fn run_chat(config: Config, user_id: String) -> Result<()> {
    tracing::info!(user_id = %user_id, "Starting interactive chat");
    let services = Services::from_config(&config)?;

    let mut engine = ChatEngine::new(services.transport.clone());
    let Some(session) = engine.open_today(&services.resolver, &user_id).await? else {
        print_not_signed_in();
        return Ok(());
    };
    print_welcome_banner(session);
    print_history(session);

    let mut updates = engine.subscribe();
    let (commands, commands_rx) = mpsc::unbounded_channel();
    let engine_task = tokio::spawn(engine.run(commands_rx));
    let renderer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            render_update(&update);
        }
    });

    let mut rl = DefaultEditor::new()?;
    let prompt = format!("{} ", "you>".green().bold());

    loop {
        // readline blocks; keep the engine and renderer running meanwhile.
        let line = tokio::task::block_in_place(|| rl.readline(&prompt));
        match line {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                match parse_special_command(trimmed) {
                    Ok(SpecialCommand::Reset) => {
                        match services.resolver.reset_today_session(&user_id).await {
                            Ok(None) => print_not_signed_in(),
                            Ok(Some(fresh)) => {
                                println!(
                                    "{}",
                                    format!("Started a fresh session ({})", fresh.session_id)
                                        .green()
                                );
                                let _ = commands.send(ChatCommand::SwitchSession(Box::new(fresh)));
                            }
                            Err(e) => eprintln!("{}", format!("Reset failed: {}", e).red()),
                        }
                        continue;
                    }
                    Ok(SpecialCommand::Cancel) => {
                        let _ = commands.send(ChatCommand::Cancel);
                        continue;
                    }
                    Ok(SpecialCommand::Status) => {
                        let (reply, status) = oneshot::channel();
                        if commands.send(ChatCommand::Status(reply)).is_ok() {
                            if let Ok(status) = status.await {
                                print_status(&status);
                            }
                        }
                        continue;
                    }
                    Ok(SpecialCommand::Help) => {
                        special_commands::print_help();
                        continue;
                    }
                    Ok(SpecialCommand::Exit) => break,
                    Ok(SpecialCommand::None) => {}
                    Err(e) => {
                        eprintln!("{}", e.to_string().yellow());
                        continue;
                    }
                }

                rl.add_history_entry(trimmed)?;
                if commands.send(ChatCommand::Send(trimmed.to_string())).is_err() {
                    tracing::warn!("Chat engine stopped; leaving");
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                let _ = commands.send(ChatCommand::Cancel);
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = commands.send(ChatCommand::Close);
    let store = engine_task.await?;
    renderer.await?;
    tracing::info!(
        messages = store.messages().len(),
        "Chat closed"
    );
    println!("Goodbye!");
    Ok(())
}

fn print_welcome_banner(session: &ChatSession) {
    let title = if session.title.is_empty() {
        "Today's chat"
    } else {
        session.title.as_str()
    };
    println!();
    println!("{}", title.bold());
    println!(
        "Session {} - type {} for commands",
        session.session_id.cyan(),
        "/help".cyan()
    );
    println!();
}

fn print_history(session: &ChatSession) {
    for message in &session.messages {
        print_message(message);
    }
    if !session.messages.is_empty() {
        println!();
    }
}

fn print_message(message: &Message) {
    match message.role {
        MessageRole::User => println!("{} {}", "you>".green().bold(), message.content),
        MessageRole::Assistant => {
            let content = if message.incomplete {
                format!("{} {}", message.content, "(incomplete)".dimmed())
            } else {
                message.content.clone()
            };
            println!("{} {}", "bot>".magenta().bold(), content);
            print_extras(message);
        }
    }
}

/// Action hint and related diaries under an assistant message.
fn print_extras(message: &Message) {
    if let Some(action) = &message.action {
        println!("     {} {} ({})", "->".cyan(), action.label, action.path.dimmed());
    }
    for diary in &message.related_diaries {
        let label = match (&diary.title, &diary.date) {
            (Some(title), Some(date)) => format!("{} ({})", title, date),
            (Some(title), None) => title.clone(),
            (None, Some(date)) => date.clone(),
            (None, None) => diary.diary_id.clone(),
        };
        println!("     {} {}", "diary:".dimmed(), label);
    }
}

fn print_status(status: &ChatStatus) {
    println!("Session:  {}", status.session_id.as_deref().unwrap_or("-"));
    println!("Reply:    {}", status.phase);
    println!("Messages: {}", status.messages);
    println!("Queued:   {}", status.queued);
    if let Some(error) = &status.error {
        println!("Error:    {}", error.red());
    }
}

/// Print one engine update; shared with the one-shot `send` command.
pub(crate) fn render_update(update: &ChatUpdate) {
    let mut stdout = std::io::stdout();
    match update {
        ChatUpdate::Started { .. } => {
            print!("{} ", "bot>".magenta().bold());
        }
        ChatUpdate::Token(token) => {
            print!("{}", token);
        }
        ChatUpdate::Settled(message) => {
            println!();
            print_extras(message);
        }
        ChatUpdate::Failed { error, partial } => {
            if partial.is_some() {
                print!(" {}", "(incomplete)".dimmed());
            }
            println!();
            println!("{}", format!("Reply failed: {}", error).red());
        }
        ChatUpdate::Queued { position } => {
            println!("{}", format!("(queued, position {})", position).dimmed());
        }
        ChatUpdate::Cancelled { dropped } => {
            println!();
            let note = match dropped {
                0 => "Reply cancelled".to_string(),
                n => format!("Reply cancelled; {} queued message(s) dropped", n),
            };
            println!("{}", note.yellow());
        }
        ChatUpdate::Rejected(reason) => {
            println!("{}", reason.yellow());
        }
    }
    let _ = stdout.flush();
}
