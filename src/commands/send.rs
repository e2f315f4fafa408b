//! One-shot send: resolve today's session, send one message, print the reply.

use crate::chat::ChatEngine;
use crate::commands::chat::render_update;
use crate::commands::{print_not_signed_in, Services};
use crate::config::Config;
use crate::error::Result;

/// Send `message` for `user_id` and stream the reply to stdout. Without a
/// stored credential nothing is sent.
///
/// # Errors
///
/// Fails on session resolution errors, on an empty message, and when the
/// reply itself ends in an error.
pub async fn run_send(config: Config, user_id: String, message: String) -> Result<()> {
    let services = Services::from_config(&config)?;
    let mut engine = ChatEngine::new(services.transport.clone());
    let Some(session) = engine.open_today(&services.resolver, &user_id).await? else {
        print_not_signed_in();
        return Ok(());
    };
    tracing::debug!(session_id = %session.session_id, "Sending one-shot message");

    let mut updates = engine.subscribe();
    let renderer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            render_update(&update);
        }
    });

    engine.send_message(&message).await?;
    engine.run_until_idle().await;
    let error = engine.store().error().map(str::to_string);

    // Dropping the engine closes the update channel and ends the renderer.
    drop(engine);
    renderer.await?;

    match error {
        Some(error) => anyhow::bail!("Reply failed: {}", error),
        None => Ok(()),
    }
}
