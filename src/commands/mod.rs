//! Command handlers for the moodchat CLI
//!
//! Each subcommand lives in its own module. They share [`Services`], the
//! set of collaborators built from the loaded [`Config`], and
//! [`resolve_user_id`].

use std::sync::Arc;

use crate::auth::{profile_user_id, provider_from_config};
use crate::config::{AuthSource, Config};
use crate::directory::{HttpSessionDirectory, SessionDirectory};
use crate::error::{MoodchatError, Result};
use crate::session::SessionResolver;
use crate::transport::{HttpStreamTransport, StreamTransport};

pub mod chat;
pub mod send;
pub mod sessions;
pub mod special_commands;

/// Backend collaborators wired from configuration.
#[derive(Debug, Clone)]
pub struct Services {
    pub directory: Arc<dyn SessionDirectory>,
    pub resolver: SessionResolver,
    pub transport: Arc<dyn StreamTransport>,
}

impl Services {
    /// Build the HTTP directory and transport sharing one credential
    /// provider. No network I/O happens here.
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = provider_from_config(&config.auth);
        let directory: Arc<dyn SessionDirectory> =
            Arc::new(HttpSessionDirectory::new(&config.api, credentials.clone())?);
        let transport: Arc<dyn StreamTransport> = Arc::new(HttpStreamTransport::new(
            &config.api,
            &config.stream,
            credentials.clone(),
        )?);

        // `source: none` targets a backend without auth; every other source
        // needs a token before there is a session.
        let mut resolver = SessionResolver::new(directory.clone());
        if config.auth.source != AuthSource::None {
            resolver = resolver.with_credentials(credentials);
        }

        Ok(Self {
            resolver,
            directory,
            transport,
        })
    }
}

/// Pick the user id: the explicit flag, then `user_id` from config (or
/// `MOODCHAT_USER_ID`), then the persisted auth profile.
///
/// # Errors
///
/// Returns [`MoodchatError::Config`] when none of them yields an id.
pub fn resolve_user_id(explicit: Option<String>, config: &Config) -> Result<String> {
    explicit
        .or_else(|| config.user_id.clone())
        .or_else(|| profile_user_id(&config.auth))
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            MoodchatError::Config(
                "No user id; pass --user-id, set user_id in the config or log in first".into(),
            )
            .into()
        })
}

/// Shown instead of a session when no credential is stored.
pub(crate) fn print_not_signed_in() {
    use colored::Colorize;
    println!("{}", "Not signed in; log in to the journal first.".yellow());
}
