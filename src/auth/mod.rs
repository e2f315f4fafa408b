//! Bearer credential providers
//!
//! Every backend call attaches `Authorization: Bearer <token>` when a
//! credential is available. Token acquisition (login) happens elsewhere;
//! this module only reads what the login flow persisted.
//!
//! # Module Layout
//!
//! - [`store`]       -- the persisted auth record (token + user profile)
//! - [`credentials`] -- [`CredentialProvider`] implementations

pub mod credentials;
pub mod store;

use std::sync::Arc;

use crate::config::{AuthConfig, AuthSource};
use crate::error::Result;

pub use credentials::{EnvCredentials, FileCredentials, KeyringCredentials, StaticCredentials};
pub use store::{AuthStore, PersistedAuth, UserProfile};

/// Supplies the current bearer token.
///
/// `Ok(None)` means "not logged in": requests go out without an
/// `Authorization` header and the backend decides what that means. `Err` is
/// reserved for a credential source that exists but cannot be read.
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    fn bearer_token(&self) -> Result<Option<String>>;
}

/// Build the provider selected by `auth.source`.
pub fn provider_from_config(config: &AuthConfig) -> Arc<dyn CredentialProvider> {
    match config.source {
        AuthSource::None => Arc::new(StaticCredentials::none()),
        AuthSource::Env => Arc::new(EnvCredentials::new(config.env_var.clone())),
        AuthSource::File => match config.resolved_file_path() {
            Some(path) => Arc::new(FileCredentials::new(path)),
            None => {
                tracing::warn!("No auth file location available; continuing without credentials");
                Arc::new(StaticCredentials::none())
            }
        },
        AuthSource::Keyring => Arc::new(KeyringCredentials::new(
            config.keyring_service.clone(),
            config.keyring_user.clone(),
        )),
    }
}

/// User id from the persisted auth profile, if the file source is in use.
pub fn profile_user_id(config: &AuthConfig) -> Option<String> {
    if config.source != AuthSource::File {
        return None;
    }
    let path = config.resolved_file_path()?;
    match AuthStore::new(path).load() {
        Ok(Some(auth)) => auth.user.map(|u| u.id),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Failed to read auth profile: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_source_yields_no_token() {
        let config = AuthConfig {
            source: AuthSource::None,
            ..AuthConfig::default()
        };
        let provider = provider_from_config(&config);
        assert!(provider.bearer_token().unwrap().is_none());
    }

    #[test]
    fn test_file_source_reads_profile_user() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(
            &path,
            r#"{"auth":{"token":"tok-1","user":{"id":"u-42","name":"Mina"}}}"#,
        )
        .unwrap();

        let config = AuthConfig {
            source: AuthSource::File,
            file_path: Some(path),
            ..AuthConfig::default()
        };
        assert_eq!(profile_user_id(&config).as_deref(), Some("u-42"));
        assert_eq!(
            provider_from_config(&config).bearer_token().unwrap().as_deref(),
            Some("tok-1")
        );
    }

    #[test]
    fn test_profile_user_id_ignored_for_env_source() {
        let config = AuthConfig {
            source: AuthSource::Env,
            ..AuthConfig::default()
        };
        assert!(profile_user_id(&config).is_none());
    }
}
