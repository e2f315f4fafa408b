//! [`CredentialProvider`] implementations.

use std::path::PathBuf;

use crate::auth::{AuthStore, CredentialProvider};
use crate::error::{MoodchatError, Result};

/// Fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn none() -> Self {
        Self { token: None }
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }
}

/// Token read from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn bearer_token(&self) -> Result<Option<String>> {
        Ok(std::env::var(&self.var)
            .ok()
            .filter(|t| !t.trim().is_empty()))
    }
}

/// Token read from the persisted auth store on every call, so a login in
/// another process is picked up without restarting the chat.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    store: AuthStore,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: AuthStore::new(path),
        }
    }
}

impl CredentialProvider for FileCredentials {
    fn bearer_token(&self) -> Result<Option<String>> {
        let Some(auth) = self.store.load()? else {
            tracing::debug!("No auth file at {}", self.store.path().display());
            return Ok(None);
        };
        if auth.is_expired() {
            tracing::warn!("Stored token has expired; sending requests unauthenticated");
        }
        Ok(auth.usable_token().map(str::to_string))
    }
}

/// Token stored in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringCredentials {
    service: String,
    user: String,
}

impl KeyringCredentials {
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }
}

impl CredentialProvider for KeyringCredentials {
    fn bearer_token(&self) -> Result<Option<String>> {
        let entry = keyring::Entry::new(&self.service, &self.user).map_err(MoodchatError::Keyring)?;
        match entry.get_password() {
            Ok(token) if token.trim().is_empty() => Ok(None),
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(MoodchatError::Keyring(e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_static_credentials() {
        assert_eq!(
            StaticCredentials::new("t").bearer_token().unwrap().as_deref(),
            Some("t")
        );
        assert!(StaticCredentials::none().bearer_token().unwrap().is_none());
    }

    #[test]
    #[serial]
    fn test_env_credentials() {
        let provider = EnvCredentials::new("MOODCHAT_TEST_TOKEN_VAR");
        std::env::remove_var("MOODCHAT_TEST_TOKEN_VAR");
        assert!(provider.bearer_token().unwrap().is_none());

        std::env::set_var("MOODCHAT_TEST_TOKEN_VAR", "env-token");
        let token = provider.bearer_token().unwrap();
        std::env::remove_var("MOODCHAT_TEST_TOKEN_VAR");
        assert_eq!(token.as_deref(), Some("env-token"));
    }

    #[test]
    fn test_file_credentials_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = FileCredentials::new(dir.path().join("auth.json"));
        assert!(provider.bearer_token().unwrap().is_none());
    }

    #[test]
    fn test_file_credentials_picks_up_new_login() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        let provider = FileCredentials::new(&path);
        assert!(provider.bearer_token().unwrap().is_none());

        std::fs::write(&path, r#"{"auth":{"token":"fresh"}}"#).unwrap();
        assert_eq!(provider.bearer_token().unwrap().as_deref(), Some("fresh"));
    }
}
