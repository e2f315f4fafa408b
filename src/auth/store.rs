//! Persisted auth record
//!
//! The login flow writes a JSON document whose `auth` key holds the bearer
//! token next to the user's profile. Documents written by the web client's
//! state persistence (`{"state": {...}}`) and flat documents are accepted
//! too.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MoodchatError, Result};

/// Profile of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "user_id", alias = "userId")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Token and profile persisted by the login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAuth {
    #[serde(default, alias = "access_token", alias = "accessToken")]
    pub token: Option<String>,

    /// When `None`, the token is treated as non-expiring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl PersistedAuth {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map_or(false, |at| Utc::now() >= at)
    }

    /// The token, unless it is missing, blank or expired.
    pub fn usable_token(&self) -> Option<&str> {
        if self.is_expired() {
            return None;
        }
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// File-backed accessor for [`PersistedAuth`].
#[derive(Debug, Clone)]
pub struct AuthStore {
    path: PathBuf,
}

impl AuthStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. A missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`MoodchatError::Credential`] if the file exists but is not a
    /// recognisable auth document.
    pub fn load(&self) -> Result<Option<PersistedAuth>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut document: Value = serde_json::from_str(&contents).map_err(|e| {
            MoodchatError::Credential(format!("{} is not valid JSON: {}", self.path.display(), e))
        })?;

        let wrapper = ["auth", "state"]
            .into_iter()
            .find(|key| document.get(key).is_some());
        let record = match wrapper {
            Some(key) => document[key].take(),
            None => document,
        };

        serde_json::from_value(record).map(Some).map_err(|e| {
            MoodchatError::Credential(format!(
                "{} has no usable auth record: {}",
                self.path.display(),
                e
            ))
            .into()
        })
    }
}
