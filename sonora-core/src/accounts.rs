//! Requester accounts as seen by the streaming engine: only the stored
//! format preference matters here.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::catalog::EncodingTier;

/// Encoding a requester prefers to stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatPreference {
    #[serde(rename = "flac", alias = "lossless")]
    Lossless,
    #[serde(rename = "opus", alias = "lossy")]
    Lossy,
}

impl FormatPreference {
    /// Encoding tier this preference asks for first.
    pub fn preferred_tier(self) -> EncodingTier {
        match self {
            FormatPreference::Lossless => EncodingTier::Lossless,
            FormatPreference::Lossy => EncodingTier::Lossy,
        }
    }
}

impl std::str::FromStr for FormatPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flac" | "lossless" => Ok(FormatPreference::Lossless),
            "opus" | "lossy" => Ok(FormatPreference::Lossy),
            _ => Err(format!(
                "Invalid format preference: '{s}'. Valid options are: flac, opus"
            )),
        }
    }
}

impl std::fmt::Display for FormatPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatPreference::Lossless => write!(f, "flac"),
            FormatPreference::Lossy => write!(f, "opus"),
        }
    }
}

/// Errors from account store operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// No account exists with this id
    #[error("Requester not found: {requester_id}")]
    RequesterNotFound {
        /// Identifier that was looked up
        requester_id: String,
    },
}

/// Account lookups needed for format selection.
///
/// Implementations must return the current stored value on every call; the
/// engine never caches preferences across requests.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Stored preference of `requester_id`, or `None` if the account does not exist.
    async fn preference(&self, requester_id: &str) -> Option<FormatPreference>;

    /// Replaces the stored preference of an existing account.
    ///
    /// # Errors
    /// - `AccountError::RequesterNotFound` - No account with this id
    async fn set_preference(
        &self,
        requester_id: &str,
        preference: FormatPreference,
    ) -> Result<(), AccountError>;
}

/// Account store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    preferences: RwLock<HashMap<String, FormatPreference>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account, replacing any existing preference.
    pub fn insert(&self, requester_id: impl Into<String>, preference: FormatPreference) {
        self.preferences.write().insert(requester_id.into(), preference);
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.preferences.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.read().is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn preference(&self, requester_id: &str) -> Option<FormatPreference> {
        self.preferences.read().get(requester_id).copied()
    }

    async fn set_preference(
        &self,
        requester_id: &str,
        preference: FormatPreference,
    ) -> Result<(), AccountError> {
        match self.preferences.write().get_mut(requester_id) {
            Some(stored) => {
                *stored = preference;
                Ok(())
            }
            None => Err(AccountError::RequesterNotFound {
                requester_id: requester_id.to_string(),
            }),
        }
    }
}
