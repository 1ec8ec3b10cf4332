use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::models::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantType {
    /// App-level token, not tied to a user.
    ClientCredentials,
    /// User token obtained through the OAuth redirect handshake.
    AuthorizationCode,
    ApiKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    pub platform: Platform,
    pub grant: GrantType,
    pub session: Option<String>,
}

impl CredentialKey {
    pub fn app(platform: Platform) -> Self {
        Self {
            platform,
            grant: GrantType::ClientCredentials,
            session: None,
        }
    }

    pub fn api_key(platform: Platform) -> Self {
        Self {
            platform,
            grant: GrantType::ApiKey,
            session: None,
        }
    }

    pub fn user(platform: Platform, session_id: &str) -> Self {
        Self {
            platform,
            grant: GrantType::AuthorizationCode,
            session: Some(session_id.to_string()),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct Credential {
    pub access_token: String,
    /// `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
            refresh_token: None,
        }
    }

    pub fn non_expiring(access_token: impl Into<String>) -> Self {
        Self::new(access_token, None)
    }

    /// An entry that is already stale, so the first read triggers a refresh.
    pub fn refreshable(refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: String::new(),
            expires_at: Some(DateTime::<Utc>::UNIX_EPOCH),
            refresh_token: Some(refresh_token.into()),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    pub fn is_valid_at(&self, instant: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => instant < expires_at,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of a cache read. A stale entry is handed back so the caller can
/// refresh with it.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Valid(Credential),
    Stale(Credential),
    Absent,
}

impl Lookup {
    pub fn is_valid(&self) -> bool {
        matches!(self, Lookup::Valid(_))
    }
}

/// Passive keyed store of access credentials with expiry-aware reads.
///
/// One lock covers reads and writes. Nothing is evicted: stale entries stay
/// until overwritten or removed.
#[derive(Default)]
pub struct CredentialCache {
    entries: Mutex<HashMap<CredentialKey, Credential>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CredentialKey, Credential>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put(&self, key: CredentialKey, credential: Credential) {
        debug!(
            "Storing {:?} credential for {} (expires {:?})",
            key.grant, key.platform, credential.expires_at
        );
        self.entries().insert(key, credential);
    }

    pub fn get(&self, key: &CredentialKey) -> Lookup {
        self.get_at(key, Utc::now())
    }

    pub fn get_at(&self, key: &CredentialKey, instant: DateTime<Utc>) -> Lookup {
        match self.entries().get(key) {
            None => Lookup::Absent,
            Some(c) if c.is_valid_at(instant) => Lookup::Valid(c.clone()),
            Some(c) => Lookup::Stale(c.clone()),
        }
    }

    pub fn contains(&self, key: &CredentialKey) -> bool {
        self.entries().contains_key(key)
    }

    pub fn remove(&self, key: &CredentialKey) -> Option<Credential> {
        self.entries().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
