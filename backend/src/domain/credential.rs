//! Short-lived access credential and the store that enforces its expiry.
//!
//! The persisted form is JSON `{"token": "...", "expiresAt": <epoch millis>}`.
//! A credential read back at or past `expiresAt`, or one that fails to parse,
//! is deleted and reported as absent.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::ports::{CredentialStorage, CredentialStorageError};

/// Lifetime applied when the token grant does not carry `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 86_400;

const FINGERPRINT_LEN: usize = 12;

/// Validation errors returned by [`AccessToken::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessTokenValidationError {
    /// Token was blank once trimmed.
    #[error("access token must not be empty")]
    Empty,
}

/// Opaque bearer token issued by the ads platform.
///
/// The backing buffer is zeroised on drop and `Debug` prints only the
/// fingerprint.
///
/// # Examples
/// ```
/// use pixel_onboarding::domain::AccessToken;
///
/// let token = AccessToken::new("act.example").expect("valid token");
/// assert_eq!(token.expose(), "act.example");
/// assert!(!format!("{token:?}").contains("act.example"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Validate and wrap a raw token.
    pub fn new(value: impl Into<String>) -> Result<Self, AccessTokenValidationError> {
        let raw = Zeroizing::new(value.into());
        if raw.trim().is_empty() {
            return Err(AccessTokenValidationError::Empty);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw token for transmission to the ads platform.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Truncated SHA-256 hex digest usable in logs.
    pub fn fingerprint(&self) -> String {
        let digest = hex::encode(Sha256::digest(self.0.as_bytes()));
        digest.chars().take(FINGERPRINT_LEN).collect()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&self.fingerprint()).finish()
    }
}

/// A token together with its absolute expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    token: AccessToken,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Pair a token with its expiry.
    pub fn new(token: AccessToken, expires_at: DateTime<Utc>) -> Self {
        Self { token, expires_at }
    }

    /// The bearer token.
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Expiry instant. The credential is unusable from this instant on.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the credential has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredential {
    token: String,
    expires_at: i64,
}

impl StoredCredential {
    fn from_credential(credential: &Credential) -> Self {
        Self {
            token: credential.token.expose().to_owned(),
            expires_at: credential.expires_at.timestamp_millis(),
        }
    }

    fn into_credential(self) -> Option<Credential> {
        let expires_at = DateTime::<Utc>::from_timestamp_millis(self.expires_at)?;
        let token = AccessToken::new(self.token).ok()?;
        Some(Credential::new(token, expires_at))
    }
}

/// Errors raised while persisting or clearing the credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialStoreError {
    /// The storage adapter failed.
    #[error(transparent)]
    Storage(#[from] CredentialStorageError),
    /// The credential could not be serialised.
    #[error("credential encoding failed: {message}")]
    Encode {
        /// Serializer message.
        message: String,
    },
    /// `expires_in` is too large to represent as an instant.
    #[error("token lifetime of {seconds}s is out of range")]
    LifetimeOutOfRange {
        /// The rejected lifetime.
        seconds: u64,
    },
}

/// Domain service wrapping the raw storage port with expiry rules.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use mockable::DefaultClock;
/// use pixel_onboarding::domain::{AccessToken, CredentialStore};
/// use pixel_onboarding::outbound::credential_storage::InMemoryCredentialStorage;
///
/// let store = CredentialStore::new(
///     Arc::new(InMemoryCredentialStorage::default()),
///     Arc::new(DefaultClock),
/// );
/// let token = AccessToken::new("act.example").expect("valid token");
/// store.save(token, Some(3600)).expect("saved");
/// assert!(store.load().is_some());
/// ```
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn CredentialStorage>,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    /// Build a store over `storage`, reading time from `clock`.
    pub fn new(storage: Arc<dyn CredentialStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Return the persisted credential if it is still valid.
    ///
    /// Unparseable and expired values are deleted. Read failures are logged
    /// and reported as absence.
    pub fn load(&self) -> Option<Credential> {
        let raw = match self.storage.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                warn!(%error, "credential storage read failed");
                return None;
            }
        };

        let parsed = serde_json::from_str::<StoredCredential>(&raw)
            .ok()
            .and_then(StoredCredential::into_credential);
        let Some(credential) = parsed else {
            warn!("discarding corrupt stored credential");
            self.discard();
            return None;
        };

        if credential.is_expired_at(self.clock.utc()) {
            warn!(
                fingerprint = %credential.token.fingerprint(),
                expires_at = %credential.expires_at,
                "discarding expired credential"
            );
            self.discard();
            return None;
        }
        Some(credential)
    }

    /// Persist `token`, valid for `expires_in_secs` from now.
    ///
    /// A missing lifetime falls back to [`DEFAULT_TOKEN_LIFETIME_SECS`].
    pub fn save(
        &self,
        token: AccessToken,
        expires_in_secs: Option<u64>,
    ) -> Result<Credential, CredentialStoreError> {
        let seconds = expires_in_secs.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let expires_at = i64::try_from(seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| self.clock.utc().checked_add_signed(lifetime))
            .ok_or(CredentialStoreError::LifetimeOutOfRange { seconds })?;

        let credential = Credential::new(token, expires_at);
        let encoded = serde_json::to_string(&StoredCredential::from_credential(&credential))
            .map_err(|error| CredentialStoreError::Encode {
                message: error.to_string(),
            })?;
        self.storage.write(&encoded)?;
        info!(
            fingerprint = %credential.token.fingerprint(),
            expires_at = %credential.expires_at,
            "credential stored"
        );
        Ok(credential)
    }

    /// Delete the persisted credential.
    pub fn clear(&self) -> Result<(), CredentialStoreError> {
        self.storage.remove()?;
        Ok(())
    }

    fn discard(&self) {
        if let Err(error) = self.storage.remove() {
            warn!(%error, "failed to delete stored credential");
        }
    }
}

#[cfg(test)]
mod tests;
