//! Driven port holding the single persisted credential record.
//!
//! The store is raw: one string value under one key. Parsing,
//! expiry and deletion policy live in [`crate::domain::CredentialStore`].

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential storage adapters.
    pub enum CredentialStorageError {
        /// The backing medium could not be read or written.
        Io { message: String } => "credential storage i/o failed: {message}",
        /// The adapter's internal state is unusable.
        Unavailable { message: String } => "credential storage unavailable: {message}",
    }
}

/// Port for reading and writing the persisted credential value.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStorage: Send + Sync {
    /// Return the stored value, or `None` when nothing is stored.
    fn read(&self) -> Result<Option<String>, CredentialStorageError>;

    /// Replace the stored value.
    fn write(&self, value: &str) -> Result<(), CredentialStorageError>;

    /// Delete the stored value. Deleting an absent value succeeds.
    fn remove(&self) -> Result<(), CredentialStorageError>;
}
